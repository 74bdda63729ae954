// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Typed mutation operations for diagram documents.
//!
//! A batch is applied in order; each operation sees the document state the
//! previous one left behind. Individual operations fail softly — the
//! batch collects error entries and keeps going, so one bad operation
//! never aborts the rest. All-or-nothing only exists at the final
//! validation gate, which is the caller's job.

use std::fmt;

use crate::format::mxgraph::CellParseError;
use crate::model::{CellId, Delta, DeltaBuilder, Document};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOp {
    /// Insert the parsed `new_xml` cell; an existing id makes this an
    /// implicit in-place update (idempotent upsert).
    Add { cell_id: CellId, new_xml: String },
    /// Full-node replacement. An unknown id is treated as an add — its
    /// own add operation may simply not have arrived yet mid-stream.
    Update { cell_id: CellId, new_xml: String },
    /// Remove the cell. A missing id is a non-fatal error entry.
    Delete { cell_id: CellId },
}

impl CellOp {
    pub fn cell_id(&self) -> &CellId {
        match self {
            Self::Add { cell_id, .. } | Self::Update { cell_id, .. } | Self::Delete { cell_id } => {
                cell_id
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpErrorReason {
    NotFound,
    SentinelDelete,
    InvalidNewXml(CellParseError),
}

impl fmt::Display for OpErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("cell not found"),
            Self::SentinelDelete => f.write_str("sentinel cells cannot be deleted"),
            Self::InvalidNewXml(err) => write!(f, "new_xml rejected: {err}"),
        }
    }
}

impl std::error::Error for OpErrorReason {}

/// One failed operation within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpError {
    pub cell_id: CellId,
    pub reason: OpErrorReason,
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation on cell {}: {}", self.cell_id, self.reason)
    }
}

impl std::error::Error for OpError {}

/// The per-batch report: how many operations applied, which failed and
/// why, and the coarse change delta of the survivors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub applied: usize,
    pub errors: Vec<OpError>,
    pub delta: Delta,
}

pub fn apply_batch(document: &mut Document, ops: &[CellOp]) -> BatchReport {
    let mut delta = DeltaBuilder::default();
    let mut applied = 0usize;
    let mut errors = Vec::new();

    for op in ops {
        match apply_cell_op(document, op, &mut delta) {
            Ok(()) => applied += 1,
            Err(reason) => errors.push(OpError {
                cell_id: op.cell_id().clone(),
                reason,
            }),
        }
    }

    BatchReport {
        applied,
        errors,
        delta: delta.finish(),
    }
}

// Extracted op-application implementation.
include!("ops_impl.rs");
