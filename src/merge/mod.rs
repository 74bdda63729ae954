// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Id-keyed fragment merging.
//!
//! A fragment cell replaces the base cell sharing its id in place; unseen
//! cells append in fragment order; untouched base cells keep their
//! original order. A fragment that fails to parse rejects the whole merge
//! and the caller keeps its base — merging is never partial.

use std::fmt;

use crate::format::mxgraph::{
    legalize, parse_cells, parse_document, CellParseError, DocumentParseError,
};
use crate::model::{Cell, Delta, DeltaBuilder, Document};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    Fragment(CellParseError),
    Base(DocumentParseError),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fragment(err) => write!(f, "fragment rejected: {err}"),
            Self::Base(err) => write!(f, "base document rejected: {err}"),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fragment(err) => Some(err),
            Self::Base(err) => Some(err),
        }
    }
}

/// A successful merge: the new document, its serialized form, and the
/// coarse change delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub document: Document,
    pub xml: String,
    pub delta: Delta,
}

/// Merge parsed cells into a document. The shared primitive behind both
/// the string-level merge and the streaming preview path.
pub fn merge_cells(document: &mut Document, cells: Vec<Cell>) -> Delta {
    let mut delta = DeltaBuilder::default();
    for cell in cells {
        let id = cell.id().clone();
        if document.upsert(cell) {
            delta.record_updated(id);
        } else {
            delta.record_added(id);
        }
    }
    delta.finish()
}

/// Parse a legalized payload as a cell list. Producers send either bare
/// cells or a whole wrapped document; a wrapped payload contributes its
/// cell list and its own wrapper is discarded (the base wrapper wins).
pub fn fragment_cells(legalized: &str) -> Result<Vec<Cell>, CellParseError> {
    match parse_document(legalized) {
        Ok(document) => {
            let (_, cells) = document.into_parts();
            Ok(cells)
        }
        Err(_) => parse_cells(legalized),
    }
}

/// Merge a raw fragment into a base document string.
///
/// The fragment is legalized first; the base is parsed as-is (it came out
/// of this engine). A blank base — the first message of a session — is
/// replaced by the synthesized two-sentinel document.
pub fn merge_into_base(base: &str, fragment: &str) -> Result<Merged, MergeError> {
    let legalized = legalize(fragment);
    let cells = fragment_cells(&legalized).map_err(MergeError::Fragment)?;

    let mut document = if base.trim().is_empty() {
        Document::empty()
    } else {
        parse_document(base).map_err(MergeError::Base)?
    };

    let delta = merge_cells(&mut document, cells);
    let xml = document.to_xml();
    Ok(Merged {
        document,
        xml,
        delta,
    })
}
