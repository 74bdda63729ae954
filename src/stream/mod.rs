// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The streaming coordinator.
//!
//! One coordinator instance exists per session and owns all mutable
//! streaming state: the committed document, the pending preview payload,
//! and the history of committed correlation ids. Speculative previews run
//! the cheap extract → legalize → merge path, coalesced to at most one
//! render per interval with latest-wins semantics. Finalization runs the
//! full pipeline synchronously and either commits (exactly once per
//! correlation id) or rejects, leaving the committed document untouched.

mod driver;
mod gate;

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

use crate::format::mxgraph::{legalize, parse_cells, renderable_fragment, CellParseError};
use crate::merge::{fragment_cells, merge_cells};
use crate::model::{CorrelationId, Document};
use crate::ops::{apply_batch, CellOp, OpError};
use crate::validate::{repair, Issue};

pub use driver::drive;
use gate::{GateDecision, PreviewGate};

pub const DEFAULT_PREVIEW_INTERVAL: Duration = Duration::from_millis(150);

/// Lifecycle of the current unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Receiving,
    Finalizing,
    Committed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMarker {
    Streaming,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrementPayload {
    /// A (possibly partial) document or cell-list string.
    Markup(String),
    /// The operations decoded so far from a structured batch.
    Ops(Vec<CellOp>),
}

/// One delivery from the producer, scoped to a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    pub correlation_id: CorrelationId,
    pub marker: DeliveryMarker,
    pub payload: IncrementPayload,
}

/// Why a unit of work was rejected at the validation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Fragment(CellParseError),
    Invariant(Issue),
    /// The producing collaborator reported it gave up on this unit.
    Timeout,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fragment(err) => write!(f, "payload rejected: {err}"),
            Self::Invariant(issue) => write!(f, "invariant violated: {issue}"),
            Self::Timeout => f.write_str("producer timed out"),
        }
    }
}

impl std::error::Error for RejectReason {}

/// The rendering collaborator. `on_preview` fires at most once per
/// coalescing interval; `on_committed` exactly once per successful unit
/// of work; `on_rejected` when finalization fails and cannot be repaired.
pub trait StreamSink {
    fn on_preview(&mut self, document: &Document);
    fn on_committed(&mut self, document: &Document);
    fn on_rejected(&mut self, correlation_id: &CorrelationId, reasons: &[RejectReason]);
}

/// What a call to [`StreamCoordinator::handle_increment`] did, so the
/// driver can maintain its single pending timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// Duplicate correlation id (already committed) — dropped.
    Ignored,
    PreviewRendered,
    /// Coalesced: render the pending payload at `deadline`.
    PreviewDeferred { deadline: Instant },
    Committed {
        rev: u64,
        op_errors: Vec<OpError>,
        repaired: Vec<Issue>,
    },
    Rejected { reasons: Vec<RejectReason> },
}

pub struct StreamCoordinator<S: StreamSink> {
    sink: S,
    document: Document,
    gate: PreviewGate,
    state: StreamState,
    active: Option<CorrelationId>,
    pending: Option<IncrementPayload>,
    committed_units: BTreeSet<CorrelationId>,
}

impl<S: StreamSink> StreamCoordinator<S> {
    pub fn new(sink: S, document: Document) -> Self {
        Self::with_preview_interval(sink, document, DEFAULT_PREVIEW_INTERVAL)
    }

    pub fn with_preview_interval(sink: S, document: Document, interval: Duration) -> Self {
        Self {
            sink,
            document,
            gate: PreviewGate::new(interval),
            state: StreamState::Idle,
            active: None,
            pending: None,
            committed_units: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The unit of work currently receiving increments, if any.
    pub fn active_unit(&self) -> Option<&CorrelationId> {
        self.active.as_ref()
    }

    /// Snapshot accessor for the persistence collaborator; independent of
    /// the commit path.
    pub fn current_document(&self) -> &Document {
        &self.document
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Session restore: swap in a fully formed document. In-flight unit
    /// state is discarded; the committed-unit history survives so a
    /// re-delivered unit still commits at most once.
    pub fn replace_document(&mut self, document: Document) {
        self.document = document;
        self.state = StreamState::Idle;
        self.active = None;
        self.pending = None;
        self.gate.reset();
    }

    pub fn handle_increment(&mut self, increment: Increment, now: Instant) -> Handled {
        let Increment {
            correlation_id,
            marker,
            payload,
        } = increment;

        if self.committed_units.contains(&correlation_id) {
            tracing::debug!(%correlation_id, "ignoring increment for committed unit");
            return Handled::Ignored;
        }

        match marker {
            DeliveryMarker::Streaming => {
                self.state = StreamState::Receiving;
                self.active = Some(correlation_id);
                match self.gate.poll(now) {
                    GateDecision::RenderNow => {
                        self.pending = None;
                        self.render_preview(&payload);
                        Handled::PreviewRendered
                    }
                    GateDecision::Defer(deadline) => {
                        // Latest wins; a superseded increment is dropped,
                        // never queued.
                        self.pending = Some(payload);
                        Handled::PreviewDeferred { deadline }
                    }
                }
            }
            DeliveryMarker::Complete => {
                // Cancel the coalesced preview synchronously; a stale
                // preview must not clobber the commit.
                self.pending = None;
                self.state = StreamState::Finalizing;
                self.finalize(correlation_id, payload)
            }
        }
    }

    /// The driver's timer fired: render the latest pending payload, if
    /// any survived until the deadline.
    pub fn flush_preview(&mut self, now: Instant) {
        if let Some(payload) = self.pending.take() {
            self.gate.mark(now);
            self.render_preview(&payload);
        }
    }

    /// External producer failure (e.g. transport timeout). The committed
    /// document stands; the unit moves to the error state.
    pub fn handle_timeout(&mut self, correlation_id: &CorrelationId) {
        if self.committed_units.contains(correlation_id) {
            return;
        }
        self.pending = None;
        self.active = None;
        self.state = StreamState::Error;
        self.gate.reset();
        tracing::warn!(%correlation_id, "unit of work abandoned by producer");
        self.sink
            .on_rejected(correlation_id, &[RejectReason::Timeout]);
    }

    fn render_preview(&mut self, payload: &IncrementPayload) {
        match self.preview_document(payload) {
            Some(preview) => self.sink.on_preview(&preview),
            None => tracing::debug!("skipping preview tick: no renderable fragment"),
        }
    }

    /// Best-effort speculative document: extract → legalize → merge for
    /// markup, scratch batch application for ops. No validation.
    fn preview_document(&self, payload: &IncrementPayload) -> Option<Document> {
        match payload {
            IncrementPayload::Markup(text) => {
                let window = renderable_fragment(text);
                if window.is_empty() {
                    return None;
                }
                let legalized = legalize(window);
                let cells = parse_cells(&legalized).ok()?;
                let mut preview = self.document.clone();
                merge_cells(&mut preview, cells);
                Some(preview)
            }
            IncrementPayload::Ops(ops) => {
                let mut preview = self.document.clone();
                let _ = apply_batch(&mut preview, ops);
                Some(preview)
            }
        }
    }

    fn finalize(&mut self, correlation_id: CorrelationId, payload: IncrementPayload) -> Handled {
        match self.apply_complete(payload) {
            Ok((mut document, op_errors, repaired)) => {
                document.set_rev(self.document.rev().saturating_add(1));
                let rev = document.rev();
                self.document = document;
                self.state = StreamState::Committed;
                self.active = None;
                self.gate.reset();
                self.committed_units.insert(correlation_id);
                self.sink.on_committed(&self.document);
                Handled::Committed {
                    rev,
                    op_errors,
                    repaired,
                }
            }
            Err(reasons) => {
                self.state = StreamState::Error;
                self.active = None;
                self.gate.reset();
                tracing::warn!(%correlation_id, reasons = reasons.len(), "unit rejected");
                self.sink.on_rejected(&correlation_id, &reasons);
                Handled::Rejected { reasons }
            }
        }
    }

    /// The full committed pipeline: legalize → merge/apply → repair.
    #[allow(clippy::type_complexity)]
    fn apply_complete(
        &self,
        payload: IncrementPayload,
    ) -> Result<(Document, Vec<OpError>, Vec<Issue>), Vec<RejectReason>> {
        let (candidate, op_errors) = match payload {
            IncrementPayload::Markup(text) => {
                let legalized = legalize(&text);
                let cells = fragment_cells(&legalized)
                    .map_err(|err| vec![RejectReason::Fragment(err)])?;
                let mut candidate = self.document.clone();
                merge_cells(&mut candidate, cells);
                (candidate, Vec::new())
            }
            IncrementPayload::Ops(ops) => {
                let mut candidate = self.document.clone();
                let report = apply_batch(&mut candidate, &ops);
                (candidate, report.errors)
            }
        };

        let report = repair(&candidate);
        if report.valid {
            let repaired = report.issues;
            let document = report.fixed.unwrap_or(candidate);
            Ok((document, op_errors, repaired))
        } else {
            Err(report
                .issues
                .into_iter()
                .map(RejectReason::Invariant)
                .collect())
        }
    }
}
