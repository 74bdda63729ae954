// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural invariant checks and conservative repair.
//!
//! Validation never mutates; repair fixes what it can deterministically
//! and reports what it found. Repair only ever runs on the committed
//! path — speculative previews skip this module entirely.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::model::{is_sentinel, Attr, Cell, CellId, Document, DEFAULT_LAYER_ID, ROOT_CELL_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Source,
    Target,
}

impl EndpointKind {
    fn attr_name(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attr_name())
    }
}

/// One violated structural invariant, named concretely enough to surface
/// to the user when a commit is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    MissingSentinel { cell_id: CellId },
    DuplicateId { cell_id: CellId, occurrences: usize },
    MissingParent { cell_id: CellId },
    DanglingParent { cell_id: CellId, parent: String },
    DanglingEndpoint { cell_id: CellId, endpoint: EndpointKind, target: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSentinel { cell_id } => {
                write!(f, "required sentinel cell {cell_id} is missing")
            }
            Self::DuplicateId { cell_id, occurrences } => {
                write!(f, "id {cell_id} occurs {occurrences} times")
            }
            Self::MissingParent { cell_id } => {
                write!(f, "cell {cell_id} has no parent attribute")
            }
            Self::DanglingParent { cell_id, parent } => {
                write!(f, "cell {cell_id} references missing parent {parent:?}")
            }
            Self::DanglingEndpoint { cell_id, endpoint, target } => {
                write!(f, "edge {cell_id} references missing {endpoint} {target:?}")
            }
        }
    }
}

impl std::error::Error for Issue {}

/// Check invariants in order: sentinel presence, duplicate ids, parent
/// references, edge endpoint references. Well-formedness is established
/// upstream by parsing; an unparsable string never reaches this function.
pub fn validate(document: &Document) -> Vec<Issue> {
    let mut issues = Vec::new();

    for sentinel in [ROOT_CELL_ID, DEFAULT_LAYER_ID] {
        let id = CellId::new(sentinel).expect("sentinel id");
        if !document.contains(&id) {
            issues.push(Issue::MissingSentinel { cell_id: id });
        }
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for cell in document.cells() {
        *counts.entry(cell.id().as_str()).or_insert(0) += 1;
    }
    let mut reported: HashSet<&str> = HashSet::new();
    for cell in document.cells() {
        let id = cell.id().as_str();
        let occurrences = counts[id];
        if occurrences > 1 && reported.insert(id) {
            issues.push(Issue::DuplicateId {
                cell_id: cell.id().clone(),
                occurrences,
            });
        }
    }

    let ids: HashSet<&str> = document
        .cells()
        .iter()
        .map(|cell| cell.id().as_str())
        .collect();

    for cell in document.cells() {
        if is_sentinel(cell.id()) {
            continue;
        }
        match cell.parent_raw() {
            None => issues.push(Issue::MissingParent {
                cell_id: cell.id().clone(),
            }),
            Some(parent) if !ids.contains(parent) => issues.push(Issue::DanglingParent {
                cell_id: cell.id().clone(),
                parent: parent.to_owned(),
            }),
            Some(_) => {}
        }
    }

    for cell in document.cells() {
        for endpoint in [EndpointKind::Source, EndpointKind::Target] {
            if let Some(target) = cell.attr(endpoint.attr_name()) {
                if !ids.contains(target) {
                    issues.push(Issue::DanglingEndpoint {
                        cell_id: cell.id().clone(),
                        endpoint,
                        target: target.to_owned(),
                    });
                }
            }
        }
    }

    issues
}

/// The outcome of a repair attempt. `issues` lists what validation found
/// before any fix; `fixed` is present only when something was repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub valid: bool,
    pub fixed: Option<Document>,
    pub issues: Vec<Issue>,
}

/// Best-effort deterministic repair:
/// duplicate ids keep the last occurrence, orphans are reparented to the
/// default layer, dangling edge endpoints are dropped (the edge itself
/// survives as a floating edge), missing sentinels are reinstated.
pub fn repair(document: &Document) -> RepairReport {
    let issues = validate(document);
    if issues.is_empty() {
        return RepairReport {
            valid: true,
            fixed: None,
            issues,
        };
    }

    let mut fixed = document.clone();

    let needs_root = !fixed.contains(&CellId::new(ROOT_CELL_ID).expect("sentinel id"));
    let needs_layer = !fixed.contains(&CellId::new(DEFAULT_LAYER_ID).expect("sentinel id"));
    if needs_layer {
        let layer = Cell::new(
            "mxCell",
            CellId::new(DEFAULT_LAYER_ID).expect("sentinel id"),
            vec![
                Attr::new("id", DEFAULT_LAYER_ID),
                Attr::new("parent", ROOT_CELL_ID),
            ],
            None,
        );
        fixed.cells_mut().insert(0, layer);
    }
    if needs_root {
        let root = Cell::new(
            "mxCell",
            CellId::new(ROOT_CELL_ID).expect("sentinel id"),
            vec![Attr::new("id", ROOT_CELL_ID)],
            None,
        );
        fixed.cells_mut().insert(0, root);
    }

    // Duplicate ids: keep the last occurrence, at its position.
    let mut remaining: HashMap<String, usize> = HashMap::new();
    for cell in fixed.cells() {
        *remaining.entry(cell.id().as_str().to_owned()).or_insert(0) += 1;
    }
    fixed.cells_mut().retain(|cell| {
        let count = remaining
            .get_mut(cell.id().as_str())
            .expect("id counted above");
        *count -= 1;
        *count == 0
    });

    let ids: HashSet<String> = fixed
        .cells()
        .iter()
        .map(|cell| cell.id().as_str().to_owned())
        .collect();
    let layer = CellId::new(DEFAULT_LAYER_ID).expect("sentinel id");

    for cell in fixed.cells_mut() {
        if !is_sentinel(cell.id()) {
            let orphaned = match cell.parent_raw() {
                None => true,
                Some(parent) => !ids.contains(parent),
            };
            if orphaned {
                cell.set_parent(&layer);
            }
        }
        if cell
            .attr("source")
            .is_some_and(|target| !ids.contains(target))
        {
            cell.clear_source();
        }
        if cell
            .attr("target")
            .is_some_and(|target| !ids.contains(target))
        {
            cell.clear_target();
        }
    }

    let still_broken = validate(&fixed);
    if still_broken.is_empty() {
        RepairReport {
            valid: true,
            fixed: Some(fixed),
            issues,
        }
    } else {
        RepairReport {
            valid: false,
            fixed: None,
            issues,
        }
    }
}

#[cfg(test)]
mod tests;
