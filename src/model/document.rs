// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::cell::{Attr, Cell};
use super::ids::{CellId, DEFAULT_LAYER_ID, ROOT_CELL_ID};

/// Attribute lists of the fixed wrapper chain
/// `mxfile → diagram → mxGraphModel → root`.
///
/// The outer two layers are optional on the wire (a bare `<mxGraphModel>`
/// is accepted); `None` means the layer was absent and stays absent on
/// serialization, so the base document's wrapper survives merges verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub file: Option<Vec<Attr>>,
    pub page: Option<Vec<Attr>>,
    pub model: Vec<Attr>,
    pub root: Vec<Attr>,
}

impl Envelope {
    /// The wrapper synthesized for a session that has no document yet.
    pub fn minimal() -> Self {
        Self {
            file: Some(Vec::new()),
            page: Some(Vec::new()),
            model: Vec::new(),
            root: Vec::new(),
        }
    }
}

/// The full diagram graph: wrapper envelope plus the ordered cell list.
///
/// Cells keep their document order; merges replace in place or append, so
/// successive patches produce minimal visual diffs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    envelope: Envelope,
    cells: Vec<Cell>,
    rev: u64,
}

impl Document {
    pub fn new(envelope: Envelope, cells: Vec<Cell>) -> Self {
        Self {
            envelope,
            cells,
            rev: 0,
        }
    }

    /// The two-sentinel empty document: invisible root `"0"` and default
    /// layer `"1"`.
    pub fn empty() -> Self {
        let root = CellId::new(ROOT_CELL_ID).expect("sentinel id");
        let layer = CellId::new(DEFAULT_LAYER_ID).expect("sentinel id");

        let root_cell = Cell::new(
            "mxCell",
            root.clone(),
            vec![Attr::new("id", ROOT_CELL_ID)],
            None,
        );
        let layer_cell = Cell::new(
            "mxCell",
            layer,
            vec![Attr::new("id", DEFAULT_LAYER_ID), Attr::new("parent", ROOT_CELL_ID)],
            None,
        );

        Self::new(Envelope::minimal(), vec![root_cell, layer_cell])
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn into_parts(self) -> (Envelope, Vec<Cell>) {
        (self.envelope, self.cells)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &CellId) -> Option<usize> {
        self.cells.iter().position(|cell| cell.id() == id)
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.position(id).map(|index| &self.cells[index])
    }

    /// Insert keyed by id: an existing cell is replaced at its position,
    /// an unseen one is appended. Returns true when this was a replace.
    pub fn upsert(&mut self, cell: Cell) -> bool {
        match self.position(cell.id()) {
            Some(index) => {
                self.cells[index] = cell;
                true
            }
            None => {
                self.cells.push(cell);
                false
            }
        }
    }

    pub fn remove(&mut self, id: &CellId) -> Option<Cell> {
        let index = self.position(id)?;
        Some(self.cells.remove(index))
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    pub fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }

    pub fn to_xml(&self) -> String {
        crate::format::mxgraph::write_document(self)
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::model::{Attr, Cell, CellId};

    fn cid(value: &str) -> CellId {
        CellId::new(value).expect("cell id")
    }

    fn cell(id: &str) -> Cell {
        Cell::new(
            "mxCell",
            cid(id),
            vec![Attr::new("id", id), Attr::new("parent", "1")],
            None,
        )
    }

    #[test]
    fn empty_document_contains_exactly_the_sentinels() {
        let document = Document::empty();
        assert_eq!(document.len(), 2);
        assert!(document.contains(&cid("0")));
        assert!(document.contains(&cid("1")));
        assert_eq!(document.rev(), 0);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut document = Document::empty();
        document.upsert(cell("2"));
        document.upsert(cell("3"));

        let replaced = document.upsert(cell("2"));

        assert!(replaced);
        assert_eq!(document.position(&cid("2")), Some(2));
        assert_eq!(document.position(&cid("3")), Some(3));
    }

    #[test]
    fn remove_returns_the_cell() {
        let mut document = Document::empty();
        document.upsert(cell("2"));

        let removed = document.remove(&cid("2")).expect("removed cell");
        assert_eq!(removed.id(), &cid("2"));
        assert!(document.remove(&cid("2")).is_none());
    }
}
