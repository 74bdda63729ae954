// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::cell::{Attr, Cell};
use super::document::Document;
use super::ids::CellId;

pub(crate) fn cid(value: &str) -> CellId {
    CellId::new(value).expect("cell id")
}

pub(crate) fn vertex_cell(id: &str, parent: &str, label: &str) -> Cell {
    Cell::new(
        "mxCell",
        cid(id),
        vec![
            Attr::new("id", id),
            Attr::new("value", label),
            Attr::new("style", "rounded=0;whiteSpace=wrap;html=1;"),
            Attr::new("vertex", "1"),
            Attr::new("parent", parent),
        ],
        Some(r#"<mxGeometry x="40" y="40" width="120" height="60" as="geometry"/>"#.to_owned()),
    )
}

pub(crate) fn edge_cell(id: &str, parent: &str, source: &str, target: &str) -> Cell {
    Cell::new(
        "mxCell",
        cid(id),
        vec![
            Attr::new("id", id),
            Attr::new("style", "edgeStyle=orthogonalEdgeStyle;"),
            Attr::new("edge", "1"),
            Attr::new("parent", parent),
            Attr::new("source", source),
            Attr::new("target", target),
        ],
        Some(r#"<mxGeometry relative="1" as="geometry"/>"#.to_owned()),
    )
}

/// Two vertices joined by one edge, on the default layer.
pub(crate) fn small_document() -> Document {
    let mut document = Document::empty();
    document.upsert(vertex_cell("2", "1", "Start"));
    document.upsert(vertex_cell("3", "1", "End"));
    document.upsert(edge_cell("4", "1", "2", "3"));
    document
}
