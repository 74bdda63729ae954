// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared bench fixtures: synthetic documents and fragments of stable
//! shape so case results stay comparable across refactors.

// Not every bench target uses every fixture.
#![allow(dead_code)]

use std::fmt::Write;

/// A cell-list fragment: `vertices` boxes plus a chain of edges between
/// consecutive vertices.
pub fn fragment_xml(vertices: usize) -> String {
    let mut out = String::new();
    for index in 0..vertices {
        let x = (index % 16) * 160;
        let y = (index / 16) * 100;
        write!(
            out,
            r#"<mxCell id="v{index}" value="Node {index}" style="rounded=0;whiteSpace=wrap;html=1;" vertex="1" parent="1"><mxGeometry x="{x}" y="{y}" width="120" height="60" as="geometry"/></mxCell>"#,
        )
        .expect("write fragment cell");
    }
    for index in 1..vertices {
        let from = index - 1;
        write!(
            out,
            r#"<mxCell id="e{index}" style="edgeStyle=orthogonalEdgeStyle;" edge="1" parent="1" source="v{from}" target="v{index}"><mxGeometry relative="1" as="geometry"/></mxCell>"#,
        )
        .expect("write fragment edge");
    }
    out
}

/// A fully wrapped document containing [`fragment_xml`]'s cells.
pub fn document_xml(vertices: usize) -> String {
    format!(
        concat!(
            r#"<mxfile host="bench"><diagram id="page-1" name="Page-1">"#,
            r#"<mxGraphModel dx="1024" dy="768" grid="1"><root>"#,
            r#"<mxCell id="0"/><mxCell id="1" parent="0"/>"#,
            "{}",
            r#"</root></mxGraphModel></diagram></mxfile>"#,
        ),
        fragment_xml(vertices)
    )
}
