// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{Attr, Cell, Document};

fn push_escaped_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn push_attrs(attrs: &[Attr], out: &mut String) {
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        push_escaped_attr(&attr.value, out);
        out.push('"');
    }
}

fn push_open(tag: &str, attrs: &[Attr], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    push_attrs(attrs, out);
    out.push('>');
}

fn push_close(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_cell(cell: &Cell, indent: &str, out: &mut String) {
    out.push_str(indent);
    out.push('<');
    out.push_str(cell.tag());
    push_attrs(cell.attrs(), out);
    match cell.inner() {
        Some(inner) => {
            out.push('>');
            out.push_str(inner);
            push_close(cell.tag(), out);
        }
        None => out.push_str("/>"),
    }
    out.push('\n');
}

/// Serialize a document in its canonical form. Wrapper layers that were
/// absent on parse stay absent; cell attribute order and inner markup are
/// written verbatim.
pub fn write_document(document: &Document) -> String {
    let envelope = document.envelope();
    let mut out = String::new();
    let mut depth = 0usize;

    if let Some(file) = &envelope.file {
        push_open("mxfile", file, &mut out);
        out.push('\n');
        depth += 1;
    }
    if let Some(page) = &envelope.page {
        out.push_str(&"  ".repeat(depth));
        push_open("diagram", page, &mut out);
        out.push('\n');
        depth += 1;
    }
    out.push_str(&"  ".repeat(depth));
    push_open("mxGraphModel", &envelope.model, &mut out);
    out.push('\n');
    depth += 1;
    out.push_str(&"  ".repeat(depth));
    push_open("root", &envelope.root, &mut out);
    out.push('\n');

    let cell_indent = "  ".repeat(depth + 1);
    for cell in document.cells() {
        push_cell(cell, &cell_indent, &mut out);
    }

    out.push_str(&"  ".repeat(depth));
    push_close("root", &mut out);
    out.push('\n');
    depth -= 1;
    out.push_str(&"  ".repeat(depth));
    push_close("mxGraphModel", &mut out);
    out.push('\n');
    if envelope.page.is_some() {
        depth -= 1;
        out.push_str(&"  ".repeat(depth));
        push_close("diagram", &mut out);
        out.push('\n');
    }
    if envelope.file.is_some() {
        push_close("mxfile", &mut out);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::write_document;
    use crate::format::mxgraph::parse_document;
    use crate::model::Document;

    #[test]
    fn empty_document_round_trips() {
        let document = Document::empty();
        let xml = write_document(&document);
        let parsed = parse_document(&xml).expect("parse serialized document");
        assert_eq!(parsed.cells(), document.cells());
        assert_eq!(parsed.envelope(), document.envelope());
    }

    #[test]
    fn absent_wrapper_layers_stay_absent() {
        let input = r#"<mxGraphModel dx="1"><root><mxCell id="0"/></root></mxGraphModel>"#;
        let document = parse_document(input).expect("document");
        let xml = write_document(&document);
        assert!(xml.starts_with("<mxGraphModel"));
        assert!(!xml.contains("<mxfile"));
        assert!(!xml.contains("<diagram"));
    }

    #[test]
    fn attr_values_are_escaped_on_write() {
        let input = r#"<mxGraphModel><root><mxCell id="2" value="A &amp; B" parent="1"/></root></mxGraphModel>"#;
        let document = parse_document(input).expect("document");
        let xml = write_document(&document);
        assert!(xml.contains(r#"value="A &amp; B""#));
    }

    #[test]
    fn inner_markup_is_written_verbatim() {
        let input = concat!(
            r#"<mxGraphModel><root>"#,
            r#"<mxCell id="2" vertex="1" parent="1"><mxGeometry x="1" as="geometry"/></mxCell>"#,
            r#"</root></mxGraphModel>"#,
        );
        let document = parse_document(input).expect("document");
        let xml = write_document(&document);
        assert!(xml.contains(r#"<mxGeometry x="1" as="geometry"/></mxCell>"#));
    }
}
