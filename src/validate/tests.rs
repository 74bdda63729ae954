// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::rstest;

use crate::model::fixtures::{edge_cell, small_document, vertex_cell};
use crate::model::{CellId, Document};

use super::{repair, validate, EndpointKind, Issue};

fn cid(value: &str) -> CellId {
    CellId::new(value).expect("cell id")
}

#[test]
fn clean_document_validates_with_no_issues() {
    let document = small_document();
    assert!(validate(&document).is_empty());

    let report = repair(&document);
    assert!(report.valid);
    assert!(report.fixed.is_none());
    assert!(report.issues.is_empty());
}

#[test]
fn duplicate_ids_are_reported_once_per_id() {
    let mut document = small_document();
    document.cells_mut().push(vertex_cell("2", "1", "Copy"));

    let issues = validate(&document);
    assert_eq!(
        issues,
        vec![Issue::DuplicateId {
            cell_id: cid("2"),
            occurrences: 2
        }]
    );
}

#[test]
fn repair_keeps_the_last_duplicate_at_its_position() {
    let mut document = small_document();
    document.cells_mut().push(vertex_cell("2", "1", "Winner"));

    let report = repair(&document);
    assert!(report.valid);
    let fixed = report.fixed.expect("fixed document");

    let survivors: Vec<&str> = fixed.cells().iter().map(|c| c.id().as_str()).collect();
    assert_eq!(survivors, vec!["0", "1", "3", "4", "2"]);
    assert_eq!(
        fixed.cell(&cid("2")).expect("cell 2").attr("value"),
        Some("Winner")
    );
}

#[test]
fn dangling_parent_is_reported_and_reparented_to_the_default_layer() {
    let mut document = small_document();
    document.cells_mut().push(vertex_cell("9", "ghost", "Orphan"));

    let issues = validate(&document);
    assert_eq!(
        issues,
        vec![Issue::DanglingParent {
            cell_id: cid("9"),
            parent: "ghost".to_owned()
        }]
    );

    let report = repair(&document);
    assert!(report.valid);
    let fixed = report.fixed.expect("fixed document");
    assert_eq!(
        fixed.cell(&cid("9")).expect("cell 9").parent(),
        Some(cid("1"))
    );
}

#[test]
fn missing_parent_attribute_counts_as_orphaned() {
    let mut document = Document::empty();
    document.cells_mut().push(crate::model::Cell::new(
        "mxCell",
        cid("5"),
        vec![crate::model::Attr::new("id", "5")],
        None,
    ));

    let issues = validate(&document);
    assert_eq!(issues, vec![Issue::MissingParent { cell_id: cid("5") }]);

    let report = repair(&document);
    assert!(report.valid);
    let fixed = report.fixed.expect("fixed document");
    assert_eq!(
        fixed.cell(&cid("5")).expect("cell 5").parent(),
        Some(cid("1"))
    );
}

#[test]
fn dangling_endpoint_is_dropped_but_the_edge_survives() {
    let mut document = small_document();
    document.cells_mut().push(edge_cell("9", "1", "2", "ghost"));

    let issues = validate(&document);
    assert_eq!(
        issues,
        vec![Issue::DanglingEndpoint {
            cell_id: cid("9"),
            endpoint: EndpointKind::Target,
            target: "ghost".to_owned()
        }]
    );

    let report = repair(&document);
    assert!(report.valid);
    let fixed = report.fixed.expect("fixed document");
    let edge = fixed.cell(&cid("9")).expect("edge 9");
    assert_eq!(edge.source(), Some(cid("2")));
    assert_eq!(edge.target(), None);
    assert!(edge.is_edge());
}

#[test]
fn missing_sentinels_are_reinstated() {
    let mut document = Document::empty();
    document.remove(&cid("0"));
    document.remove(&cid("1"));
    document.cells_mut().push(vertex_cell("2", "1", "Lonely"));

    let report = repair(&document);
    assert!(report.valid);
    let fixed = report.fixed.expect("fixed document");
    let ids: Vec<&str> = fixed.cells().iter().map(|c| c.id().as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
}

// Repair totality: a document whose only defects are dangling parent
// references always repairs to valid.
#[rstest]
#[case::single_orphan(vec![("2", "ghost")])]
#[case::several_orphans(vec![("2", "ghost"), ("3", "nowhere"), ("4", "gone")])]
#[case::orphan_chain(vec![("2", "3"), ("3", "ghost")])]
fn dangling_parent_only_documents_always_repair(#[case] cells: Vec<(&str, &str)>) {
    let mut document = Document::empty();
    for (id, parent) in &cells {
        document.cells_mut().push(vertex_cell(id, parent, "N"));
    }

    let report = repair(&document);
    assert!(report.valid, "issues: {:?}", report.issues);
}

#[test]
fn issues_render_actionable_messages() {
    let issue = Issue::DanglingEndpoint {
        cell_id: cid("9"),
        endpoint: EndpointKind::Target,
        target: "ghost".to_owned(),
    };
    assert_eq!(
        issue.to_string(),
        r#"edge 9 references missing target "ghost""#
    );
}
