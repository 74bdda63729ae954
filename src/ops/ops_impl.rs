// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Single-operation implementation used by `apply_batch`. Keeps `ops::mod`
/// focused on the public op types and orchestration.
fn apply_cell_op(
    document: &mut Document,
    op: &CellOp,
    delta: &mut DeltaBuilder,
) -> Result<(), OpErrorReason> {
    match op {
        CellOp::Add { cell_id, new_xml } | CellOp::Update { cell_id, new_xml } => {
            upsert_from_xml(document, cell_id, new_xml, delta)
        }
        CellOp::Delete { cell_id } => {
            if crate::model::is_sentinel(cell_id) {
                return Err(OpErrorReason::SentinelDelete);
            }
            if document.remove(cell_id).is_none() {
                return Err(OpErrorReason::NotFound);
            }
            delta.record_removed(cell_id.clone());
            Ok(())
        }
    }
}

fn upsert_from_xml(
    document: &mut Document,
    cell_id: &CellId,
    new_xml: &str,
    delta: &mut DeltaBuilder,
) -> Result<(), OpErrorReason> {
    let legalized = crate::format::mxgraph::legalize(new_xml);
    let mut cell = crate::format::mxgraph::parse_single_cell(&legalized)
        .map_err(OpErrorReason::InvalidNewXml)?;

    // The op envelope is authoritative; a disagreeing embedded id is
    // rewritten so later ops in the batch stay addressable.
    if cell.id() != cell_id {
        cell.set_id(cell_id.clone());
    }

    if document.upsert(cell) {
        delta.record_updated(cell_id.clone());
    } else {
        delta.record_added(cell_id.clone());
    }
    Ok(())
}
