// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Producer-facing wire types and boundary decoding.
//!
//! Everything arriving from the transport is loosely shaped; this module
//! is the single place where it is checked and converted into the closed
//! core types. Nothing duck-typed crosses into the applier or the
//! coordinator.

pub mod types;

use std::fmt;

use crate::model::{CellId, CorrelationId, IdError};
use crate::ops::CellOp;
use crate::stream::{DeliveryMarker, Increment, IncrementPayload};

pub use types::{WireFailure, WireIncrement, WireMarker, WireOp, WireOperation, WirePayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    InvalidCorrelationId { value: String, reason: IdError },
    InvalidCellId { value: String, reason: IdError },
    MissingNewXml { cell_id: String, operation: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCorrelationId { value, reason } => {
                write!(f, "invalid correlation id {value:?}: {reason}")
            }
            Self::InvalidCellId { value, reason } => {
                write!(f, "invalid cell id {value:?}: {reason}")
            }
            Self::MissingNewXml { cell_id, operation } => {
                write!(f, "{operation} operation on cell {cell_id:?} has no new_xml")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Convert a wire operation list into the closed op union. `add`/`update`
/// without `new_xml` is a decode error; a redundant `new_xml` on `delete`
/// is tolerated and dropped (producers overshare mid-stream).
pub fn decode_ops(ops: &[WireOp]) -> Result<Vec<CellOp>, DecodeError> {
    ops.iter()
        .map(|op| {
            let cell_id =
                CellId::new(&op.cell_id).map_err(|reason| DecodeError::InvalidCellId {
                    value: op.cell_id.clone(),
                    reason,
                })?;
            match op.operation {
                WireOperation::Delete => Ok(CellOp::Delete { cell_id }),
                WireOperation::Add | WireOperation::Update => {
                    let new_xml =
                        op.new_xml
                            .clone()
                            .ok_or_else(|| DecodeError::MissingNewXml {
                                cell_id: op.cell_id.clone(),
                                operation: op.operation.as_str(),
                            })?;
                    Ok(match op.operation {
                        WireOperation::Add => CellOp::Add { cell_id, new_xml },
                        _ => CellOp::Update { cell_id, new_xml },
                    })
                }
            }
        })
        .collect()
}

pub fn decode_increment(increment: &WireIncrement) -> Result<Increment, DecodeError> {
    let correlation_id = CorrelationId::new(&increment.correlation_id).map_err(|reason| {
        DecodeError::InvalidCorrelationId {
            value: increment.correlation_id.clone(),
            reason,
        }
    })?;
    let marker = match increment.marker {
        WireMarker::Streaming => DeliveryMarker::Streaming,
        WireMarker::Complete => DeliveryMarker::Complete,
    };
    let payload = match &increment.payload {
        WirePayload::Document { xml } => IncrementPayload::Markup(xml.clone()),
        WirePayload::Ops { ops } => IncrementPayload::Ops(decode_ops(ops)?),
    };
    Ok(Increment {
        correlation_id,
        marker,
        payload,
    })
}

pub fn decode_failure(failure: &WireFailure) -> Result<CorrelationId, DecodeError> {
    match failure {
        WireFailure::Timeout { correlation_id } => CorrelationId::new(correlation_id)
            .map_err(|reason| DecodeError::InvalidCorrelationId {
                value: correlation_id.clone(),
                reason,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_increment, decode_ops, DecodeError, WireIncrement, WireMarker, WireOp,
        WireOperation, WirePayload,
    };
    use crate::model::IdError;
    use crate::ops::CellOp;
    use crate::stream::{DeliveryMarker, IncrementPayload};

    #[test]
    fn increments_deserialize_from_producer_json() {
        let json = r#"{
            "correlation_id": "u1",
            "marker": "streaming",
            "payload": { "type": "document", "xml": "<mxCell id=\"2\" parent=\"1\"/>" }
        }"#;
        let wire: WireIncrement = serde_json::from_str(json).expect("wire increment");
        assert_eq!(wire.marker, WireMarker::Streaming);

        let increment = decode_increment(&wire).expect("decoded");
        assert_eq!(increment.correlation_id.as_str(), "u1");
        assert_eq!(increment.marker, DeliveryMarker::Streaming);
        assert!(matches!(increment.payload, IncrementPayload::Markup(_)));
    }

    #[test]
    fn ops_batches_decode_into_the_closed_union() {
        let json = r#"{
            "correlation_id": "u2",
            "marker": "complete",
            "payload": { "type": "ops", "ops": [
                { "operation": "add", "cell_id": "2", "new_xml": "<mxCell id=\"2\" parent=\"1\"/>" },
                { "operation": "delete", "cell_id": "3" }
            ] }
        }"#;
        let wire: WireIncrement = serde_json::from_str(json).expect("wire increment");
        let increment = decode_increment(&wire).expect("decoded");

        let IncrementPayload::Ops(ops) = increment.payload else {
            panic!("expected ops payload");
        };
        assert!(matches!(ops[0], CellOp::Add { .. }));
        assert!(matches!(ops[1], CellOp::Delete { .. }));
    }

    #[test]
    fn add_without_new_xml_is_a_decode_error() {
        let ops = [WireOp {
            operation: WireOperation::Add,
            cell_id: "2".to_owned(),
            new_xml: None,
        }];
        assert_eq!(
            decode_ops(&ops),
            Err(DecodeError::MissingNewXml {
                cell_id: "2".to_owned(),
                operation: "add"
            })
        );
    }

    #[test]
    fn delete_with_redundant_new_xml_is_tolerated() {
        let ops = [WireOp {
            operation: WireOperation::Delete,
            cell_id: "2".to_owned(),
            new_xml: Some("<mxCell id=\"2\"/>".to_owned()),
        }];
        let decoded = decode_ops(&ops).expect("decoded");
        assert_eq!(
            decoded,
            vec![CellOp::Delete {
                cell_id: crate::model::CellId::new("2").expect("cell id")
            }]
        );
    }

    #[test]
    fn empty_cell_id_is_a_decode_error() {
        let ops = [WireOp {
            operation: WireOperation::Delete,
            cell_id: String::new(),
            new_xml: None,
        }];
        assert_eq!(
            decode_ops(&ops),
            Err(DecodeError::InvalidCellId {
                value: String::new(),
                reason: IdError::Empty
            })
        );
    }

    #[test]
    fn wire_payloads_round_trip_through_serde() {
        let payload = WirePayload::Ops {
            ops: vec![WireOp {
                operation: WireOperation::Update,
                cell_id: "5".to_owned(),
                new_xml: Some("<mxCell id=\"5\" parent=\"1\"/>".to_owned()),
            }],
        };
        let json = serde_json::to_string(&payload).expect("serialize");
        let back: WirePayload = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, payload);
    }
}
