// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WireMarker {
    Streaming,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WireOperation {
    Add,
    Update,
    Delete,
}

impl WireOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One operation as the producer ships it. Loosely shaped on the wire;
/// [`crate::protocol::decode_ops`] turns it into the closed core union
/// before anything reaches the applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WireOp {
    pub operation: WireOperation,
    pub cell_id: String,
    /// Required for `add`/`update`; ignored for `delete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_xml: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WirePayload {
    /// A raw (possibly partial) document or cell-list string.
    Document { xml: String },
    /// The operations decoded so far from a structured batch.
    Ops { ops: Vec<WireOp> },
}

/// One delivery of a unit of work from the agent/transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WireIncrement {
    pub correlation_id: String,
    pub marker: WireMarker,
    pub payload: WirePayload,
}

/// Failure signals the transport may deliver instead of increments. The
/// engine never generates these; it only routes them to the error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireFailure {
    Timeout { correlation_id: String },
}
