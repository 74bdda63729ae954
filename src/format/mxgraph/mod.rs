// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The mxGraph XML dialect: streaming extraction, legalization, parsing,
//! and serialization.

pub mod extract;
pub mod legalize;
pub mod parse;
mod write;

pub use extract::{complete_cell_prefix, renderable_fragment};
pub use legalize::legalize;
pub use parse::{
    parse_cells, parse_document, parse_single_cell, CellParseError, DocumentParseError,
};
pub use write::write_document;
