// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus — streaming patch & validation engine for mxGraph diagram documents.
//!
//! An AI agent emits diagram edits incrementally: raw (and often truncated or
//! malformed) mxGraph XML, or structured add/update/delete operation batches.
//! Proteus turns that stream into safe previews and validated commits without
//! ever corrupting the committed document.

pub mod format;
pub mod merge;
pub mod model;
pub mod ops;
pub mod protocol;
pub mod store;
pub mod stream;
pub mod validate;

#[cfg(test)]
mod tests {
    #[test]
    fn sanity() {
        assert_eq!(2 + 2, 4);
    }
}
