// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use super::ids::CellId;

/// A single attribute as it appeared in the markup, order-preserving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: SmolStr,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl AsRef<str>, value: impl Into<String>) -> Self {
        Self {
            name: SmolStr::new(name.as_ref()),
            value: value.into(),
        }
    }
}

/// One diagram cell: a direct child element of `<root>`.
///
/// The engine treats everything but `id`, `parent`, `source`, and `target`
/// as opaque payload. Tag name, attribute order, and inner child markup
/// (geometry etc.) round-trip verbatim so merges never perturb content the
/// engine does not understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    tag: SmolStr,
    id: CellId,
    attrs: Vec<Attr>,
    inner: Option<String>,
}

impl Cell {
    pub fn new(tag: impl AsRef<str>, id: CellId, attrs: Vec<Attr>, inner: Option<String>) -> Self {
        Self {
            tag: SmolStr::new(tag.as_ref()),
            id,
            attrs,
            inner,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> &CellId {
        &self.id
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn inner(&self) -> Option<&str> {
        self.inner.as_deref()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    fn attr_id(&self, name: &str) -> Option<CellId> {
        let value = self.attr(name)?;
        CellId::new(value).ok()
    }

    pub fn parent(&self) -> Option<CellId> {
        self.attr_id("parent")
    }

    /// Raw `parent` attribute value, present even when it is not a valid id.
    pub fn parent_raw(&self) -> Option<&str> {
        self.attr("parent")
    }

    pub fn source(&self) -> Option<CellId> {
        self.attr_id("source")
    }

    pub fn target(&self) -> Option<CellId> {
        self.attr_id("target")
    }

    pub fn is_edge(&self) -> bool {
        self.attr("edge") == Some("1") || self.attr("source").is_some() || self.attr("target").is_some()
    }

    fn set_attr(&mut self, name: &str, value: String) {
        if let Some(attr) = self.attrs.iter_mut().find(|attr| attr.name == name) {
            attr.value = value;
        } else {
            self.attrs.push(Attr::new(name, value));
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|attr| attr.name != name);
    }

    pub fn set_id(&mut self, id: CellId) {
        self.set_attr("id", id.as_str().to_owned());
        self.id = id;
    }

    pub fn set_parent(&mut self, parent: &CellId) {
        self.set_attr("parent", parent.as_str().to_owned());
    }

    pub fn clear_source(&mut self) {
        self.remove_attr("source");
    }

    pub fn clear_target(&mut self) {
        self.remove_attr("target");
    }
}
