// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use crate::model::{Attr, Cell, CellId, Document, Envelope, IdError};

use super::extract::{scan_elements, ElementSpan, ScanStop};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellParseError {
    Empty,
    Incomplete,
    Malformed,
    TextOutsideElements,
    MalformedAttribute { near: String },
    MissingId { tag: String },
    InvalidId { value: String, reason: IdError },
    MultipleCells { count: usize },
}

impl fmt::Display for CellParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("no complete element found"),
            Self::Incomplete => f.write_str("trailing element is incomplete"),
            Self::Malformed => f.write_str("mismatched or stray close tag"),
            Self::TextOutsideElements => f.write_str("character data between elements"),
            Self::MalformedAttribute { near } => {
                write!(f, "malformed attribute syntax near {near:?}")
            }
            Self::MissingId { tag } => write!(f, "element <{tag}> has no id attribute"),
            Self::InvalidId { value, reason } => write!(f, "invalid id {value:?}: {reason}"),
            Self::MultipleCells { count } => {
                write!(f, "expected exactly one element, found {count}")
            }
        }
    }
}

impl std::error::Error for CellParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentParseError {
    Empty,
    UnexpectedTag { found: String, expected: &'static str },
    Truncated { expected: &'static str },
    UnclosedWrapper { tag: &'static str },
    TrailingContent,
    Cell(CellParseError),
}

impl fmt::Display for DocumentParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("document is empty"),
            Self::UnexpectedTag { found, expected } => {
                write!(f, "unexpected tag <{found}> (expected {expected})")
            }
            Self::Truncated { expected } => write!(f, "document ends before {expected}"),
            Self::UnclosedWrapper { tag } => write!(f, "wrapper <{tag}> is never closed"),
            Self::TrailingContent => f.write_str("content after the document wrapper"),
            Self::Cell(err) => write!(f, "cell list: {err}"),
        }
    }
}

impl std::error::Error for DocumentParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cell(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CellParseError> for DocumentParseError {
    fn from(err: CellParseError) -> Self {
        Self::Cell(err)
    }
}

/// Decode entity references in attribute values. Unknown references are
/// copied through untouched; the legalizer upstream guarantees bare `&`
/// never survives to this point.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let body = &tail[1..semi];
        let decoded = match body {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| body.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':')
}

/// Parse `name="value"` pairs from the inside of an open tag (everything
/// between the tag name and the closing `>`, minus any self-close slash).
fn parse_attrs(mut rest: &str) -> Result<Vec<Attr>, CellParseError> {
    let mut attrs = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() || rest == "/" {
            return Ok(attrs);
        }
        if !rest.chars().next().is_some_and(is_name_start) {
            return Err(CellParseError::MalformedAttribute {
                near: rest.chars().take(16).collect(),
            });
        }
        let name_len = rest
            .char_indices()
            .find(|(_, ch)| !is_name_char(*ch))
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        rest = rest[name_len..].trim_start();
        let Some(after_eq) = rest.strip_prefix('=') else {
            return Err(CellParseError::MalformedAttribute {
                near: name.chars().take(16).collect(),
            });
        };
        rest = after_eq.trim_start();
        let mut chars = rest.chars();
        let quote = match chars.next() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                return Err(CellParseError::MalformedAttribute {
                    near: name.chars().take(16).collect(),
                })
            }
        };
        let value_region = &rest[1..];
        let Some(close) = value_region.find(quote) else {
            return Err(CellParseError::MalformedAttribute {
                near: name.chars().take(16).collect(),
            });
        };
        attrs.push(Attr::new(name, unescape(&value_region[..close])));
        rest = &value_region[close + 1..];
    }
}

fn build_cell(input: &str, span: &ElementSpan) -> Result<Cell, CellParseError> {
    let tag = &input[span.tag_start..span.tag_end];
    let open_gt = span.open_end - 1;
    let attr_slice = &input[span.tag_end..open_gt];
    let attrs = parse_attrs(attr_slice)?;

    let raw_id = attrs
        .iter()
        .find(|attr| attr.name == "id")
        .map(|attr| attr.value.as_str())
        .ok_or_else(|| CellParseError::MissingId {
            tag: tag.to_owned(),
        })?;
    let id = CellId::new(raw_id).map_err(|reason| CellParseError::InvalidId {
        value: raw_id.to_owned(),
        reason,
    })?;

    let inner = if span.self_closing {
        None
    } else {
        Some(input[span.open_end..span.close_start].to_owned())
    };

    Ok(Cell::new(tag, id, attrs, inner))
}

/// Parse a legalized fragment as a complete cell list. The whole input
/// must be consumed: trailing partial elements, stray closes, and
/// character data between elements are errors (callers reject the merge
/// and keep their base document).
pub fn parse_cells(input: &str) -> Result<Vec<Cell>, CellParseError> {
    let scan = scan_elements(input);
    match scan.stop {
        ScanStop::End { partial: false } => {}
        ScanStop::End { partial: true } => return Err(CellParseError::Incomplete),
        ScanStop::StrayClose { .. } | ScanStop::Malformed => return Err(CellParseError::Malformed),
    }
    if scan.top_level_text {
        return Err(CellParseError::TextOutsideElements);
    }

    scan.spans
        .iter()
        .map(|span| build_cell(input, span))
        .collect()
}

/// Parse `new_xml` payloads: exactly one cell element.
pub fn parse_single_cell(input: &str) -> Result<Cell, CellParseError> {
    let mut cells = parse_cells(input)?;
    match cells.len() {
        0 => Err(CellParseError::Empty),
        1 => Ok(cells.pop().expect("one cell")),
        count => Err(CellParseError::MultipleCells { count }),
    }
}

/// Skip whitespace, comments, processing instructions, and declarations.
fn skip_trivia(input: &str, mut pos: usize) -> usize {
    let bytes = input.as_bytes();
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if input[pos..].starts_with("<!--") {
            match input[pos + 4..].find("-->") {
                Some(end) => pos = pos + 4 + end + 3,
                None => return input.len(),
            }
        } else if input[pos..].starts_with("<?") || input[pos..].starts_with("<!") {
            match input[pos..].find('>') {
                Some(end) => pos += end + 1,
                None => return input.len(),
            }
        } else {
            return pos;
        }
    }
}

struct OpenTag<'a> {
    name: &'a str,
    attrs: Vec<Attr>,
    self_closing: bool,
    after: usize,
}

fn read_open_tag<'a>(
    input: &'a str,
    pos: usize,
    expected: &'static str,
) -> Result<OpenTag<'a>, DocumentParseError> {
    let bytes = input.as_bytes();
    if pos >= bytes.len() {
        return Err(DocumentParseError::Truncated { expected });
    }
    if bytes[pos] != b'<' {
        return Err(DocumentParseError::UnexpectedTag {
            found: input[pos..].chars().take(16).collect(),
            expected,
        });
    }
    let name_start = pos + 1;
    let mut name_stop = name_start;
    while name_stop < bytes.len() && is_name_char(bytes[name_stop] as char) {
        name_stop += 1;
    }
    if name_stop == name_start {
        return Err(DocumentParseError::UnexpectedTag {
            found: input[pos..].chars().take(16).collect(),
            expected,
        });
    }
    let name = &input[name_start..name_stop];

    let mut quote: Option<u8> = None;
    let mut index = name_stop;
    while index < bytes.len() {
        let byte = bytes[index];
        match quote {
            Some(q) => {
                if byte == q {
                    quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' => quote = Some(byte),
                b'>' => {
                    let self_closing = bytes[index - 1] == b'/';
                    let attr_end = if self_closing { index - 1 } else { index };
                    let attrs = parse_attrs(&input[name_stop..attr_end])?;
                    return Ok(OpenTag {
                        name,
                        attrs,
                        self_closing,
                        after: index + 1,
                    });
                }
                _ => {}
            },
        }
        index += 1;
    }
    Err(DocumentParseError::Truncated { expected })
}

fn read_close_tag(
    input: &str,
    pos: usize,
    tag: &'static str,
) -> Result<usize, DocumentParseError> {
    let rest = &input[pos..];
    let Some(after_slash) = rest.strip_prefix("</") else {
        return Err(DocumentParseError::UnclosedWrapper { tag });
    };
    let Some(after_name) = after_slash.strip_prefix(tag) else {
        return Err(DocumentParseError::UnclosedWrapper { tag });
    };
    let trimmed = after_name.trim_start();
    if !trimmed.starts_with('>') {
        return Err(DocumentParseError::UnclosedWrapper { tag });
    }
    let consumed = rest.len() - trimmed.len() + 1;
    Ok(pos + consumed)
}

/// Parse a full document: the wrapper chain
/// `mxfile → diagram → mxGraphModel → root` (the outer two layers are
/// optional) around an ordered cell list. Strict: content outside the
/// wrapper is an error, and every opened wrapper must close.
pub fn parse_document(input: &str) -> Result<Document, DocumentParseError> {
    let mut pos = skip_trivia(input, 0);
    if pos >= input.len() {
        return Err(DocumentParseError::Empty);
    }

    let mut file = None;
    let mut page = None;

    let mut tag = read_open_tag(input, pos, "<mxfile>, <diagram>, or <mxGraphModel>")?;
    if tag.name == "mxfile" {
        if tag.self_closing {
            return Err(DocumentParseError::Truncated { expected: "<diagram>" });
        }
        file = Some(tag.attrs);
        pos = skip_trivia(input, tag.after);
        tag = read_open_tag(input, pos, "<diagram>")?;
    }
    if tag.name == "diagram" {
        if tag.self_closing {
            return Err(DocumentParseError::Truncated {
                expected: "<mxGraphModel>",
            });
        }
        page = Some(tag.attrs);
        pos = skip_trivia(input, tag.after);
        tag = read_open_tag(input, pos, "<mxGraphModel>")?;
    }
    if tag.name != "mxGraphModel" {
        return Err(DocumentParseError::UnexpectedTag {
            found: tag.name.to_owned(),
            expected: "<mxGraphModel>",
        });
    }
    if tag.self_closing {
        return Err(DocumentParseError::Truncated { expected: "<root>" });
    }
    let model = tag.attrs;

    pos = skip_trivia(input, tag.after);
    let root_tag = read_open_tag(input, pos, "<root>")?;
    if root_tag.name != "root" {
        return Err(DocumentParseError::UnexpectedTag {
            found: root_tag.name.to_owned(),
            expected: "<root>",
        });
    }
    let root = root_tag.attrs;

    let mut cells = Vec::new();
    pos = root_tag.after;
    if !root_tag.self_closing {
        let region = &input[pos..];
        let scan = scan_elements(region);
        match scan.stop {
            ScanStop::StrayClose {
                name_start,
                name_end,
                after_gt,
                ..
            } => {
                if &region[name_start..name_end] != "root" {
                    return Err(DocumentParseError::UnexpectedTag {
                        found: region[name_start..name_end].to_owned(),
                        expected: "</root>",
                    });
                }
                if scan.top_level_text {
                    return Err(CellParseError::TextOutsideElements.into());
                }
                for span in &scan.spans {
                    cells.push(build_cell(region, span)?);
                }
                pos += after_gt;
            }
            ScanStop::End { .. } => {
                return Err(DocumentParseError::UnclosedWrapper { tag: "root" })
            }
            ScanStop::Malformed => return Err(CellParseError::Malformed.into()),
        }
    }

    pos = skip_trivia(input, pos);
    pos = read_close_tag(input, pos, "mxGraphModel")?;
    if page.is_some() {
        pos = skip_trivia(input, pos);
        pos = read_close_tag(input, pos, "diagram")?;
    }
    if file.is_some() {
        pos = skip_trivia(input, pos);
        pos = read_close_tag(input, pos, "mxfile")?;
    }
    pos = skip_trivia(input, pos);
    if pos < input.len() {
        return Err(DocumentParseError::TrailingContent);
    }

    let envelope = Envelope {
        file,
        page,
        model,
        root,
    };
    Ok(Document::new(envelope, cells))
}
