// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Fragment extraction from partial streaming output.
//!
//! The extractor works by tag-balance counting rather than a full parse so
//! an in-progress trailing element costs nothing to tolerate. It is
//! monotone: growing the input never retracts an element that was already
//! part of the extracted prefix.

use memchr::memchr;
use smallvec::SmallVec;

/// Byte ranges of one complete top-level element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ElementSpan {
    /// One past the `>` of the open tag.
    pub open_end: usize,
    /// Index of the `<` of the close tag; meaningless when self-closing.
    pub close_start: usize,
    pub tag_start: usize,
    pub tag_end: usize,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScanStop {
    /// Input ended after the last complete element; `partial` is true when
    /// a trailing in-progress element (or comment) was discarded.
    End { partial: bool },
    /// A close tag at top level with no matching open tag. The document
    /// parser uses this to find `</root>`.
    StrayClose {
        lt: usize,
        name_start: usize,
        name_end: usize,
        after_gt: usize,
    },
    /// Mismatched nesting; the element being scanned can never complete.
    Malformed,
}

#[derive(Debug)]
pub(crate) struct Scan {
    pub spans: Vec<ElementSpan>,
    /// One past the `>` of the last complete top-level element (0 if none).
    pub complete_len: usize,
    pub stop: ScanStop,
    /// Non-whitespace character data seen between top-level elements.
    pub top_level_text: bool,
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b':')
}

fn name_end(bytes: &[u8], start: usize) -> usize {
    let mut index = start;
    while index < bytes.len() && is_name_byte(bytes[index]) {
        index += 1;
    }
    index
}

/// Find the `>` ending an open tag, honoring quoted attribute values
/// (which may legally contain `>`). Returns one past the `>` plus whether
/// the tag was self-closing.
fn open_tag_end(bytes: &[u8], from: usize) -> Option<(usize, bool)> {
    let mut quote: Option<u8> = None;
    let mut index = from;
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
                    let self_closing = index > from && bytes[index - 1] == b'/';
                    return Some((index + 1, self_closing));
                }
                _ => {}
            },
        }
        index += 1;
    }
    None
}

pub(crate) fn scan_elements(input: &str) -> Scan {
    let bytes = input.as_bytes();
    let mut spans = Vec::new();
    let mut stack: SmallVec<[(usize, usize); 8]> = SmallVec::new();
    let mut complete_len = 0usize;
    let mut top_level_text = false;

    let mut pos = 0usize;
    let mut open_end = 0usize;
    let mut tag_range = (0usize, 0usize);

    loop {
        let Some(offset) = memchr(b'<', &bytes[pos..]) else {
            if stack.is_empty() && bytes[pos..].iter().any(|b| !b.is_ascii_whitespace()) {
                top_level_text = true;
            }
            let partial = !stack.is_empty();
            return Scan {
                spans,
                complete_len,
                stop: ScanStop::End { partial },
                top_level_text,
            };
        };
        let lt = pos + offset;
        if stack.is_empty() && bytes[pos..lt].iter().any(|b| !b.is_ascii_whitespace()) {
            top_level_text = true;
        }

        let Some(&next) = bytes.get(lt + 1) else {
            // A lone trailing '<': an in-progress tag.
            return Scan {
                spans,
                complete_len,
                stop: ScanStop::End { partial: true },
                top_level_text,
            };
        };

        if next == b'/' {
            let name_start = lt + 2;
            let name_stop = name_end(bytes, name_start);
            let Some(gt_offset) = memchr(b'>', &bytes[name_stop..]) else {
                return Scan {
                    spans,
                    complete_len,
                    stop: ScanStop::End { partial: true },
                    top_level_text,
                };
            };
            let after_gt = name_stop + gt_offset + 1;

            let Some((open_name_start, open_name_end)) = stack.pop() else {
                return Scan {
                    spans,
                    complete_len,
                    stop: ScanStop::StrayClose {
                        lt,
                        name_start,
                        name_end: name_stop,
                        after_gt,
                    },
                    top_level_text,
                };
            };
            if bytes[open_name_start..open_name_end] != bytes[name_start..name_stop] {
                return Scan {
                    spans,
                    complete_len,
                    stop: ScanStop::Malformed,
                    top_level_text,
                };
            }
            if stack.is_empty() {
                spans.push(ElementSpan {
                    open_end,
                    close_start: lt,
                    tag_start: open_name_start,
                    tag_end: open_name_end,
                    self_closing: false,
                });
                complete_len = after_gt;
            }
            pos = after_gt;
        } else if next == b'!' || next == b'?' {
            // Comment, declaration, or processing instruction: skip whole.
            if bytes[lt..].starts_with(b"<!--") {
                let Some(end_offset) = find_subsequence(&bytes[lt + 4..], b"-->") else {
                    return Scan {
                        spans,
                        complete_len,
                        stop: ScanStop::End { partial: true },
                        top_level_text,
                    };
                };
                pos = lt + 4 + end_offset + 3;
            } else {
                let Some(gt_offset) = memchr(b'>', &bytes[lt..]) else {
                    return Scan {
                        spans,
                        complete_len,
                        stop: ScanStop::End { partial: true },
                        top_level_text,
                    };
                };
                pos = lt + gt_offset + 1;
            }
        } else if is_name_start(next) {
            let tag_start = lt + 1;
            let tag_stop = name_end(bytes, tag_start);
            let Some((after_gt, self_closing)) = open_tag_end(bytes, tag_stop) else {
                return Scan {
                    spans,
                    complete_len,
                    stop: ScanStop::End { partial: true },
                    top_level_text,
                };
            };

            if stack.is_empty() {
                tag_range = (tag_start, tag_stop);
                open_end = after_gt;
            }
            if self_closing {
                if stack.is_empty() {
                    spans.push(ElementSpan {
                        open_end: after_gt,
                        close_start: after_gt,
                        tag_start: tag_range.0,
                        tag_end: tag_range.1,
                        self_closing: true,
                    });
                    complete_len = after_gt;
                }
            } else {
                stack.push((tag_start, tag_stop));
            }
            pos = after_gt;
        } else {
            // A '<' that cannot begin a tag is character data.
            if stack.is_empty() {
                top_level_text = true;
            }
            pos = lt + 1;
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    let mut from = 0usize;
    while let Some(offset) = memchr(needle[0], &haystack[from..]) {
        let start = from + offset;
        if haystack[start..].len() < needle.len() {
            return None;
        }
        if &haystack[start..start + needle.len()] == needle {
            return Some(start);
        }
        from = start + 1;
    }
    None
}

/// The maximal leading substring of `input` consisting only of
/// syntactically complete, balanced top-level elements.
///
/// Empty input (or input with no complete element yet) yields `""`. A
/// malformed element is excluded whole, never partially emitted, and
/// nothing after it is considered.
pub fn complete_cell_prefix(input: &str) -> &str {
    let scan = scan_elements(input);
    &input[..scan.complete_len]
}

/// Window a partial payload down to its renderable cell fragment.
///
/// Streamed payloads often carry the document wrapper
/// (`<mxfile>…<root>`) around the cells; previews only need the complete
/// cells after the innermost `<root>`. Without a wrapper the whole input
/// is the window. A trailing `</root>` (and anything after it) is cut off
/// by the stray-close stop of the scanner.
pub fn renderable_fragment(input: &str) -> &str {
    let start = match input.rfind("<root") {
        Some(lt) => {
            let bytes = input.as_bytes();
            match open_tag_end(bytes, lt + "<root".len()) {
                Some((after_gt, false)) => after_gt,
                // `<root/>` or a still-open `<root` tag: nothing inside yet.
                Some((_, true)) | None => return "",
            }
        }
        None => 0,
    };
    complete_cell_prefix(&input[start..])
}
