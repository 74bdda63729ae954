// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text-safety normalization for model-emitted markup.
//!
//! Models do not reliably escape label text. The legalizer makes a
//! fragment or document safe to parse — bare ampersands, raw `<` in
//! character data and attribute values, interior quotes, XML-illegal
//! control characters — without touching node ids, attribute names, or
//! structural nesting. It is a text pass, never a semantic transform,
//! and it is idempotent.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Tag,
    Quoted(char),
    Comment,
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':')
}

/// True when `rest` (the text immediately after `&`) begins a well-formed
/// entity reference: named, decimal, or hex.
fn is_entity(rest: &str) -> bool {
    let Some(semi) = rest.find(';') else {
        return false;
    };
    let body = &rest[..semi];
    if body.is_empty() || body.len() > 10 {
        return false;
    }
    if let Some(digits) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(digits) = body.strip_prefix('#') {
        return !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    }
    body.chars().all(|c| c.is_ascii_alphabetic())
}

/// True when a quote character at this position terminates the attribute
/// value. `rest` is the text after the candidate quote. A quote followed
/// by tag-end syntax or another `name=` attribute closes the value; any
/// other quote is interior label text and gets escaped.
fn quote_terminates(rest: &str) -> bool {
    let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
    let Some(first) = trimmed.chars().next() else {
        // Truncated payload: treat the quote as closing so the tail stays
        // parseable as far as it goes.
        return true;
    };
    if first == '>' || first == '/' {
        return true;
    }
    if !is_name_start(first) {
        return false;
    }
    let after_name = trimmed.trim_start_matches(is_name_char);
    after_name
        .trim_start_matches([' ', '\t', '\r', '\n'])
        .starts_with('=')
}

fn is_stripped_control(ch: char) -> bool {
    ch.is_control() && !matches!(ch, '\t' | '\n' | '\r')
}

/// Normalize `input` into parseable markup. See the module docs for the
/// exact rules; structure and ids are never altered.
pub fn legalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = State::Text;
    let mut chars = input.char_indices();

    while let Some((index, ch)) = chars.next() {
        let rest = &input[index + ch.len_utf8()..];
        match state {
            State::Text => match ch {
                '<' => {
                    if rest.starts_with("!--") {
                        state = State::Comment;
                        out.push('<');
                    } else if rest
                        .chars()
                        .next()
                        .is_some_and(|c| is_name_start(c) || matches!(c, '/' | '!' | '?'))
                    {
                        state = State::Tag;
                        out.push('<');
                    } else if rest.is_empty() {
                        // Trailing '<' of a truncated tag: keep for the
                        // extractor to classify as in-progress.
                        out.push('<');
                    } else {
                        out.push_str("&lt;");
                    }
                }
                '&' => {
                    if is_entity(rest) {
                        out.push('&');
                    } else {
                        out.push_str("&amp;");
                    }
                }
                _ if is_stripped_control(ch) => {}
                _ => out.push(ch),
            },
            State::Tag => match ch {
                '"' | '\'' => {
                    state = State::Quoted(ch);
                    out.push(ch);
                }
                '>' => {
                    state = State::Text;
                    out.push('>');
                }
                _ if is_stripped_control(ch) => {}
                _ => out.push(ch),
            },
            State::Quoted(q) => match ch {
                _ if ch == q => {
                    if quote_terminates(rest) {
                        state = State::Tag;
                        out.push(ch);
                    } else {
                        out.push_str("&quot;");
                    }
                }
                '&' => {
                    if is_entity(rest) {
                        out.push('&');
                    } else {
                        out.push_str("&amp;");
                    }
                }
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ if is_stripped_control(ch) => {}
                _ => out.push(ch),
            },
            State::Comment => {
                out.push(ch);
                if ch == '>' && out.ends_with("-->") {
                    state = State::Text;
                }
            }
        }
    }

    out
}
