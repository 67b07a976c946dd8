// src/declarations.rs
//! Function definition → forward declaration, by text surgery on one
//! definition at a time. No printer: comments are dropped, the body is cut,
//! and anything that cannot be forward-declared this way is filtered out.

use log::debug;

use crate::index::{DeclarationKind, DeclarationNode};

/// Forward declaration for one function definition, or `None` when the
/// flattened signature contains `=` (default arguments, initializers) or `::`
/// (out-of-line member definitions).
pub fn forward_declaration(raw: &str) -> Option<String> {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = strip_line_comments(&text);
    let text = text.replace('\n', " ");
    let signature = strip_body(&text);
    let signature = signature.trim();

    if signature.is_empty() || signature.contains('=') || signature.contains("::") {
        debug!("no forward declaration for `{signature}`");
        return None;
    }
    Some(format!("{signature};"))
}

/// Append a declaration line for every function definition in `decls`.
pub fn extract_into(decls: &[DeclarationNode], body: &mut String) -> usize {
    let mut added = 0;
    for decl in decls {
        if decl.kind != DeclarationKind::FunctionDefinition {
            continue;
        }
        if let Some(fwd) = forward_declaration(&decl.raw) {
            body.push_str(&fwd);
            body.push('\n');
            added += 1;
        }
    }
    added
}

/* ---------------- text surgery ---------------- */

/// `//` to end of line becomes a single space (the newline survives).
/// String and char literals and `/* */` spans are copied through untouched.
fn strip_line_comments(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copied = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string_like(bytes, i).map_or(bytes.len(), |end| end + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&s[copied..i]);
                out.push(' ');
                let eol = s[i..].find('\n').map_or(bytes.len(), |n| i + n);
                copied = eol;
                i = eol;
            }
            _ => i += 1,
        }
    }
    out.push_str(&s[copied..]);
    out
}

/// Remove the body: from the first `{` through its matching `}`.
/// Unbalanced text falls back to cutting through the last `}`.
fn strip_body(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(open) = s.find('{') else {
        return s.to_string();
    };
    let close = find_matching(bytes, open, b'{', b'}').or_else(|| s.rfind('}').filter(|&c| c > open));
    match close {
        Some(close) => format!("{}{}", &s[..open], &s[close + 1..]),
        None => s.to_string(),
    }
}

/// Index of the closer matching `bytes[start] == open`, skipping literals
/// and block comments.
fn find_matching(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    if start >= bytes.len() || bytes[start] != open { return None; }
    let mut depth: i32 = 0;
    let mut i = start;
    while i < bytes.len() {
        let c = bytes[i];
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 { return Some(i); }
        } else if c == b'"' || c == b'\'' {
            if let Some(n) = skip_string_like(bytes, i) { i = n + 1; continue; }
        } else if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i = skip_block_comment(bytes, i);
            continue;
        }
        i += 1;
    }
    None
}

/// Index just past the `*/` closing the comment at `start`, or the end of input.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' { return i + 2; }
        i += 1;
    }
    bytes.len()
}

fn skip_string_like(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote { return Some(i); }
        i += 1;
    }
    None
}
