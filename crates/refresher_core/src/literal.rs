//! Decoding of loosely-quoted JavaScript object literals into JSON values.
//!
//! Only literal data is supported: strings, numbers, booleans, `null`, and
//! nested objects/arrays. Anything executable (functions, `undefined`,
//! `!0`, trailing commas) is left untouched by the key-quoting pass and
//! rejected by the JSON parser.

use serde_json::Value;
use thiserror::Error;

/// A decoded module export: the JSON value tree of one object literal.
pub type DecodedObject = Value;

#[derive(Debug, Error)]
#[error("object literal is not valid data after key quoting: {source}; literal: {literal}")]
pub struct DecodeError {
    /// The literal exactly as it was handed to the decoder.
    pub literal: String,
    #[source]
    pub source: serde_json::Error,
}

/// Quote bare identifier keys and parse the result as strict JSON.
pub fn decode_object_literal(literal: &str) -> Result<DecodedObject, DecodeError> {
    let quoted = quote_bare_keys(literal);
    serde_json::from_str(&quoted).map_err(|source| DecodeError {
        literal: literal.to_string(),
        source,
    })
}

/// Rewrite `ident:` into `"ident":` outside of string literals.
///
/// Single-quoted strings are re-emitted as double-quoted JSON strings.
/// Everything else is copied through verbatim.
pub fn quote_bare_keys(literal: &str) -> String {
    let chars: Vec<char> = literal.chars().collect();
    let mut out = String::with_capacity(literal.len() + literal.len() / 4);
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '"' => i = copy_double_quoted(&chars, i, &mut out),
            '\'' => i = convert_single_quoted(&chars, i, &mut out),
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                if next_non_whitespace(&chars, i) == Some(':') {
                    out.push('"');
                    out.push_str(&token);
                    out.push('"');
                } else {
                    out.push_str(&token);
                }
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn next_non_whitespace(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().copied().find(|c| !c.is_whitespace())
}

/// Copy a `"..."` string through unchanged; returns the index after the closing quote.
fn copy_double_quoted(chars: &[char], open: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = open + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            '"' => return i,
            _ => {}
        }
    }
    i
}

/// Re-emit a `'...'` string as a JSON string; returns the index after the closing quote.
fn convert_single_quoted(chars: &[char], open: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = open + 1;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '\\' => match chars.get(i) {
                Some('\'') => {
                    out.push('\'');
                    i += 1;
                }
                Some(&escaped) => {
                    out.push('\\');
                    out.push(escaped);
                    i += 1;
                }
                None => out.push('\\'),
            },
            '"' => out.push_str("\\\""),
            '\'' => {
                out.push('"');
                return i;
            }
            _ => out.push(c),
        }
    }
    // Unterminated: leave it unterminated so the parser reports it.
    i
}
