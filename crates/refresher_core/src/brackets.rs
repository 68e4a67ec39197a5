use thiserror::Error;

/// Raised when the nesting opened before `start` never returns to zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no matching closing brace for the brace opened before offset {start} (depth {depth} at end of input)")]
pub struct StructuralError {
    /// Offset the scan started from.
    pub start: usize,
    /// Nesting depth still open when the input ran out.
    pub depth: usize,
}

/// Find the byte offset of the `}` matching a `{` that sits immediately before `start`.
///
/// Every `{`/`}` counts towards nesting, including ones inside string literals;
/// the decoder is responsible for rejecting anything that is not well formed.
/// Single pass, no backtracking.
pub fn find_matching_brace(text: &str, start: usize) -> Result<usize, StructuralError> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    for (offset, byte) in bytes.iter().enumerate().skip(start) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(offset);
                }
            }
            _ => {}
        }
    }
    Err(StructuralError { start, depth })
}
