use std::sync::LazyLock;

use engine_logging::engine_debug;
use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

use crate::brackets::{find_matching_brace, StructuralError};
use crate::literal::{decode_object_literal, DecodeError, DecodedObject};

/// Numeric key of one module record inside a bundle.
pub type ModuleId = u64;

/// Decoded module exports in the order the bundle lists them.
pub type ModuleTable = IndexMap<ModuleId, DecodedObject>;

/// `123: e => { e.exports = {` with arbitrary whitespace. The carrier name is
/// captured twice because the regex engine has no backreferences; the two are
/// compared in code.
static MODULE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+):\s*([A-Za-z_$][\w$]*)\s*=>\s*\{\s*([A-Za-z_$][\w$]*)\.exports\s*=\s*\{",
    )
    .expect("module pattern is a valid regex")
});

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("module {module_id}: {source}")]
    Structural {
        module_id: ModuleId,
        #[source]
        source: StructuralError,
    },
    #[error("module {module_id}: {source}")]
    Decode {
        module_id: ModuleId,
        #[source]
        source: DecodeError,
    },
    #[error("module id {raw} does not fit in 64 bits")]
    InvalidId { raw: String },
}

impl ExtractError {
    pub fn module_id(&self) -> Option<ModuleId> {
        match self {
            ExtractError::Structural { module_id, .. } | ExtractError::Decode { module_id, .. } => {
                Some(*module_id)
            }
            ExtractError::InvalidId { .. } => None,
        }
    }
}

/// Harvest every `<id>: e => { e.exports = {...} }` object literal in `bundle`.
///
/// Zero matches is an empty table, not an error. A single undecodable module
/// fails the whole extraction.
pub fn extract_modules(bundle: &str) -> Result<ModuleTable, ExtractError> {
    let mut table = ModuleTable::new();

    for caps in MODULE_PATTERN.captures_iter(bundle) {
        let (Some(id), Some(param), Some(carrier), Some(whole)) =
            (caps.get(1), caps.get(2), caps.get(3), caps.get(0))
        else {
            continue;
        };
        if param.as_str() != carrier.as_str() {
            continue;
        }

        let module_id: ModuleId = id.as_str().parse().map_err(|_| ExtractError::InvalidId {
            raw: id.as_str().to_string(),
        })?;

        // The match ends right after the literal's opening brace.
        let body_start = whole.end();
        let close = find_matching_brace(bundle, body_start)
            .map_err(|source| ExtractError::Structural { module_id, source })?;
        let literal = format!("{{{}}}", &bundle[body_start..close]);

        let decoded = decode_object_literal(&literal)
            .map_err(|source| ExtractError::Decode { module_id, source })?;
        table.insert(module_id, decoded);
    }

    engine_debug!("extracted {} module literal(s) from bundle", table.len());
    Ok(table)
}
