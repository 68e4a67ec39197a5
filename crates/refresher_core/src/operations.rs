use std::collections::BTreeMap;
use std::fmt;

use engine_logging::{engine_debug, engine_warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::modules::{ModuleId, ModuleTable};

/// Remote API operations whose query ids the refresher keeps current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApiOperation {
    ListFollowers,
    RemoveFollower,
}

impl ApiOperation {
    pub const ALL: [ApiOperation; 2] = [ApiOperation::ListFollowers, ApiOperation::RemoveFollower];

    /// The `operationName` the bundle declares for this operation.
    pub fn operation_name(self) -> &'static str {
        match self {
            ApiOperation::ListFollowers => "Followers",
            ApiOperation::RemoveFollower => "RemoveFollower",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_name())
    }
}

/// The fields callers need to invoke one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDetails {
    pub query_id: String,
    pub operation_name: String,
    pub operation_type: String,
    #[serde(default)]
    pub metadata: Value,
}

impl OperationDetails {
    /// Path of the GraphQL endpoint selecting this operation, e.g.
    /// `/i/api/graphql/abc123/RemoveFollower`.
    pub fn graphql_path(&self) -> String {
        format!("/i/api/graphql/{}/{}", self.query_id, self.operation_name)
    }
}

pub type OperationTable = BTreeMap<ApiOperation, OperationDetails>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no module declares operationName \"{operation}\"")]
    Missing { operation: ApiOperation },
    #[error("module {module_id} declares {operation} but lacks a string `{field}`")]
    Malformed {
        operation: ApiOperation,
        module_id: ModuleId,
        field: &'static str,
    },
}

impl ResolutionError {
    pub fn operation(&self) -> ApiOperation {
        match self {
            ResolutionError::Missing { operation } | ResolutionError::Malformed { operation, .. } => {
                *operation
            }
        }
    }
}

/// Resolve every requested operation against `modules`, all or nothing.
///
/// For each operation the first module (in table order) whose `operationName`
/// equals the expected name wins. Later duplicates are ignored.
pub fn resolve_operations(
    modules: &ModuleTable,
    wanted: &[ApiOperation],
) -> Result<OperationTable, ResolutionError> {
    let mut resolved = OperationTable::new();

    for &operation in wanted {
        engine_debug!("looking for details for {}", operation);
        let mut matches = modules
            .iter()
            .filter(|(_, object)| declared_name(object) == Some(operation.operation_name()));

        let (&module_id, object) = matches
            .next()
            .ok_or(ResolutionError::Missing { operation })?;

        let duplicates = matches.count();
        if duplicates > 0 {
            engine_warn!(
                "{} is declared by {} further module(s); using module {}",
                operation,
                duplicates,
                module_id
            );
        }

        resolved.insert(operation, details_from(operation, module_id, object)?);
    }

    Ok(resolved)
}

fn declared_name(object: &Value) -> Option<&str> {
    object.get("operationName").and_then(Value::as_str)
}

fn details_from(
    operation: ApiOperation,
    module_id: ModuleId,
    object: &Value,
) -> Result<OperationDetails, ResolutionError> {
    let field = |field: &'static str| {
        object
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ResolutionError::Malformed {
                operation,
                module_id,
                field,
            })
    };

    Ok(OperationDetails {
        query_id: field("queryId")?,
        operation_name: field("operationName")?,
        operation_type: field("operationType")?,
        metadata: object.get("metadata").cloned().unwrap_or(Value::Null),
    })
}
