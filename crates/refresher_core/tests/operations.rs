use std::sync::Once;

use pretty_assertions::assert_eq;
use refresher_core::{
    resolve_operations, ApiOperation, ModuleTable, OperationDetails, ResolutionError,
};
use serde_json::{json, Value};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn operation_module(query_id: &str, name: &str, kind: &str) -> Value {
    json!({
        "queryId": query_id,
        "operationName": name,
        "operationType": kind,
        "metadata": {"featureSwitches": ["x"], "fieldToggles": []}
    })
}

fn table(entries: Vec<(u64, Value)>) -> ModuleTable {
    entries.into_iter().collect()
}

#[test]
fn resolves_remove_follower_query_id() {
    init_logging();
    let modules = table(vec![
        (1, json!({"unrelated": true})),
        (2, operation_module("abc123", "RemoveFollower", "mutation")),
    ]);

    let resolved = resolve_operations(&modules, &[ApiOperation::RemoveFollower]).unwrap();

    assert_eq!(
        resolved[&ApiOperation::RemoveFollower],
        OperationDetails {
            query_id: "abc123".to_string(),
            operation_name: "RemoveFollower".to_string(),
            operation_type: "mutation".to_string(),
            metadata: json!({"featureSwitches": ["x"], "fieldToggles": []}),
        }
    );
}

#[test]
fn missing_operation_names_the_operation() {
    init_logging();
    let modules = table(vec![(2, operation_module("abc123", "RemoveFollower", "mutation"))]);

    let err = resolve_operations(&modules, &ApiOperation::ALL).unwrap_err();

    assert_eq!(
        err,
        ResolutionError::Missing {
            operation: ApiOperation::ListFollowers
        }
    );
    assert!(err.to_string().contains("Followers"));
}

#[test]
fn first_match_in_table_order_wins() {
    init_logging();
    let modules = table(vec![
        (900, operation_module("first", "Followers", "query")),
        (3, operation_module("second", "Followers", "query")),
        (4, operation_module("rm", "RemoveFollower", "mutation")),
    ]);

    let resolved = resolve_operations(&modules, &ApiOperation::ALL).unwrap();

    assert_eq!(resolved[&ApiOperation::ListFollowers].query_id, "first");
    assert_eq!(resolved.len(), 2);
}

#[test]
fn matching_module_without_query_id_is_malformed() {
    init_logging();
    let modules = table(vec![(
        8,
        json!({"operationName": "Followers", "operationType": "query"}),
    )]);

    let err = resolve_operations(&modules, &[ApiOperation::ListFollowers]).unwrap_err();

    assert_eq!(
        err,
        ResolutionError::Malformed {
            operation: ApiOperation::ListFollowers,
            module_id: 8,
            field: "queryId",
        }
    );
}

#[test]
fn graphql_path_uses_query_id_and_name() {
    init_logging();
    let details = OperationDetails {
        query_id: "abc123".into(),
        operation_name: "RemoveFollower".into(),
        operation_type: "mutation".into(),
        metadata: Value::Null,
    };
    assert_eq!(details.graphql_path(), "/i/api/graphql/abc123/RemoveFollower");
}

#[test]
fn details_serialize_with_bundle_field_names() {
    init_logging();
    let details: OperationDetails =
        serde_json::from_value(operation_module("q", "Followers", "query")).unwrap();
    let back = serde_json::to_value(&details).unwrap();
    assert_eq!(back["queryId"], "q");
    assert_eq!(back["operationType"], "query");
}
