use std::collections::VecDeque;
use std::fs;
use std::sync::{Arc, Mutex, Once};

use pretty_assertions::assert_eq;
use refresher_core::ApiOperation;
use refresher_engine::{
    BundleSource, CycleError, FailureKind, LookupError, PublishedLookup, Refresher,
    SnapshotStore, Stage,
};
use tempfile::TempDir;

const BUNDLE: &str = r#"{
    5: e => { e.exports = {queryId: "fol-v1", operationName: "Followers", operationType: "query", metadata: {}} },
    9: e => { e.exports = {queryId: "abc123", operationName: "RemoveFollower", operationType: "mutation", metadata: {}} },
}"#;

/// Hands out pre-recorded navigation results in order.
struct ScriptedSource {
    results: Mutex<VecDeque<Result<String, CycleError>>>,
}

impl ScriptedSource {
    fn new(results: Vec<Result<String, CycleError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
        })
    }
}

#[async_trait::async_trait]
impl BundleSource for ScriptedSource {
    async fn fetch_bundle(&self) -> Result<String, CycleError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted result left")
    }
}

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn post_failed() -> CycleError {
    CycleError::new(
        Stage::FormSubmission,
        FailureKind::UnexpectedStatus(200),
        "expected 302",
    )
}

fn refresher(source: Arc<ScriptedSource>, store: Option<SnapshotStore>) -> Refresher {
    Refresher::new(
        source,
        Arc::new(PublishedLookup::new()),
        store,
        ApiOperation::ALL.to_vec(),
    )
}

#[tokio::test]
async fn lookup_is_unavailable_before_first_success() {
    init_logging();
    let refresher = refresher(ScriptedSource::new(vec![Err(post_failed())]), None);

    assert_eq!(
        refresher.lookup().lookup(ApiOperation::RemoveFollower),
        Err(LookupError::Unavailable(ApiOperation::RemoveFollower))
    );
    assert!(refresher.refresh_once().await.is_err());
    assert!(refresher.lookup().snapshot().is_empty());
}

#[tokio::test]
async fn failed_cycle_leaves_published_table_untouched() {
    init_logging();
    let refresher = refresher(
        ScriptedSource::new(vec![Ok(BUNDLE.to_string()), Err(post_failed())]),
        None,
    );

    let report = refresher.refresh_once().await.unwrap();
    assert_eq!(report.module_count, 2);
    let before = refresher.lookup().snapshot();
    assert_eq!(before.generation, 1);
    assert_eq!(before.get(ApiOperation::RemoveFollower).unwrap().query_id, "abc123");
    assert_eq!(before.get(ApiOperation::ListFollowers).unwrap().query_id, "fol-v1");

    let err = refresher.refresh_once().await.unwrap_err();
    assert_eq!(err.stage, Stage::FormSubmission);

    let after = refresher.lookup().snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(*before, *after);
}

#[tokio::test]
async fn bundle_without_modules_is_a_failure() {
    init_logging();
    let refresher = refresher(
        ScriptedSource::new(vec![Ok("console.log('redesigned');".to_string())]),
        None,
    );

    let err = refresher.refresh_once().await.unwrap_err();
    assert_eq!(err.stage, Stage::Extraction);
    assert_eq!(err.kind, FailureKind::NoModules);
}

#[tokio::test]
async fn malformed_module_is_a_failure() {
    init_logging();
    let bundle = r#"1: e => { e.exports = {queryId: "x", operationName: "Followers", extra: undefined} }"#;
    let refresher = refresher(ScriptedSource::new(vec![Ok(bundle.to_string())]), None);

    let err = refresher.refresh_once().await.unwrap_err();
    assert_eq!(err.stage, Stage::Extraction);
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn missing_operation_does_not_publish_partially() {
    init_logging();
    let only_remove = r#"9: e => { e.exports = {queryId: "abc123", operationName: "RemoveFollower", operationType: "mutation", metadata: {}} }"#;
    let refresher = refresher(ScriptedSource::new(vec![Ok(only_remove.to_string())]), None);

    let err = refresher.refresh_once().await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::Resolution {
            operation: ApiOperation::ListFollowers
        }
    );
    assert_eq!(
        refresher.lookup().lookup(ApiOperation::RemoveFollower),
        Err(LookupError::Unavailable(ApiOperation::RemoveFollower))
    );
}

#[tokio::test]
async fn newer_bundle_replaces_every_entry() {
    init_logging();
    let newer = BUNDLE.replace("fol-v1", "fol-v2").replace("abc123", "def456");
    let refresher = refresher(
        ScriptedSource::new(vec![Ok(BUNDLE.to_string()), Ok(newer)]),
        None,
    );

    refresher.refresh_once().await.unwrap();
    refresher.refresh_once().await.unwrap();

    let snapshot = refresher.lookup().snapshot();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.get(ApiOperation::ListFollowers).unwrap().query_id, "fol-v2");
    assert_eq!(snapshot.get(ApiOperation::RemoveFollower).unwrap().query_id, "def456");
}

#[tokio::test]
async fn successful_cycle_writes_full_module_snapshot() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path().join("snapshots"));
    let refresher = refresher(ScriptedSource::new(vec![Ok(BUNDLE.to_string())]), Some(store));

    let report = refresher.refresh_once().await.unwrap();
    let path = report
        .persist
        .expect("store configured")
        .await
        .unwrap()
        .expect("snapshot written");

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["9"]["queryId"], "abc123");
    assert_eq!(written["5"]["operationName"], "Followers");
    assert_eq!(refresher.last_snapshot_path(), Some(path));
}

#[tokio::test]
async fn snapshot_failure_does_not_block_publish() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let not_a_dir = temp.path().join("file");
    fs::write(&not_a_dir, "x").unwrap();
    let refresher = refresher(
        ScriptedSource::new(vec![Ok(BUNDLE.to_string())]),
        Some(SnapshotStore::new(not_a_dir)),
    );

    let report = refresher.refresh_once().await.unwrap();
    assert_eq!(report.persist.unwrap().await.unwrap(), None);
    assert_eq!(
        refresher.lookup().lookup(ApiOperation::RemoveFollower).unwrap().query_id,
        "abc123"
    );
    assert_eq!(refresher.last_snapshot_path(), None);
}
