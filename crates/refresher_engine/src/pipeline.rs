use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::Local;
use engine_logging::{engine_error, engine_info, engine_warn};
use refresher_core::{
    extract_modules, resolve_operations, ApiOperation, ModuleTable, OperationTable,
};
use tokio::task::JoinHandle;

use crate::lookup::{LookupSnapshot, PublishedLookup};
use crate::navigate::BundleSource;
use crate::persist::SnapshotStore;
use crate::{CycleError, FailureKind, Stage};

/// Navigation → extraction → resolution, without publishing anything.
pub async fn run_pipeline(
    source: &dyn BundleSource,
    operations: &[ApiOperation],
) -> Result<(ModuleTable, OperationTable), CycleError> {
    let bundle = source.fetch_bundle().await?;

    let modules = extract_modules(&bundle)?;
    if modules.is_empty() {
        return Err(CycleError::new(
            Stage::Extraction,
            FailureKind::NoModules,
            format!("no module records in {} bytes of bundle text", bundle.len()),
        ));
    }

    let resolved = resolve_operations(&modules, operations)?;
    Ok((modules, resolved))
}

#[derive(Debug)]
pub struct CycleReport {
    pub module_count: usize,
    pub snapshot: Arc<LookupSnapshot>,
    /// Background snapshot write; resolves to the file written, if any.
    pub persist: Option<JoinHandle<Option<PathBuf>>>,
}

/// Runs refresh cycles and publishes their results.
pub struct Refresher {
    source: Arc<dyn BundleSource>,
    lookup: Arc<PublishedLookup>,
    store: Option<SnapshotStore>,
    operations: Vec<ApiOperation>,
    last_snapshot: Arc<ArcSwapOption<PathBuf>>,
}

impl Refresher {
    pub fn new(
        source: Arc<dyn BundleSource>,
        lookup: Arc<PublishedLookup>,
        store: Option<SnapshotStore>,
        operations: Vec<ApiOperation>,
    ) -> Self {
        Self {
            source,
            lookup,
            store,
            operations,
            last_snapshot: Arc::new(ArcSwapOption::empty()),
        }
    }

    pub fn lookup(&self) -> &Arc<PublishedLookup> {
        &self.lookup
    }

    /// Path of the most recent snapshot file that was written successfully.
    pub fn last_snapshot_path(&self) -> Option<PathBuf> {
        self.last_snapshot.load_full().map(|path| (*path).clone())
    }

    /// One full cycle. On failure the published table is left untouched.
    ///
    /// Must be called from within a tokio runtime: the snapshot write is
    /// handed to the blocking pool and never delays the publish.
    pub async fn refresh_once(&self) -> Result<CycleReport, CycleError> {
        let (modules, resolved) = match run_pipeline(self.source.as_ref(), &self.operations).await {
            Ok(result) => result,
            Err(err) => {
                engine_error!(
                    "API details refresh failed at {} ({}): {}",
                    err.stage,
                    err.kind,
                    err.message
                );
                return Err(err);
            }
        };

        let module_count = modules.len();
        let persist = self.store.clone().map(|store| self.spawn_persist(store, modules));

        let snapshot = self.lookup.publish(resolved);
        for (operation, details) in &snapshot.operations {
            engine_info!("{} -> queryId {}", operation, details.query_id);
        }
        engine_info!(
            "Published API details generation {} from {} module(s)",
            snapshot.generation,
            module_count
        );

        Ok(CycleReport {
            module_count,
            snapshot,
            persist,
        })
    }

    fn spawn_persist(
        &self,
        store: SnapshotStore,
        modules: ModuleTable,
    ) -> JoinHandle<Option<PathBuf>> {
        let last_snapshot = Arc::clone(&self.last_snapshot);
        tokio::task::spawn_blocking(move || match store.write(&modules, Local::now()) {
            Ok(path) => {
                engine_info!("Saved API details snapshot to {}", path.display());
                last_snapshot.store(Some(Arc::new(path.clone())));
                Some(path)
            }
            Err(err) => {
                engine_warn!(
                    "Failed to save API details snapshot in {}: {}",
                    store.dir().display(),
                    err
                );
                None
            }
        })
    }
}
