//! The process-wide operation lookup.
//!
//! Readers load an `Arc` to an immutable [`LookupSnapshot`]; the refresher
//! publishes by swapping in a whole new snapshot. A reader therefore sees
//! either the old table or the new one, never a mix, and never blocks.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use refresher_core::{ApiOperation, OperationDetails, OperationTable};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("details for {0} are not available yet")]
    Unavailable(ApiOperation),
}

/// One immutable generation of the published table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupSnapshot {
    /// 0 before the first successful refresh, then +1 per publish.
    pub generation: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub operations: OperationTable,
}

impl LookupSnapshot {
    pub fn get(&self, operation: ApiOperation) -> Option<&OperationDetails> {
        self.operations.get(&operation)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PublishedLookup {
    current: ArcSwap<LookupSnapshot>,
}

impl PublishedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Details for one operation, or `Unavailable` until a refresh has succeeded.
    pub fn lookup(&self, operation: ApiOperation) -> Result<OperationDetails, LookupError> {
        self.current
            .load()
            .get(operation)
            .cloned()
            .ok_or(LookupError::Unavailable(operation))
    }

    /// The whole current generation, for callers that need several operations at once.
    pub fn snapshot(&self) -> Arc<LookupSnapshot> {
        self.current.load_full()
    }

    /// Replace the table wholesale. There is a single writer (the refresher),
    /// so reading the previous generation and storing is not racy.
    pub fn publish(&self, operations: OperationTable) -> Arc<LookupSnapshot> {
        let next = Arc::new(LookupSnapshot {
            generation: self.current.load().generation + 1,
            published_at: Some(Utc::now()),
            operations,
        });
        self.current.store(Arc::clone(&next));
        next
    }
}
