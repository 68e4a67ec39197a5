//! Refresher engine: network navigation, publishing, persistence, and the
//! background refresh loop.
mod data_dir;
mod lookup;
mod navigate;
mod persist;
mod pipeline;
mod scheduler;
mod settings;
mod types;
mod user_agent;

pub use data_dir::{
    app_data_dir, base_data_dir, DataDirError, APP_NAME, DATA_DIR_ENV,
};
pub use lookup::{LookupError, LookupSnapshot, PublishedLookup};
pub use navigate::{
    find_bundle_link, find_redirect_form, find_redirect_url, BundleRef, BundleSource,
    NavigationSession, RedirectForm, ReqwestNavigator,
};
pub use persist::{ensure_writable_dir, snapshot_filename, PersistError, SnapshotStore};
pub use pipeline::{run_pipeline, CycleReport, Refresher};
pub use scheduler::RefreshScheduler;
pub use settings::{RefreshSettings, DEFAULT_ORIGIN, MIN_REFRESH_INTERVAL};
pub use types::{CycleError, FailureKind, Stage};
pub use user_agent::{UserAgentPool, FALLBACK_USER_AGENT};
