use std::sync::Arc;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use refresher_core::ApiOperation;
use refresher_engine::{app_data_dir, PublishedLookup, RefreshScheduler};

use super::config::AppConfig;
use super::logging;

/// Bootstrap the refresher and block until Ctrl+C.
pub fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    let data_dir = app_data_dir(config.data_dir_override.as_deref())
        .context("cannot prepare application data directory")?;
    logging::initialize(config.log_level, &data_dir);
    engine_info!("Using application data directory {}", data_dir.display());

    let lookup = Arc::new(PublishedLookup::new());
    let mut scheduler = RefreshScheduler::start_with_settings(
        config.settings.clone(),
        Arc::clone(&lookup),
        Some(data_dir.clone()),
    )
    .context("cannot start API details refresher")?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot build signal runtime")?
        .block_on(tokio::signal::ctrl_c())
        .context("cannot listen for Ctrl+C")?;

    engine_info!("Stopping refresher");
    if !scheduler.stop() {
        engine_warn!("Refresher did not finish within {:?}", config.settings.stop_wait);
    }

    for operation in ApiOperation::ALL {
        match lookup.lookup(operation) {
            Ok(details) => engine_info!("{} -> {}", operation, details.graphql_path()),
            Err(err) => engine_warn!("{}", err),
        }
    }
    if let Some(path) = scheduler.last_snapshot_path() {
        engine_info!("Last saved API details file: {}", path.display());
    }
    Ok(())
}
