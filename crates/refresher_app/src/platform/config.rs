use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use refresher_engine::{RefreshSettings, DATA_DIR_ENV, MIN_REFRESH_INTERVAL};

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const INTERVAL_ENV: &str = "REFRESH_INTERVAL_SECS";

/// Process configuration read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: LevelFilter,
    pub data_dir_override: Option<PathBuf>,
    pub settings: RefreshSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset, empty, or unparsable values fall back to defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        let log_level = read(LOG_LEVEL_ENV)
            .and_then(|raw| engine_logging::parse_level(&raw))
            .unwrap_or(LevelFilter::Info);

        let mut settings = RefreshSettings::default();
        if let Some(secs) = read(INTERVAL_ENV).and_then(|raw| raw.trim().parse::<u64>().ok()) {
            settings.interval = Duration::from_secs(secs).max(MIN_REFRESH_INTERVAL);
        }

        Self {
            log_level,
            data_dir_override: read(DATA_DIR_ENV).map(PathBuf::from),
            settings,
        }
    }
}
