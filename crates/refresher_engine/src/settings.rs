use std::time::Duration;

use refresher_core::ApiOperation;

pub const DEFAULT_ORIGIN: &str = "https://x.com";

/// Shortest delay the scheduler accepts between cycles.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Scheme and host every request goes to, without a trailing slash.
    pub origin: String,
    pub interval: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    /// Fixed User-Agent; `None` picks one from the pool each cycle.
    pub user_agent: Option<String>,
    pub operations: Vec<ApiOperation>,
    /// Upper bound `stop()` waits for an in-flight cycle.
    pub stop_wait: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            interval: Duration::from_secs(6 * 60 * 60),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 16 * 1024 * 1024,
            user_agent: None,
            operations: ApiOperation::ALL.to_vec(),
            stop_wait: Duration::from_secs(5),
        }
    }
}

impl RefreshSettings {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}
