use std::fmt;

use refresher_core::{ApiOperation, ExtractError, ResolutionError};

/// Step of a refresh cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RedirectDiscovery,
    FormDiscovery,
    FormSubmission,
    BundleDiscovery,
    BundleDownload,
    Extraction,
    Resolution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::RedirectDiscovery => "redirect discovery",
            Stage::FormDiscovery => "form discovery",
            Stage::FormSubmission => "form submission",
            Stage::BundleDiscovery => "bundle discovery",
            Stage::BundleDownload => "bundle download",
            Stage::Extraction => "extraction",
            Stage::Resolution => "resolution",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// An expected script, form, or link element was absent.
    PatternNotFound { what: &'static str },
    HttpStatus(u16),
    /// A non-redirect success where a redirect was required.
    UnexpectedStatus(u16),
    InvalidUrl,
    Timeout,
    Network,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Structural,
    Decode,
    /// The bundle contained no recognizable module records.
    NoModules,
    Resolution { operation: ApiOperation },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::PatternNotFound { what } => write!(f, "pattern not found: {what}"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::UnexpectedStatus(code) => {
                write!(f, "unexpected status {code} (expected 302)")
            }
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Structural => write!(f, "structural error"),
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::NoModules => write!(f, "no modules found"),
            FailureKind::Resolution { operation } => {
                write!(f, "resolution error for {operation}")
            }
        }
    }
}

/// Why a refresh cycle failed, and where.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} failed ({kind}): {message}")]
pub struct CycleError {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

impl CycleError {
    pub fn new(stage: Stage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn pattern(stage: Stage, what: &'static str, message: impl Into<String>) -> Self {
        Self::new(stage, FailureKind::PatternNotFound { what }, message)
    }
}

impl From<ExtractError> for CycleError {
    fn from(err: ExtractError) -> Self {
        let kind = match err {
            ExtractError::Structural { .. } => FailureKind::Structural,
            ExtractError::Decode { .. } | ExtractError::InvalidId { .. } => FailureKind::Decode,
        };
        CycleError::new(Stage::Extraction, kind, err.to_string())
    }
}

impl From<ResolutionError> for CycleError {
    fn from(err: ResolutionError) -> Self {
        CycleError::new(
            Stage::Resolution,
            FailureKind::Resolution {
                operation: err.operation(),
            },
            err.to_string(),
        )
    }
}
