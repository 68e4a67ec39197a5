use std::path::{Path, PathBuf};

use crate::persist::{ensure_writable_dir, PersistError};

pub const APP_NAME: &str = "x-remove.cc";

/// Overrides the base directory the application folder is created in.
pub const DATA_DIR_ENV: &str = "X_DATA_DIR";

#[derive(Debug, thiserror::Error)]
pub enum DataDirError {
    #[error("no data directory could be determined; set X_DATA_DIR")]
    Unresolved,
    #[error("application data directory {path:?} is unusable: {source}")]
    Unusable {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
}

/// Base directory for application data: `$X_DATA_DIR` when set, otherwise
/// the platform data directory, otherwise `$HOME/.local/share`.
pub fn base_data_dir(override_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = override_dir {
        return Some(dir.to_path_buf());
    }
    dirs::data_dir().or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
}

/// Resolve `<base>/x-remove.cc`, create it, and check that it is writable.
pub fn app_data_dir(override_dir: Option<&Path>) -> Result<PathBuf, DataDirError> {
    let base = base_data_dir(override_dir).ok_or(DataDirError::Unresolved)?;
    let path = base.join(APP_NAME);
    ensure_writable_dir(&path).map_err(|source| DataDirError::Unusable {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
