use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use refresher_core::ModuleTable;
use tempfile::NamedTempFile;
use thiserror::Error;

const SNAPSHOT_PREFIX: &str = "x_api_details_";
const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot directory missing or not writable: {0}")]
    Dir(String),
    #[error("failed to serialize module table: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no free snapshot name for {0}")]
    NameExhausted(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` if needed and confirm files can be created inside it.
pub fn ensure_writable_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |err: io::Error| PersistError::Dir(format!("{}: {err}", dir.display()));
    fs::create_dir_all(dir).map_err(unusable)?;
    tempfile::tempfile_in(dir).map_err(unusable)?;
    Ok(())
}

/// File name for a snapshot taken at `at`; sorts chronologically.
pub fn snapshot_filename(at: DateTime<Local>) -> String {
    format!("{SNAPSHOT_PREFIX}{}.json", at.format(SNAPSHOT_TIME_FORMAT))
}

/// Append-only store of timestamped module-table snapshots.
///
/// Files are written to a temp file first and then linked into place without
/// replacing anything already there.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, modules: &ModuleTable, at: DateTime<Local>) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| PersistError::Dir(format!("{}: {err}", self.dir.display())))?;
        let content = serde_json::to_string_pretty(modules)?;

        let base = snapshot_filename(at);
        let stem = base.trim_end_matches(".json");
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                base.clone()
            } else {
                format!("{stem}_{attempt}.json")
            };
            let target = self.dir.join(name);
            match tmp.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => tmp = err.file,
                Err(err) => return Err(PersistError::Io(err.error)),
            }
        }
        Err(PersistError::NameExhausted(base))
    }
}
