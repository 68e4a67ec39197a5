//! Logging initialization for the refresher binary.
//!
//! Writes to the terminal and to `<data dir>/logs/x-remove.log`.

use std::fs::{self, File};
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const LOG_FILE_NAME: &str = "x-remove.log";

/// Install the terminal logger plus, when possible, a file logger under `data_dir`.
pub fn initialize(level: LevelFilter, data_dir: &Path) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(file_logger) = create_file_logger(level, config, data_dir) {
        loggers.push(file_logger);
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    data_dir: &Path,
) -> Option<Box<WriteLogger<File>>> {
    let log_dir = data_dir.join("logs");
    if let Err(err) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory {:?}: {}", log_dir, err);
        return None;
    }
    let log_path = log_dir.join(LOG_FILE_NAME);
    match File::options().create(true).append(true).open(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not open log file at {:?}: {}", log_path, err);
            None
        }
    }
}
