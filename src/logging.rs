use crate::app_dirs::AppDirs;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::{self, OpenOptions};
use std::path::Path;

pub fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Send log output to the state-dir log file; the terminal belongs to the TUI.
/// Logging stays disabled if the file cannot be opened.
pub fn init(verbose: bool) {
    if let Some(path) = AppDirs::log_path() {
        init_at(&path, verbose);
    }
}

pub fn init_at(path: &Path, verbose: bool) {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = WriteLogger::init(level(verbose), log_config, log_file);
    }
}
