//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ctxlog::{Clock, LockedWriter, LogConfig, Logger, ManualClock, TimeZoneMode};
use serde_json::Value;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// 2024-03-01 at the given UTC hour and minute
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

/// Default configuration writing files under `dir`, timestamps in UTC
pub fn config_in(dir: &Path) -> LogConfig {
    let mut config = LogConfig::default();
    config.file.pattern = format!("{}/%Y%m%d/info.log-%Y%m%d%H%M", dir.display());
    config.encoder.time_zone = TimeZoneMode::Utc;
    config
}

/// Build a logger with a captured console and a manual clock
pub fn logger_with(config: LogConfig, clock: &ManualClock) -> (Logger, LockedWriter<Vec<u8>>) {
    let console = LockedWriter::buffer();
    let (logger, status) = Logger::builder(config)
        .clock(Arc::new(clock.clone()) as Arc<dyn Clock>)
        .console_writer(console.clone())
        .build()
        .expect("Failed to build logger");
    assert!(status.is_ready(), "unexpected status: {status:?}");
    (logger, console)
}

/// Parse newline-delimited JSON
pub fn parse_lines(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_str(l).expect("each line should be JSON"))
        .collect()
}

/// Entries written to `path`
pub fn read_entries(path: &Path) -> Vec<Value> {
    parse_lines(&std::fs::read_to_string(path).expect("Failed to read log file"))
}

/// All regular files below `dir`, sorted
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!("{}/**/*", dir.display());
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}
