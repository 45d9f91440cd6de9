use serde::{Deserialize, Serialize};

use crate::domain::models::DurationUnit;

/// Default file name pattern: one directory per day, one file per rotation slot
pub const DEFAULT_FILE_PATTERN: &str = "./logs/%Y%m%d/info.log-%Y%m%d%H%M";

/// Default rotation interval (4 hours)
pub const DEFAULT_ROTATION_SECS: u64 = 4 * 60 * 60;

/// Default retention window (30 days)
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Default timestamp layout for the `ts` key
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// Console sink
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Rotating file sink
    #[serde(default)]
    pub file: FileConfig,

    /// Encoding shared by both sinks
    #[serde(default)]
    pub encoder: EncoderConfig,
}

/// Console sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Enable console logging
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum level (trace, debug, info, warn, error)
    #[serde(default = "default_console_level")]
    pub level: String,

    /// Stream written to
    #[serde(default)]
    pub target: ConsoleTarget,

    /// Optional `EnvFilter` directive, e.g. `"info,hyper=warn"`
    #[serde(default)]
    pub filter: Option<String>,
}

/// Console stream
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

/// Rotating file sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    /// Enable file logging
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum level (trace, debug, info, warn, error)
    #[serde(default = "default_file_level")]
    pub level: String,

    /// strftime pattern for the file path; directories are created as needed
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Seconds per rotation slot
    #[serde(default = "default_rotation_secs")]
    pub rotation_secs: u64,

    /// Delete rotated files older than this many days (`None` keeps everything)
    #[serde(default = "default_retention_days")]
    pub retention_days: Option<u32>,

    /// Roll over to a numbered generation once the current file reaches this size
    #[serde(default)]
    pub max_size_bytes: Option<u64>,

    /// Keep at most this many files matching the pattern
    #[serde(default)]
    pub max_files: Option<usize>,

    /// Hand writes to a background worker instead of writing on the caller's thread
    #[serde(default)]
    pub non_blocking: bool,

    /// Optional `EnvFilter` directive
    #[serde(default)]
    pub filter: Option<String>,
}

/// Time zone used for `ts` and for rendering file names
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    #[default]
    Local,
    Utc,
}

/// Key names and value encodings of a log line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderConfig {
    #[serde(default = "default_message_key")]
    pub message_key: String,

    #[serde(default = "default_level_key")]
    pub level_key: String,

    #[serde(default = "default_time_key")]
    pub time_key: String,

    #[serde(default = "default_caller_key")]
    pub caller_key: String,

    /// strftime layout for the time key
    #[serde(default = "default_time_format")]
    pub time_format: String,

    #[serde(default)]
    pub time_zone: TimeZoneMode,

    /// Unit for duration fields, applied to both sinks
    #[serde(default)]
    pub duration_unit: DurationUnit,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_console_level(),
            target: ConsoleTarget::default(),
            filter: None,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_file_level(),
            pattern: default_pattern(),
            rotation_secs: default_rotation_secs(),
            retention_days: default_retention_days(),
            max_size_bytes: None,
            max_files: None,
            non_blocking: false,
            filter: None,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            message_key: default_message_key(),
            level_key: default_level_key(),
            time_key: default_time_key(),
            caller_key: default_caller_key(),
            time_format: default_time_format(),
            time_zone: TimeZoneMode::default(),
            duration_unit: DurationUnit::default(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_console_level() -> String {
    "debug".to_string()
}

fn default_file_level() -> String {
    "info".to_string()
}

fn default_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

const fn default_rotation_secs() -> u64 {
    DEFAULT_ROTATION_SECS
}

#[allow(clippy::unnecessary_wraps)]
const fn default_retention_days() -> Option<u32> {
    Some(DEFAULT_RETENTION_DAYS)
}

fn default_message_key() -> String {
    "msg".to_string()
}

fn default_level_key() -> String {
    "level".to_string()
}

fn default_time_key() -> String {
    "ts".to_string()
}

fn default_caller_key() -> String {
    "file".to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = LogConfig::default();
        assert_eq!(config.console.level, "debug");
        assert_eq!(config.file.level, "info");
        assert_eq!(config.file.pattern, "./logs/%Y%m%d/info.log-%Y%m%d%H%M");
        assert_eq!(config.file.rotation_secs, 14_400);
        assert_eq!(config.file.retention_days, Some(30));
        assert_eq!(config.encoder.message_key, "msg");
        assert_eq!(config.encoder.level_key, "level");
        assert_eq!(config.encoder.time_key, "ts");
        assert_eq!(config.encoder.caller_key, "file");
        assert_eq!(config.encoder.duration_unit, DurationUnit::Millis);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r"
file:
  level: warn
  max_size_bytes: 1048576
encoder:
  time_zone: utc
";
        let config: LogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.file.level, "warn");
        assert_eq!(config.file.max_size_bytes, Some(1_048_576));
        assert_eq!(config.file.rotation_secs, DEFAULT_ROTATION_SECS);
        assert!(config.console.enabled);
        assert_eq!(config.encoder.time_zone, TimeZoneMode::Utc);
        assert_eq!(config.encoder.time_key, "ts");
    }
}
