//! Time and size based log file rotation
//!
//! The active file name is a strftime pattern rendered at the start of the
//! current rotation slot. Slots are aligned to the Unix epoch, so a 4 hour
//! interval always rolls over at 00:00, 04:00, ... UTC. Within one slot the
//! file can additionally roll over to numbered generations (`name.1`,
//! `name.2`, ...) once it reaches a size limit.
//!
//! After every rotation, files matching the pattern are swept: those older
//! than the retention window are deleted, and optionally only the newest
//! `max_files` are kept. The active file is never removed.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, Local, Utc};
use tracing_subscriber::fmt::MakeWriter;

use super::config::{FileConfig, TimeZoneMode};
use crate::domain::errors::{LoggerError, LoggerResult};
use crate::domain::ports::Clock;

/// A strftime file path pattern such as `./logs/%Y%m%d/info.log-%Y%m%d%H%M`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    raw: String,
    glob: String,
}

impl FilePattern {
    /// Validate and compile a pattern
    pub fn parse(raw: &str) -> LoggerResult<Self> {
        let invalid = |reason: &str| LoggerError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR) {
            return Err(invalid("pattern must name a file, not a directory"));
        }
        if StrftimeItems::new(raw).any(|item| matches!(item, Item::Error)) {
            return Err(invalid("unsupported strftime specifier"));
        }

        Ok(Self {
            raw: raw.to_string(),
            glob: to_glob(raw),
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Glob matching every file the pattern can produce
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Render the path for the instant `at`
    pub fn render(&self, at: DateTime<Utc>, zone: TimeZoneMode) -> PathBuf {
        let rendered = match zone {
            TimeZoneMode::Local => at.with_timezone(&Local).format(&self.raw).to_string(),
            TimeZoneMode::Utc => at.format(&self.raw).to_string(),
        };
        PathBuf::from(rendered)
    }
}

/// Replace every strftime specifier with `*`, escaping the literal parts
fn to_glob(raw: &str) -> String {
    let mut glob = String::with_capacity(raw.len());
    let mut literal = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        // flags and widths: %-d, %_H, %3f, %.3f, %:z
        while matches!(chars.peek(), Some('-' | '_' | '0'..='9' | '.' | ':' | '#' | '^')) {
            chars.next();
        }
        match chars.next() {
            Some('%') => literal.push('%'),
            Some(_) => {
                glob.push_str(&glob::Pattern::escape(&literal));
                literal.clear();
                if !glob.ends_with('*') {
                    glob.push('*');
                }
            }
            None => literal.push('%'),
        }
    }
    glob.push_str(&glob::Pattern::escape(&literal));
    glob
}

/// Start of the rotation slot containing `now`
pub fn slot_start(now: DateTime<Utc>, interval: StdDuration) -> DateTime<Utc> {
    let secs = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX).max(1);
    let ts = now.timestamp();
    DateTime::from_timestamp(ts - ts.rem_euclid(secs), 0).unwrap_or(now)
}

/// When files are rotated and how long they are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Length of one rotation slot
    pub interval: StdDuration,
    /// Files last modified longer ago than this are deleted
    pub max_age: Option<Duration>,
    /// Size at which the current file rolls over to the next generation
    pub max_size: Option<u64>,
    /// Maximum number of files kept, the active one included
    pub max_files: Option<usize>,
}

impl RotationPolicy {
    /// Build a policy from the file sink configuration
    pub fn from_config(config: &FileConfig) -> LoggerResult<Self> {
        if config.rotation_secs == 0 {
            return Err(LoggerError::InvalidRotation(
                "rotation_secs must be at least 1".to_string(),
            ));
        }
        if config.max_size_bytes == Some(0) {
            return Err(LoggerError::InvalidRotation(
                "max_size_bytes must be at least 1".to_string(),
            ));
        }
        if config.max_files == Some(0) {
            return Err(LoggerError::InvalidRotation(
                "max_files must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            interval: StdDuration::from_secs(config.rotation_secs),
            max_age: config.retention_days.map(|d| Duration::days(i64::from(d))),
            max_size: config.max_size_bytes,
            max_files: config.max_files,
        })
    }
}

struct ActiveFile {
    base: PathBuf,
    path: PathBuf,
    generation: u32,
    file: File,
    size: u64,
}

struct RotationState {
    pattern: FilePattern,
    policy: RotationPolicy,
    clock: Arc<dyn Clock>,
    zone: TimeZoneMode,
    active: Option<ActiveFile>,
}

/// Rotation-aware file writer
///
/// Clones share one file handle. Every write takes an internal lock, so
/// concurrent entries never interleave and the rotation boundary is atomic
/// with respect to writers.
#[derive(Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<RotationState>>,
}

impl std::fmt::Debug for RotatingFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileWriter")
            .field("current", &self.current_path())
            .finish()
    }
}

impl RotatingFileWriter {
    /// Create a writer that opens its first file on the first write
    pub fn new(
        pattern: FilePattern,
        policy: RotationPolicy,
        clock: Arc<dyn Clock>,
        zone: TimeZoneMode,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(RotationState {
                pattern,
                policy,
                clock,
                zone,
                active: None,
            })),
        }
    }

    /// Create a writer and open the file for the current slot immediately
    pub fn open(
        pattern: FilePattern,
        policy: RotationPolicy,
        clock: Arc<dyn Clock>,
        zone: TimeZoneMode,
    ) -> io::Result<Self> {
        let writer = Self::new(pattern, policy, clock, zone);
        writer.lock().ensure_current(0)?;
        Ok(writer)
    }

    /// Path of the file currently written to, if one is open
    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock().active.as_ref().map(|a| a.path.clone())
    }

    /// Apply the retention policy now; returns the number of files deleted
    pub fn sweep(&self) -> io::Result<usize> {
        self.lock().sweep()
    }

    fn lock(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RotationState {
    /// Make sure `active` points at the right file for a write of `incoming` bytes.
    /// Returns `true` when a previously open file was retired.
    fn ensure_current(&mut self, incoming: u64) -> io::Result<bool> {
        let slot = slot_start(self.clock.now(), self.policy.interval);
        let base = self.pattern.render(slot, self.zone);

        let next_generation = match &self.active {
            Some(active) if active.base == base => match self.policy.max_size {
                Some(max) if active.size > 0 && active.size + incoming > max => {
                    Some(active.generation + 1)
                }
                _ => return Ok(false),
            },
            _ => None,
        };

        let retiring = self.active.is_some();
        let next = open_active(base, next_generation.unwrap_or(0), self.policy.max_size)?;
        // dropping the previous handle closes it
        self.active = Some(next);
        Ok(retiring)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let rotated = self.ensure_current(buf.len() as u64)?;
        if rotated {
            if let Err(e) = self.sweep() {
                eprintln!("[ctxlog] log retention sweep failed: {e}");
            }
        }

        let active = self
            .active
            .as_mut()
            .ok_or_else(|| io::Error::other("no active log file"))?;
        active.file.write_all(buf)?;
        active.size += buf.len() as u64;
        Ok(buf.len())
    }

    fn sweep(&self) -> io::Result<usize> {
        if self.policy.max_age.is_none() && self.policy.max_files.is_none() {
            return Ok(0);
        }

        // compared against glob output, which drops a leading `./`
        let active_path = self.active.as_ref().map(|a| normalize(&a.path));
        let mut candidates: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
        for path in matching_files(&self.pattern)? {
            if Some(&path) == active_path.as_ref() {
                continue;
            }
            let meta = match fs::symlink_metadata(&path) {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let modified: DateTime<Utc> = meta.modified()?.into();
            candidates.push((path, modified));
        }

        let mut doomed: BTreeSet<PathBuf> = BTreeSet::new();
        if let Some(max_age) = self.policy.max_age {
            let cutoff = self.clock.now() - max_age;
            doomed.extend(
                candidates
                    .iter()
                    .filter(|(_, modified)| *modified < cutoff)
                    .map(|(path, _)| path.clone()),
            );
        }
        if let Some(max_files) = self.policy.max_files {
            let keep = max_files.saturating_sub(usize::from(active_path.is_some()));
            let mut survivors: Vec<_> = candidates
                .iter()
                .filter(|(path, _)| !doomed.contains(path))
                .collect();
            survivors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
            doomed.extend(survivors.into_iter().skip(keep).map(|(path, _)| path.clone()));
        }

        let mut deleted = 0;
        for path in &doomed {
            match fs::remove_file(path) {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            if let Some(parent) = path.parent() {
                let holds_active = active_path
                    .as_deref()
                    .and_then(Path::parent)
                    .is_some_and(|p| p == parent);
                if !holds_active {
                    // only succeeds once the directory is empty
                    let _ = fs::remove_dir(parent);
                }
            }
        }
        Ok(deleted)
    }
}

/// Drop `.` components so paths built from the pattern compare equal to glob results
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn generation_path(base: &Path, generation: u32) -> PathBuf {
    if generation == 0 {
        return base.to_path_buf();
    }
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

fn open_active(base: PathBuf, mut generation: u32, max_size: Option<u64>) -> io::Result<ActiveFile> {
    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // skip generations that are already full, e.g. after a restart
    let mut path = generation_path(&base, generation);
    if let Some(max) = max_size {
        while fs::metadata(&path).is_ok_and(|m| m.len() >= max) {
            generation += 1;
            path = generation_path(&base, generation);
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let size = file.metadata()?.len();
    Ok(ActiveFile {
        base,
        path,
        generation,
        file,
        size,
    })
}

fn matching_files(pattern: &FilePattern) -> io::Result<BTreeSet<PathBuf>> {
    let mut found = BTreeSet::new();
    let generations = format!("{}.*", pattern.glob());
    for glob_pattern in [pattern.glob(), generations.as_str()] {
        let paths = glob::glob(glob_pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        found.extend(paths.filter_map(Result::ok).map(|p| normalize(&p)));
    }
    Ok(found)
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().active.as_mut() {
            Some(active) => active.file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ManualClock;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn policy(interval_secs: u64) -> RotationPolicy {
        RotationPolicy {
            interval: StdDuration::from_secs(interval_secs),
            max_age: Some(Duration::days(30)),
            max_size: None,
            max_files: None,
        }
    }

    fn writer_in(dir: &TempDir, policy: RotationPolicy, clock: &ManualClock) -> RotatingFileWriter {
        let raw = format!("{}/%Y%m%d/info.log-%Y%m%d%H%M", dir.path().display());
        RotatingFileWriter::new(
            FilePattern::parse(&raw).unwrap(),
            policy,
            Arc::new(clock.clone()),
            TimeZoneMode::Utc,
        )
    }

    #[test]
    fn test_pattern_glob() {
        let pattern = FilePattern::parse("./logs/%Y%m%d/info.log-%Y%m%d%H%M").unwrap();
        assert_eq!(pattern.glob(), "./logs/*/info.log-*");

        let pattern = FilePattern::parse("/var/log/app-%-d.log").unwrap();
        assert_eq!(pattern.glob(), "/var/log/app-*.log");

        let pattern = FilePattern::parse("/var/log/100%%/[x]-%H").unwrap();
        assert_eq!(pattern.glob(), "/var/log/100%/[[]x[]]-*");
    }

    #[test]
    fn test_pattern_rejects_invalid() {
        assert!(FilePattern::parse("").is_err());
        assert!(FilePattern::parse("./logs/%Y/").is_err());
        assert!(FilePattern::parse("./logs/%Q.log").is_err());
    }

    #[test]
    fn test_pattern_render_utc() {
        let pattern = FilePattern::parse("./logs/%Y%m%d/info.log-%Y%m%d%H%M").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(
            pattern.render(at, TimeZoneMode::Utc),
            PathBuf::from("./logs/20240301/info.log-202403010800")
        );
    }

    #[test]
    fn test_slot_start_aligns_to_interval() {
        let four_hours = StdDuration::from_secs(4 * 3600);
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 7, 59, 59).unwrap();
        assert_eq!(
            slot_start(at, four_hours),
            Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap()
        );
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(slot_start(at, four_hours), at);
    }

    #[test]
    fn test_policy_rejects_zero_values() {
        let mut config = FileConfig::default();
        assert!(RotationPolicy::from_config(&config).is_ok());

        config.rotation_secs = 0;
        assert!(RotationPolicy::from_config(&config).is_err());

        let config = FileConfig {
            max_files: Some(0),
            ..FileConfig::default()
        };
        assert!(RotationPolicy::from_config(&config).is_err());
    }

    #[test]
    fn test_lazy_writer_opens_on_first_write() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
        let mut writer = writer_in(&dir, policy(4 * 3600), &clock);

        assert!(writer.current_path().is_none());
        writer.write_all(b"first\n").unwrap();

        let expected = dir.path().join("20240301").join("info.log-202403010800");
        assert_eq!(writer.current_path(), Some(expected.clone()));
        assert_eq!(fs::read_to_string(expected).unwrap(), "first\n");
    }

    #[test]
    fn test_boundary_crossing_switches_file() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 11, 59, 0).unwrap());
        let mut writer = writer_in(&dir, policy(4 * 3600), &clock);

        writer.write_all(b"before\n").unwrap();
        clock.advance(Duration::minutes(2));
        writer.write_all(b"after\n").unwrap();

        let old = dir.path().join("20240301").join("info.log-202403010800");
        let new = dir.path().join("20240301").join("info.log-202403011200");
        assert_eq!(fs::read_to_string(old).unwrap(), "before\n");
        assert_eq!(fs::read_to_string(&new).unwrap(), "after\n");
        assert_eq!(writer.current_path(), Some(new));
    }

    #[test]
    fn test_size_limit_rolls_generation() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap());
        let mut policy = policy(4 * 3600);
        policy.max_size = Some(10);
        let mut writer = writer_in(&dir, policy, &clock);

        writer.write_all(b"123456\n").unwrap();
        writer.write_all(b"abcdef\n").unwrap();
        writer.write_all(b"ghijkl\n").unwrap();

        let base = dir.path().join("20240301").join("info.log-202403010000");
        assert_eq!(fs::read_to_string(&base).unwrap(), "123456\n");
        assert_eq!(
            fs::read_to_string(generation_path(&base, 1)).unwrap(),
            "abcdef\n"
        );
        assert_eq!(
            fs::read_to_string(generation_path(&base, 2)).unwrap(),
            "ghijkl\n"
        );
    }

    #[test]
    fn test_full_generation_skipped_on_open() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap());
        let base = dir.path().join("20240301").join("info.log-202403010000");
        fs::create_dir_all(base.parent().unwrap()).unwrap();
        fs::write(&base, b"0123456789").unwrap();

        let mut policy = policy(4 * 3600);
        policy.max_size = Some(10);
        let mut writer = writer_in(&dir, policy, &clock);
        writer.write_all(b"next\n").unwrap();

        assert_eq!(writer.current_path(), Some(generation_path(&base, 1)));
        assert_eq!(fs::read_to_string(&base).unwrap(), "0123456789");
    }

    #[test]
    fn test_max_files_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        let mut policy = policy(3600);
        policy.max_age = None;
        policy.max_files = Some(2);
        let mut writer = writer_in(&dir, policy, &clock);

        for _ in 0..4 {
            writer.write_all(b"entry\n").unwrap();
            clock.advance(Duration::hours(1));
            // distinct mtimes for ordering
            std::thread::sleep(StdDuration::from_millis(20));
        }
        writer.write_all(b"entry\n").unwrap();

        let remaining: Vec<_> = fs::read_dir(dir.path().join("20240301"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(remaining.len(), 2, "{remaining:?}");
        assert!(remaining.contains(&"info.log-202403010400".to_string()));
        assert!(remaining.contains(&"info.log-202403010300".to_string()));
    }

    #[test]
    fn test_sweep_without_limits_is_noop() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Utc::now());
        let mut policy = policy(3600);
        policy.max_age = None;
        let mut writer = writer_in(&dir, policy, &clock);
        writer.write_all(b"x\n").unwrap();
        assert_eq!(writer.sweep().unwrap(), 0);
    }

    #[test]
    fn test_normalize_matches_glob_form() {
        assert_eq!(
            normalize(Path::new("./logs/20240301/info.log-202403011200")),
            PathBuf::from("logs/20240301/info.log-202403011200")
        );
        assert_eq!(
            normalize(Path::new("/var/log/./app.log")),
            PathBuf::from("/var/log/app.log")
        );
    }
}
