//! In-process reproduce and replay.
//!
//! Each testcase is classified and logged before it runs, then executed once
//! through the chosen entry point. In vulnerable mode an overflowing testcase
//! may crash the process (or trip ASan); the `testcase_start` line already
//! written identifies it.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use sha2::{Digest, Sha256};

use overflowlab_membrane::{SafetyLevel, global_healing_policy};

use crate::classify::{Classification, classify};
use crate::error::HarnessError;
use crate::structured_log::{LogEmitter, LogLevel, Outcome};
use crate::target::Target;

/// Result of running one testcase.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub testcase: String,
    pub sha256: String,
    pub classification: Classification,
    /// Healing label for hardened runs, absent for vulnerable ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healing_action: Option<&'static str>,
    pub latency_ns: u64,
}

impl RunRecord {
    #[must_use]
    pub fn healed(&self) -> bool {
        self.healing_action.is_some_and(|label| label != "None")
    }
}

/// Aggregate of a corpus replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub target: Target,
    pub mode: String,
    pub executed: usize,
    pub overflowing: usize,
    /// Testcases the hardened path had to truncate.
    pub healed: usize,
    pub records: Vec<RunRecord>,
}

/// Lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Regular files directly under `dir`, sorted by path.
pub fn corpus_files(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let read_err = |source: std::io::Error| HarnessError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Process-wide healing counters, for the replay summary.
fn healing_policy_details() -> serde_json::Value {
    let stats = global_healing_policy().stats();
    serde_json::json!({
        "total_heals": stats.total_heals,
        "null_truncations": stats.null_truncations,
    })
}

/// Runs testcases through one target in one mode.
pub struct Runner {
    target: Target,
    level: SafetyLevel,
    log: Option<LogEmitter>,
}

impl Runner {
    #[must_use]
    pub fn new(target: Target, level: SafetyLevel) -> Self {
        Self {
            target,
            level,
            log: None,
        }
    }

    #[must_use]
    pub fn with_log(mut self, log: LogEmitter) -> Self {
        self.log = Some(log);
        self
    }

    #[must_use]
    pub fn target(&self) -> Target {
        self.target
    }

    #[must_use]
    pub fn level(&self) -> SafetyLevel {
        self.level
    }

    /// Execute one testcase.
    ///
    /// # Safety
    ///
    /// Same contract as [`Target::execute`].
    pub unsafe fn run_one(&mut self, name: &str, data: &[u8]) -> Result<RunRecord, HarnessError> {
        let sha256 = sha256_hex(data);
        let classification = classify(self.target, data);

        if let Some(log) = self.log.as_mut() {
            let entry = log
                .entry(LogLevel::Info, "testcase_start")
                .with_target(self.target)
                .with_mode(self.level.as_str())
                .with_testcase(name, data.len(), &sha256)
                .with_overflow_bytes(classification.overflow_bytes)
                .with_details(serde_json::to_value(classification)?);
            log.emit_entry(entry)?;
        }

        let started = Instant::now();
        let action = unsafe { self.target.execute(data, self.level) };
        let healing_action = self.level.heals_enabled().then(|| action.label());
        let latency_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);

        if let Some(log) = self.log.as_mut() {
            let level = if classification.overflows() && !self.level.heals_enabled() {
                // Survived an overflowing copy; worth a look under ASan.
                LogLevel::Warn
            } else {
                LogLevel::Info
            };
            let mut entry = log
                .entry(level, "testcase_done")
                .with_target(self.target)
                .with_mode(self.level.as_str())
                .with_testcase(name, data.len(), &sha256)
                .with_outcome(Outcome::Pass)
                .with_latency_ns(latency_ns);
            if let Some(label) = healing_action {
                entry = entry.with_healing_action(label);
            }
            log.emit_entry(entry)?;
        }

        Ok(RunRecord {
            testcase: name.to_string(),
            sha256,
            classification,
            healing_action,
            latency_ns,
        })
    }

    /// Read and execute one testcase file.
    ///
    /// # Safety
    ///
    /// Same contract as [`Target::execute`].
    pub unsafe fn reproduce(&mut self, path: &Path) -> Result<RunRecord, HarnessError> {
        let data = std::fs::read(path).map_err(|source| HarnessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        unsafe { self.run_one(&path.display().to_string(), &data) }
    }

    /// Execute every file in `dir`, in path order.
    ///
    /// # Safety
    ///
    /// Same contract as [`Target::execute`], for every file.
    pub unsafe fn replay_dir(&mut self, dir: &Path) -> Result<ReplaySummary, HarnessError> {
        let files = corpus_files(dir)?;
        if files.is_empty() {
            return Err(HarnessError::EmptyCorpus(dir.to_path_buf()));
        }

        let mut records = Vec::with_capacity(files.len());
        for path in &files {
            records.push(unsafe { self.reproduce(path) }?);
        }

        let overflowing = records
            .iter()
            .filter(|r| r.classification.overflows())
            .count();
        let healed = records.iter().filter(|r| r.healed()).count();
        let summary = ReplaySummary {
            target: self.target,
            mode: self.level.as_str().to_string(),
            executed: records.len(),
            overflowing,
            healed,
            records,
        };

        if let Some(log) = self.log.as_mut() {
            let entry = log
                .entry(LogLevel::Info, "replay_summary")
                .with_target(self.target)
                .with_mode(self.level.as_str())
                .with_outcome(Outcome::Pass)
                .with_artifacts(files.iter().map(|p| p.display().to_string()).collect())
                .with_details(serde_json::json!({
                    "executed": summary.executed,
                    "overflowing": summary.overflowing,
                    "healed": summary.healed,
                    "policy": healing_policy_details(),
                }));
            log.emit_entry(entry)?;
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardened_harness_reports_applied_action() {
        let mut runner = Runner::new(Target::Harness, SafetyLevel::Hardened);
        assert_eq!(runner.target(), Target::Harness);
        // SAFETY: hardened mode performs no unchecked copy.
        let long = unsafe { runner.run_one("long", &[b'x'; 30]) }.unwrap();
        assert_eq!(long.healing_action, Some("TruncateWithNull"));
        // An interior nul keeps the sink's C string short.
        // SAFETY: as above.
        let cut = unsafe { runner.run_one("cut", b"ab\0cccccccccccccccccccc") }.unwrap();
        assert_eq!(cut.healing_action, Some("None"));
        assert!(!cut.healed());
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hardened_run_records_classification() {
        let mut runner = Runner::new(Target::Inline, SafetyLevel::Hardened);
        // SAFETY: hardened mode performs no unchecked copy.
        let record = unsafe { runner.run_one("aaaa", &[b'A'; 20]) }.unwrap();
        assert_eq!(record.classification.overflow_bytes, 4);
        assert_eq!(record.healing_action, Some("TruncateWithNull"));
        assert!(record.healed());
        assert_eq!(record.testcase, "aaaa");
    }

    #[test]
    fn vulnerable_harness_run_with_short_input() {
        let mut runner = Runner::new(Target::Harness, SafetyLevel::Vulnerable);
        // SAFETY: 5 bytes plus terminator fit the 16-byte sink.
        let record = unsafe { runner.run_one("short", b"hello") }.unwrap();
        assert!(!record.classification.overflows());
        assert_eq!(record.healing_action, None);
        assert!(!record.healed());
    }
}
