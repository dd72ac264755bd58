//! Standalone runner for the overflowlab targets.
//!
//! This crate provides:
//! - Reproduce: run one testcase through a target, as a fuzzer's standalone
//!   replay would
//! - Replay: run a whole corpus directory, logging one record per input
//! - Classify: predict a testcase's overflow without executing it
//! - Structured JSONL logs with SHA-256 testcase digests, and their validation

pub mod classify;
pub mod error;
pub mod runner;
pub mod structured_log;
pub mod target;

pub use classify::{Classification, classify};
pub use error::HarnessError;
pub use runner::{ReplaySummary, RunRecord, Runner};
pub use target::Target;
