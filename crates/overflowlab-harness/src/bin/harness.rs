//! CLI entrypoint for the overflowlab runner.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use overflowlab_harness::runner::Runner;
use overflowlab_harness::structured_log::{LogEmitter, validate_log_file};
use overflowlab_harness::{HarnessError, Target, classify};
use overflowlab_membrane::{SafetyLevel, safety_level};

/// Reproduce, replay and triage inputs for the overflowlab targets.
#[derive(Debug, Parser)]
#[command(name = "overflowlab-harness")]
#[command(about = "Standalone runner for the overflowlab fuzz targets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one testcase through a target once.
    Reproduce {
        #[arg(long, value_enum)]
        target: Target,
        /// Testcase file (e.g. a crash artifact written by the fuzzer).
        #[arg(long)]
        testcase: PathBuf,
        /// Runtime mode (`vulnerable` or `hardened`). Defaults to OVERFLOWLAB_MODE.
        #[arg(long)]
        mode: Option<String>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Run every file in a corpus directory through a target.
    Replay {
        #[arg(long, value_enum)]
        target: Target,
        #[arg(long)]
        corpus: PathBuf,
        /// Runtime mode (`vulnerable` or `hardened`). Defaults to OVERFLOWLAB_MODE.
        #[arg(long)]
        mode: Option<String>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Predict a testcase's overflow without executing it.
    Classify {
        #[arg(long, value_enum)]
        target: Target,
        #[arg(long)]
        testcase: PathBuf,
    },
    /// Validate a structured JSONL log.
    ValidateLog {
        #[arg(long)]
        log: PathBuf,
    },
}

fn resolve_mode(mode: Option<String>) -> SafetyLevel {
    mode.map_or_else(safety_level, |m| SafetyLevel::from_str_loose(&m))
}

fn build_runner(
    target: Target,
    mode: Option<String>,
    log: Option<PathBuf>,
) -> Result<Runner, HarnessError> {
    let level = resolve_mode(mode);
    let runner = Runner::new(target, level);
    match log {
        Some(path) => {
            let run_id = format!("{target}-{}", std::process::id());
            Ok(runner.with_log(LogEmitter::to_file(&path, &run_id)?))
        }
        None => Ok(runner),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Reproduce {
            target,
            testcase,
            mode,
            log,
        } => {
            let mut runner = build_runner(target, mode, log)?;
            eprintln!(
                "Running {} through {} ({} mode)",
                testcase.display(),
                runner.target(),
                runner.level()
            );
            // SAFETY: reproducing the overflow is the purpose of this command.
            let record = unsafe { runner.reproduce(&testcase) }?;
            eprintln!(
                "Executed {} in {} ns: {} byte(s) past the buffer, healing {}",
                record.testcase,
                record.latency_ns,
                record.classification.overflow_bytes,
                record.healing_action.unwrap_or("disabled")
            );
        }
        Command::Replay {
            target,
            corpus,
            mode,
            log,
        } => {
            let mut runner = build_runner(target, mode, log)?;
            eprintln!(
                "Replaying {} through {} ({} mode)",
                corpus.display(),
                runner.target(),
                runner.level()
            );
            // SAFETY: as above, for every corpus entry.
            let summary = unsafe { runner.replay_dir(&corpus) }?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Classify { target, testcase } => {
            let data = std::fs::read(&testcase).map_err(|source| HarnessError::Read {
                path: testcase.clone(),
                source,
            })?;
            let classification = classify(target, &data);
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if !errors.is_empty() {
                return Err(HarnessError::InvalidLog {
                    path: log,
                    errors: errors.len(),
                }
                .into());
            }
            eprintln!("{}: {lines} valid line(s)", log.display());
        }
    }

    Ok(())
}
