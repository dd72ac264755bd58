//! Runtime mode configuration.
//!
//! The runtime mode is set via the `OVERFLOWLAB_MODE` environment variable:
//! - `vulnerable` (default): the targets copy without bounds checks. Writes past
//!   the fixed buffers are the observable behavior under test and are left for
//!   external instrumentation (ASan, a debugger) to catch.
//! - `hardened`: opt-in safe variant. Copies are clamped to the destination and
//!   nul-terminated; every clamp is recorded in the healing policy.
//!
//! The mode is only consulted by the `*_for_mode` dispatchers and the ABI
//! entry points. The plain vulnerable functions never read it.

use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable that selects the runtime mode.
pub const MODE_ENV_VAR: &str = "OVERFLOWLAB_MODE";

/// Runtime operating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Unchecked copies into fixed buffers. The fuzzing target as shipped.
    #[default]
    Vulnerable,
    /// Copies clamped to the destination capacity, always nul-terminated.
    Hardened,
}

impl SafetyLevel {
    /// Parse from string (case-insensitive). Unknown values stay vulnerable,
    /// so a typo never silently turns the target safe.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardened" | "safe" | "repair" | "clamp" => Self::Hardened,
            _ => Self::Vulnerable,
        }
    }

    /// Returns true if copies should be clamped and healed.
    #[must_use]
    pub const fn heals_enabled(self) -> bool {
        matches!(self, Self::Hardened)
    }

    /// Stable lowercase name used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vulnerable => "vulnerable",
            Self::Hardened => "hardened",
        }
    }
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Atomic cache: 0=unresolved, 1=Vulnerable, 2=Hardened, 255=resolving.
// Fuzz workers call the ABI entry points millions of times, so the env var is
// read once per process.
static CACHED_LEVEL: AtomicU8 = AtomicU8::new(0);

const LEVEL_UNRESOLVED: u8 = 0;
const LEVEL_VULNERABLE: u8 = 1;
const LEVEL_HARDENED: u8 = 2;
const LEVEL_RESOLVING: u8 = 255;

fn level_to_u8(level: SafetyLevel) -> u8 {
    match level {
        SafetyLevel::Vulnerable => LEVEL_VULNERABLE,
        SafetyLevel::Hardened => LEVEL_HARDENED,
    }
}

fn u8_to_level(v: u8) -> SafetyLevel {
    match v {
        LEVEL_HARDENED => SafetyLevel::Hardened,
        _ => SafetyLevel::Vulnerable,
    }
}

/// Get the configured safety level (reads env var on first call, caches thereafter).
///
/// A call racing the first resolution sees `Vulnerable`, which is also the
/// default when the variable is unset.
#[must_use]
pub fn safety_level() -> SafetyLevel {
    let cached = CACHED_LEVEL.load(Ordering::Relaxed);

    if cached != LEVEL_UNRESOLVED && cached != LEVEL_RESOLVING {
        return u8_to_level(cached);
    }
    if cached == LEVEL_RESOLVING {
        return SafetyLevel::Vulnerable;
    }

    if CACHED_LEVEL
        .compare_exchange(
            LEVEL_UNRESOLVED,
            LEVEL_RESOLVING,
            Ordering::SeqCst,
            Ordering::Relaxed,
        )
        .is_err()
    {
        let v = CACHED_LEVEL.load(Ordering::Relaxed);
        return if v != LEVEL_UNRESOLVED && v != LEVEL_RESOLVING {
            u8_to_level(v)
        } else {
            SafetyLevel::Vulnerable
        };
    }

    let level = std::env::var(MODE_ENV_VAR)
        .map(|v| SafetyLevel::from_str_loose(&v))
        .unwrap_or_default();
    CACHED_LEVEL.store(level_to_u8(level), Ordering::Release);
    level
}
