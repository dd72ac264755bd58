use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use overflowlab_core::{harness, inline};
use overflowlab_membrane::{HealingAction, SafetyLevel};

/// Which fuzz entry point a testcase is fed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// 16-byte stack buffer, copied inline.
    Inline,
    /// Terminated heap copy handed to the vulnerable sink.
    Harness,
}

impl Target {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Harness => "harness",
        }
    }

    /// Run `data` through the entry point in the given mode and return the
    /// healing the hardened path applied.
    ///
    /// # Safety
    ///
    /// In [`SafetyLevel::Vulnerable`] mode an oversized input corrupts the
    /// stack of the calling process.
    pub unsafe fn execute(self, data: &[u8], level: SafetyLevel) -> HealingAction {
        match self {
            Self::Inline => unsafe { inline::run_for_mode(data, level) },
            Self::Harness => unsafe { harness::run_for_mode(data, level) },
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
