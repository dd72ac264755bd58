//! Mode selection and hardened-mode policy for overflowlab.
//!
//! The vulnerable targets in `overflowlab-core` never consult this crate on
//! their unchecked path. It only backs the opt-in hardened variants and the
//! mode dispatch used by the ABI entry points.

pub mod config;
pub mod heal;

pub use config::{MODE_ENV_VAR, SafetyLevel, safety_level};
pub use heal::{HealingAction, HealingPolicy, HealingStats, global_healing_policy};
