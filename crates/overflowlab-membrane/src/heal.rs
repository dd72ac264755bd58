//! Healing policy for the hardened mode.
//!
//! In hardened mode an oversized string copy is not performed as requested.
//! The policy decides how far the copy is truncated, and the counters record
//! every truncation so a replay can report how often the unsafe path would
//! have been taken.

use std::sync::atomic::{AtomicU64, Ordering};

/// Actions the hardened path can take instead of an unchecked copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealingAction {
    /// Truncate a string copy and keep room for the nul terminator.
    TruncateWithNull { requested: usize, truncated: usize },
    /// No healing needed.
    None,
}

impl HealingAction {
    /// Returns true if this action represents an actual healing (not None).
    #[must_use]
    pub const fn is_heal(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Number of bytes the copy is allowed to write, given what was requested.
    #[must_use]
    pub const fn effective_len(&self, requested: usize) -> usize {
        match self {
            Self::TruncateWithNull { truncated, .. } => *truncated,
            Self::None => requested,
        }
    }

    /// Stable label for structured logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TruncateWithNull { .. } => "TruncateWithNull",
            Self::None => "None",
        }
    }
}

/// Point-in-time copy of the policy counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealingStats {
    pub total_heals: u64,
    pub null_truncations: u64,
}

/// Policy engine that decides which healing action to apply.
pub struct HealingPolicy {
    /// Total heals applied.
    pub total_heals: AtomicU64,
    /// Null truncations applied.
    pub null_truncations: AtomicU64,
}

impl HealingPolicy {
    /// Create a new policy with zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_heals: AtomicU64::new(0),
            null_truncations: AtomicU64::new(0),
        }
    }

    /// Record a healing action.
    pub fn record(&self, action: &HealingAction) {
        if action.is_heal() {
            self.total_heals.fetch_add(1, Ordering::Relaxed);
        }

        if let HealingAction::TruncateWithNull { .. } = action {
            self.null_truncations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Decide healing for a string copy of `src_len` bytes (terminator not
    /// counted) into a buffer of `dst_capacity` bytes.
    #[must_use]
    pub fn heal_string_bounds(&self, src_len: usize, dst_capacity: usize) -> HealingAction {
        if src_len >= dst_capacity {
            HealingAction::TruncateWithNull {
                requested: src_len,
                truncated: dst_capacity.saturating_sub(1),
            }
        } else {
            HealingAction::None
        }
    }

    /// Snapshot the counters.
    #[must_use]
    pub fn stats(&self) -> HealingStats {
        HealingStats {
            total_heals: self.total_heals.load(Ordering::Relaxed),
            null_truncations: self.null_truncations.load(Ordering::Relaxed),
        }
    }
}

impl Default for HealingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Global healing policy instance.
static GLOBAL_POLICY: HealingPolicy = HealingPolicy::new();

/// Access the global healing policy.
#[must_use]
pub fn global_healing_policy() -> &'static HealingPolicy {
    &GLOBAL_POLICY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_heal_when_string_fits() {
        let policy = HealingPolicy::new();
        assert_eq!(policy.heal_string_bounds(0, 16), HealingAction::None);
        assert_eq!(HealingAction::None.effective_len(7), 7);
    }

    #[test]
    fn truncate_string_leaves_room_for_terminator() {
        let policy = HealingPolicy::new();
        assert_eq!(
            policy.heal_string_bounds(16, 16),
            HealingAction::TruncateWithNull {
                requested: 16,
                truncated: 15
            }
        );
        assert_eq!(policy.heal_string_bounds(15, 16), HealingAction::None);
    }

    #[test]
    fn zero_capacity_truncates_to_empty() {
        let policy = HealingPolicy::new();
        let action = policy.heal_string_bounds(3, 0);
        assert_eq!(action.effective_len(3), 0);
    }

    #[test]
    fn record_increments_counters() {
        let policy = HealingPolicy::new();
        policy.record(&HealingAction::TruncateWithNull {
            requested: 20,
            truncated: 15,
        });
        policy.record(&HealingAction::TruncateWithNull {
            requested: 30,
            truncated: 15,
        });
        policy.record(&HealingAction::None);

        let stats = policy.stats();
        assert_eq!(
            stats,
            HealingStats {
                total_heals: 2,
                null_truncations: 2
            }
        );
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(HealingAction::None.label(), "None");
        assert!(!HealingAction::None.is_heal());
        let truncate = HealingAction::TruncateWithNull {
            requested: 2,
            truncated: 1,
        };
        assert_eq!(truncate.label(), "TruncateWithNull");
        assert!(truncate.is_heal());
    }
}
