//! Static overflow analysis of a testcase.
//!
//! Predicts what a target's unchecked copy would do with an input without
//! running it. `classify` is how a crash can be triaged after the fact, and
//! the runner logs it before every execution.

use serde::{Deserialize, Serialize};

use overflowlab_core::{BUFFER_LEN, DEFAULT_SINK_LEN};

use crate::target::Target;

/// Predicted effect of one input on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub target: Target,
    pub input_len: usize,
    /// Bytes the unchecked copy writes.
    pub copy_len: usize,
    /// Capacity of the buffer the copy lands in.
    pub capacity: usize,
    /// Bytes written past `capacity`.
    pub overflow_bytes: usize,
    /// The inline target's print runs past the buffer (no nul in the first
    /// `capacity` bytes).
    pub reads_past_buffer: bool,
}

impl Classification {
    #[must_use]
    pub const fn overflows(&self) -> bool {
        self.overflow_bytes > 0
    }
}

/// Classify `data` for `target`.
#[must_use]
pub fn classify(target: Target, data: &[u8]) -> Classification {
    let (copy_len, capacity, reads_past_buffer) = match target {
        // Empty input never reaches the copy.
        Target::Inline => {
            let unterminated =
                !data.is_empty() && !data.iter().take(BUFFER_LEN).any(|&b| b == 0);
            (data.len(), BUFFER_LEN, unterminated)
        }
        // The sink copies the C string, terminator included.
        Target::Harness => {
            let strlen = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            (strlen + 1, DEFAULT_SINK_LEN, false)
        }
    };

    Classification {
        target,
        input_len: data.len(),
        copy_len,
        capacity,
        overflow_bytes: copy_len.saturating_sub(capacity),
        reads_past_buffer,
    }
}
