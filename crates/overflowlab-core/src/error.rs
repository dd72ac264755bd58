use thiserror::Error;

/// Failures the harness recovers from locally.
///
/// None of these ever cross a fuzz entry point: the entry maps every error to
/// the `0` status. Memory corruption is not represented here, because the
/// targets never detect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OverflowError {
    #[error("heap allocation of {size} bytes failed")]
    AllocationFailure { size: usize },
    #[error("input of {len} bytes leaves no room for a nul terminator")]
    LayoutOverflow { len: usize },
}
