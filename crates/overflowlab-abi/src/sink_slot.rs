//! Process-wide choice of the harness sink.
//!
//! Empty by default, which routes the harness to the built-in fixed-buffer
//! sink. A C program can install its own `vulnerable_function` once at
//! startup; fuzz iterations then only take the read lock.

use overflowlab_core::SinkFn;
use parking_lot::RwLock;

static SINK_SLOT: RwLock<Option<SinkFn>> = RwLock::new(None);

/// Install `sink` (or clear the slot with `None`), returning the previous one.
pub fn install_sink(sink: Option<SinkFn>) -> Option<SinkFn> {
    std::mem::replace(&mut *SINK_SLOT.write(), sink)
}

/// The currently installed external sink, if any.
#[must_use]
pub fn installed_sink() -> Option<SinkFn> {
    *SINK_SLOT.read()
}
