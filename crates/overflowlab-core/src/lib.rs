//! Deliberately vulnerable stack-overflow targets.
//!
//! Two independent fuzz targets live here:
//!
//! - [`inline`]: copies the input into a 16-byte stack buffer with no bounds
//!   check and prints it.
//! - [`harness`]: copies the input to a nul-terminated heap buffer and passes
//!   it to a [`sink::Sink`] that performs the unchecked copy one frame deeper.
//!
//! The unchecked copies are the product. They are `unsafe fn`s because they
//! are undefined behavior for long inputs, and they stay that way: bounds
//! checks exist only in the separately named hardened variants, selected with
//! [`overflowlab_membrane::SafetyLevel::Hardened`].

pub mod alloc;
pub mod error;
pub mod harness;
pub mod inline;
pub mod sink;

pub use alloc::{FailingAllocator, RawAllocator, ScopedCString, SystemAllocator};
pub use error::OverflowError;
pub use inline::{BUFFER_LEN, CopyReport, StackFrame};
pub use sink::{
    DEFAULT_SINK_LEN, ExternSink, FixedBufferSink, HardenedSink, Sink, SinkFn, SinkInput,
};
