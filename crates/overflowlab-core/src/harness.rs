//! Harness-wrapped vulnerable function.
//!
//! Mirrors the classic libFuzzer harness around a C API that wants a string:
//! copy the input to the heap, terminate it, hand it to the sink, free it.
//! Allocation failure is the only handled error.

use overflowlab_membrane::{HealingAction, SafetyLevel};

use crate::alloc::{RawAllocator, ScopedCString, SystemAllocator};
use crate::sink::{DEFAULT_SINK_LEN, FixedBufferSink, HardenedSink, Sink};

/// Run one input through `sink` using `alloc` for the terminated copy.
///
/// Returns `0` on every path. When the allocation fails nothing is copied and
/// the sink is not called.
///
/// # Safety
///
/// Same contract as [`Sink::consume`] for the given sink.
pub unsafe fn harness_entry<S, A>(data: &[u8], sink: &S, alloc: &A) -> i32
where
    S: Sink + ?Sized,
    A: RawAllocator + ?Sized,
{
    let Ok(mut buf) = ScopedCString::acquire(data, alloc) else {
        return 0;
    };
    // SAFETY: forwarded caller contract.
    unsafe { sink.consume(buf.sink_input()) };
    0
}

/// Fuzz entry for the harness target with the default vulnerable sink.
///
/// # Safety
///
/// Inputs whose C string is longer than 15 bytes overflow the sink's stack
/// buffer.
pub unsafe fn fuzz_entry(data: &[u8]) -> i32 {
    unsafe { harness_entry(data, &FixedBufferSink::<DEFAULT_SINK_LEN>, &SystemAllocator) }
}

/// Run the harness target with the default sink for `level` and return the
/// healing the sink applied.
///
/// # Safety
///
/// With [`SafetyLevel::Vulnerable`], same contract as [`fuzz_entry`].
pub unsafe fn run_for_mode(data: &[u8], level: SafetyLevel) -> HealingAction {
    match level {
        SafetyLevel::Vulnerable => {
            unsafe { fuzz_entry(data) };
            HealingAction::None
        }
        SafetyLevel::Hardened => {
            let sink = HardenedSink::<DEFAULT_SINK_LEN>::new();
            // SAFETY: the hardened sink performs bounded copies only.
            unsafe { harness_entry(data, &sink, &SystemAllocator) };
            sink.last_action()
        }
    }
}

/// Fuzz entry dispatching between the vulnerable and hardened default sinks.
///
/// # Safety
///
/// Same contract as [`run_for_mode`].
pub unsafe fn fuzz_entry_for_mode(data: &[u8], level: SafetyLevel) -> i32 {
    unsafe { run_for_mode(data, level) };
    0
}
