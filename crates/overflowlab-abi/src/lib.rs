// Every export takes raw pointers from a fuzzing engine or C caller; the
// contracts are the libFuzzer ones and are documented once here.
#![allow(clippy::missing_safety_doc)]
//! # overflowlab-abi
//!
//! C ABI boundary for the overflowlab targets.
//!
//! ```text
//! engine -> *_test_one_input (this crate) -> mode dispatch -> overflowlab-core target
//! ```
//!
//! Both entry points have the libFuzzer shape `(const uint8_t *, size_t) -> int`
//! and always return `0`. The mode comes from `OVERFLOWLAB_MODE` and defaults
//! to the vulnerable targets.
//!
//! With the `libfuzzer-inline` or `libfuzzer-harness` feature, the matching
//! entry is also exported as `LLVMFuzzerTestOneInput`, so the static library
//! links straight into a libFuzzer or AFL++ driver.

#[cfg(all(feature = "libfuzzer-inline", feature = "libfuzzer-harness"))]
compile_error!("enable at most one of `libfuzzer-inline` and `libfuzzer-harness`");

mod sink_slot;

use libc::c_int;

use overflowlab_core::harness::{self, harness_entry};
use overflowlab_core::{ExternSink, SinkFn, SystemAllocator, inline};
use overflowlab_membrane::{SafetyLevel, safety_level};

pub use sink_slot::{install_sink, installed_sink};

/// Engines may pass a dangling or null pointer with a zero size.
unsafe fn input_slice<'a>(data: *const u8, size: usize) -> &'a [u8] {
    if data.is_null() || size == 0 {
        &[]
    } else {
        // SAFETY: the engine guarantees `size` readable bytes at `data`.
        unsafe { std::slice::from_raw_parts(data, size) }
    }
}

/// Inline target: unchecked copy into a 16-byte stack buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn overflowlab_inline_test_one_input(data: *const u8, size: usize) -> c_int {
    let input = unsafe { input_slice(data, size) };
    unsafe { inline::fuzz_entry_for_mode(input, safety_level()) }
}

/// Harness target: terminated heap copy handed to the installed sink.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn overflowlab_harness_test_one_input(
    data: *const u8,
    size: usize,
) -> c_int {
    unsafe { harness_test_one_input_for(safety_level(), data, size) }
}

/// [`overflowlab_harness_test_one_input`] with an explicit mode.
///
/// An installed external sink is only used in vulnerable mode. Hardened mode
/// always uses the bounded built-in sink.
pub unsafe fn harness_test_one_input_for(
    level: SafetyLevel,
    data: *const u8,
    size: usize,
) -> c_int {
    let input = unsafe { input_slice(data, size) };
    match (level, installed_sink()) {
        (SafetyLevel::Vulnerable, Some(sink)) => unsafe {
            harness_entry(input, &ExternSink(sink), &SystemAllocator)
        },
        _ => unsafe { harness::fuzz_entry_for_mode(input, level) },
    }
}

/// Point the harness target at an external `vulnerable_function`.
/// Passing null restores the built-in sink.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn overflowlab_set_sink(sink: Option<SinkFn>) {
    install_sink(sink);
}

/// Built-in `vulnerable_function`: unchecked copy into a 16-byte buffer.
#[cfg(feature = "default-sink")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vulnerable_function(input: *mut libc::c_char) {
    use overflowlab_core::{DEFAULT_SINK_LEN, FixedBufferSink, Sink, SinkInput};

    if let Some(view) = unsafe { SinkInput::from_raw(input) } {
        unsafe { FixedBufferSink::<DEFAULT_SINK_LEN>.consume(view) };
    }
}

#[cfg(feature = "libfuzzer-inline")]
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn LLVMFuzzerTestOneInput(data: *const u8, size: usize) -> c_int {
    unsafe { overflowlab_inline_test_one_input(data, size) }
}

#[cfg(feature = "libfuzzer-harness")]
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn LLVMFuzzerTestOneInput(data: *const u8, size: usize) -> c_int {
    unsafe { overflowlab_harness_test_one_input(data, size) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_or_empty_input_is_empty_slice() {
        // SAFETY: null is never dereferenced.
        assert!(unsafe { input_slice(std::ptr::null(), 10) }.is_empty());
        let byte = 1_u8;
        // SAFETY: size 0.
        assert!(unsafe { input_slice(&byte, 0) }.is_empty());
    }

    #[test]
    fn input_slice_views_engine_bytes() {
        let data = [1_u8, 2, 3];
        // SAFETY: three readable bytes.
        assert_eq!(unsafe { input_slice(data.as_ptr(), 3) }, &data);
    }
}
