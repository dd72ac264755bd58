#![no_main]
use libfuzzer_sys::fuzz_target;
use overflowlab_core::inline;

// Expected to crash: inputs over 16 bytes smash the stack buffer, which
// AddressSanitizer reports as a stack-buffer-overflow.
fuzz_target!(|data: &[u8]| {
    // SAFETY: none. The overflow is what this target is for.
    unsafe { inline::fuzz_entry(data) };
});
