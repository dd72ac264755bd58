#![no_main]
use libfuzzer_sys::fuzz_target;
use overflowlab_core::harness;

// Expected to crash once the input's C string reaches 16 bytes: the default
// sink copies it into a 16-byte stack buffer unchecked.
fuzz_target!(|data: &[u8]| {
    // SAFETY: none. The overflow is what this target is for.
    unsafe { harness::fuzz_entry(data) };
});
