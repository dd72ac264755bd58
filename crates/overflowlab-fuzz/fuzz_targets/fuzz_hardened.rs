#![no_main]
use libfuzzer_sys::fuzz_target;
use overflowlab_core::harness;
use overflowlab_core::inline::{self, BUFFER_LEN, FRAME_FILL, StackFrame};
use overflowlab_membrane::SafetyLevel;

// Both targets in hardened mode must survive anything, and the bounded frame
// copy must never touch the bytes after the buffer.
fuzz_target!(|data: &[u8]| {
    // SAFETY: hardened paths perform bounded copies only.
    unsafe {
        inline::fuzz_entry_for_mode(data, SafetyLevel::Hardened);
        harness::fuzz_entry_for_mode(data, SafetyLevel::Hardened);
    }

    let mut frame = StackFrame::new();
    let action = inline::process_into_frame_hardened(&mut frame, data);
    let kept = action.effective_len(data.len());
    assert!(kept < BUFFER_LEN);
    assert_eq!(&frame.buffer()[..kept], &data[..kept]);
    assert_eq!(frame.buffer()[kept], 0);
    assert!(frame.adjacent().iter().all(|&b| b == FRAME_FILL));
});
