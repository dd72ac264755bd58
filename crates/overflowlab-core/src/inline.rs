//! Inline vulnerable processor.
//!
//! The fuzz entry copies the whole input into a 16-byte stack buffer with no
//! length check and prints the buffer as a C string. Anything past byte 16
//! lands on whatever the compiler placed next to the buffer.
//!
//! [`StackFrame`] is a laid-out stand-in for that stack region: a buffer
//! followed by adjacent bytes in one `#[repr(C)]` allocation. The same
//! unchecked copy into it spills into `adjacent` deterministically, which is
//! what the tests observe.

use std::ffi::{CStr, c_char};
use std::hint::black_box;
use std::io::{self, Write};
use std::mem::MaybeUninit;
use std::ptr;

use overflowlab_membrane::{HealingAction, SafetyLevel, global_healing_policy};

/// Capacity of the vulnerable stack buffer.
pub const BUFFER_LEN: usize = 16;
/// Bytes modeled after the buffer in a [`StackFrame`].
pub const ADJACENT_LEN: usize = 48;
/// Total size of a [`StackFrame`].
pub const FRAME_LEN: usize = BUFFER_LEN + ADJACENT_LEN;
/// Byte a fresh [`StackFrame`] is filled with.
pub const FRAME_FILL: u8 = 0xCC;

/// Copy `data` into a 16-byte stack buffer and print it to stdout.
///
/// # Safety
///
/// No bounds check is performed. For `data.len() > BUFFER_LEN` this writes
/// past the end of the stack buffer, and without a nul in the copied bytes
/// the print reads past it too. Callers accept the resulting undefined
/// behavior; this function exists to be a sanitizer target.
pub unsafe fn process_input(data: &[u8]) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Diagnostic only; a closed stdout is not an error for the target.
    let _ = unsafe { process_input_to(data, &mut out) };
}

/// [`process_input`] with the diagnostic line written to `out`.
///
/// # Safety
///
/// Same contract as [`process_input`].
pub unsafe fn process_input_to<W: Write + ?Sized>(data: &[u8], out: &mut W) -> io::Result<()> {
    let mut buffer = [MaybeUninit::<u8>::uninit(); BUFFER_LEN];
    let dst = buffer.as_mut_ptr().cast::<u8>();

    // SAFETY: none for data.len() > BUFFER_LEN. The overflow is the behavior
    // under test.
    unsafe { unchecked_copy(dst, data) };

    // SAFETY: reads up to the first nul, wherever it is, like `%s`.
    let text = unsafe { CStr::from_ptr(dst.cast_const().cast::<c_char>()) };
    writeln!(out, "Processed: {}", text.to_string_lossy())
}

/// The inline target's copy: `data.len()` bytes to `dst`, unbounded.
///
/// # Safety
///
/// `dst` must be valid for `data.len()` writes, or the caller accepts the
/// overflow.
unsafe fn unchecked_copy(dst: *mut u8, data: &[u8]) {
    // Launder the pointer so the optimizer cannot bound the copy by the
    // destination's capacity.
    let dst = black_box(dst);
    // SAFETY: forwarded caller contract.
    unsafe { ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len()) };
}

/// Fuzz entry for the inline target. Empty input is a no-op.
///
/// # Safety
///
/// Same contract as [`process_input`].
pub unsafe fn fuzz_entry(data: &[u8]) -> i32 {
    if data.is_empty() {
        return 0;
    }
    unsafe { process_input(data) };
    0
}

/// Hardened variant of [`process_input`]: truncates to 15 bytes plus a nul.
pub fn process_input_hardened(data: &[u8]) -> HealingAction {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let (action, _) = process_input_hardened_to(data, &mut out);
    action
}

/// [`process_input_hardened`] with the diagnostic line written to `out`.
pub fn process_input_hardened_to<W: Write + ?Sized>(
    data: &[u8],
    out: &mut W,
) -> (HealingAction, io::Result<()>) {
    let policy = global_healing_policy();
    let action = policy.heal_string_bounds(data.len(), BUFFER_LEN);
    policy.record(&action);

    let len = action.effective_len(data.len());
    let mut buffer = [0_u8; BUFFER_LEN];
    buffer[..len].copy_from_slice(&data[..len]);

    let end = buffer.iter().position(|&b| b == 0).unwrap_or(BUFFER_LEN);
    let written = writeln!(out, "Processed: {}", String::from_utf8_lossy(&buffer[..end]));
    (action, written)
}

/// Run the inline target in `level` and return the healing it applied.
///
/// The vulnerable target never heals, so it always reports
/// [`HealingAction::None`].
///
/// # Safety
///
/// With [`SafetyLevel::Vulnerable`], same contract as [`process_input`].
pub unsafe fn run_for_mode(data: &[u8], level: SafetyLevel) -> HealingAction {
    match level {
        SafetyLevel::Vulnerable => {
            unsafe { fuzz_entry(data) };
            HealingAction::None
        }
        SafetyLevel::Hardened if data.is_empty() => HealingAction::None,
        SafetyLevel::Hardened => process_input_hardened(data),
    }
}

/// Fuzz entry dispatching between the vulnerable and hardened inline targets.
///
/// # Safety
///
/// Same contract as [`run_for_mode`].
pub unsafe fn fuzz_entry_for_mode(data: &[u8], level: SafetyLevel) -> i32 {
    unsafe { run_for_mode(data, level) };
    0
}

/// A 16-byte buffer with the bytes that follow it, laid out contiguously.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    buffer: [u8; BUFFER_LEN],
    adjacent: [u8; ADJACENT_LEN],
}

const _: () = assert!(std::mem::size_of::<StackFrame>() == FRAME_LEN);

impl StackFrame {
    /// A frame filled with [`FRAME_FILL`].
    #[must_use]
    pub const fn new() -> Self {
        Self::filled(FRAME_FILL)
    }

    /// A frame with every byte set to `byte`.
    #[must_use]
    pub const fn filled(byte: u8) -> Self {
        Self {
            buffer: [byte; BUFFER_LEN],
            adjacent: [byte; ADJACENT_LEN],
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &[u8; BUFFER_LEN] {
        &self.buffer
    }

    #[must_use]
    pub fn adjacent(&self) -> &[u8; ADJACENT_LEN] {
        &self.adjacent
    }

    /// The whole frame, buffer first.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: repr(C) of two u8 arrays has no padding, and the size is
        // asserted to be FRAME_LEN above.
        unsafe { std::slice::from_raw_parts(ptr::from_ref(self).cast::<u8>(), FRAME_LEN) }
    }

    /// The frame read as a C string starting at the buffer, stopping at the
    /// first nul or the end of the frame.
    #[must_use]
    pub fn text(&self) -> String {
        let bytes = self.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }
}

impl Default for StackFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// What an unchecked copy into a [`StackFrame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    /// Bytes written starting at the buffer.
    pub copied: usize,
    /// Bytes written past the end of the buffer.
    pub spilled: usize,
}

impl CopyReport {
    #[must_use]
    pub const fn overflowed(&self) -> bool {
        self.spilled > 0
    }
}

/// The inline target's copy, aimed at a [`StackFrame`] instead of a local.
///
/// # Safety
///
/// No bounds check is performed against the buffer or the frame. Inputs up to
/// [`FRAME_LEN`] bytes stay inside `frame` and spill into its adjacent bytes;
/// longer inputs write past the frame itself.
pub unsafe fn process_into_frame(frame: &mut StackFrame, data: &[u8]) -> CopyReport {
    // SAFETY: none beyond FRAME_LEN, see the function contract.
    unsafe { unchecked_copy(ptr::from_mut(frame).cast::<u8>(), data) };
    CopyReport {
        copied: data.len(),
        spilled: data.len().saturating_sub(BUFFER_LEN),
    }
}

/// Hardened copy into a [`StackFrame`]. Never touches the adjacent bytes.
pub fn process_into_frame_hardened(frame: &mut StackFrame, data: &[u8]) -> HealingAction {
    let policy = global_healing_policy();
    let action = policy.heal_string_bounds(data.len(), BUFFER_LEN);
    policy.record(&action);

    let len = action.effective_len(data.len());
    frame.buffer[..len].copy_from_slice(&data[..len]);
    frame.buffer[len] = 0;
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(7)).collect()
    }

    #[test]
    fn in_bounds_copy_stays_in_buffer() {
        for size in 0..=BUFFER_LEN {
            let data = pattern(size);
            let mut frame = StackFrame::new();
            // SAFETY: size <= FRAME_LEN keeps the write inside the frame.
            let report = unsafe { process_into_frame(&mut frame, &data) };

            assert!(!report.overflowed(), "size {size} should not overflow");
            assert_eq!(&frame.buffer()[..size], &data[..]);
            assert!(frame.buffer()[size..].iter().all(|&b| b == FRAME_FILL));
            assert!(frame.adjacent().iter().all(|&b| b == FRAME_FILL));
        }
    }

    #[test]
    fn oversized_copy_spills_exact_tail_into_adjacent() {
        for size in BUFFER_LEN + 1..=FRAME_LEN {
            let data = pattern(size);
            let mut frame = StackFrame::new();
            // SAFETY: size <= FRAME_LEN keeps the write inside the frame.
            let report = unsafe { process_into_frame(&mut frame, &data) };

            let spilled = size - BUFFER_LEN;
            assert_eq!(report.spilled, spilled);
            assert_eq!(frame.buffer(), &data[..BUFFER_LEN]);
            assert_eq!(&frame.adjacent()[..spilled], &data[BUFFER_LEN..]);
            assert!(frame.adjacent()[spilled..].iter().all(|&b| b == FRAME_FILL));
        }
    }

    #[test]
    fn twenty_a_bytes_overwrite_four_adjacent_bytes() {
        let data = [0x41_u8; 20];
        let mut frame = StackFrame::new();
        // SAFETY: 20 <= FRAME_LEN.
        let report = unsafe { process_into_frame(&mut frame, &data) };

        assert_eq!(report, CopyReport { copied: 20, spilled: 4 });
        assert_eq!(frame.buffer(), &[0x41; BUFFER_LEN]);
        assert_eq!(&frame.adjacent()[..4], &[0x41; 4]);
        assert_eq!(frame.adjacent()[4], FRAME_FILL);
        assert!(frame.text().starts_with(&"A".repeat(20)));
    }

    #[test]
    fn repeated_copies_produce_same_frame() {
        let data = pattern(37);
        let mut first = StackFrame::new();
        let mut second = StackFrame::new();
        // SAFETY: 37 <= FRAME_LEN.
        unsafe {
            process_into_frame(&mut first, &data);
            process_into_frame(&mut second, &data);
        }
        assert_eq!(first, second);
    }

    #[test]
    fn fuzz_entry_empty_input_is_noop() {
        // SAFETY: empty input never reaches the copy.
        assert_eq!(unsafe { fuzz_entry(&[]) }, 0);
        // SAFETY: same for the mode dispatcher.
        assert_eq!(unsafe { fuzz_entry_for_mode(&[], SafetyLevel::Vulnerable) }, 0);
    }

    #[test]
    fn fuzz_entry_short_terminated_input_returns_zero() {
        // SAFETY: 6 bytes with a terminator fit the buffer.
        assert_eq!(unsafe { fuzz_entry(b"hello\0") }, 0);
    }

    #[test]
    fn prints_processed_line() {
        let mut out = Vec::new();
        // SAFETY: terminated input within BUFFER_LEN.
        unsafe { process_input_to(b"hello\0", &mut out) }.unwrap();
        assert_eq!(out, b"Processed: hello\n");

        let mut out = Vec::new();
        // SAFETY: exactly BUFFER_LEN bytes, terminated in the last byte.
        unsafe { process_input_to(b"0123456789abcde\0", &mut out) }.unwrap();
        assert_eq!(out, b"Processed: 0123456789abcde\n");
    }

    #[test]
    fn hardened_truncates_and_prints() {
        let mut out = Vec::new();
        let (action, written) = process_input_hardened_to(&[b'A'; 20], &mut out);
        written.unwrap();
        assert_eq!(
            action,
            HealingAction::TruncateWithNull {
                requested: 20,
                truncated: 15
            }
        );
        assert_eq!(out, format!("Processed: {}\n", "A".repeat(15)).into_bytes());
    }

    #[test]
    fn hardened_short_input_is_not_healed() {
        let mut out = Vec::new();
        let (action, written) = process_input_hardened_to(b"abc", &mut out);
        written.unwrap();
        assert_eq!(action, HealingAction::None);
        assert_eq!(out, b"Processed: abc\n");
    }

    #[test]
    fn hardened_frame_never_touches_adjacent() {
        let data = pattern(FRAME_LEN * 2);
        let mut frame = StackFrame::new();
        let action = process_into_frame_hardened(&mut frame, &data);

        assert!(action.is_heal());
        assert_eq!(&frame.buffer()[..BUFFER_LEN - 1], &data[..BUFFER_LEN - 1]);
        assert_eq!(frame.buffer()[BUFFER_LEN - 1], 0);
        assert!(frame.adjacent().iter().all(|&b| b == FRAME_FILL));
    }

    #[test]
    fn hardened_mode_dispatch_handles_long_input() {
        // SAFETY: the hardened path performs no unchecked copy.
        assert_eq!(
            unsafe { fuzz_entry_for_mode(&[0x41; 200], SafetyLevel::Hardened) },
            0
        );
    }

    #[test]
    fn run_for_mode_reports_applied_action() {
        // SAFETY: hardened mode performs no unchecked copy.
        let action = unsafe { run_for_mode(&[0x41; 200], SafetyLevel::Hardened) };
        assert_eq!(
            action,
            HealingAction::TruncateWithNull {
                requested: 200,
                truncated: 15
            }
        );
        // SAFETY: as above.
        let action = unsafe { run_for_mode(&[], SafetyLevel::Hardened) };
        assert_eq!(action, HealingAction::None);
        // SAFETY: terminated input within BUFFER_LEN.
        let action = unsafe { run_for_mode(b"short\0", SafetyLevel::Vulnerable) };
        assert_eq!(action, HealingAction::None);
    }

    #[test]
    fn stack_path_and_frame_path_copy_the_same_bytes() {
        let data = b"0123456789abcde\0";
        let mut out = Vec::new();
        // SAFETY: exactly BUFFER_LEN bytes, terminated.
        unsafe { process_input_to(data, &mut out) }.unwrap();

        let mut frame = StackFrame::new();
        // SAFETY: within the frame.
        unsafe { process_into_frame(&mut frame, data) };
        assert_eq!(out, format!("Processed: {}\n", frame.text()).into_bytes());
    }
}
