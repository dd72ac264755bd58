//! Vulnerable sinks for the harness target.
//!
//! A sink receives the harness's nul-terminated heap buffer and, in its
//! vulnerable form, copies it into a fixed stack buffer without checking the
//! length. The harness does not care which sink it drives: a Rust type, a C
//! `vulnerable_function` reached through a function pointer, or a recorder
//! in tests.

use std::cell::Cell;
use std::ffi::{CStr, c_char};
use std::hint::black_box;
use std::mem::MaybeUninit;
use std::ptr;

use overflowlab_membrane::{HealingAction, global_healing_policy};

/// Stack buffer size of the default sink.
pub const DEFAULT_SINK_LEN: usize = 16;

/// Signature of an external C `vulnerable_function(char *input)`.
pub type SinkFn = unsafe extern "C" fn(*mut c_char);

/// A mutable, nul-terminated byte buffer handed to a sink.
///
/// The last byte is always zero. Interior zeros are possible; a C view of the
/// buffer ends at the first one.
pub struct SinkInput<'a> {
    bytes: &'a mut [u8],
}

impl<'a> SinkInput<'a> {
    pub(crate) fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(bytes.last(), Some(&0));
        Self { bytes }
    }

    /// Wrap a C string owned by a foreign caller. Returns `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a nul-terminated buffer that stays valid and
    /// unaliased for `'a`.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        // SAFETY: caller guarantees a terminated buffer.
        let len = unsafe { CStr::from_ptr(ptr) }.count_bytes() + 1;
        // SAFETY: `len` bytes up to and including the terminator are valid.
        let bytes = unsafe { std::slice::from_raw_parts_mut(ptr.cast::<u8>(), len) };
        Some(Self { bytes })
    }

    /// Every byte of the buffer, terminator included.
    #[must_use]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.bytes
    }

    /// The buffer as C sees it: up to the first nul.
    #[must_use]
    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: the buffer ends in a nul byte.
        unsafe { CStr::from_ptr(self.bytes.as_ptr().cast::<c_char>()) }
    }

    /// Pointer suitable for a `char *` parameter.
    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.bytes.as_mut_ptr().cast::<c_char>()
    }
}

/// Downstream function that performs the final copy.
pub trait Sink {
    /// Consume one harness buffer.
    ///
    /// # Safety
    ///
    /// Vulnerable implementations write past their own buffers for long
    /// inputs. Callers accept that calling a sink may corrupt memory.
    unsafe fn consume(&self, input: SinkInput<'_>);
}

/// Stand-in for `vulnerable_function`: copies the C string, terminator
/// included, into an `N`-byte stack buffer with no length check.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedBufferSink<const N: usize = DEFAULT_SINK_LEN>;

impl<const N: usize> Sink for FixedBufferSink<N> {
    unsafe fn consume(&self, input: SinkInput<'_>) {
        let src = input.as_c_str().to_bytes_with_nul();
        let mut buffer = [MaybeUninit::<u8>::uninit(); N];
        let dst = black_box(buffer.as_mut_ptr().cast::<u8>());

        // SAFETY: none for src.len() > N. This is the strcpy under test.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len()) };
        black_box(&buffer);
    }
}

/// Hardened counterpart of [`FixedBufferSink`]: truncates to `N - 1` bytes and
/// terminates, recording the heal.
///
/// The sink owns its `N`-byte buffer, so the result of the last copy and the
/// healing it needed can be read back after the harness returns.
#[derive(Debug)]
pub struct HardenedSink<const N: usize = DEFAULT_SINK_LEN> {
    buffer: Cell<[u8; N]>,
    last_action: Cell<HealingAction>,
}

impl<const N: usize> HardenedSink<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Cell::new([0; N]),
            last_action: Cell::new(HealingAction::None),
        }
    }

    /// Copy `input` the safe way and return what ended up in the buffer.
    pub fn copy_bounded(&self, input: &CStr) -> [u8; N] {
        let src = input.to_bytes();
        let policy = global_healing_policy();
        let action = policy.heal_string_bounds(src.len(), N);
        policy.record(&action);

        let len = action.effective_len(src.len());
        let mut buffer = [0_u8; N];
        buffer[..len].copy_from_slice(&src[..len]);
        self.buffer.set(buffer);
        self.last_action.set(action);
        buffer
    }

    /// Contents of the buffer after the last copy.
    #[must_use]
    pub fn buffer(&self) -> [u8; N] {
        self.buffer.get()
    }

    /// Healing applied by the last copy.
    #[must_use]
    pub fn last_action(&self) -> HealingAction {
        self.last_action.get()
    }
}

impl<const N: usize> Default for HardenedSink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Sink for HardenedSink<N> {
    unsafe fn consume(&self, input: SinkInput<'_>) {
        self.copy_bounded(input.as_c_str());
    }
}

/// A sink reached through a C function pointer.
#[derive(Debug, Clone, Copy)]
pub struct ExternSink(pub SinkFn);

impl Sink for ExternSink {
    unsafe fn consume(&self, mut input: SinkInput<'_>) {
        // SAFETY: the pointer targets a live, terminated buffer for the call.
        unsafe { (self.0)(input.as_mut_ptr()) }
    }
}
