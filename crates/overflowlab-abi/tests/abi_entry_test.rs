// C ABI entry points exercised as an engine would call them.
// The sink slot is process-global, so every test touching it lives in one
// test function.

use std::ffi::{CStr, c_char};

use overflowlab_abi::{
    harness_test_one_input_for, install_sink, installed_sink, overflowlab_inline_test_one_input,
    overflowlab_set_sink,
};
use overflowlab_membrane::SafetyLevel;
use parking_lot::Mutex;

static RECORDED: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

unsafe extern "C" fn recording_sink(input: *mut c_char) {
    // SAFETY: the harness passes a live, terminated buffer.
    let bytes = unsafe { CStr::from_ptr(input) }.to_bytes_with_nul().to_vec();
    RECORDED.lock().push(bytes);
}

#[test]
fn inline_entry_returns_zero_for_empty_input() {
    let byte = 0x41_u8;
    // SAFETY: zero size, nothing is read.
    assert_eq!(unsafe { overflowlab_inline_test_one_input(&byte, 0) }, 0);
    // SAFETY: null with zero size.
    assert_eq!(
        unsafe { overflowlab_inline_test_one_input(std::ptr::null(), 0) },
        0
    );
}

#[test]
fn inline_entry_returns_zero_for_short_terminated_input() {
    let data = b"short\0";
    // SAFETY: fits the 16-byte buffer and is terminated.
    assert_eq!(
        unsafe { overflowlab_inline_test_one_input(data.as_ptr(), data.len()) },
        0
    );
}

#[test]
fn harness_entry_routes_to_installed_sink() {
    let previous = install_sink(None);
    RECORDED.lock().clear();

    // SAFETY: recording_sink only reads up to the terminator.
    unsafe { overflowlab_set_sink(Some(recording_sink)) };
    assert!(installed_sink().is_some());

    let long = vec![b'Z'; 300];
    // SAFETY: the installed sink performs no unchecked copy.
    let status = unsafe {
        harness_test_one_input_for(SafetyLevel::Vulnerable, long.as_ptr(), long.len())
    };
    assert_eq!(status, 0);

    let with_nul = b"ab\0cd";
    // SAFETY: same sink.
    unsafe {
        harness_test_one_input_for(SafetyLevel::Vulnerable, with_nul.as_ptr(), with_nul.len())
    };

    {
        let recorded = RECORDED.lock();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].len(), 301);
        assert!(recorded[0][..300].iter().all(|&b| b == b'Z'));
        assert_eq!(recorded[0][300], 0);
        // A C sink sees the string up to the first nul.
        assert_eq!(recorded[1], b"ab\0");
    }

    // Hardened mode bypasses the installed sink for the bounded built-in one.
    // SAFETY: the hardened sink performs bounded copies only.
    let status = unsafe {
        harness_test_one_input_for(SafetyLevel::Hardened, long.as_ptr(), long.len())
    };
    assert_eq!(status, 0);
    assert!(installed_sink().is_some());
    assert_eq!(RECORDED.lock().len(), 2);

    // SAFETY: null restores the built-in sink.
    unsafe { overflowlab_set_sink(None) };
    assert!(installed_sink().is_none());

    let short = b"fits";
    // SAFETY: 4 bytes plus terminator fit the built-in 16-byte sink.
    assert_eq!(
        unsafe { harness_test_one_input_for(SafetyLevel::Vulnerable, short.as_ptr(), short.len()) },
        0
    );
    assert_eq!(RECORDED.lock().len(), 2);

    install_sink(previous);
}

#[cfg(feature = "default-sink")]
#[test]
fn builtin_vulnerable_function_accepts_short_string() {
    let mut raw = *b"hello\0";
    // SAFETY: 6 bytes fit the 16-byte buffer.
    unsafe { overflowlab_abi::vulnerable_function(raw.as_mut_ptr().cast::<c_char>()) };
    // SAFETY: null is ignored.
    unsafe { overflowlab_abi::vulnerable_function(std::ptr::null_mut()) };
}
