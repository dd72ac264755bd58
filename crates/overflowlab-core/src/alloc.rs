//! Scoped heap buffer for the harness target.
//!
//! The harness copies the input into a fresh `len + 1` byte allocation and
//! terminates it. The allocator is a parameter so tests can inject failures
//! and count releases.

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use crate::error::OverflowError;
use crate::sink::SinkInput;

/// Source of raw byte allocations.
pub trait RawAllocator {
    /// Allocate `layout`, returning null on failure or for a zero-size layout.
    fn allocate(&self, layout: Layout) -> *mut u8;

    /// Release a block previously returned by [`RawAllocator::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator with the same
    /// `layout`, and must not be released twice.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global Rust allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl RawAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> *mut u8 {
        if layout.size() == 0 {
            return ptr::null_mut();
        }
        // SAFETY: the layout has a non-zero size.
        unsafe { std::alloc::alloc(layout) }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// An allocator that always fails. Simulates memory exhaustion.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingAllocator;

impl RawAllocator for FailingAllocator {
    fn allocate(&self, _layout: Layout) -> *mut u8 {
        ptr::null_mut()
    }

    unsafe fn release(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

/// A heap copy of the input followed by a nul byte, released on drop.
pub struct ScopedCString<'a, A: RawAllocator + ?Sized> {
    ptr: NonNull<u8>,
    layout: Layout,
    alloc: &'a A,
}

impl<'a, A: RawAllocator + ?Sized> ScopedCString<'a, A> {
    /// Allocate `data.len() + 1` bytes, copy `data` and terminate it.
    pub fn acquire(data: &[u8], alloc: &'a A) -> Result<Self, OverflowError> {
        let size = data
            .len()
            .checked_add(1)
            .ok_or(OverflowError::LayoutOverflow { len: data.len() })?;
        let layout = Layout::array::<u8>(size)
            .map_err(|_| OverflowError::LayoutOverflow { len: data.len() })?;
        let ptr = NonNull::new(alloc.allocate(layout))
            .ok_or(OverflowError::AllocationFailure { size })?;

        // SAFETY: the block holds `size` bytes and does not overlap `data`.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len());
            ptr.as_ptr().add(data.len()).write(0);
        }

        Ok(Self { ptr, layout, alloc })
    }

    /// Length including the terminator.
    #[must_use]
    pub fn len_with_nul(&self) -> usize {
        self.layout.size()
    }

    /// The whole block: input bytes then the terminator.
    #[must_use]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        // SAFETY: the block is initialized over its full size by acquire.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Borrow the block as sink input.
    pub fn sink_input(&mut self) -> SinkInput<'_> {
        // SAFETY: initialized over its full size, uniquely borrowed through self.
        let bytes =
            unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) };
        SinkInput::new(bytes)
    }
}

impl<A: RawAllocator + ?Sized> Drop for ScopedCString<'_, A> {
    fn drop(&mut self) {
        // SAFETY: ptr and layout come from a successful allocate in acquire,
        // and drop runs once.
        unsafe { self.alloc.release(self.ptr, self.layout) };
    }
}
