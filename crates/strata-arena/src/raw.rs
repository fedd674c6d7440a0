//! Low-level primitives for arena memory operations.
//!
//! This is the only module that talks to the operating system. Backing
//! blocks are acquired through [`Mapping::anonymous`] and handed back
//! through [`Mapping::release`] (or `Drop`). Every `unsafe` block carries a
//! mandatory `// SAFETY:` comment.
//!
//! On Unix the block is a private anonymous `mmap(2)` mapping. Other
//! targets fall back to a page-aligned zeroed heap block so the rest of the
//! crate stays platform-agnostic.

#![allow(unsafe_code)]

use std::io;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

/// Page size assumed when the OS cannot be asked.
pub(crate) const FALLBACK_PAGE_SIZE: usize = 4096;

/// Granularity of the platform's virtual-memory mappings, in bytes.
#[cfg(unix)]
pub(crate) fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions and touches no memory we own.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size < 1 {
        FALLBACK_PAGE_SIZE
    } else {
        size as usize
    }
}

/// Granularity of the platform's virtual-memory mappings, in bytes.
#[cfg(not(unix))]
pub(crate) fn page_size() -> usize {
    FALLBACK_PAGE_SIZE
}

/// Round `value` up to the next multiple of `align` (a power of two).
///
/// Returns `None` if the result is not representable.
pub(crate) fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

/// An exclusively owned, zero-initialised, page-aligned block of memory.
///
/// The block stays mapped at the same address until the `Mapping` is
/// released or dropped, so pointers into it survive moves of the owner.
pub(crate) struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the block is owned by exactly one `Mapping`; sending the mapping
// to another thread transfers that ownership along with it.
unsafe impl Send for Mapping {}

impl Mapping {
    /// Acquire a fresh block of exactly `len` bytes (`len` must already be
    /// a multiple of the page size).
    #[cfg(unix)]
    pub(crate) fn anonymous(len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "zero-length mapping",
            ));
        }
        // SAFETY: a private anonymous mapping with a null address hint
        // creates new memory and does not alias anything already mapped.
        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        let ptr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| io::Error::other("mmap returned a null mapping"))?;
        Ok(Self { ptr, len })
    }

    /// Acquire a fresh block of exactly `len` bytes (`len` must already be
    /// a multiple of the page size).
    #[cfg(not(unix))]
    pub(crate) fn anonymous(len: usize) -> io::Result<Self> {
        let layout = heap_layout(len)?;
        // SAFETY: `heap_layout` rejects zero-sized layouts.
        let addr = unsafe { std::alloc::alloc_zeroed(layout) };
        NonNull::new(addr)
            .map(|ptr| Self { ptr, len })
            .ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))
    }

    /// Base address of the block.
    pub(crate) fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Length of the block in bytes.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Hand the block back to the OS, reporting a refused release.
    pub(crate) fn release(self) -> io::Result<()> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `ManuallyDrop` suppresses the `Drop` path, so this is the
        // only release of the block.
        unsafe { unmap(this.ptr, this.len) }
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: drop runs at most once and `release` bypasses it.
        if let Err(err) = unsafe { unmap(self.ptr, self.len) } {
            tracing::warn!(len = self.len, error = %err, "failed to unmap arena region");
        }
    }
}

/// # Safety
///
/// `ptr` and `len` must describe a live block returned by
/// [`Mapping::anonymous`] that has not been released yet.
#[cfg(unix)]
unsafe fn unmap(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    // SAFETY: guaranteed by the caller contract above.
    let rc = unsafe { libc::munmap(ptr.as_ptr().cast(), len) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// # Safety
///
/// `ptr` and `len` must describe a live block returned by
/// [`Mapping::anonymous`] that has not been released yet.
#[cfg(not(unix))]
unsafe fn unmap(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    let layout = heap_layout(len)?;
    // SAFETY: the block was allocated with this exact layout.
    unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
    Ok(())
}

#[cfg(not(unix))]
fn heap_layout(len: usize) -> io::Result<std::alloc::Layout> {
    if len == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "zero-length mapping",
        ));
    }
    std::alloc::Layout::from_size_align(len, FALLBACK_PAGE_SIZE)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
