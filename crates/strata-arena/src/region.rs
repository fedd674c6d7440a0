//! Backing regions: one OS-mapped block plus a bump offset.
//!
//! A [`Region`] is the fundamental storage unit of an arena. Its memory is
//! mapped once at creation, handed out front to back by advancing
//! `offset`, rewound by [`Region::reset`], and unmapped only when the
//! region itself goes away.

use std::io;
use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::raw::{self, Mapping};
use crate::ALIGNMENT;

/// Round a requested allocation size up to the arena alignment.
///
/// Zero-sized requests still consume one alignment unit so that every
/// allocation gets a distinct address.
pub(crate) fn aligned_size(size: usize) -> Result<usize, ArenaError> {
    if size > isize::MAX as usize {
        return Err(ArenaError::InvalidSize { requested: size });
    }
    raw::align_up(size, ALIGNMENT)
        .map(|aligned| aligned.max(ALIGNMENT))
        .ok_or(ArenaError::InvalidSize { requested: size })
}

/// A single contiguous OS-mapped block with bump allocation.
///
/// The block is zero-initialised when mapped. After a [`reset`](Self::reset)
/// it keeps whatever bytes earlier allocations left behind.
pub struct Region {
    mapping: Mapping,
    /// Bytes already handed out. Always a multiple of [`ALIGNMENT`].
    offset: usize,
}

impl Region {
    /// Map a new region of at least `requested` bytes.
    ///
    /// The capacity is `requested` rounded up to `page_size`.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidSize`] if the rounded size is zero or not
    /// representable, [`ArenaError::OutOfMemory`] if the OS declines the
    /// mapping.
    pub fn new(requested: usize, page_size: usize) -> Result<Self, ArenaError> {
        let capacity = raw::align_up(requested, page_size)
            .filter(|&c| c != 0 && c <= isize::MAX as usize)
            .ok_or(ArenaError::InvalidSize { requested })?;
        let mapping = Mapping::anonymous(capacity).map_err(|err| {
            tracing::warn!(capacity, error = %err, "OS declined region mapping");
            ArenaError::OutOfMemory {
                requested: capacity,
                cause: err.to_string(),
            }
        })?;
        Ok(Self { mapping, offset: 0 })
    }

    /// Bump-allocate `size` bytes from this region.
    ///
    /// The returned slice starts on an [`ALIGNMENT`] boundary. Returns
    /// `None` if the size is invalid or the region has too little room
    /// left.
    pub fn alloc(&mut self, size: usize) -> Option<&mut [u8]> {
        let aligned = aligned_size(size).ok()?;
        let ptr = self.bump(aligned)?;
        // SAFETY: `bump` reserved `aligned >= size` bytes at `ptr` inside
        // the live mapping; the `&mut self` borrow keeps them unaliased for
        // the slice's lifetime.
        #[allow(unsafe_code)]
        let bytes = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) };
        Some(bytes)
    }

    /// Reserve `aligned` bytes and return their start address.
    ///
    /// `aligned` must come from [`aligned_size`]. The region is untouched
    /// when it returns `None`.
    pub(crate) fn bump(&mut self, aligned: usize) -> Option<NonNull<u8>> {
        if !self.fits(aligned) {
            return None;
        }
        // SAFETY: `fits` guarantees `offset + aligned <= capacity`, so the
        // offset stays inside the mapping.
        #[allow(unsafe_code)]
        let ptr = unsafe { self.mapping.as_ptr().add(self.offset) };
        self.offset += aligned;
        Some(ptr)
    }

    /// Whether `aligned` more bytes fit behind the current offset.
    pub fn fits(&self, aligned: usize) -> bool {
        aligned <= self.remaining()
    }

    /// Rewind the bump offset to zero without unmapping.
    ///
    /// All previous allocations become invalid. The memory is NOT zeroed.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Bytes handed out since creation or the last reset.
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Total bytes in the mapping.
    pub fn capacity(&self) -> usize {
        self.mapping.len()
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    /// Start of the mapping.
    pub fn base(&self) -> *const u8 {
        self.mapping.as_ptr().as_ptr()
    }

    /// Unmap the region, reporting an OS refusal.
    pub(crate) fn release(self) -> io::Result<()> {
        self.mapping.release()
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("base", &self.base())
            .field("used", &self.offset)
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> usize {
        raw::page_size()
    }

    #[test]
    fn new_rounds_up_to_page() {
        let region = Region::new(1, page()).unwrap();
        assert_eq!(region.capacity(), page());
        assert_eq!(region.used(), 0);

        let region = Region::new(page() + 1, page()).unwrap();
        assert_eq!(region.capacity(), 2 * page());
    }

    #[test]
    fn zero_sized_region_rejected() {
        let err = Region::new(0, page()).unwrap_err();
        assert_eq!(err, ArenaError::InvalidSize { requested: 0 });
    }

    #[test]
    fn unrepresentable_region_rejected() {
        let err = Region::new(usize::MAX, page()).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSize { .. }));
    }

    #[test]
    fn alloc_returns_zeroed_bytes_on_fresh_region() {
        let mut region = Region::new(page(), page()).unwrap();
        let bytes = region.alloc(10).unwrap();
        assert_eq!(bytes.len(), 10);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn sequential_allocs_are_aligned_and_adjacent() {
        let mut region = Region::new(page(), page()).unwrap();
        let a = region.alloc(1).unwrap().as_ptr() as usize;
        let b = region.alloc(17).unwrap().as_ptr() as usize;
        let c = region.alloc(0).unwrap().as_ptr() as usize;
        assert_eq!(a % ALIGNMENT, 0);
        assert_eq!(b, a + 16);
        assert_eq!(c, b + 32);
        assert_eq!(region.used(), 16 + 32 + 16);
    }

    #[test]
    fn alloc_fails_when_full() {
        let mut region = Region::new(page(), page()).unwrap();
        assert!(region.alloc(page()).is_some());
        assert_eq!(region.remaining(), 0);
        assert!(region.alloc(1).is_none());
        assert_eq!(region.used(), page());
    }

    #[test]
    fn reset_allows_realloc_at_base() {
        let mut region = Region::new(page(), page()).unwrap();
        region.alloc(100).unwrap()[0] = 7;
        region.reset();
        assert_eq!(region.used(), 0);
        let ptr = region.alloc(100).unwrap().as_ptr();
        assert_eq!(ptr as *const u8, region.base());
    }

    #[test]
    fn reset_keeps_stale_bytes() {
        let mut region = Region::new(page(), page()).unwrap();
        region.alloc(4).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        region.reset();
        assert_eq!(&*region.alloc(4).unwrap(), &[1u8, 2, 3, 4][..]);
    }

    #[test]
    fn aligned_size_floor_and_overflow() {
        assert_eq!(aligned_size(0), Ok(16));
        assert_eq!(aligned_size(1), Ok(16));
        assert_eq!(aligned_size(16), Ok(16));
        assert_eq!(aligned_size(17), Ok(32));
        assert_eq!(
            aligned_size(usize::MAX),
            Err(ArenaError::InvalidSize {
                requested: usize::MAX
            })
        );
        assert!(aligned_size(isize::MAX as usize + 1).is_err());
    }
}
