//! The arena handle: allocation, reset and teardown.
//!
//! [`Arena`] wraps the region chain and turns the raw addresses it hands
//! out into references whose lifetime is tied to a shared borrow of the
//! arena. Because [`reset`](Arena::reset) needs `&mut self` and
//! [`destroy`](Arena::destroy) consumes the arena, the borrow checker
//! rejects any use of an allocation past either call.

use std::cell::RefCell;
use std::mem;
use std::ptr::NonNull;

use crate::chain::RegionChain;
use crate::config::{ArenaConfig, Discipline};
use crate::error::ArenaError;
use crate::stats::ArenaStats;
use crate::ALIGNMENT;

/// A region-based bump allocator.
///
/// Every allocation is [`ALIGNMENT`]-aligned and lives until the next
/// [`reset`](Self::reset) or until the arena is dropped. Individual
/// allocations are never freed and destructors of values placed in the
/// arena are never run.
///
/// The arena is `Send` but not `Sync`: one owner at a time, no internal
/// locking.
pub struct Arena {
    chain: RefCell<RegionChain>,
    page_size: usize,
}

impl Arena {
    /// Create an arena with the default config for `discipline`.
    ///
    /// `Fixed` arenas start with 16 pages and never grow; `Dynamic` arenas
    /// start with one page.
    pub fn new(discipline: Discipline) -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::new(discipline))
    }

    /// Shorthand for `Arena::new(Discipline::Fixed)`.
    pub fn fixed() -> Result<Self, ArenaError> {
        Self::new(Discipline::Fixed)
    }

    /// Shorthand for `Arena::new(Discipline::Dynamic)`.
    pub fn dynamic() -> Result<Self, ArenaError> {
        Self::new(Discipline::Dynamic)
    }

    /// Create an arena from an explicit config.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidConfig`] if `config` fails validation,
    /// [`ArenaError::OutOfMemory`] if the first region cannot be mapped.
    /// No arena exists after a failure.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let chain = RegionChain::new(
            config.discipline,
            config.initial_capacity,
            config.page_size,
        )?;
        tracing::debug!(
            discipline = ?config.discipline,
            capacity = chain.capacity(),
            "arena created"
        );
        Ok(Self {
            chain: RefCell::new(chain),
            page_size: config.page_size,
        })
    }

    /// Allocate `size` bytes.
    ///
    /// The returned slice is exactly `size` bytes long; the arena consumes
    /// `size` rounded up to [`ALIGNMENT`] (at least one unit, so zero-sized
    /// requests still get distinct addresses). Contents are zero on a
    /// region's first use and unspecified after a reset; see
    /// [`alloc_zeroed`](Self::alloc_zeroed).
    ///
    /// # Errors
    ///
    /// - [`ArenaError::CapacityExceeded`]: a `Fixed` arena is full.
    /// - [`ArenaError::OutOfMemory`]: a `Dynamic` arena could not map a new
    ///   region.
    /// - [`ArenaError::InvalidSize`]: `size` cannot be aligned without
    ///   overflow.
    ///
    /// The arena is unchanged after any error.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc(&self, size: usize) -> Result<&mut [u8], ArenaError> {
        let ptr = self.reserve(size)?;
        // SAFETY: `reserve` set aside at least `size` bytes at `ptr` that no
        // other allocation overlaps. The mapping stays put until `reset`
        // (`&mut self`) or drop, so the slice cannot outlive it.
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// Allocate `size` bytes, all set to zero.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_zeroed(&self, size: usize) -> Result<&mut [u8], ArenaError> {
        let bytes = self.alloc(size)?;
        bytes.fill(0);
        Ok(bytes)
    }

    /// Move `value` into the arena.
    ///
    /// `T` must not need more than [`ALIGNMENT`]; this is checked at
    /// compile time. `value` is never dropped.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc_value<T>(&self, value: T) -> Result<&mut T, ArenaError> {
        const { assert!(mem::align_of::<T>() <= ALIGNMENT) };
        let ptr = self.reserve(mem::size_of::<T>())?.cast::<T>();
        // SAFETY: the address is ALIGNMENT-aligned, which satisfies `T`, and
        // `size_of::<T>()` bytes behind it are reserved for this call only.
        unsafe {
            ptr.as_ptr().write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Copy `src` into the arena.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> Result<&mut [T], ArenaError> {
        const { assert!(mem::align_of::<T>() <= ALIGNMENT) };
        let ptr = self.reserve(mem::size_of_val(src))?.cast::<T>();
        // SAFETY: as in `alloc_value`; the destination is fresh, so it cannot
        // overlap `src`.
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            Ok(std::slice::from_raw_parts_mut(ptr.as_ptr(), src.len()))
        }
    }

    /// Copy `src` into the arena.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc_str(&self, src: &str) -> Result<&mut str, ArenaError> {
        let bytes = self.alloc_slice_copy(src.as_bytes())?;
        // SAFETY: the bytes were copied verbatim from a `str`.
        Ok(unsafe { std::str::from_utf8_unchecked_mut(bytes) })
    }

    fn reserve(&self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        self.chain.borrow_mut().alloc(size)
    }

    /// Rewind every region so its memory can be handed out again.
    ///
    /// No memory is returned to the OS and no region is dropped; a
    /// `Dynamic` arena reuses the regions it grew before allocating new
    /// ones.
    pub fn reset(&mut self) {
        self.chain.get_mut().reset();
    }

    /// Release every region back to the OS, in creation order.
    ///
    /// Returns the number of regions released. Dropping the arena does the
    /// same but cannot report an OS refusal.
    ///
    /// # Errors
    ///
    /// [`ArenaError::ReleaseFailed`] for the first region the OS refused to
    /// unmap. Every other region is still released.
    pub fn destroy(self) -> Result<usize, ArenaError> {
        let chain = self.chain.into_inner();
        let bytes = chain.capacity();
        let released = chain.release()?;
        tracing::debug!(regions = released, bytes, "arena destroyed");
        Ok(released)
    }

    /// The arena's growth behaviour.
    pub fn discipline(&self) -> Discipline {
        self.chain.borrow().discipline()
    }

    /// Page granularity regions are sized in.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of regions mapped so far.
    pub fn region_count(&self) -> usize {
        self.chain.borrow().len()
    }

    /// Total bytes mapped across all regions.
    pub fn capacity(&self) -> usize {
        self.chain.borrow().capacity()
    }

    /// Total bytes handed out since creation or the last reset.
    pub fn used(&self) -> usize {
        self.chain.borrow().used()
    }

    /// Bytes left in the region currently being filled.
    pub fn remaining(&self) -> usize {
        self.chain.borrow().current_region().remaining()
    }

    /// Snapshot of per-region usage.
    pub fn stats(&self) -> ArenaStats {
        let chain = self.chain.borrow();
        ArenaStats {
            discipline: chain.discipline(),
            current_region: chain.current(),
            regions: chain.region_stats(),
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chain = self.chain.borrow();
        f.debug_struct("Arena")
            .field("discipline", &chain.discipline())
            .field("regions", &chain.len())
            .field("used", &chain.used())
            .field("capacity", &chain.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_arena_starts_with_sixteen_pages() {
        let arena = Arena::fixed().unwrap();
        assert_eq!(arena.discipline(), Discipline::Fixed);
        assert_eq!(arena.region_count(), 1);
        assert_eq!(arena.capacity(), 16 * arena.page_size());
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn dynamic_arena_starts_with_one_page() {
        let arena = Arena::dynamic().unwrap();
        assert_eq!(arena.discipline(), Discipline::Dynamic);
        assert_eq!(arena.capacity(), arena.page_size());
    }

    #[test]
    fn invalid_config_creates_no_arena() {
        let config = ArenaConfig::dynamic().with_initial_capacity(0);
        let err = Arena::with_config(config).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidConfig { .. }));
    }

    #[test]
    fn allocations_coexist() {
        let arena = Arena::dynamic().unwrap();
        let a = arena.alloc(8).unwrap();
        let b = arena.alloc(8).unwrap();
        a.fill(1);
        b.fill(2);
        assert!(a.iter().all(|&x| x == 1));
        assert!(b.iter().all(|&x| x == 2));
    }

    #[test]
    fn alloc_zeroed_clears_reused_memory() {
        let mut arena = Arena::fixed().unwrap();
        arena.alloc(32).unwrap().fill(0xFF);
        arena.reset();
        let bytes = arena.alloc_zeroed(32).unwrap();
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn alloc_value_places_value() {
        let arena = Arena::dynamic().unwrap();
        let x = arena.alloc_value(0xDEAD_BEEF_u64).unwrap();
        let y = arena.alloc_value([1.5f32; 3]).unwrap();
        *x += 1;
        assert_eq!(*x, 0xDEAD_BEEF_u64 + 1);
        assert_eq!(*y, [1.5; 3]);
        assert_eq!(x as *mut u64 as usize % ALIGNMENT, 0);
    }

    #[test]
    fn alloc_value_zero_sized_still_consumes_alignment() {
        let arena = Arena::dynamic().unwrap();
        arena.alloc_value(()).unwrap();
        assert_eq!(arena.used(), ALIGNMENT);
    }

    #[test]
    fn alloc_slice_copy_copies() {
        let arena = Arena::dynamic().unwrap();
        let src = [1u32, 2, 3, 4, 5];
        let copy = arena.alloc_slice_copy(&src).unwrap();
        copy[0] = 10;
        assert_eq!(copy, &[10, 2, 3, 4, 5]);
        assert_eq!(src[0], 1);
        assert_eq!(arena.used(), 32);
    }

    #[test]
    fn alloc_str_copies() {
        let arena = Arena::dynamic().unwrap();
        let s = arena.alloc_str("parse tree node").unwrap();
        s.make_ascii_uppercase();
        assert_eq!(s, "PARSE TREE NODE");
    }

    #[test]
    fn stats_reflect_usage() {
        let arena = Arena::dynamic().unwrap();
        arena.alloc(100).unwrap();
        let stats = arena.stats();
        assert_eq!(stats.discipline, Discipline::Dynamic);
        assert_eq!(stats.current_region, 0);
        assert_eq!(stats.used_bytes(), 112);
        assert_eq!(stats.capacity_bytes(), arena.capacity());
        assert_eq!(arena.remaining(), arena.page_size() - 112);
    }

    #[test]
    fn destroy_reports_region_count() {
        let arena = Arena::fixed().unwrap();
        assert_eq!(arena.destroy().unwrap(), 1);
    }

    #[test]
    fn debug_output_names_discipline() {
        let arena = Arena::fixed().unwrap();
        let out = format!("{arena:?}");
        assert!(out.contains("Fixed"));
    }
}
