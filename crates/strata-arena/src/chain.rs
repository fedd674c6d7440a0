//! The owned sequence of regions behind an arena.
//!
//! Regions are kept in creation order in a `Vec`; `current` is the index of
//! the region being filled. The head is index 0 and is never removed.

use std::ptr::NonNull;

use crate::config::Discipline;
use crate::error::ArenaError;
use crate::raw;
use crate::region::{aligned_size, Region};
use crate::stats::RegionStats;

/// A growable list of [`Region`]s with overflow-based bump allocation.
///
/// Allocations never span regions: a request that does not fit in the
/// current region is placed entirely in a later one.
pub(crate) struct RegionChain {
    regions: Vec<Region>,
    /// Index of the region currently being filled.
    current: usize,
    discipline: Discipline,
    page_size: usize,
}

impl RegionChain {
    /// Create a chain holding a single freshly mapped region.
    pub(crate) fn new(
        discipline: Discipline,
        initial_capacity: usize,
        page_size: usize,
    ) -> Result<Self, ArenaError> {
        let head = Region::new(initial_capacity, page_size)?;
        Ok(Self {
            regions: vec![head],
            current: 0,
            discipline,
            page_size,
        })
    }

    /// Reserve room for `size` bytes and return its start address.
    ///
    /// On error the chain is left exactly as it was.
    pub(crate) fn alloc(&mut self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        let aligned = aligned_size(size)?;

        if let Some(ptr) = self.regions[self.current].bump(aligned) {
            return Ok(ptr);
        }

        match self.discipline {
            Discipline::Fixed => {
                let head = &self.regions[self.current];
                Err(ArenaError::CapacityExceeded {
                    requested: aligned,
                    available: head.remaining(),
                    capacity: head.capacity(),
                })
            }
            Discipline::Dynamic => self.alloc_slow(aligned),
        }
    }

    /// Serve a request the current region could not, from a region retained
    /// since the last reset or from a newly mapped one.
    #[cold]
    fn alloc_slow(&mut self, aligned: usize) -> Result<NonNull<u8>, ArenaError> {
        let retained = (self.current + 1..self.regions.len())
            .find(|&index| self.regions[index].fits(aligned));
        if let Some(index) = retained {
            tracing::trace!(region = index, "reusing retained region");
            self.current = index;
            return self
                .bump_current(aligned)
                .ok_or(ArenaError::InvalidSize { requested: aligned });
        }

        let capacity = self.next_region_size(aligned)?;
        let region = Region::new(capacity, self.page_size)?;
        self.regions.push(region);
        self.current = self.regions.len() - 1;
        tracing::debug!(
            capacity = self.regions[self.current].capacity(),
            regions = self.regions.len(),
            "arena grew"
        );
        // A fresh region is at least `aligned` bytes, so this always fits.
        self.bump_current(aligned)
            .ok_or(ArenaError::InvalidSize { requested: aligned })
    }

    fn bump_current(&mut self, aligned: usize) -> Option<NonNull<u8>> {
        self.regions[self.current].bump(aligned)
    }

    /// Size of the next region: double the newest region, or exactly
    /// enough pages for the request if doubling falls short.
    fn next_region_size(&self, aligned: usize) -> Result<usize, ArenaError> {
        let required = raw::align_up(aligned, self.page_size)
            .ok_or(ArenaError::InvalidSize { requested: aligned })?;
        let newest = self.regions.last().map_or(0, Region::capacity);
        // When doubling overflows, fall back to exact fit.
        let doubled = newest.checked_mul(2).unwrap_or(required);
        Ok(doubled.max(required))
    }

    /// Rewind every region without unmapping; allocation restarts at the head.
    pub(crate) fn reset(&mut self) {
        for region in &mut self.regions {
            region.reset();
        }
        self.current = 0;
        tracing::trace!(regions = self.regions.len(), "arena reset");
    }

    /// Unmap every region in chain order.
    ///
    /// Returns the number of regions released, or the first failure after
    /// attempting all of them.
    pub(crate) fn release(self) -> Result<usize, ArenaError> {
        let count = self.regions.len();
        let mut first_error = None;
        for (index, region) in self.regions.into_iter().enumerate() {
            if let Err(err) = region.release() {
                tracing::warn!(region = index, error = %err, "failed to release region");
                first_error.get_or_insert(ArenaError::ReleaseFailed {
                    region: index,
                    cause: err.to_string(),
                });
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(count),
        }
    }

    pub(crate) fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub(crate) fn current(&self) -> usize {
        self.current
    }

    pub(crate) fn len(&self) -> usize {
        self.regions.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.regions.iter().map(Region::capacity).sum()
    }

    pub(crate) fn used(&self) -> usize {
        self.regions.iter().map(Region::used).sum()
    }

    pub(crate) fn region_stats(&self) -> Vec<RegionStats> {
        self.regions
            .iter()
            .map(|region| RegionStats {
                used: region.used(),
                capacity: region.capacity(),
            })
            .collect()
    }

    pub(crate) fn current_region(&self) -> &Region {
        &self.regions[self.current]
    }
}
