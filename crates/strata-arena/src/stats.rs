//! Point-in-time usage snapshots of an arena.

use crate::config::Discipline;

/// Usage of one region in an arena's chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionStats {
    /// Bytes handed out since creation or the last reset.
    pub used: usize,
    /// Total bytes mapped for the region.
    pub capacity: usize,
}

/// Usage of a whole arena, taken by [`Arena::stats`](crate::Arena::stats).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaStats {
    /// The arena's growth behaviour.
    pub discipline: Discipline,
    /// Index into `regions` of the region currently being filled.
    pub current_region: usize,
    /// Every region in creation order.
    pub regions: Vec<RegionStats>,
}

impl ArenaStats {
    /// Total bytes mapped across all regions.
    pub fn capacity_bytes(&self) -> usize {
        self.regions.iter().map(|r| r.capacity).sum()
    }

    /// Total bytes handed out across all regions.
    pub fn used_bytes(&self) -> usize {
        self.regions.iter().map(|r| r.used).sum()
    }

    /// Number of regions created over the arena's lifetime.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}
