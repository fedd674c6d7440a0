//! Arena configuration parameters.

use crate::error::ArenaError;
use crate::raw;
use crate::ALIGNMENT;

/// How an arena behaves once its current region is exhausted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Discipline {
    /// A single region that never grows. Allocations that do not fit fail
    /// with [`ArenaError::CapacityExceeded`].
    Fixed,
    /// A chain of regions. When the current region is full a new one,
    /// at least twice as large, is mapped and linked.
    Dynamic,
}

/// Configuration for an [`Arena`](crate::Arena).
///
/// Validated at construction; all values are immutable once the arena
/// exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Growth behaviour.
    pub discipline: Discipline,

    /// Requested size of the first region in bytes.
    ///
    /// Rounded up to `page_size` when the region is mapped. Must be
    /// non-zero.
    pub initial_capacity: usize,

    /// Page granularity used when sizing regions.
    ///
    /// Defaults to the OS page size. Must be a power of two and at least
    /// the allocation alignment.
    pub page_size: usize,
}

impl ArenaConfig {
    /// Pages in the first region of a `Fixed` arena.
    pub const FIXED_INITIAL_PAGES: usize = 16;

    /// Pages in the first region of a `Dynamic` arena.
    pub const DYNAMIC_INITIAL_PAGES: usize = 1;

    /// Create a config for `discipline` with the default initial size.
    pub fn new(discipline: Discipline) -> Self {
        let page_size = raw::page_size();
        let pages = match discipline {
            Discipline::Fixed => Self::FIXED_INITIAL_PAGES,
            Discipline::Dynamic => Self::DYNAMIC_INITIAL_PAGES,
        };
        Self {
            discipline,
            initial_capacity: pages * page_size,
            page_size,
        }
    }

    /// Default `Fixed` config: 16 pages, never grows.
    pub fn fixed() -> Self {
        Self::new(Discipline::Fixed)
    }

    /// Default `Dynamic` config: 1 page, grows on demand.
    pub fn dynamic() -> Self {
        Self::new(Discipline::Dynamic)
    }

    /// Override the size of the first region.
    pub fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Check the config for values no arena can be built from.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.page_size.is_power_of_two() || self.page_size < ALIGNMENT {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "page_size must be a power of two >= {ALIGNMENT}, got {}",
                    self.page_size
                ),
            });
        }
        if self.initial_capacity == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "initial_capacity must be non-zero".into(),
            });
        }
        Ok(())
    }
}
