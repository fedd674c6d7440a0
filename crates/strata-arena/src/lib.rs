//! Region-based bump allocation over OS-mapped memory.
//!
//! An [`Arena`] hands out successive byte ranges from page-granular
//! regions mapped directly from the OS, with no per-allocation bookkeeping.
//! Nothing is freed individually: [`Arena::reset`] rewinds the whole
//! working set, and dropping (or [`Arena::destroy`]-ing) the arena unmaps
//! it. This crate is the only one in the workspace that contains `unsafe`
//! code, confined to `raw.rs` and the allocation entry points.
//!
//! # Architecture
//!
//! ```text
//! Arena (handle, single owner)
//! └── RegionChain (Vec<Region> in creation order + current index)
//!     └── Region × N (one OS mapping + bump offset)
//!         └── raw::Mapping (mmap / munmap)
//! ```
//!
//! # Disciplines
//!
//! - **Fixed:** one 16-page region for the arena's whole life. A request
//!   that does not fit fails with [`ArenaError::CapacityExceeded`].
//! - **Dynamic:** starts with one page. When the current region is full a
//!   new region of `max(2 × newest, request rounded to pages)` is mapped
//!   and linked. Earlier allocations never move.
//!
//! # Lifetimes
//!
//! Allocations borrow the arena, so the compiler rejects use after a
//! reset:
//!
//! ```compile_fail
//! let mut arena = strata_arena::Arena::dynamic().unwrap();
//! let bytes = arena.alloc(8).unwrap();
//! arena.reset();
//! bytes[0] = 1;
//! ```
//!
//! and the arena cannot be shared between threads without external
//! synchronisation:
//!
//! ```compile_fail
//! fn assert_sync<T: Sync>() {}
//! assert_sync::<strata_arena::Arena>();
//! ```
//!
//! # Example
//!
//! ```
//! use strata_arena::{Arena, ArenaError};
//!
//! let mut arena = Arena::dynamic()?;
//! let name = arena.alloc_str("root")?;
//! let children = arena.alloc_slice_copy(&[1u32, 2, 3])?;
//! assert_eq!(name, "root");
//! assert_eq!(children.len(), 3);
//!
//! arena.reset();
//! assert_eq!(arena.used(), 0);
//! # Ok::<(), ArenaError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
mod chain;
pub mod config;
pub mod error;
mod raw;
pub mod region;
pub mod stats;

/// Alignment, in bytes, of every allocation an arena hands out.
pub const ALIGNMENT: usize = 16;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::{ArenaConfig, Discipline};
pub use error::ArenaError;
pub use region::Region;
pub use stats::{ArenaStats, RegionStats};
