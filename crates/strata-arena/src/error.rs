//! Arena-specific error types.

use thiserror::Error;

/// Errors that can occur during arena operations.
///
/// Every fallible operation either completes or leaves the arena exactly as
/// it was before the call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The OS declined to provide a backing region.
    #[error("out of memory: could not map a {requested}-byte region: {cause}")]
    OutOfMemory {
        /// Size of the region that was requested, in bytes.
        requested: usize,
        /// OS-reported reason.
        cause: String,
    },
    /// A `Fixed` arena has no room for the request and will never grow.
    ///
    /// When `requested > capacity` the request could not fit even in an
    /// empty arena; otherwise a `reset` would make room.
    #[error(
        "arena capacity exceeded: requested {requested} bytes, \
         {available} of {capacity} bytes available"
    )]
    CapacityExceeded {
        /// Aligned size of the request in bytes.
        requested: usize,
        /// Bytes left in the arena's region.
        available: usize,
        /// Total bytes the arena can ever hold.
        capacity: usize,
    },
    /// The requested size cannot be aligned or represented without overflow.
    #[error("invalid allocation size: {requested} bytes")]
    InvalidSize {
        /// Size passed by the caller, in bytes.
        requested: usize,
    },
    /// An [`ArenaConfig`](crate::ArenaConfig) failed validation.
    #[error("invalid arena config: {reason}")]
    InvalidConfig {
        /// What was wrong with the config.
        reason: String,
    },
    /// The OS refused to release a region during teardown.
    ///
    /// The remaining regions are still released; this reports the first
    /// failure.
    #[error("failed to release region {region}: {cause}")]
    ReleaseFailed {
        /// Position of the region in the chain.
        region: usize,
        /// OS-reported reason.
        cause: String,
    },
}

impl ArenaError {
    /// `true` if retrying the same request can never succeed on this arena.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
                ..
            } => requested > capacity,
            Self::InvalidSize { .. } | Self::InvalidConfig { .. } => true,
            Self::OutOfMemory { .. } | Self::ReleaseFailed { .. } => false,
        }
    }
}
