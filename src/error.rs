//! Construction errors.
//!
//! A full or empty ring is an ordinary outcome reported through `Result`/
//! `Option` on the push and pop operations, never through [`Error`].

use alloc::collections::TryReserveError;

use snafu::Snafu;

/// Reasons a ring could not be constructed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The slot array could not be allocated.
    #[snafu(display("failed to allocate {slots} ring slots"))]
    Alloc {
        /// Number of slots that were requested from the allocator.
        slots: usize,
        /// Allocator failure.
        source: TryReserveError,
    },

    /// The requested capacity has no power of two representable in `usize`.
    #[snafu(display("capacity {requested} cannot be rounded up to a power of two"))]
    CapacityOverflow {
        /// Capacity passed by the caller.
        requested: usize,
    },
}

/// Result alias for ring construction.
pub type Result<T, E = Error> = core::result::Result<T, E>;
