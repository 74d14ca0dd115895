//! Ring construction options.

use crate::{
    SpscRing,
    error::Result,
    handle::{Consumer, Producer},
};

/// Configures and allocates an [`SpscRing`].
///
/// ```
/// use spsc_ring::Builder;
///
/// let ring = Builder::new(100).warm(true).build::<u32>().unwrap();
/// assert_eq!(ring.capacity(), 127);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Builder {
    capacity: usize,
    warm: bool,
}

impl Builder {
    /// Builder for a ring holding at least `capacity` items, without warming.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            warm: false,
        }
    }

    /// Touch every slot before returning the ring so the first pushes do not
    /// page-fault. Off by default.
    pub const fn warm(mut self, warm: bool) -> Self {
        self.warm = warm;
        self
    }

    /// Requested capacity, before rounding.
    #[must_use]
    pub const fn requested_capacity(&self) -> usize {
        self.capacity
    }

    /// Allocate the ring.
    ///
    /// # Errors
    ///
    /// See [`SpscRing::new`].
    pub fn build<T>(self) -> Result<SpscRing<T>> {
        SpscRing::allocate(self.capacity, self.warm)
    }

    /// Allocate the ring and split it into its two handles.
    ///
    /// # Errors
    ///
    /// See [`SpscRing::new`].
    pub fn build_split<T>(self) -> Result<(Producer<T>, Consumer<T>)> {
        self.build().map(SpscRing::split)
    }
}
