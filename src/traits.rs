//! Role traits implemented by the ring handles.

/// Occupancy information about a ring.
///
/// Values are snapshots: a concurrent producer or consumer can change them
/// at any moment.
pub trait RingInfo {
    /// Number of items in the ring.
    fn len(&self) -> usize;

    /// Maximum number of items the ring holds.
    fn capacity(&self) -> usize;

    /// True if the ring holds no items.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the ring holds `capacity()` items.
    #[inline]
    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

/// Write side of a ring.
pub trait RingProducer<T>: RingInfo {
    /// Push an item, handing it back if the ring is full.
    fn try_push(&mut self, item: T) -> Result<(), T>;
}

/// Read side of a ring.
pub trait RingConsumer<T>: RingInfo {
    /// Remove and return the oldest item.
    fn try_pop(&mut self) -> Option<T>;

    /// Borrow the oldest item without removing it.
    fn peek(&mut self) -> Option<&T>;
}
