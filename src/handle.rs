//! Producer and consumer handles.
//!
//! [`SpscRing::split`] turns a ring into exactly one [`Producer`] and one
//! [`Consumer`]. Each handle owns its role, so the role operations are safe
//! on the handles.

use core::{cell::Cell, fmt, marker::PhantomData};

#[cfg(not(loom))]
use alloc::sync::Arc;
#[cfg(loom)]
use loom::sync::Arc;

use crate::{
    SpscRing,
    error::Result,
    trace,
    traits::{RingConsumer, RingInfo, RingProducer},
};

/// Marker type to opt-out of `Sync` while remaining `Send`.
type PhantomUnsync = PhantomData<Cell<&'static ()>>;

/// Write end of a ring.
///
/// `Send` but not `Sync` or `Clone`: the handle can move to the producer
/// thread, and no second producer can exist.
pub struct Producer<T> {
    ring: Arc<SpscRing<T>>,
    _unsync: PhantomUnsync,
}

/// Read end of a ring. See [`Producer`] for the thread-safety rules.
pub struct Consumer<T> {
    ring: Arc<SpscRing<T>>,
    _unsync: PhantomUnsync,
}

impl<T> SpscRing<T> {
    /// Share the ring between one producer and one consumer.
    ///
    /// The ring moves behind an `Arc` and stays at that address until both
    /// handles are dropped, at which point remaining items are dropped too.
    #[must_use]
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        trace::trace!(capacity = self.capacity(), "splitting spsc ring");

        let ring = Arc::new(self);
        let producer = Producer {
            ring: Arc::clone(&ring),
            _unsync: PhantomData,
        };
        let consumer = Consumer {
            ring,
            _unsync: PhantomData,
        };
        (producer, consumer)
    }
}

/// Create a ring for at least `capacity` items and split it.
///
/// ```
/// let (mut tx, mut rx) = spsc_ring::channel::<u32>(4).unwrap();
///
/// tx.try_push(1).unwrap();
/// tx.try_push(2).unwrap();
/// assert_eq!(rx.try_pop(), Some(1));
/// assert_eq!(rx.front(), Some(&2));
/// ```
///
/// # Errors
///
/// See [`SpscRing::new`].
pub fn channel<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>)> {
    SpscRing::new(capacity).map(SpscRing::split)
}

impl<T> Producer<T> {
    /// Push an item, handing it back if the ring is full.
    ///
    /// Never blocks. A caller that wants to wait retries in a loop.
    #[inline]
    pub fn try_push(&mut self, item: T) -> core::result::Result<(), T> {
        // Safety: this handle is the only producer.
        unsafe { self.ring.try_push(item) }
    }

    /// True if the ring looked full. Advisory only.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Number of items in the ring. Advisory only.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// True if the ring looked empty. Advisory only.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Maximum number of items the ring holds.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl<T> Consumer<T> {
    /// Borrow the oldest item without removing it.
    ///
    /// The borrow must end before [`pop`](Self::pop) can be called.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        // Safety: this handle is the only consumer, and the returned borrow
        // of `self` rules out `pop`/`try_pop` while it is alive.
        unsafe { self.ring.front() }
    }

    /// Drop the oldest item. Returns `false` if the ring was empty.
    ///
    /// After a successful [`front`](Self::front) the emptiness check only
    /// compares against the consumer's cached tail.
    #[inline]
    pub fn pop(&mut self) -> bool {
        // Safety: this handle is the only consumer; `pop` runs only when
        // `front` has just seen an item.
        unsafe {
            if self.ring.front().is_none() {
                return false;
            }
            self.ring.pop();
        }
        true
    }

    /// Remove and return the oldest item, or `None` if the ring is empty.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        // Safety: this handle is the only consumer.
        unsafe { self.ring.try_pop() }
    }

    /// Iterate over the items currently available, removing each one.
    ///
    /// Stops at the first moment the ring is observed empty; items pushed
    /// afterwards stay in the ring.
    #[inline]
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { consumer: self }
    }

    /// True if the ring looked empty. Advisory only.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of items in the ring. Advisory only.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Maximum number of items the ring holds.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Draining iterator over a [`Consumer`].
pub struct Drain<'a, T> {
    consumer: &'a mut Consumer<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.consumer.try_pop()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        // The producer can only add items, so the snapshot is a lower bound.
        (self.consumer.len(), None)
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").field("ring", &*self.ring).finish()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").field("ring", &*self.ring).finish()
    }
}

impl<T> RingInfo for Producer<T> {
    #[inline]
    fn len(&self) -> usize {
        Producer::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        Producer::capacity(self)
    }
}

impl<T> RingProducer<T> for Producer<T> {
    #[inline]
    fn try_push(&mut self, item: T) -> core::result::Result<(), T> {
        Producer::try_push(self, item)
    }
}

impl<T> RingInfo for Consumer<T> {
    #[inline]
    fn len(&self) -> usize {
        Consumer::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        Consumer::capacity(self)
    }
}

impl<T> RingConsumer<T> for Consumer<T> {
    #[inline]
    fn try_pop(&mut self) -> Option<T> {
        Consumer::try_pop(self)
    }

    #[inline]
    fn peek(&mut self) -> Option<&T> {
        self.front()
    }
}
