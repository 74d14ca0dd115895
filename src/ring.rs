//! Fixed-capacity SPSC ring buffer.

use alloc::{boxed::Box, vec::Vec};
use core::{cell::Cell, fmt, mem::MaybeUninit};

#[cfg(loom)]
use loom::cell::UnsafeCell;

#[cfg(not(loom))]
use core::cell::UnsafeCell;

use snafu::{OptionExt, ResultExt};

use crate::{
    builder::Builder,
    error::{AllocSnafu, CapacityOverflowSnafu, Result},
    index::AtomicIndex,
    trace,
};

/// Slot wrapper holding one item in the ring buffer.
///
/// Slots start uninitialised, so `T` needs no `Default` impl. A slot is
/// initialised exactly when its index lies in `[head, tail)`.
///
/// All access goes through [`with`](Self::with) / [`with_mut`](Self::with_mut)
/// so that loom can track slot reads and writes against the index protocol.
#[repr(transparent)]
pub(crate) struct Slot<T> {
    data: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    #[cfg(loom)]
    fn new() -> Self {
        Self {
            data: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    #[inline]
    #[cfg(not(loom))]
    fn with<R>(&self, f: impl FnOnce(*const MaybeUninit<T>) -> R) -> R {
        f(self.data.get())
    }

    #[inline]
    #[cfg(not(loom))]
    fn with_mut<R>(&self, f: impl FnOnce(*mut MaybeUninit<T>) -> R) -> R {
        f(self.data.get())
    }

    #[inline]
    #[cfg(loom)]
    fn with<R>(&self, f: impl FnOnce(*const MaybeUninit<T>) -> R) -> R {
        self.data.with(f)
    }

    #[inline]
    #[cfg(loom)]
    fn with_mut<R>(&self, f: impl FnOnce(*mut MaybeUninit<T>) -> R) -> R {
        self.data.with_mut(f)
    }
}

/// Target cache-line size in bytes. 64 bytes is correct for x86-64 and most
/// ARM64 server cores. Adjust if targeting a platform with a different line
/// size (e.g. 128 bytes on Apple M-series).
pub(crate) const CACHE_LINE: usize = 64;

/// Padding to fill the consumer cache line (head + cached_tail + pad = CACHE_LINE).
const HEAD_PAD: usize =
    CACHE_LINE.saturating_sub(size_of::<AtomicIndex>() + size_of::<Cell<usize>>());

/// Padding to fill the producer cache line (tail + cached_head + pad = CACHE_LINE).
const TAIL_PAD: usize =
    CACHE_LINE.saturating_sub(size_of::<AtomicIndex>() + size_of::<Cell<usize>>());

/// Lock-free ring buffer for exactly one producer and one consumer.
///
/// The slot array holds `buffer_size()` slots, always a power of two of at
/// least 2. One slot stays empty so that `head == tail` means empty and
/// `tail + 1 == head` means full, giving a usable capacity of
/// `buffer_size() - 1`.
///
/// Fields are laid out with explicit cache-line padding. The consumer's line
/// holds `head` and its private copy of `tail`; the producer's line holds
/// `tail` and its private copy of `head`. Neither role writes to the other's
/// line.
///
/// The role operations ([`try_push`](Self::try_push), [`front`](Self::front),
/// [`pop`](Self::pop), [`try_pop`](Self::try_pop)) are `unsafe` because the
/// ring cannot tell which thread calls them. [`split`](Self::split) hands out
/// [`Producer`](crate::Producer) and [`Consumer`](crate::Consumer) handles
/// that make the roles safe to use.
///
/// Once shared, the ring must stay at one address: both roles hold
/// references to the same instance. `split` moves it behind an `Arc` for
/// that reason.
#[repr(C, align(64))]
pub struct SpscRing<T> {
    // ── Consumer cache line (consumer writes head, producer reads it) ──
    head: AtomicIndex,
    /// Consumer-local cache of tail. Only the consumer reads/writes this field.
    cached_tail: Cell<usize>,
    _pad_head: [u8; HEAD_PAD],

    // ── Producer cache line (producer writes tail, consumer reads it) ──
    tail: AtomicIndex,
    /// Producer-local cache of head. Only the producer reads/writes this field.
    cached_head: Cell<usize>,
    _pad_tail: [u8; TAIL_PAD],

    // ── Cold fields ──────────────────────────────────────────────────
    mask: usize,
    buffer: Box<[Slot<T>]>,
}

// SAFETY: `head` and `tail` each have a single writer and are published with
// Release / observed with Acquire. `cached_tail` is only touched by the
// consumer and `cached_head` only by the producer. A slot is accessed by the
// producer while it is free and by the consumer while it is occupied, and
// ownership changes hands only through the index publication.
unsafe impl<T: Send> Sync for SpscRing<T> {}

/// Number of slots allocated for a requested capacity.
///
/// `next_power_of_two(max(requested, 1))`, raised to at least 2 so that one
/// usable slot remains next to the sentinel.
pub(crate) fn slot_count(requested: usize) -> Result<usize> {
    requested
        .max(1)
        .checked_next_power_of_two()
        .map(|slots| slots.max(2))
        .context(CapacityOverflowSnafu { requested })
}

impl<T> SpscRing<T> {
    /// Create a ring holding at least `capacity` items.
    ///
    /// The slot count is rounded up to a power of two, so the usable
    /// [`capacity()`](Self::capacity) is `next_power_of_two(max(capacity, 1)) - 1`
    /// and never less than 1. This is the only allocation the ring performs.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`](crate::Error::Alloc) if the slot array cannot be
    /// allocated, [`Error::CapacityOverflow`](crate::Error::CapacityOverflow)
    /// if the rounded capacity does not fit in `usize`.
    pub fn new(capacity: usize) -> Result<Self> {
        Builder::new(capacity).build()
    }

    pub(crate) fn allocate(capacity: usize, warm: bool) -> Result<Self> {
        let slots = slot_count(capacity)?;

        let mut buffer: Vec<Slot<T>> = Vec::new();
        buffer
            .try_reserve_exact(slots)
            .context(AllocSnafu { slots })?;

        // Safety: a `Slot` is an `UnsafeCell<MaybeUninit<T>>`, for which
        // uninitialised memory is a valid value, and the capacity was just
        // reserved. This is O(1) for every `T`, zero-sized or not.
        #[cfg(not(loom))]
        unsafe {
            buffer.set_len(slots)
        };
        #[cfg(loom)]
        buffer.extend((0..slots).map(|_| Slot::new()));

        let ring = Self {
            head: AtomicIndex::new(0),
            cached_tail: Cell::new(0),
            _pad_head: [0; HEAD_PAD],
            tail: AtomicIndex::new(0),
            cached_head: Cell::new(0),
            _pad_tail: [0; TAIL_PAD],
            mask: slots - 1,
            buffer: buffer.into_boxed_slice(),
        };

        if warm {
            ring.warm();
        }

        trace::debug!(
            requested = capacity,
            capacity = ring.capacity(),
            slots,
            warm,
            "allocated spsc ring"
        );
        Ok(ring)
    }

    /// Bring all ring slots into cache.
    ///
    /// Touches every slot with zero bytes to fault the pages in. No items
    /// are logically added to the ring.
    fn warm(&self) {
        for slot in self.buffer.iter() {
            // Safety: writing raw bytes into MaybeUninit storage is always
            // valid, and the ring is not shared yet.
            slot.with_mut(|ptr| unsafe {
                core::ptr::write_bytes(ptr as *mut u8, 0, size_of::<MaybeUninit<T>>());
            });
        }
    }

    /// Push an item, handing it back if the ring is full.
    ///
    /// Completes in a bounded number of steps. The cached head is consulted
    /// first; the real `head` is only loaded when the cache says full.
    ///
    /// # Safety
    ///
    /// Only one thread may act as producer: no other call to `try_push` may
    /// run concurrently with this one.
    #[inline]
    pub unsafe fn try_push(&self, item: T) -> core::result::Result<(), T> {
        let tail = self.tail.own();
        let next = (tail + 1) & self.mask;

        if next == self.cached_head.get() {
            let head = self.head.observe();
            self.cached_head.set(head);

            if next == head {
                return Err(item);
            }
        }

        // Safety: `tail` is masked, and the slot is free because
        // `next != head`. The consumer will not read it until the store below.
        self.buffer[tail].with_mut(|ptr| unsafe {
            (*ptr).write(item);
        });
        self.tail.publish(next);
        Ok(())
    }

    /// Reference to the oldest item, or `None` if the ring is empty.
    ///
    /// The item stays in the ring until [`pop`](Self::pop) is called.
    ///
    /// # Safety
    ///
    /// Only one thread may act as consumer, and the returned reference must
    /// not outlive the next `pop` or `try_pop`.
    #[inline]
    #[must_use]
    pub unsafe fn front(&self) -> Option<&T> {
        let head = self.head.own();

        if head == self.cached_tail.get() {
            let tail = self.tail.observe();
            self.cached_tail.set(tail);

            if head == tail {
                return None;
            }
        }

        // Safety: the Acquire load of `tail` that exposed this slot
        // happens-after the producer's write to it.
        Some(self.buffer[head].with(|ptr| unsafe { (*ptr).assume_init_ref() }))
    }

    /// Drop the oldest item and release its slot to the producer.
    ///
    /// # Safety
    ///
    /// Consumer only, and the ring must be non-empty: call this only after
    /// [`front`](Self::front) returned `Some` on the same thread. Popping an
    /// empty ring corrupts the occupancy count.
    #[inline]
    pub unsafe fn pop(&self) {
        let head = self.head.own();
        debug_assert_ne!(head, self.tail.own(), "pop on an empty ring");

        // Safety: the caller guarantees the slot is occupied.
        self.buffer[head].with_mut(|ptr| unsafe { (*ptr).assume_init_drop() });
        self.head.publish((head + 1) & self.mask);
    }

    /// Move the oldest item out, or `None` if the ring is empty.
    ///
    /// Equivalent to `front` followed by `pop`, with a single emptiness check.
    ///
    /// # Safety
    ///
    /// Only one thread may act as consumer.
    #[inline]
    pub unsafe fn try_pop(&self) -> Option<T> {
        let head = self.head.own();

        if head == self.cached_tail.get() {
            let tail = self.tail.observe();
            self.cached_tail.set(tail);

            if head == tail {
                return None;
            }
        }

        // Safety: see `front`. The slot is released by the store below, so
        // the value is read out exactly once.
        let item = self.buffer[head].with(|ptr| unsafe { (*ptr).assume_init_read() });
        self.head.publish((head + 1) & self.mask);
        Some(item)
    }

    /// True if the ring looked empty when both indices were read.
    ///
    /// Racy snapshot: with a live producer or consumer the answer can be
    /// stale before it is returned. Never use it to predict whether a
    /// following push or pop will succeed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.own() == self.tail.own()
    }

    /// True if the ring looked full. Racy snapshot, see [`is_empty`](Self::is_empty).
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        let next = (self.tail.own() + 1) & self.mask;
        next == self.head.own()
    }

    /// Number of items in the ring. Racy snapshot, see [`is_empty`](Self::is_empty).
    ///
    /// Always within `0..=capacity()` because the difference is masked.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        let head = self.head.own();
        let tail = self.tail.own();
        tail.wrapping_sub(head) & self.mask
    }

    /// Maximum number of items the ring holds.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.mask
    }

    /// Number of allocated slots, sentinel included.
    #[inline]
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.mask + 1
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        if !core::mem::needs_drop::<T>() {
            return;
        }

        let mut head = self.head.settled();
        let tail = self.tail.settled();
        while head != tail {
            // Safety: `[head, tail)` is exactly the initialised range, and
            // `&mut self` excludes both roles.
            self.buffer[head].with_mut(|ptr| unsafe { (*ptr).assume_init_drop() });
            head = (head + 1) & self.mask;
        }
    }
}

impl<T> fmt::Debug for SpscRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscRing")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
