//! Ring positions published by one role and observed by the other.

#[cfg(loom)]
use loom::sync::atomic::{AtomicUsize, Ordering};

#[cfg(not(loom))]
use core::sync::atomic::{AtomicUsize, Ordering};

/// A masked slot position with exactly one writing role.
///
/// `head` is written by the consumer and `tail` by the producer. The writer
/// re-reads its own position with [`own`](Self::own) and hands slots over
/// with [`publish`](Self::publish); the other role calls
/// [`observe`](Self::observe) before it touches a slot the position guards.
#[repr(transparent)]
pub struct AtomicIndex(AtomicUsize);

impl AtomicIndex {
    #[inline]
    pub fn new(pos: usize) -> Self {
        Self(AtomicUsize::new(pos))
    }

    /// Read the other role's position. Pairs with its [`publish`](Self::publish),
    /// so every slot access that preceded the publish is visible afterwards.
    #[inline]
    pub fn observe(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    /// Read a position without synchronising.
    ///
    /// Exact for the writing role. For anyone else it is a snapshot that may
    /// already be stale, which is all the diagnostics need.
    #[inline]
    pub fn own(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Hand the slots before `pos` over to the other role.
    #[inline]
    pub fn publish(&self, pos: usize) {
        self.0.store(pos, Ordering::Release);
    }

    /// Position seen through `&mut`, once neither role can be running.
    #[inline]
    #[cfg(not(loom))]
    pub fn settled(&mut self) -> usize {
        *self.0.get_mut()
    }

    #[inline]
    #[cfg(loom)]
    pub fn settled(&mut self) -> usize {
        self.0.with_mut(|pos| *pos)
    }
}
