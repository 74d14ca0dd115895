//! Fixed-capacity, lock-free single-producer single-consumer ring buffer.
//!
//! One thread pushes, one thread pops, and neither ever takes a lock or
//! allocates after construction. Every operation finishes in a bounded
//! number of steps; callers that want to wait poll in a loop.
//!
//! ```
//! use std::thread;
//!
//! let (mut tx, mut rx) = spsc_ring::channel::<u64>(1024).unwrap();
//!
//! let producer = thread::spawn(move || {
//!     for i in 0..10_000 {
//!         let mut item = i;
//!         while let Err(back) = tx.try_push(item) {
//!             item = back;
//!             thread::yield_now();
//!         }
//!     }
//! });
//!
//! let mut expected = 0;
//! while expected < 10_000 {
//!     match rx.try_pop() {
//!         Some(v) => {
//!             assert_eq!(v, expected);
//!             expected += 1;
//!         }
//!         None => thread::yield_now(),
//!     }
//! }
//! producer.join().unwrap();
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod builder;
mod error;
mod handle;
mod index;
mod ring;
mod trace;
mod traits;

#[cfg(all(test, not(loom)))]
mod tests;

pub use builder::Builder;
pub use error::{Error, Result};
pub use handle::{Consumer, Drain, Producer, channel};
pub use ring::SpscRing;
pub use traits::{RingConsumer, RingInfo, RingProducer};
