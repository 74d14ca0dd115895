use alloc::{format, rc::Rc, string::String, vec::Vec};
use core::cell::Cell;

use crate::{Error, SpscRing, ring::slot_count};

struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

/// A type with no `Default` impl and a heap-owning field.
#[derive(Debug, PartialEq)]
struct NoDefault(String);

#[test]
fn capacity_rounds_to_power_of_two_minus_one() {
    let cases = [
        (0, 1, 2),
        (1, 1, 2),
        (2, 1, 2),
        (3, 3, 4),
        (4, 3, 4),
        (5, 7, 8),
        (7, 7, 8),
        (8, 7, 8),
        (9, 15, 16),
        (1000, 1023, 1024),
        (1024, 1023, 1024),
    ];

    for (requested, capacity, buffer_size) in cases {
        let ring = SpscRing::<u32>::new(requested).unwrap();
        assert_eq!(ring.capacity(), capacity, "requested {requested}");
        assert_eq!(ring.buffer_size(), buffer_size, "requested {requested}");
    }
}

#[test]
fn slot_count_matches_next_power_of_two() {
    for requested in 0..=4096usize {
        let expected = requested.max(1).next_power_of_two().max(2);
        assert_eq!(slot_count(requested).unwrap(), expected);
        assert!(expected - 1 >= 1);
    }
}

#[test]
fn capacity_overflow_is_reported() {
    let requested = usize::MAX / 2 + 2;
    let err = SpscRing::<u8>::new(requested).unwrap_err();
    assert!(matches!(err, Error::CapacityOverflow { requested: r } if r == requested));
    assert_eq!(
        format!("{err}"),
        format!("capacity {requested} cannot be rounded up to a power of two")
    );
}

#[test]
fn allocation_failure_is_reported() {
    // The byte size of this slot array overflows `isize`, so the allocator
    // refuses it without attempting the allocation.
    let slots = 1usize << (usize::BITS - 2);
    let err = SpscRing::<u64>::new(slots).unwrap_err();
    assert!(matches!(err, Error::Alloc { slots: s, .. } if s == slots));
    assert_eq!(format!("{err}"), format!("failed to allocate {slots} ring slots"));
}

#[test]
fn construct_five_gives_capacity_seven() {
    let ring = SpscRing::<i32>::new(5).unwrap();
    assert_eq!(ring.capacity(), 7);
    assert_eq!(ring.buffer_size(), 8);
    assert!(ring.is_empty());
    assert!(!ring.is_full());
    assert_eq!(ring.len(), 0);
}

#[test]
fn fill_then_reject_then_drain_in_order() {
    let ring = SpscRing::<i32>::new(7).unwrap();

    for i in 0..7 {
        assert!(unsafe { ring.try_push(i) }.is_ok());
        assert_eq!(ring.len(), (i + 1) as usize);
    }
    assert!(ring.is_full());
    assert_eq!(unsafe { ring.try_push(99) }, Err(99));
    assert_eq!(ring.len(), 7);

    for expected in 0..7 {
        assert_eq!(unsafe { ring.try_pop() }, Some(expected));
    }
    assert!(unsafe { ring.front() }.is_none());
    assert!(unsafe { ring.try_pop() }.is_none());
    assert!(ring.is_empty());
}

#[test]
fn push_pop_push_keeps_order_and_size() {
    let ring = SpscRing::<i32>::new(5).unwrap();
    assert!(ring.capacity() >= 4);

    let mut popped = Vec::new();
    for i in 0..3 {
        unsafe { ring.try_push(i) }.unwrap();
    }
    popped.push(unsafe { ring.try_pop() }.unwrap());
    unsafe { ring.try_push(3) }.unwrap();
    assert_eq!(ring.len(), 3);

    while let Some(v) = unsafe { ring.try_pop() } {
        popped.push(v);
    }
    assert_eq!(popped, [0, 1, 2, 3]);
}

#[test]
fn front_does_not_remove() {
    let ring = SpscRing::<u32>::new(4).unwrap();
    assert!(unsafe { ring.front() }.is_none());

    unsafe { ring.try_push(10) }.unwrap();
    unsafe { ring.try_push(20) }.unwrap();

    assert_eq!(unsafe { ring.front() }, Some(&10));
    assert_eq!(unsafe { ring.front() }, Some(&10));
    assert_eq!(ring.len(), 2);

    unsafe { ring.pop() };
    assert_eq!(unsafe { ring.front() }, Some(&20));
    unsafe { ring.pop() };
    assert!(unsafe { ring.front() }.is_none());
    assert!(ring.is_empty());
}

#[test]
fn wraps_around_many_times() {
    let ring = SpscRing::<usize>::new(3).unwrap();
    let mut next_push = 0;
    let mut next_pop = 0;

    for round in 0..1000 {
        let burst = round % 4;
        for _ in 0..burst {
            if unsafe { ring.try_push(next_push) }.is_ok() {
                next_push += 1;
            }
        }
        assert!(ring.len() <= ring.capacity());
        if let Some(v) = unsafe { ring.try_pop() } {
            assert_eq!(v, next_pop);
            next_pop += 1;
        }
    }

    while let Some(v) = unsafe { ring.try_pop() } {
        assert_eq!(v, next_pop);
        next_pop += 1;
    }
    assert_eq!(next_pop, next_push);
}

#[test]
fn minimum_ring_holds_exactly_one() {
    let ring = SpscRing::<u8>::new(0).unwrap();
    assert_eq!(ring.capacity(), 1);

    unsafe { ring.try_push(1) }.unwrap();
    assert!(ring.is_full());
    assert_eq!(unsafe { ring.try_push(2) }, Err(2));
    assert_eq!(unsafe { ring.try_pop() }, Some(1));
    unsafe { ring.try_push(3) }.unwrap();
    assert_eq!(unsafe { ring.try_pop() }, Some(3));
}

#[test]
fn element_type_needs_no_default() {
    let ring = SpscRing::<NoDefault>::new(3).unwrap();
    for name in ["a", "b", "c"] {
        unsafe { ring.try_push(NoDefault(name.into())) }.unwrap();
    }

    let rejected = unsafe { ring.try_push(NoDefault("d".into())) }.unwrap_err();
    assert_eq!(rejected, NoDefault("d".into()));

    assert_eq!(unsafe { ring.front() }, Some(&NoDefault("a".into())));
    assert_eq!(unsafe { ring.try_pop() }, Some(NoDefault("a".into())));
    assert_eq!(unsafe { ring.try_pop() }, Some(NoDefault("b".into())));
}

#[test]
fn zero_sized_items() {
    let ring = SpscRing::<()>::new(3).unwrap();
    for _ in 0..3 {
        unsafe { ring.try_push(()) }.unwrap();
    }
    assert!(ring.is_full());
    assert_eq!(unsafe { ring.try_pop() }, Some(()));
    assert_eq!(ring.len(), 2);
}

#[test]
fn huge_zero_sized_ring_builds_without_touching_slots() {
    let requested = 1usize << (usize::BITS - 2);
    let ring = SpscRing::<()>::new(requested).unwrap();
    assert_eq!(ring.buffer_size(), requested);
    assert_eq!(ring.capacity(), requested - 1);

    unsafe { ring.try_push(()) }.unwrap();
    assert_eq!(ring.len(), 1);
    assert_eq!(unsafe { ring.try_pop() }, Some(()));
    assert!(ring.is_empty());
}

#[test]
fn pop_drops_the_item() {
    let drops = Rc::new(Cell::new(0));
    let ring = SpscRing::new(4).unwrap();

    unsafe { ring.try_push(DropCounter(drops.clone())) }.ok().unwrap();
    unsafe { ring.try_push(DropCounter(drops.clone())) }.ok().unwrap();

    assert!(unsafe { ring.front() }.is_some());
    unsafe { ring.pop() };
    assert_eq!(drops.get(), 1);

    let item = unsafe { ring.try_pop() }.unwrap();
    assert_eq!(drops.get(), 1);
    drop(item);
    assert_eq!(drops.get(), 2);
}

#[test]
fn rejected_push_hands_item_back_undropped() {
    let drops = Rc::new(Cell::new(0));
    let ring = SpscRing::new(1).unwrap();

    unsafe { ring.try_push(DropCounter(drops.clone())) }.ok().unwrap();
    let rejected = unsafe { ring.try_push(DropCounter(drops.clone())) }.err().unwrap();
    assert_eq!(drops.get(), 0);

    drop(rejected);
    assert_eq!(drops.get(), 1);
}

#[test]
fn drop_releases_remaining_items() {
    let drops = Rc::new(Cell::new(0));
    {
        let ring = SpscRing::new(8).unwrap();
        for _ in 0..5 {
            unsafe { ring.try_push(DropCounter(drops.clone())) }.ok().unwrap();
        }
        drop(unsafe { ring.try_pop() });
        assert_eq!(drops.get(), 1);
    }
    assert_eq!(drops.get(), 5);
}

#[test]
fn drop_after_wrap_releases_remaining_items() {
    let drops = Rc::new(Cell::new(0));
    {
        let ring = SpscRing::new(3).unwrap();
        for _ in 0..10 {
            unsafe { ring.try_push(DropCounter(drops.clone())) }.ok().unwrap();
            drop(unsafe { ring.try_pop() });
        }
        for _ in 0..3 {
            unsafe { ring.try_push(DropCounter(drops.clone())) }.ok().unwrap();
        }
        assert_eq!(drops.get(), 10);
    }
    assert_eq!(drops.get(), 13);
}

#[test]
fn debug_shows_capacity_and_len() {
    let ring = SpscRing::<u8>::new(4).unwrap();
    unsafe { ring.try_push(1) }.unwrap();
    assert_eq!(format!("{ring:?}"), "SpscRing { capacity: 3, len: 1, .. }");
}
