//! Property-based tests for `Ring<T>`'s core invariants.

use proptest::prelude::*;
use soralog_ring::{Config, Ring};

// INV-SEQ-01: Bounded Count — the ring never reports more items queued than
// its capacity allows, no matter the put/get sequence.
proptest! {
    #[test]
    fn prop_bounded_count(writes in 0usize..200, reads in 0usize..200) {
        let ring: Ring<u64> = Ring::new(Config::new(32));

        let mut produced = 0usize;
        for i in 0..writes {
            if let Some(mut g) = ring.put() {
                g.write(i as u64);
                g.commit();
                produced += 1;
            }
        }
        prop_assert!(ring.len() <= ring.capacity());

        let mut consumed = 0usize;
        for _ in 0..reads {
            if let Some(g) = ring.get() {
                g.release();
                consumed += 1;
            } else {
                break;
            }
        }
        prop_assert!(consumed <= produced);
        prop_assert!(ring.len() <= ring.capacity());
    }
}

// INV-ORD-03: Happens-Before — a single producer's commits are observed by
// the consumer in the exact order they were committed.
proptest! {
    #[test]
    fn prop_fifo_order(values in prop::collection::vec(any::<u64>(), 0..64)) {
        let ring: Ring<u64> = Ring::new(Config::new(128));

        for &v in &values {
            let mut g = ring.put().expect("ring sized to avoid backpressure");
            g.write(v);
            g.commit();
        }

        for &expected in &values {
            let g = ring.get().expect("as many gets as puts");
            prop_assert_eq!(g.get(), expected);
            g.release();
        }
        prop_assert!(ring.is_empty());
    }
}

// INV-RES-02: abandoning a reservation (drop without commit) never leaks a
// phantom event to the consumer, and the slot is reusable afterwards.
proptest! {
    #[test]
    fn prop_abandoned_reservation_reusable(keep in prop::collection::vec(any::<bool>(), 1..64)) {
        let ring: Ring<u64> = Ring::new(Config::new(4));
        let mut expected = Vec::new();

        for (i, &commit) in keep.iter().enumerate() {
            if let Some(mut g) = ring.put() {
                g.write(i as u64);
                if commit {
                    g.commit();
                    expected.push(i as u64);
                }
                // else: dropped, abandoned
            }
            // Drain eagerly to keep the tiny ring from permanently filling.
            while let Some(g) = ring.get() {
                let v = g.get();
                g.release();
                prop_assert_eq!(Some(v), expected.first().copied());
                expected.remove(0);
            }
        }
        prop_assert!(expected.is_empty());
    }
}
