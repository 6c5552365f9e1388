use crate::Config;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::hint;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Each slot carries its own `ready` flag. The flag is the only thing that
// needs to cross threads with acquire/release semantics; the push/pop index
// CAS loops themselves are Relaxed because the ready flag already supplies
// the happens-before edge between a producer's write and a consumer's read
// of the same slot (and vice versa once the slot is recycled).
//
// Producer (`put`):
//   1. Load `push_idx` (Relaxed) and compute `next`.
//   2. Load `pop_idx` (Relaxed) to detect "ring full".
//   3. Load the target slot's `ready` flag (Acquire) to detect "a lagging
//      consumer hasn't cleared this slot yet" and retry if so.
//   4. CAS `push_idx` from the read value to `next` (Relaxed on both
//      success and failure) to claim the slot.
//   5. Write the value in place, then store `ready = true` (Release) on
//      commit — this publishes the write to the consumer.
//
// Consumer (`get`):
//   1. Load `pop_idx` (Relaxed) and compare against `push_idx` (Relaxed) to
//      detect "ring empty".
//   2. Load the target slot's `ready` flag (Acquire) — synchronizes with
//      the producer's Release store, making the written value visible.
//   3. CAS `pop_idx` from the read value to the next index (Relaxed) to
//      claim the slot for reading.
//   4. On guard drop (or explicit `release`), store `ready = false`
//      (Release), recycling the slot for a future producer.
// =============================================================================

struct Slot<T> {
    ready: AtomicBool,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            ready: AtomicBool::new(false),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

// Safety: access to `value` is gated by the `ready` flag's acquire/release
// protocol; only one of {producer, consumer} ever touches a given slot's
// bytes at a time.
unsafe impl<T: Send> Sync for Slot<T> {}

/// A bounded, lock-free, multi-producer/single-consumer-friendly event ring.
///
/// Any number of producer threads may call [`Ring::put`] concurrently; a
/// single background worker (or a synchronous producer taking the flush
/// path) calls [`Ring::get`] to drain it. Capacity need not be a power of
/// two — indices wrap with a modulo rather than a bitmask.
///
/// `T` is required to be `Copy`: slots are recycled by placement-write
/// without ever running a destructor on the previous occupant. Event
/// records are plain, fixed-size data, so this is not a real restriction
/// for this crate's use of `Ring`.
pub struct Ring<T: Copy> {
    capacity: usize,
    push_idx: CachePadded<AtomicUsize>,
    pop_idx: CachePadded<AtomicUsize>,
    closed: AtomicBool,
    slots: Box<[Slot<T>]>,
}

// Safety: `Ring` may be shared across producer/consumer threads as long as
// `T` itself is `Send`; the slot protocol prevents concurrent access to the
// same byte range.
unsafe impl<T: Copy + Send> Send for Ring<T> {}
unsafe impl<T: Copy + Send> Sync for Ring<T> {}

impl<T: Copy> Ring<T> {
    /// Creates a new ring with the given configuration.
    pub fn new(config: Config) -> Self {
        let mut slots = Vec::with_capacity(config.capacity);
        slots.resize_with(config.capacity, Slot::empty);

        Self {
            capacity: config.capacity,
            push_idx: CachePadded::new(AtomicUsize::new(0)),
            pop_idx: CachePadded::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
            slots: slots.into_boxed_slice(),
        }
    }

    /// Returns the ring's slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns an approximate occupancy.
    ///
    /// Per the original design, the distance between the two indices is
    /// updated after the index CAS succeeds but before the ready flag
    /// flips, so treat this as approximate — don't rely on it for
    /// correctness, only for metrics/diagnostics.
    pub fn len(&self) -> usize {
        let push = self.push_idx.load(Ordering::Relaxed);
        let pop = self.pop_idx.load(Ordering::Relaxed);
        if push >= pop {
            push - pop
        } else {
            self.capacity - pop + push
        }
    }

    /// Returns true if no slot is currently occupied.
    pub fn is_empty(&self) -> bool {
        self.push_idx.load(Ordering::Relaxed) == self.pop_idx.load(Ordering::Relaxed)
    }

    /// Closes the ring. Further `put` calls fail; already-queued events may
    /// still be drained with `get`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Returns true if the ring has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Reserve a slot for writing. Returns `None` if the ring is full or
    /// closed. Never blocks.
    pub fn put(&self) -> Option<PutGuard<'_, T>> {
        if self.is_closed() {
            return None;
        }
        loop {
            let head = self.push_idx.load(Ordering::Relaxed);
            let next = (head + 1) % self.capacity;

            if next == self.pop_idx.load(Ordering::Relaxed) {
                return None; // full
            }

            let slot = &self.slots[head];
            if slot.ready.load(Ordering::Acquire) {
                // A lagging consumer hasn't cleared this slot yet.
                hint::spin_loop();
                continue;
            }

            if self
                .push_idx
                .compare_exchange_weak(head, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            return Some(PutGuard {
                ring: self,
                index: head,
                committed: false,
            });
        }
    }

    /// Reserve a slot, retrying with adaptive backoff until the ring has
    /// room or is closed.
    pub fn put_with_backoff(&self) -> Option<PutGuard<'_, T>> {
        let mut backoff = crate::Backoff::new();
        loop {
            if let Some(guard) = self.put() {
                return Some(guard);
            }
            if self.is_closed() {
                return None;
            }
            if backoff.is_completed() {
                return None;
            }
            backoff.snooze();
        }
    }

    /// Claim the next ready slot for reading. Returns `None` if the ring is
    /// empty. Never blocks.
    pub fn get(&self) -> Option<GetGuard<'_, T>> {
        loop {
            let tail = self.pop_idx.load(Ordering::Relaxed);

            if self.push_idx.load(Ordering::Relaxed) == tail {
                return None; // empty
            }

            let slot = &self.slots[tail];
            if !slot.ready.load(Ordering::Acquire) {
                // Producer reserved this slot but hasn't committed yet.
                hint::spin_loop();
                continue;
            }

            let next = (tail + 1) % self.capacity;
            if self
                .pop_idx
                .compare_exchange_weak(tail, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            return Some(GetGuard {
                ring: self,
                index: tail,
                released: false,
            });
        }
    }
}

/// A reserved, writable slot returned by [`Ring::put`].
///
/// If dropped without calling [`PutGuard::commit`], the slot is abandoned:
/// its `ready` flag is left clear so the consumer skips it, and the next
/// producer to claim this index will simply overwrite it.
pub struct PutGuard<'a, T: Copy> {
    ring: &'a Ring<T>,
    index: usize,
    committed: bool,
}

impl<'a, T: Copy> PutGuard<'a, T> {
    /// Writes the event into the reserved slot.
    pub fn write(&mut self, value: T) {
        // Safety: this slot was just claimed by `put` and is not readable
        // until `commit` flips `ready`, so no consumer can race this write.
        unsafe {
            (*self.ring.slots[self.index].value.get()).write(value);
        }
    }

    /// Returns a mutable pointer to the slot's uninitialized storage, for
    /// formatting directly into place rather than constructing a `T` and
    /// copying it in.
    pub fn as_uninit_mut(&mut self) -> &mut MaybeUninit<T> {
        // Safety: see `write`.
        unsafe { &mut *self.ring.slots[self.index].value.get() }
    }

    /// Commits the write, making the event visible to the consumer.
    pub fn commit(mut self) {
        self.ring.slots[self.index]
            .ready
            .store(true, Ordering::Release);
        self.committed = true;
    }
}

impl<'a, T: Copy> Drop for PutGuard<'a, T> {
    fn drop(&mut self) {
        if !self.committed {
            self.ring.slots[self.index]
                .ready
                .store(false, Ordering::Release);
        }
    }
}

/// A claimed, readable slot returned by [`Ring::get`].
///
/// Dereferences to the committed event. Dropping the guard (or calling
/// [`GetGuard::release`] explicitly) clears the slot's `ready` flag,
/// recycling it for a future producer.
pub struct GetGuard<'a, T: Copy> {
    ring: &'a Ring<T>,
    index: usize,
    released: bool,
}

impl<'a, T: Copy> GetGuard<'a, T> {
    /// Returns the event value.
    pub fn get(&self) -> T {
        // Safety: `ready` was observed true with Acquire ordering before
        // this guard was constructed, so the producer's write is visible.
        unsafe { (*self.ring.slots[self.index].value.get()).assume_init() }
    }

    /// Explicitly releases the slot. Equivalent to dropping the guard.
    pub fn release(mut self) {
        self.ring.slots[self.index]
            .ready
            .store(false, Ordering::Release);
        self.released = true;
    }
}

impl<'a, T: Copy> Drop for GetGuard<'a, T> {
    fn drop(&mut self) {
        if !self.released {
            self.ring.slots[self.index]
                .ready
                .store(false, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Item(u64);

    #[test]
    fn put_get_roundtrip() {
        let ring: Ring<Item> = Ring::new(Config::new(4));

        let mut guard = ring.put().unwrap();
        guard.write(Item(42));
        guard.commit();

        let got = ring.get().unwrap();
        assert_eq!(got.get(), Item(42));
        got.release();

        assert!(ring.is_empty());
    }

    #[test]
    fn full_ring_rejects_put() {
        let ring: Ring<Item> = Ring::new(Config::new(2));
        // capacity 2 -> only 1 usable slot (next == pop_idx detects full)
        let mut g1 = ring.put().unwrap();
        g1.write(Item(1));
        g1.commit();

        assert!(ring.put().is_none());
    }

    #[test]
    fn abandoned_reservation_is_skipped() {
        let ring: Ring<Item> = Ring::new(Config::new(4));

        {
            let mut guard = ring.put().unwrap();
            guard.write(Item(1));
            // dropped without commit: abandoned
        }

        assert!(ring.get().is_none());
    }

    #[test]
    fn fifo_order_preserved_single_producer() {
        let ring: Ring<Item> = Ring::new(Config::new(8));

        for i in 0..5 {
            let mut guard = ring.put().unwrap();
            guard.write(Item(i));
            guard.commit();
        }

        for i in 0..5 {
            let got = ring.get().unwrap();
            assert_eq!(got.get(), Item(i));
            got.release();
        }
        assert!(ring.get().is_none());
    }

    #[test]
    fn closed_ring_rejects_put_but_drains() {
        let ring: Ring<Item> = Ring::new(Config::new(4));
        let mut guard = ring.put().unwrap();
        guard.write(Item(7));
        guard.commit();

        ring.close();
        assert!(ring.put().is_none());

        let got = ring.get().unwrap();
        assert_eq!(got.get(), Item(7));
    }

    #[test]
    fn concurrent_producers_single_consumer() {
        use std::sync::Arc;
        use std::thread;

        let ring: Arc<Ring<Item>> = Arc::new(Ring::new(Config::new(1024)));
        let producers = 4;
        let per_producer = 200;

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    for i in 0..per_producer {
                        loop {
                            if let Some(mut guard) = ring.put() {
                                guard.write(Item((p * 10_000 + i) as u64));
                                guard.commit();
                                break;
                            }
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();

        let mut received = 0;
        while received < producers * per_producer {
            if let Some(guard) = ring.get() {
                received += 1;
                guard.release();
            } else {
                thread::yield_now();
            }
        }

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(received, producers * per_producer);
    }
}
