//! Lock-free single-producer / single-consumer ring buffer.
//!
//! The buffer is split into a [`Producer`] and a [`Consumer`] at construction.
//! Neither half is `Clone`, so exactly one context can push and exactly one can
//! pop. Cursors are independent atomics:
//! - the producer only ever stores `head`
//! - the consumer only ever stores `tail`
//!
//! Full when `(head + 1) % N == tail`, empty when `head == tail`, so `N - 1`
//! slots are usable.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared<T, const N: usize> {
    head: AtomicUsize,
    tail: AtomicUsize,
    slots: [UnsafeCell<T>; N],
}

// Safety: a slot is written only by the producer while it is outside the
// consumer's readable range, and read only by the consumer after the release
// store on `head` made it visible.
unsafe impl<T: Send, const N: usize> Sync for Shared<T, N> {}

impl<T, const N: usize> Shared<T, N> {
    const MASK: usize = N - 1;
    const POWER_OF_TWO: () = assert!(N >= 2 && N.is_power_of_two(), "N must be a power of 2");
}

/// Writing half, owned by the interrupt context.
pub struct Producer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

/// Reading half, owned by the main context.
pub struct Consumer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

/// Creates an empty buffer and returns its two halves.
pub fn ring_buffer<T: Copy + Default, const N: usize>() -> (Producer<T, N>, Consumer<T, N>) {
    #[allow(clippy::let_unit_value)]
    let () = Shared::<T, N>::POWER_OF_TWO;

    let shared = Arc::new(Shared {
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
        slots: std::array::from_fn(|_| UnsafeCell::new(T::default())),
    });

    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

impl<T: Copy, const N: usize> Producer<T, N> {
    /// Non-blocking push. Hands the value back when the buffer is full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let shared = &self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let next = (head + 1) & Shared::<T, N>::MASK;

        if next == shared.tail.load(Ordering::Acquire) {
            return Err(value);
        }

        // Safety: `head` is not readable by the consumer until the store below.
        unsafe { *shared.slots[head].get() = value };
        shared.head.store(next, Ordering::Release);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        let head = self.shared.head.load(Ordering::Relaxed);
        (head + 1) & Shared::<T, N>::MASK == self.shared.tail.load(Ordering::Acquire)
    }
}

impl<T: Copy, const N: usize> Consumer<T, N> {
    /// Pops the oldest value, or `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        let shared = &self.shared;
        let tail = shared.tail.load(Ordering::Relaxed);

        if tail == shared.head.load(Ordering::Acquire) {
            return None;
        }

        // Safety: the acquire load above makes the producer's write visible and
        // the producer will not touch `tail` until we release it.
        let value = unsafe { *shared.slots[tail].get() };
        shared
            .tail
            .store((tail + 1) & Shared::<T, N>::MASK, Ordering::Release);
        Some(value)
    }

    /// Number of values currently queued.
    pub fn len(&self) -> usize {
        let head = self.shared.head.load(Ordering::Acquire);
        let tail = self.shared.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & Shared::<T, N>::MASK
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable slots (`N - 1`).
    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_buffer_pops_nothing() {
        let (_tx, mut rx) = ring_buffer::<u32, 8>();
        assert!(rx.is_empty());
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_full_when_head_one_behind_tail() {
        let (mut tx, mut rx) = ring_buffer::<u32, 4>();
        assert!(tx.push(1).is_ok());
        assert!(tx.push(2).is_ok());
        assert!(tx.push(3).is_ok());
        assert!(tx.is_full());
        assert_eq!(tx.push(4), Err(4));
        assert_eq!(rx.len(), 3);

        assert_eq!(rx.pop(), Some(1));
        assert!(tx.push(4).is_ok());
        assert_eq!(rx.pop(), Some(2));
        assert_eq!(rx.pop(), Some(3));
        assert_eq!(rx.pop(), Some(4));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_cross_thread_fifo() {
        let (mut tx, mut rx) = ring_buffer::<u32, 64>();
        let producer = thread::spawn(move || {
            let mut value = 0;
            while value < 10_000 {
                if tx.push(value).is_ok() {
                    value += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0;
        while expected < 10_000 {
            if let Some(value) = rx.pop() {
                assert_eq!(value, expected);
                expected += 1;
            } else {
                thread::yield_now();
            }
        }
        producer.join().unwrap();
        assert!(rx.is_empty());
    }
}
