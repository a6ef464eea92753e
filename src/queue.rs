//! The inbound queue: a bounded FIFO of received payloads.
//!
//! Grounded in `original_source/hdlcontroller/hdlcontroller.py`'s
//! `Queue(maxsize=frames_queue_size)` (0 = unbounded) and in the
//! `Condvar`-gated buffers of `maminrayej-handshake/src/tcp/stream.rs`.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

struct Inner {
    items: VecDeque<Vec<u8>>,
    capacity: usize,
}

impl Inner {
    fn is_full(&self) -> bool {
        self.capacity != 0 && self.items.len() >= self.capacity
    }
}

/// `Arc<(Mutex<VecDeque<Vec<u8>>>, Condvar)>`, shared between the Receiver
/// (which pushes) and the application thread (which pops via
/// `get_data()`).
#[derive(Clone)]
pub struct SharedQueue {
    inner: Arc<(Mutex<Inner>, Condvar)>,
}

impl SharedQueue {
    /// `capacity == 0` means unbounded, matching spec.md §3's `Q = 0`.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(Inner {
                    items: VecDeque::new(),
                    capacity,
                }),
                Condvar::new(),
            )),
        }
    }

    /// Pushes `payload` without blocking. Returns `false` (and drops the
    /// payload) if the queue is at capacity.
    pub fn try_push(&self, payload: Vec<u8>) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut inner = lock.lock().unwrap();
        if inner.is_full() {
            return false;
        }
        inner.items.push_back(payload);
        cvar.notify_one();
        true
    }

    /// Blocks until a payload is available, then returns it.
    pub fn pop(&self) -> Vec<u8> {
        let (lock, cvar) = &*self.inner;
        let mut inner = cvar.wait_while(lock.lock().unwrap(), |i| i.items.is_empty()).unwrap();
        inner.items.pop_front().expect("queue non-empty by wait_while")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_round_trips() {
        let queue = SharedQueue::new(0);
        assert!(queue.try_push(b"test".to_vec()));
        assert_eq!(queue.pop(), b"test");
    }

    #[test]
    fn bounded_queue_rejects_past_capacity() {
        let queue = SharedQueue::new(1);
        assert!(queue.try_push(b"a".to_vec()));
        assert!(!queue.try_push(b"b".to_vec()));
        assert_eq!(queue.pop(), b"a");
    }

    #[test]
    fn zero_capacity_is_unbounded() {
        let queue = SharedQueue::new(0);
        for i in 0..100 {
            assert!(queue.try_push(vec![i]));
        }
    }
}
