//! The sender registry: a fixed-size slot table keyed by `seq mod 8`.
//!
//! A `HashMap<u8, SenderHandle>` would work too, but the sequence space is
//! fixed and small (`MAX_SEQ_NO = 8`), so a plain array of optionals avoids
//! hash overhead and makes the "at most one Sender per seq" invariant a
//! property of the type rather than something to check at runtime.

use std::sync::{Arc, Condvar, Mutex};

use crate::sender::SenderHandle;
use crate::MAX_SEQ_NO;

/// The slot table itself. Not shared directly — see [`SharedRegistry`].
pub struct Registry {
    slots: [Option<SenderHandle>; MAX_SEQ_NO],
    len: usize,
    window: usize,
}

impl Registry {
    fn new(window: usize) -> Self {
        Self {
            slots: Default::default(),
            len: 0,
            window,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn is_full(&self) -> bool {
        self.len >= self.window
    }

    fn insert(&mut self, seq: u8, handle: SenderHandle) {
        let slot = &mut self.slots[seq as usize % MAX_SEQ_NO];
        debug_assert!(slot.is_none(), "at most one Sender per seq");
        *slot = Some(handle);
        self.len += 1;
    }

    fn remove(&mut self, seq: u8) -> Option<SenderHandle> {
        let slot = &mut self.slots[seq as usize % MAX_SEQ_NO];
        let handle = slot.take();
        if handle.is_some() {
            self.len -= 1;
        }
        handle
    }

    fn get(&self, seq: u8) -> Option<&SenderHandle> {
        self.slots[seq as usize % MAX_SEQ_NO].as_ref()
    }

    fn get_mut(&mut self, seq: u8) -> Option<&mut SenderHandle> {
        self.slots[seq as usize % MAX_SEQ_NO].as_mut()
    }

    fn drain(&mut self) -> Vec<SenderHandle> {
        let drained: Vec<SenderHandle> = self.slots.iter_mut().filter_map(|s| s.take()).collect();
        self.len = 0;
        drained
    }
}

/// `Arc<(Mutex<Registry>, Condvar)>`, shared between the Controller (which
/// inserts) and the Receiver (which removes on ACK). `send()` waits on the
/// condvar instead of busy-spinning while the registry is at capacity.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<(Mutex<Registry>, Condvar)>,
}

impl SharedRegistry {
    pub fn new(window: usize) -> Self {
        Self {
            inner: Arc::new((Mutex::new(Registry::new(window)), Condvar::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.0.lock().unwrap().is_empty()
    }

    /// Blocks until the registry has room, then inserts `handle` at `seq`.
    pub fn wait_and_insert(&self, seq: u8, handle: SenderHandle) {
        let (lock, cvar) = &*self.inner;
        let mut registry = cvar.wait_while(lock.lock().unwrap(), |r| r.is_full()).unwrap();
        registry.insert(seq, handle);
    }

    /// Attaches a just-spawned thread to the handle reserved at `seq`.
    /// Used to complete a reserve-then-launch `send()`: the handle is
    /// already visible to ACK/NACK dispatch by the time its thread exists.
    pub fn attach_thread(&self, seq: u8, thread: std::thread::JoinHandle<()>) {
        let mut registry = self.inner.0.lock().unwrap();
        if let Some(handle) = registry.get_mut(seq) {
            handle.attach_thread(thread);
        }
    }

    /// Removes the sender at `seq`, if any, and wakes one waiter in `send()`.
    pub fn remove(&self, seq: u8) -> Option<SenderHandle> {
        let (lock, cvar) = &*self.inner;
        let handle = lock.lock().unwrap().remove(seq);
        if handle.is_some() {
            cvar.notify_one();
        }
        handle
    }

    /// Signals the sender at `seq`, if any, without removing it. Used for
    /// NACK dispatch, which re-arms the existing Sender in place.
    pub fn signal(&self, seq: u8, f: impl FnOnce(&SenderHandle)) -> bool {
        let registry = self.inner.0.lock().unwrap();
        match registry.get(seq) {
            Some(handle) => {
                f(handle);
                true
            }
            None => false,
        }
    }

    /// Removes and returns every registered sender, for use by `stop()`.
    pub fn drain(&self) -> Vec<SenderHandle> {
        let (lock, cvar) = &*self.inner;
        let drained = lock.lock().unwrap().drain();
        cvar.notify_all();
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::SenderHandle;
    use std::sync::atomic::AtomicBool;

    fn dummy_handle() -> SenderHandle {
        SenderHandle::for_test(Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn len_tracks_insertions_and_removals() {
        let registry = SharedRegistry::new(3);
        assert_eq!(registry.len(), 0);
        registry.wait_and_insert(0, dummy_handle());
        registry.wait_and_insert(1, dummy_handle());
        assert_eq!(registry.len(), 2);
        assert!(registry.remove(0).is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(0).is_none());
    }

    #[test]
    fn drain_empties_the_registry() {
        let registry = SharedRegistry::new(3);
        registry.wait_and_insert(0, dummy_handle());
        registry.wait_and_insert(1, dummy_handle());
        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn a_reserved_handle_is_visible_before_its_thread_exists() {
        // Mirrors send()'s reserve-then-launch ordering: insert a
        // thread-less handle first, signal it, then attach a thread.
        // The signal set before attachment must still be observed.
        let (stop, wake) = SenderHandle::new_signals();
        let registry = SharedRegistry::new(3);
        registry.wait_and_insert(0, SenderHandle::reserved(Arc::clone(&stop), Arc::clone(&wake)));

        assert_eq!(registry.len(), 1);
        let signalled = registry.signal(0, |handle| handle.nack_received());
        assert!(signalled);

        let (wake_flag, _) = &*wake;
        assert!(*wake_flag.lock().unwrap());
    }
}
