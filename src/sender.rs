//! The Sender task: one thread per outstanding outbound frame.
//!
//! State machine: `ARMED → (timer fires | NACK wakeup) → TRANSMITTING →
//! ARMED` until `STOPPED`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::codec::{encode_frame, FrameKind};
use crate::types::{SharedCallback, TransmitLock};

type WakeSignal = Arc<(Mutex<bool>, Condvar)>;

/// A handle to a Sender, owned by the sender registry. May be `reserved`
/// (its slot is taken and its stop/wake signals are live, but no thread
/// has been spawned yet) or fully `attach_thread`-ed.
pub struct SenderHandle {
    stop: Arc<AtomicBool>,
    wake: WakeSignal,
    thread: Option<JoinHandle<()>>,
}

impl SenderHandle {
    /// Builds the stop/wake signals for a new Sender, ahead of both its
    /// registry insertion and its thread's existence.
    pub fn new_signals() -> (Arc<AtomicBool>, WakeSignal) {
        (
            Arc::new(AtomicBool::new(false)),
            Arc::new((Mutex::new(false), Condvar::new())),
        )
    }

    /// A handle for a Sender that has reserved its registry slot but whose
    /// thread has not been spawned yet. This is what makes
    /// reserve-then-launch safe: an ACK or NACK arriving for this seq
    /// before the thread exists still finds a handle in the registry and
    /// can signal `stop`/`wake` on it, and the thread (spawned moments
    /// later against these same signals) observes that signal on its very
    /// first check before ever transmitting.
    pub fn reserved(stop: Arc<AtomicBool>, wake: WakeSignal) -> Self {
        Self {
            stop,
            wake,
            thread: None,
        }
    }

    /// Spawns the thread that re-emits `payload` every `timeout` until
    /// told otherwise, reusing signals already visible to the registry
    /// via [`Self::reserved`].
    pub fn spawn_thread(
        payload: Vec<u8>,
        seq: u8,
        timeout: Duration,
        transmit: TransmitLock,
        send_callback: SharedCallback,
        stop: Arc<AtomicBool>,
        wake: WakeSignal,
    ) -> JoinHandle<()> {
        let thread_stop = Arc::clone(&stop);
        let thread_wake = Arc::clone(&wake);

        thread::Builder::new()
            .name(format!("hdlc-sender-{seq}"))
            .spawn(move || run(payload, seq, timeout, transmit, send_callback, thread_stop, thread_wake))
            .expect("failed to spawn sender thread")
    }

    /// Attaches the just-spawned thread to a handle already visible in
    /// the registry.
    pub fn attach_thread(&mut self, thread: JoinHandle<()>) {
        self.thread = Some(thread);
    }

    /// Builds a handle around an already-stopped, thread-less sender.
    /// Used by the registry's own unit tests, which exercise slot
    /// bookkeeping without spinning up real threads.
    #[cfg(test)]
    pub fn for_test(stop: Arc<AtomicBool>) -> Self {
        Self {
            stop,
            wake: Arc::new((Mutex::new(false), Condvar::new())),
            thread: None,
        }
    }

    fn notify_wake(&self) {
        let (mutex, cvar) = &*self.wake;
        *mutex.lock().unwrap() = true;
        cvar.notify_one();
    }

    /// An ACK for this sender's seq has arrived: stop and wait for exit.
    /// Consumes the handle, matching the original's `ack_received` ==
    /// `join()` and the fact that once removed from the registry the
    /// caller owns it outright.
    pub fn ack_received(self) {
        self.join_inner();
    }

    /// A NACK for this sender's seq has arrived: wake it for an immediate
    /// resend, preserving its seq and payload. Does not stop it.
    pub fn nack_received(&self) {
        self.notify_wake();
    }

    /// Signals stop and waits for the thread to exit.
    pub fn join(self) {
        self.join_inner();
    }

    fn join_inner(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.notify_wake();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run(
    payload: Vec<u8>,
    seq: u8,
    timeout: Duration,
    transmit: TransmitLock,
    send_callback: SharedCallback,
    stop: Arc<AtomicBool>,
    wake: WakeSignal,
) {
    let (wake_mutex, wake_cvar) = &*wake;
    // Initial deadline in the past: the first iteration transmits immediately.
    let mut next_deadline = Instant::now();

    loop {
        let wait_for = next_deadline.saturating_duration_since(Instant::now());

        let mut fired = wake_mutex.lock().unwrap();
        if !*fired {
            let (guard, _) = wake_cvar.wait_timeout(fired, wait_for).unwrap();
            fired = guard;
        }
        *fired = false;
        drop(fired);

        if stop.load(Ordering::SeqCst) {
            tracing::trace!(seq, "sender stopping");
            break;
        }

        next_deadline = Instant::now() + timeout;

        let frame = encode_frame(&payload, FrameKind::Data, seq);

        // The callback and the write happen under the same transmit lock
        // acquisition, so no other producer's frame can land between the
        // callback observing this transmission and the bytes reaching the
        // transport.
        let mut write = transmit.lock().unwrap();
        let cb = send_callback.lock().unwrap().clone();
        if let Some(cb) = cb {
            cb(&payload);
        }
        if let Err(err) = write(&frame) {
            tracing::error!(seq, %err, "transport write failed, sender exiting");
            break;
        }
        drop(write);
        tracing::debug!(seq, "transmitted data frame");
    }
}
