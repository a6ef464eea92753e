//! The Controller facade: lifecycle and the public send/receive API.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{Config, MIN_SENDING_TIMEOUT};
use crate::error::Error;
use crate::queue::SharedQueue;
use crate::receiver::ReceiverHandle;
use crate::registry::SharedRegistry;
use crate::sender::SenderHandle;
use crate::types::{Callback, SharedCallback, TransmitLock, WriteFn};

/// The sliding-window HDLC link-layer controller.
///
/// `R` is the read closure (`FnMut() -> Vec<u8>`), `W` the write closure
/// (`FnMut(&[u8]) -> std::io::Result<()>`). Both are consumed by value in
/// [`HdlcController::new`]; `W` is boxed into the shared transmit lock
/// immediately, so it does not appear in the struct's fields (see
/// `crate::types` for why).
pub struct HdlcController<R, W>
where
    R: FnMut() -> Vec<u8> + Send + 'static,
    W: FnMut(&[u8]) -> std::io::Result<()> + Send + 'static,
{
    config: Config,
    transmit: TransmitLock,
    registry: SharedRegistry,
    inbound: SharedQueue,
    send_callback: SharedCallback,
    receive_callback: SharedCallback,
    next_seq: Mutex<u8>,
    sending_timeout: Mutex<Duration>,
    read_fn: Mutex<Option<R>>,
    receiver: Mutex<Option<ReceiverHandle>>,
    _write: PhantomData<W>,
}

impl<R, W> HdlcController<R, W>
where
    R: FnMut() -> Vec<u8> + Send + 'static,
    W: FnMut(&[u8]) -> std::io::Result<()> + Send + 'static,
{
    /// Mod-8 sequence space.
    pub const MAX_SEQ_NO: usize = crate::MAX_SEQ_NO;

    /// Retransmission timeout floor.
    pub const MIN_SENDING_TIMEOUT: Duration = MIN_SENDING_TIMEOUT;

    /// Constructs the engine. Fails with [`Error::InvalidWindow`] if
    /// `window` is `0` (can never admit a send) or `>= MAX_SEQ_NO`
    /// (collides in the sequence space).
    pub fn new(
        read_fn: R,
        write_fn: W,
        sending_timeout: Duration,
        window: usize,
        frames_queue_size: usize,
        fcs_nack: bool,
    ) -> Result<Self, Error> {
        if window == 0 || window >= Self::MAX_SEQ_NO {
            return Err(Error::InvalidWindow(window));
        }

        let config = Config::default()
            .with_window(window)
            .with_sending_timeout(sending_timeout)
            .with_frames_queue_size(frames_queue_size)
            .with_fcs_nack(fcs_nack);

        let boxed_write: Box<WriteFn> = Box::new(write_fn);

        Ok(Self {
            transmit: Arc::new(Mutex::new(boxed_write)),
            registry: SharedRegistry::new(config.window),
            inbound: SharedQueue::new(config.frames_queue_size),
            send_callback: Arc::new(Mutex::new(None)),
            receive_callback: Arc::new(Mutex::new(None)),
            next_seq: Mutex::new(0),
            sending_timeout: Mutex::new(config.sending_timeout),
            read_fn: Mutex::new(Some(read_fn)),
            receiver: Mutex::new(None),
            config,
            _write: PhantomData,
        })
    }

    /// Installs the callback invoked on every outbound DATA transmission
    /// (including retransmits). Read fresh by each Sender on every
    /// iteration, so changes take effect on subsequent frames.
    pub fn set_send_callback<F>(&self, callback: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        *self.send_callback.lock().unwrap() = Some(Arc::new(callback) as Callback);
    }

    /// Installs the callback invoked on every successfully-received DATA
    /// frame. Snapshotted into the Receiver at [`Self::start`] — changes
    /// made after `start()` are not observed (documented asymmetry with
    /// [`Self::set_send_callback`]).
    pub fn set_receive_callback<F>(&self, callback: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        *self.receive_callback.lock().unwrap() = Some(Arc::new(callback) as Callback);
    }

    /// Sets the retransmission timeout. Values below
    /// [`Self::MIN_SENDING_TIMEOUT`] are silently ignored, leaving the
    /// previous value in place.
    pub fn set_sending_timeout(&self, timeout: Duration) {
        if timeout >= Self::MIN_SENDING_TIMEOUT {
            *self.sending_timeout.lock().unwrap() = timeout;
        }
    }

    /// Launches the Receiver task. Calling this twice is a usage error;
    /// the second `read_fn` would simply be absent (see the `take()`
    /// below), leaving the second Receiver permanently idle. Not policed.
    pub fn start(&self) {
        let read_fn = self
            .read_fn
            .lock()
            .unwrap()
            .take()
            .expect("start() called more than once");

        let receive_callback = self.receive_callback.lock().unwrap().clone();

        let handle = ReceiverHandle::spawn(
            read_fn,
            Arc::clone(&self.transmit),
            self.registry.clone(),
            self.inbound.clone(),
            receive_callback,
            self.config.fcs_nack,
        );

        *self.receiver.lock().unwrap() = Some(handle);
    }

    /// Signals the Receiver to exit and joins it, then joins every
    /// outstanding Sender. Safe to call before [`Self::start`].
    pub fn stop(&self) {
        if let Some(receiver) = self.receiver.lock().unwrap().take() {
            receiver.stop();
        }

        for handle in self.registry.drain() {
            handle.join();
        }
    }

    /// Admission-controlled enqueue of a new outbound frame. Blocks on a
    /// condition variable (never busy-spins) until the registry has room.
    /// Returns once the Sender is launched, not once the frame is
    /// acknowledged.
    ///
    /// Reserve-then-launch: the Sender's slot is reserved in the registry
    /// *before* its thread is spawned, so it is already visible to
    /// ACK/NACK dispatch the instant it exists — a racing ACK can never
    /// find the registry empty at this seq and drop itself as "unknown
    /// sender" while a newly-spawned thread (unaware it was just acked)
    /// retransmits forever.
    pub fn send(&self, payload: Vec<u8>) {
        let seq = {
            let mut next = self.next_seq.lock().unwrap();
            let seq = *next;
            *next = (*next + 1) % Self::MAX_SEQ_NO as u8;
            seq
        };

        let timeout = *self.sending_timeout.lock().unwrap();

        let (stop, wake) = SenderHandle::new_signals();
        self.registry
            .wait_and_insert(seq, SenderHandle::reserved(Arc::clone(&stop), Arc::clone(&wake)));

        let thread = SenderHandle::spawn_thread(
            payload,
            seq,
            timeout,
            Arc::clone(&self.transmit),
            Arc::clone(&self.send_callback),
            stop,
            wake,
        );
        self.registry.attach_thread(seq, thread);
    }

    /// Blocks until an inbound DATA payload is available, then returns it.
    pub fn get_data(&self) -> Vec<u8> {
        self.inbound.pop()
    }

    /// The number of currently outstanding (unacknowledged) Senders.
    pub fn get_senders_number(&self) -> usize {
        self.registry.len()
    }
}
