//! The Receiver task: the single thread that demultiplexes inbound bytes.
//!
//! Reads whatever bytes are currently available, attempts to decode a
//! frame, dispatches on its kind, then sleeps briefly before the next
//! attempt. The transport here is a plain `FnMut() -> Vec<u8>` closure
//! with no underlying file descriptor to block on, so polling with a
//! short sleep is the only option.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::codec::{decode_frame, encode_frame, DecodeError, FrameKind};
use crate::queue::SharedQueue;
use crate::registry::SharedRegistry;
use crate::types::TransmitLock;

/// Polling cadence between read attempts.
pub const RECEIVER_POLL_INTERVAL: Duration = Duration::from_micros(200);

/// A handle to the running Receiver thread.
pub struct ReceiverHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReceiverHandle {
    pub fn spawn<R>(
        mut read_fn: R,
        transmit: TransmitLock,
        registry: SharedRegistry,
        inbound: SharedQueue,
        receive_callback: Option<crate::types::Callback>,
        fcs_nack: bool,
    ) -> Self
    where
        R: FnMut() -> Vec<u8> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("hdlc-receiver".to_string())
            .spawn(move || {
                run(
                    &mut read_fn,
                    transmit,
                    registry,
                    inbound,
                    receive_callback,
                    fcs_nack,
                    thread_stop,
                )
            })
            .expect("failed to spawn receiver thread");

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Signals the receiver to exit and waits for it.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run<R>(
    read_fn: &mut R,
    transmit: TransmitLock,
    registry: SharedRegistry,
    inbound: SharedQueue,
    receive_callback: Option<crate::types::Callback>,
    fcs_nack: bool,
    stop: Arc<AtomicBool>,
) where
    R: FnMut() -> Vec<u8>,
{
    while !stop.load(Ordering::SeqCst) {
        let bytes = read_fn();

        match decode_frame(&bytes) {
            Err(DecodeError::NoFrame) => {}
            Err(DecodeError::BadKind) => {
                tracing::trace!("dropped frame with unrecognised kind");
            }
            Err(DecodeError::FcsError(seq)) => {
                tracing::warn!(seq, "fcs mismatch");
                if fcs_nack {
                    let frame = encode_frame(&[], FrameKind::Nack, seq);
                    let mut write = transmit.lock().unwrap();
                    let _ = write(&frame);
                }
            }
            Ok((payload, FrameKind::Data, seq)) => {
                let mut write = transmit.lock().unwrap();
                if let Some(cb) = &receive_callback {
                    cb(&payload);
                }
                // The ACK is only emitted if the payload was actually
                // queued: a full inbound queue drops the frame silently
                // and the peer is left to retransmit it.
                if inbound.try_push(payload) {
                    let ack_seq = (seq + 1) % crate::MAX_SEQ_NO as u8;
                    let frame = encode_frame(&[], FrameKind::Ack, ack_seq);
                    let _ = write(&frame);
                } else {
                    tracing::warn!(seq, "inbound queue full, dropping frame");
                }
            }
            Ok((_, FrameKind::Ack, seq)) => {
                let acked_seq = (seq + crate::MAX_SEQ_NO as u8 - 1) % crate::MAX_SEQ_NO as u8;
                match registry.remove(acked_seq) {
                    Some(handle) => {
                        tracing::debug!(seq = acked_seq, "ack received");
                        handle.ack_received();
                    }
                    None => tracing::trace!(seq = acked_seq, "ack for unknown sender, dropped"),
                }
            }
            Ok((_, FrameKind::Nack, seq)) => {
                let signalled = registry.signal(seq, |handle| handle.nack_received());
                if signalled {
                    tracing::debug!(seq, "nack received");
                } else {
                    tracing::trace!(seq, "nack for unknown sender, dropped");
                }
            }
        }

        thread::sleep(RECEIVER_POLL_INTERVAL);
    }
}
