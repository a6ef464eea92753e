//! Shared type aliases for the transmit lock and callback slots.
//!
//! The Controller is generic over its read/write closures (`R`, `W`), but
//! the Sender and Receiver threads only ever need to *call through* the
//! write closure and the callback slots, never to know their concrete
//! types. Erasing them behind `Arc<Mutex<dyn FnMut...>>` / `Arc<dyn
//! Fn...>` keeps `sender`/`receiver`/`registry` free of a `W` type
//! parameter.

use std::sync::{Arc, Mutex};

/// The write half of the transport, behind the transmit lock.
pub type WriteFn = dyn FnMut(&[u8]) -> std::io::Result<()> + Send;

/// The sole gate for bytes reaching the transport, shared by the
/// Controller, every Sender, and the Receiver.
pub type TransmitLock = Arc<Mutex<Box<WriteFn>>>;

/// A send or receive callback: a side-effecting sink over a payload.
pub type Callback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// A callback slot that may be empty and may be replaced at any time.
pub type SharedCallback = Arc<Mutex<Option<Callback>>>;
