//! A sliding-window HDLC link-layer controller.
//!
//! Multiplexes an application-level send/receive API onto a sequenced
//! stream of HDLC frames exchanged with a peer over a byte transport,
//! using ACK/NACK and per-frame retransmission timers. The wire codec and
//! the byte transport are external collaborators: [`HdlcController::new`]
//! takes a read closure and a write closure, and this crate supplies a
//! concrete [`codec`] only as a stand-in to exercise the engine.

pub mod codec;
pub mod config;
pub mod error;
pub mod queue;
pub mod receiver;
pub mod registry;
pub mod sender;
mod types;

mod controller;

pub use controller::HdlcController;
pub use error::Error;

/// Size of the sequence space (`0..=7`), per spec.md §3.
pub const MAX_SEQ_NO: usize = 8;
