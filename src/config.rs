//! Controller configuration.
//!
//! Mirrors the builder-style configuration structs seen across the
//! reference transports (e.g. `xtransport::config::TransportConfig`):
//! a plain data struct with a `Default` impl and `with_*` setters.

use std::time::Duration;

/// Minimum sending timeout. Values below this floor are silently dropped.
pub const MIN_SENDING_TIMEOUT: Duration = Duration::from_millis(500);

/// Default window size (max outstanding frames).
pub const DEFAULT_WINDOW: usize = 3;

/// Default per-frame retransmission timeout.
pub const DEFAULT_SENDING_TIMEOUT: Duration = Duration::from_secs(2);

/// Default inbound queue capacity. `0` means unbounded.
pub const DEFAULT_FRAMES_QUEUE_SIZE: usize = 0;

/// Configuration for an [`crate::HdlcController`].
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum number of outstanding (unacknowledged) frames.
    pub window: usize,
    /// Per-frame retransmission timeout.
    pub sending_timeout: Duration,
    /// Inbound queue capacity. `0` means unbounded.
    pub frames_queue_size: usize,
    /// Whether a bad-FCS frame triggers a NACK.
    pub fcs_nack: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Sets the sending timeout, clamped to [`MIN_SENDING_TIMEOUT`].
    /// Values below the floor are silently ignored (the previous value is kept).
    pub fn with_sending_timeout(mut self, timeout: Duration) -> Self {
        if timeout >= MIN_SENDING_TIMEOUT {
            self.sending_timeout = timeout;
        }
        self
    }

    pub fn with_frames_queue_size(mut self, size: usize) -> Self {
        self.frames_queue_size = size;
        self
    }

    pub fn with_fcs_nack(mut self, fcs_nack: bool) -> Self {
        self.fcs_nack = fcs_nack;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            sending_timeout: DEFAULT_SENDING_TIMEOUT,
            frames_queue_size: DEFAULT_FRAMES_QUEUE_SIZE,
            fcs_nack: true,
        }
    }
}
