//! Error types for the HDLC controller.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `window == 0` can never admit a send; `window >= MAX_SEQ_NO` collides
    /// in the sequence space.
    #[error("window size must be in 1..={max} (got {0})", max = crate::MAX_SEQ_NO - 1)]
    InvalidWindow(usize),

    #[error("I/O error while writing to the transport: {0}")]
    Transport(#[from] std::io::Error),
}
