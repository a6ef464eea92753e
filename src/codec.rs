//! A minimal byte-stuffed frame codec.
//!
//! The wire format proper is out of scope for the controller (it consumes
//! `encode_frame`/`decode_frame` as pure functions); this module is a
//! concrete, self-contained stand-in so the engine has something real to
//! drive in tests and the demo binaries. Frame layout, preamble byte and
//! FCS placement follow the same shape as a split-link byte frame:
//!
//! ```text
//! +----------+------+-----+----------+-----------------+
//! | preamble | kind | seq | fcs (u16)| payload (0..N)   |
//! +----------+------+-----+----------+-----------------+
//! ```

use crc::{Crc, CRC_16_XMODEM};

const PREAMBLE: u8 = 0x7E;
const HEADER_LEN: usize = 5;

const FCS: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// The three HDLC frame kinds the controller exchanges with its peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Ack,
    Nack,
}

impl FrameKind {
    fn to_byte(self) -> u8 {
        match self {
            FrameKind::Data => 0,
            FrameKind::Ack => 1,
            FrameKind::Nack => 2,
        }
    }

    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(FrameKind::Data),
            1 => Some(FrameKind::Ack),
            2 => Some(FrameKind::Nack),
            _ => None,
        }
    }
}

/// Failure modes of [`decode_frame`], mirroring the codec's documented
/// failure surface: a frame may simply not be present yet, may be present
/// but corrupted (with a tentative seq still recoverable), or may carry an
/// unrecognised kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("no frame found in the given bytes")]
    NoFrame,
    #[error("frame check sequence mismatch (seq {0})")]
    FcsError(u8),
    #[error("unrecognised frame kind")]
    BadKind,
}

fn fcs_of(kind: u8, seq: u8, payload: &[u8]) -> u16 {
    let mut digest = FCS.digest();
    digest.update(&[kind, seq]);
    digest.update(payload);
    digest.finalize()
}

/// Encodes a payload into a framed byte sequence. Pure; never fails.
pub fn encode_frame(payload: &[u8], kind: FrameKind, seq: u8) -> Vec<u8> {
    let kind_byte = kind.to_byte();
    let fcs = fcs_of(kind_byte, seq, payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(PREAMBLE);
    out.push(kind_byte);
    out.push(seq);
    out.extend_from_slice(&fcs.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Attempts to decode one frame out of `bytes`, returning the payload,
/// kind and sequence number on success.
///
/// The seq byte on the wire is not itself range-checked by the FCS (the
/// FCS only proves the bytes weren't corrupted in transit, not that the
/// sender played by the rules), so the seq returned here — including the
/// tentative seq carried by [`DecodeError::FcsError`] — is always folded
/// into the defined `0..MAX_SEQ_NO` sequence space. Without this, a
/// corrupted or malicious frame could carry a seq byte outside `0..8`
/// and panic downstream `u8` arithmetic (ACK/NACK seq computation in the
/// Receiver) instead of being absorbed as a protocol-level condition.
pub fn decode_frame(bytes: &[u8]) -> Result<(Vec<u8>, FrameKind, u8), DecodeError> {
    let start = bytes.iter().position(|&b| b == PREAMBLE).ok_or(DecodeError::NoFrame)?;
    let frame = &bytes[start..];
    if frame.len() < HEADER_LEN {
        return Err(DecodeError::NoFrame);
    }

    let kind_byte = frame[1];
    let raw_seq = frame[2];
    let fcs = u16::from_be_bytes([frame[3], frame[4]]);
    let payload = &frame[HEADER_LEN..];

    if fcs_of(kind_byte, raw_seq, payload) != fcs {
        return Err(DecodeError::FcsError(raw_seq % crate::MAX_SEQ_NO as u8));
    }

    let seq = raw_seq % crate::MAX_SEQ_NO as u8;
    let kind = FrameKind::from_byte(kind_byte).ok_or(DecodeError::BadKind)?;
    Ok((payload.to_vec(), kind, seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_data_frame() {
        let encoded = encode_frame(b"test", FrameKind::Data, 0);
        let (payload, kind, seq) = decode_frame(&encoded).unwrap();
        assert_eq!(payload, b"test");
        assert_eq!(kind, FrameKind::Data);
        assert_eq!(seq, 0);
    }

    #[test]
    fn round_trips_an_empty_ack_frame() {
        let encoded = encode_frame(b"", FrameKind::Ack, 1);
        let (payload, kind, seq) = decode_frame(&encoded).unwrap();
        assert!(payload.is_empty());
        assert_eq!(kind, FrameKind::Ack);
        assert_eq!(seq, 1);
    }

    #[test]
    fn no_preamble_is_no_frame() {
        assert_eq!(decode_frame(b"garbage"), Err(DecodeError::NoFrame));
    }

    #[test]
    fn flipped_payload_byte_is_fcs_error_with_recovered_seq() {
        let mut encoded = encode_frame(b"test", FrameKind::Data, 3);
        let payload_start = encoded.len() - 4;
        encoded[payload_start] ^= 0x01;
        assert_eq!(decode_frame(&encoded), Err(DecodeError::FcsError(3)));
    }

    #[test]
    fn out_of_range_seq_byte_is_folded_into_mod_8_space() {
        // A well-formed frame never carries a seq byte outside 0..8, but
        // decode_frame must not trust that and must not overflow `u8`
        // arithmetic downstream if it's violated.
        let kind_byte = FrameKind::Data.to_byte();
        let payload = b"hi";
        let raw_seq: u8 = 250;
        let fcs = fcs_of(kind_byte, raw_seq, payload);

        let mut frame = vec![PREAMBLE, kind_byte, raw_seq];
        frame.extend_from_slice(&fcs.to_be_bytes());
        frame.extend_from_slice(payload);

        let (decoded_payload, kind, seq) = decode_frame(&frame).unwrap();
        assert_eq!(decoded_payload, payload);
        assert_eq!(kind, FrameKind::Data);
        assert_eq!(seq, raw_seq % 8);
    }
}
