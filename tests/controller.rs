//! End-to-end scenarios from spec.md §8 (S1–S6), driven against fake
//! read/write closures exactly like
//! `original_source/tests/unit/test_controller.py`'s `read_func`/
//! `write_func` substitution.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hdlc_controller::codec::{encode_frame, FrameKind};
use hdlc_controller::HdlcController;

/// A read closure that yields each scripted frame exactly once, then
/// empty bytes forever (the "peer went quiet" steady state).
fn scripted_read(frames: Vec<Vec<u8>>) -> impl FnMut() -> Vec<u8> {
    let remaining = Arc::new(Mutex::new(VecDeque::from(frames)));
    move || remaining.lock().unwrap().pop_front().unwrap_or_default()
}

fn no_data_read() -> Vec<u8> {
    Vec::new()
}

/// A write closure that forwards every write onto a channel so the
/// test can observe transmission order.
fn recording_write() -> (impl FnMut(&[u8]) -> std::io::Result<()>, mpsc::Receiver<Vec<u8>>) {
    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    let write = move |bytes: &[u8]| -> std::io::Result<()> {
        let _ = tx.send(bytes.to_vec());
        Ok(())
    };
    (write, rx)
}

#[test]
fn s1_single_send_timeout_retransmit() {
    let (write, rx) = recording_write();
    let controller = HdlcController::new(
        no_data_read,
        write,
        Duration::from_millis(500), // the sending_timeout floor
        3,
        0,
        true,
    )
    .unwrap();

    controller.send(b"test".to_vec());

    let first = rx.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(first, encode_frame(b"test", FrameKind::Data, 0));
    assert_eq!(controller.get_senders_number(), 1);

    // Past one retransmission timeout (the floor, 500ms), a second
    // identical write should have been emitted.
    let second = rx.recv_timeout(Duration::from_millis(900)).unwrap();
    assert_eq!(second, encode_frame(b"test", FrameKind::Data, 0));
    assert_eq!(controller.get_senders_number(), 1);

    controller.stop();
}

#[test]
fn s2_three_sends_fill_window() {
    let (write, rx) = recording_write();
    let controller =
        HdlcController::new(no_data_read, write, Duration::from_secs(2), 3, 0, true).unwrap();

    controller.send(b"test1".to_vec());
    assert_eq!(controller.get_senders_number(), 1);
    controller.send(b"test2".to_vec());
    assert_eq!(controller.get_senders_number(), 2);
    controller.send(b"test3".to_vec());
    assert_eq!(controller.get_senders_number(), 3);

    assert_eq!(
        rx.recv_timeout(Duration::from_millis(200)).unwrap(),
        encode_frame(b"test1", FrameKind::Data, 0)
    );
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(200)).unwrap(),
        encode_frame(b"test2", FrameKind::Data, 1)
    );
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(200)).unwrap(),
        encode_frame(b"test3", FrameKind::Data, 2)
    );

    controller.stop();
}

#[test]
fn s3_send_and_ack_retires_sender() {
    let read = scripted_read(vec![encode_frame(b"", FrameKind::Ack, 1)]);
    let (write, rx) = recording_write();
    let controller =
        HdlcController::new(read, write, Duration::from_secs(2), 3, 0, true).unwrap();

    controller.send(b"test".to_vec());
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(200)).unwrap(),
        encode_frame(b"test", FrameKind::Data, 0)
    );

    controller.start();
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(controller.get_senders_number(), 0);

    controller.stop();
}

#[test]
fn s4_send_and_bad_ack_is_dropped() {
    // ACK(4) acks seq 3; no sender exists at seq 3, so it's dropped.
    let read = scripted_read(vec![encode_frame(b"", FrameKind::Ack, 4)]);
    let (write, rx) = recording_write();
    let controller =
        HdlcController::new(read, write, Duration::from_secs(2), 3, 0, true).unwrap();

    controller.send(b"test".to_vec());
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(200)).unwrap(),
        encode_frame(b"test", FrameKind::Data, 0)
    );
    assert_eq!(controller.get_senders_number(), 1);

    controller.start();
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(controller.get_senders_number(), 1);

    controller.stop();
}

#[test]
fn s5_receive_data_emits_ack() {
    let read = scripted_read(vec![encode_frame(b"test", FrameKind::Data, 0)]);
    let (write, rx) = recording_write();
    let controller =
        HdlcController::new(read, write, Duration::from_secs(2), 3, 0, true).unwrap();

    controller.start();

    let payload = controller.get_data();
    assert_eq!(payload, b"test");

    let ack = rx.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(ack, encode_frame(b"", FrameKind::Ack, 1));

    controller.stop();
}

#[test]
fn s6_corrupted_data_triggers_nack_when_enabled() {
    let mut corrupted = encode_frame(b"test", FrameKind::Data, 0);
    let payload_start = corrupted.len() - 4;
    corrupted[payload_start] ^= 0x01;

    let read = scripted_read(vec![corrupted]);
    let (write, rx) = recording_write();
    let controller =
        HdlcController::new(read, write, Duration::from_secs(2), 3, 0, true).unwrap();

    controller.start();

    let nack = rx.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(nack, encode_frame(b"", FrameKind::Nack, 0));

    controller.stop();
}

#[test]
fn s6_corrupted_data_no_nack_when_disabled() {
    let mut corrupted = encode_frame(b"test", FrameKind::Data, 0);
    let payload_start = corrupted.len() - 4;
    corrupted[payload_start] ^= 0x01;

    let read = scripted_read(vec![corrupted]);
    let (write, rx) = recording_write();
    let controller =
        HdlcController::new(read, write, Duration::from_secs(2), 3, 0, false).unwrap();

    controller.start();

    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    controller.stop();
}
