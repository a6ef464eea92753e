//! Minimal demo: receives a scripted handful of frames and prints every
//! payload that reaches the application along with the ACK/NACK traffic
//! the controller emits in response.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use hdlc_controller::codec::{encode_frame, FrameKind};
use hdlc_controller::HdlcController;

fn main() {
    let next = AtomicU8::new(0);

    let read_fn = move || {
        let seq = next.fetch_add(1, Ordering::SeqCst);
        if seq >= 3 {
            return Vec::new();
        }
        encode_frame(format!("frame-{seq}").as_bytes(), FrameKind::Data, seq)
    };

    let controller = HdlcController::new(
        read_fn,
        |bytes: &[u8]| {
            println!(">>> wrote {} bytes: {:?}", bytes.len(), bytes);
            Ok(())
        },
        Duration::from_secs(2),
        3,
        0,
        true,
    )
    .expect("invalid configuration");

    println!(">>> waiting for incoming frames...");
    controller.start();

    for _ in 0..3 {
        let payload = controller.get_data();
        println!(">>> received: {:?}", String::from_utf8_lossy(&payload));
    }

    controller.stop();
}
