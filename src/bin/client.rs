//! Minimal demo: sends a handful of frames and prints every transmission.

use std::time::Duration;

use hdlc_controller::HdlcController;

fn main() {
    let controller = HdlcController::new(
        || Vec::new(),
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

    controller.start();

    controller.send(b"hello".to_vec());
    controller.send(b"from".to_vec());
    controller.send(b"client".to_vec());

    println!(">>> {} senders outstanding", controller.get_senders_number());

    std::thread::sleep(Duration::from_millis(100));
    controller.stop();
}
