//! Encode a few payloads, feed the wire bytes back through a decoder.
//!
//! Run with:
//!   cargo run --example loopback

use uartframe::frame::{decode_int_array, decode_scalar_int, Packet, SerialLink};
use uartframe::transport::MemoryStream;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut tx = SerialLink::new(MemoryStream::new());
    tx.send_int_array(&[5, -12, 999], Some(b"@"), Some(b"#"))?;
    tx.send_text("HELLO", Some("@"), Some("#"))?;
    tx.send_scalar_int(-2, Some(b"@"), Some(b"#"))?;
    let wire = tx.get_mut().take_written();
    eprintln!("wire: {:?}", String::from_utf8_lossy(&wire));

    let mut rx = SerialLink::new(MemoryStream::with_input(wire).close_on_drain());

    if let Some(packet) = rx.read_packet(true)? {
        eprintln!("ints: {:?}", decode_int_array(packet.as_bytes())?);
    }
    if let Some(Packet::Text(text)) = rx.read_packet(true)? {
        eprintln!("text: {text}");
    }
    // 0xFF bytes are not ASCII; read the scalar raw.
    if let Some(packet) = rx.read_packet(false)? {
        eprintln!("scalar: {}", decode_scalar_int(packet.as_bytes())?);
    }

    rx.close()?;
    Ok(())
}
