//! Delimited packet framing and integer/text encoding over serial links.
//!
//! uartframe packs integers and strings into head/tail delimited packets for
//! a byte-oriented serial transport, and recovers packets from the raw
//! incoming byte stream.
//!
//! # Crate Structure
//!
//! - [`transport`] — Byte-duplex stream abstraction (serial ports behind `serial`)
//! - [`frame`] — Encoders, the delimiter decoder, and [`frame::SerialLink`]

/// Re-export transport types.
pub mod transport {
    pub use uartframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use uartframe_frame::*;
}
