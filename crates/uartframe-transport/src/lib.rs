//! Blocking byte-duplex stream abstraction.
//!
//! The framing layer never talks to a port directly. It is handed something
//! that implements [`ByteStream`]:
//! - [`IoStream`] adapts any `Read + Write` (serial handle, socket, pipe)
//! - [`MemoryStream`] is an in-memory fake for tests and loopback
//! - [`SerialStream`] opens a real serial port (behind the `serial` feature)
//!
//! This is the lowest layer of uartframe. It applies no framing and no
//! buffering policy of its own.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use memory::MemoryStream;
pub use traits::{ByteSource, ByteStream, IoStream};

#[cfg(feature = "serial")]
pub use serial::SerialStream;
