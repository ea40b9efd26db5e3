use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSource, ByteStream, IoStream};

/// Poll interval used when the caller asked for fully blocking reads.
const BLOCKING_POLL: Duration = Duration::from_secs(1);

/// A serial port opened through the `serialport` driver (8N1).
///
/// With `timeout: None` reads block until a byte arrives. With
/// `Some(duration)` a read that sees nothing for `duration` returns the
/// timeout sentinel.
pub struct SerialStream {
    port_name: String,
    baud_rate: u32,
    timeout: Option<Duration>,
    inner: IoStream<Box<dyn SerialPort>>,
}

impl SerialStream {
    /// Open `port` at `baud_rate`.
    pub fn open(port: &str, baud_rate: u32, timeout: Option<Duration>) -> Result<Self> {
        let handle = serialport::new(port, baud_rate)
            .timeout(timeout.unwrap_or(BLOCKING_POLL))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .open()
            .map_err(|err| TransportError::Open {
                port: port.to_string(),
                source: err.into(),
            })?;

        info!(port, baud_rate, ?timeout, "opened serial port");

        Ok(Self {
            port_name: port.to_string(),
            baud_rate,
            timeout,
            inner: IoStream::new(handle),
        })
    }

    /// The device name this stream was opened with.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Configured read timeout (`None` = block indefinitely).
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Bytes waiting in the driver's receive buffer.
    pub fn bytes_to_read(&self) -> Result<u32> {
        let port = self.inner.get_ref().ok_or(TransportError::Closed)?;
        Ok(port.bytes_to_read()?)
    }
}

impl ByteSource for SerialStream {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.read_byte()? {
                Some(byte) => return Ok(Some(byte)),
                None if self.timeout.is_some() => return Ok(None),
                None => continue,
            }
        }
    }
}

impl ByteStream for SerialStream {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_bytes(bytes)
    }

    fn close(&mut self) -> Result<()> {
        if !self.inner.is_closed() {
            debug!(port = %self.port_name, "closing serial port");
        }
        self.inner.close()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read_into(buf)
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("port", &self.port_name)
            .field("baud_rate", &self.baud_rate)
            .field("timeout", &self.timeout)
            .finish()
    }
}
