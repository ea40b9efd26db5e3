use std::collections::VecDeque;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{ByteSource, ByteStream};

/// In-memory byte stream.
///
/// Incoming bytes are queued with [`MemoryStream::feed`]; everything written
/// is captured and available through [`MemoryStream::written`]. When the
/// receive queue is drained, reads report the timeout sentinel, or
/// end-of-stream once [`MemoryStream::close_on_drain`] is set.
#[derive(Debug, Default)]
pub struct MemoryStream {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    eof_on_drain: bool,
    closed: bool,
    close_calls: usize,
}

impl MemoryStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream with `bytes` already queued for reading.
    pub fn with_input(bytes: impl AsRef<[u8]>) -> Self {
        let mut stream = Self::new();
        stream.feed(bytes);
        stream
    }

    /// Report end-of-stream instead of a timeout once the queue is empty.
    pub fn close_on_drain(mut self) -> Self {
        self.eof_on_drain = true;
        self
    }

    /// Queue more bytes for reading.
    pub fn feed(&mut self, bytes: impl AsRef<[u8]>) {
        self.rx.extend(bytes.as_ref().iter().copied());
    }

    /// Bytes still waiting to be read.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Drain and return everything written so far.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    /// Whether the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many times `close` actually released the stream.
    pub fn close_count(&self) -> usize {
        self.close_calls
    }
}

impl ByteSource for MemoryStream {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        match self.rx.pop_front() {
            Some(byte) => Ok(Some(byte)),
            None if self.eof_on_drain => Err(TransportError::Closed),
            None => Ok(None),
        }
    }
}

impl ByteStream for MemoryStream {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.tx.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            debug!(pending = self.rx.len(), "closing memory stream");
            self.closed = true;
            self.close_calls += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drained_queue_times_out() {
        let mut stream = MemoryStream::with_input(b"a");
        assert_eq!(stream.read_byte().unwrap(), Some(b'a'));
        assert_eq!(stream.read_byte().unwrap(), None);
    }

    #[test]
    fn drained_queue_reports_eof_when_configured() {
        let mut stream = MemoryStream::with_input(b"a").close_on_drain();
        assert_eq!(stream.read_byte().unwrap(), Some(b'a'));
        assert!(matches!(stream.read_byte(), Err(TransportError::Closed)));
    }

    #[test]
    fn writes_are_captured() {
        let mut stream = MemoryStream::new();
        stream.write_bytes(b"12").unwrap();
        stream.write_bytes(b"34").unwrap();
        assert_eq!(stream.written(), b"1234");
        assert_eq!(stream.take_written(), b"1234".to_vec());
        assert!(stream.written().is_empty());
    }

    #[test]
    fn close_happens_once() {
        let mut stream = MemoryStream::with_input(b"xyz");
        stream.close().unwrap();
        stream.close().unwrap();
        assert_eq!(stream.close_count(), 1);
        assert!(matches!(stream.read_byte(), Err(TransportError::Closed)));
        assert!(matches!(stream.write_bytes(b"x"), Err(TransportError::Closed)));
    }

    #[test]
    fn read_into_stops_on_timeout() {
        let mut stream = MemoryStream::with_input(b"abc");
        let mut buf = [0u8; 8];
        let n = stream.read_into(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"abc");
    }
}
