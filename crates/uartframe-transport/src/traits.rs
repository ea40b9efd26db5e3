use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::error::{Result, TransportError};

/// A blocking source of single bytes.
///
/// `Ok(None)` is the timeout sentinel: the underlying transport gave up
/// waiting without producing a byte. End-of-stream is reported as
/// [`TransportError::Closed`].
pub trait ByteSource {
    /// Read exactly one byte, blocking until one is available or the
    /// transport's own timeout elapses.
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

/// A byte-duplex stream — the collaborator the framing layer is built on.
pub trait ByteStream: ByteSource {
    /// Write all of `bytes` and flush.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Close the stream. Calling this more than once is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Read up to `buf.len()` bytes without any framing.
    ///
    /// Stops early on the timeout sentinel. Returns the number of bytes read.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.read_byte()? {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None => break,
            }
        }
        Ok(filled)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_into(buf)
    }
}

/// Adapts any `Read + Write` into a [`ByteStream`].
///
/// `Interrupted` is retried, `TimedOut`/`WouldBlock` become the timeout
/// sentinel, and a zero-length read is end-of-stream.
pub struct IoStream<T> {
    inner: Option<T>,
}

impl<T: Read + Write> IoStream<T> {
    /// Wrap an open stream.
    pub fn new(inner: T) -> Self {
        Self { inner: Some(inner) }
    }

    /// Whether [`ByteStream::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the underlying stream, if still open.
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Mutably borrow the underlying stream, if still open.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inner.as_mut()
    }

    /// Consume the adapter and return the inner stream, if still open.
    pub fn into_inner(self) -> Option<T> {
        self.inner
    }

    fn open_mut(&mut self) -> Result<&mut T> {
        self.inner.as_mut().ok_or(TransportError::Closed)
    }
}

impl<T: Read + Write> ByteSource for IoStream<T> {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let inner = self.open_mut()?;
        let mut byte = [0u8; 1];
        loop {
            match inner.read(&mut byte) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(None),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Read + Write> ByteStream for IoStream<T> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let inner = self.open_mut()?;
        inner.write_all(bytes)?;
        inner.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut inner) = self.inner.take() {
            debug!("closing byte stream");
            inner.flush()?;
        }
        Ok(())
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let inner = self.open_mut()?;
        loop {
            match inner.read(buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T> std::fmt::Debug for IoStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoStream")
            .field("open", &self.inner.is_some())
            .finish()
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
