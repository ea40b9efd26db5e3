use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};
use uartframe_transport::ByteStream;

use crate::config::FrameConfig;
use crate::decoder::FrameDecoder;
use crate::encoder::{put_int_array, put_scalar_int, put_text};
use crate::error::Result;
use crate::packet::Packet;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// A framed serial link over any [`ByteStream`].
///
/// Owns the stream and a [`FrameDecoder`]. The stream is closed exactly
/// once: by [`SerialLink::close`], or on drop if it was never closed.
pub struct SerialLink<S: ByteStream> {
    stream: S,
    decoder: FrameDecoder,
    buf: BytesMut,
    closed: bool,
}

impl<S: ByteStream> SerialLink<S> {
    /// Create a link with default configuration.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, FrameConfig::default())
    }

    /// Create a link with explicit configuration.
    pub fn with_config(stream: S, config: FrameConfig) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::with_config(config),
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            closed: false,
        }
    }

    /// Send integers as 4-byte sign/magnitude tokens.
    pub fn send_int_array(
        &mut self,
        values: &[i32],
        head: Option<&[u8]>,
        tail: Option<&[u8]>,
    ) -> Result<()> {
        self.buf.clear();
        put_int_array(
            &mut self.buf,
            values,
            head,
            tail,
            self.decoder.config().overflow,
        )?;
        trace!(count = values.len(), len = self.buf.len(), "sending int array");
        self.flush_buf()
    }

    /// Send one integer as 4 big-endian bytes.
    pub fn send_scalar_int(
        &mut self,
        value: i32,
        head: Option<&[u8]>,
        tail: Option<&[u8]>,
    ) -> Result<()> {
        self.buf.clear();
        put_scalar_int(&mut self.buf, value, head, tail);
        trace!(value, len = self.buf.len(), "sending scalar int");
        self.flush_buf()
    }

    /// Send ASCII text, optionally bracketed by head/tail strings.
    pub fn send_text(
        &mut self,
        payload: &str,
        head: Option<&str>,
        tail: Option<&str>,
    ) -> Result<()> {
        self.buf.clear();
        put_text(&mut self.buf, payload, head, tail)?;
        trace!(len = self.buf.len(), "sending text");
        self.flush_buf()
    }

    /// Block until the next delimited packet arrives.
    ///
    /// See [`FrameDecoder::next_packet`] for empty-frame and timeout handling.
    pub fn read_packet(&mut self, decode_ascii: bool) -> Result<Option<Packet>> {
        self.decoder.next_packet(&mut self.stream, decode_ascii)
    }

    /// Read up to `n` bytes with no framing.
    pub fn raw_read(&mut self, n: usize) -> Result<Bytes> {
        let mut raw = vec![0u8; n];
        let read = self.stream.read_into(&mut raw)?;
        raw.truncate(read);
        Ok(Bytes::from(raw))
    }

    /// Write `data` with no framing. Returns the number of bytes written.
    pub fn raw_write(&mut self, data: &[u8]) -> Result<usize> {
        self.stream.write_bytes(data)?;
        Ok(data.len())
    }

    /// Close the underlying stream. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("closing serial link");
        self.stream.close()?;
        Ok(())
    }

    /// Whether [`SerialLink::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Mutably borrow the packet decoder.
    pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
        &mut self.decoder
    }

    /// Current link configuration.
    pub fn config(&self) -> &FrameConfig {
        self.decoder.config()
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.stream.write_bytes(&self.buf)?;
        Ok(())
    }
}

impl<S: ByteStream> Drop for SerialLink<S> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(err) = self.stream.close() {
                debug!(%err, "close on drop failed");
            }
        }
    }
}

impl<S: ByteStream> std::fmt::Debug for SerialLink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("decoder", &self.decoder)
            .field("closed", &self.closed)
            .finish()
    }
}
