//! `tokio_util::codec` adapter for head/tail delimited packets.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::config::FrameConfig;
use crate::decoder::FrameDecoder;
use crate::error::{FrameError, Result};
use crate::packet::Packet;

/// Async codec over the same state machine as [`FrameDecoder`].
///
/// Encoding wraps a packet in the configured head/tail markers. A payload
/// that contains either marker byte cannot be framed and is rejected.
#[derive(Debug)]
pub struct DelimiterCodec {
    decoder: FrameDecoder,
    decode_ascii: bool,
}

impl DelimiterCodec {
    /// Codec with default markers that yields text packets.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default(), true)
    }

    /// Codec with explicit configuration.
    pub fn with_config(config: FrameConfig, decode_ascii: bool) -> Self {
        Self {
            decoder: FrameDecoder::with_config(config),
            decode_ascii,
        }
    }
}

impl Default for DelimiterCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DelimiterCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        self.decoder.decode_buf(src, self.decode_ascii)
    }

    /// A frame still open when the stream ends is reported, not dropped.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if let Some(packet) = self.decode(src)? {
            return Ok(Some(packet));
        }
        if self.decoder.pending().is_empty() {
            return Ok(None);
        }
        debug!(pending = self.decoder.pending().len(), "stream ended mid-frame");
        self.decoder.reset();
        Err(FrameError::ConnectionClosed)
    }
}

impl Encoder<Packet> for DelimiterCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        let config = self.decoder.config();
        let payload = item.as_bytes();

        if let Packet::Text(text) = &item {
            if let Some((index, ch)) = text.chars().enumerate().find(|(_, ch)| !ch.is_ascii()) {
                return Err(FrameError::Encoding { ch, index });
            }
        }
        if let Some(position) = payload
            .iter()
            .position(|&b| b == config.head || b == config.tail)
        {
            return Err(FrameError::MarkerInPayload {
                byte: payload[position],
                position,
            });
        }
        if payload.len() > config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: config.max_payload_size,
            });
        }

        dst.reserve(payload.len() + 2);
        dst.put_u8(config.head);
        dst.put_slice(payload);
        dst.put_u8(config.tail);
        Ok(())
    }
}
