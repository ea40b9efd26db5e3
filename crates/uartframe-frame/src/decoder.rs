use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};
use uartframe_transport::ByteSource;

use crate::config::{DecodePolicy, EmptyFramePolicy, FrameConfig};
use crate::error::{FrameError, Result};
use crate::packet::Packet;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Result of feeding one byte to a [`FrameDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// The byte was consumed; no frame is complete yet.
    Continue,
    /// A tail marker closed a frame. The payload may be empty.
    Frame(Bytes),
}

/// Recovers head/tail delimited packets from a byte stream.
///
/// The accumulator always holds the bytes seen since the last head marker
/// (or since the last emitted frame). A head marker clears it, so a frame
/// interrupted by a new head is silently dropped in favour of the new one.
/// Marker bytes are never part of a payload.
///
/// Once a frame exceeds `max_payload_size` the decoder reports
/// [`FrameError::PayloadTooLarge`] and skips the rest of that frame: every
/// byte up to and including the next tail (or up to the next head) is
/// dropped, so no fragment of the oversized frame is ever returned.
///
/// `head` and `tail` must differ; with equal markers the head check wins
/// and no frame ever completes.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    config: FrameConfig,
    discarding: bool,
}

impl FrameDecoder {
    /// Create a decoder with default markers (`@` / `#`) and policies.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            discarding: false,
        }
    }

    /// Read bytes from `source` until a tail marker completes a frame.
    ///
    /// Returns `Ok(None)` for an empty frame under
    /// [`EmptyFramePolicy::Collapse`]. If the source reports a timeout the
    /// partial frame is kept and [`FrameError::Timeout`] is returned, so the
    /// next call resumes where this one stopped.
    pub fn next_packet<S>(&mut self, source: &mut S, decode_ascii: bool) -> Result<Option<Packet>>
    where
        S: ByteSource + ?Sized,
    {
        loop {
            let byte = match source.read_byte()? {
                Some(byte) => byte,
                None => return Err(FrameError::Timeout),
            };

            if let Scan::Frame(payload) = self.push_byte(byte)? {
                return self.emit(payload, decode_ascii);
            }
        }
    }

    /// Drain `src` until a non-empty packet completes.
    ///
    /// Bytes after the completing tail stay in `src`. Empty frames that
    /// collapse to "no packet" are skipped. Returns `Ok(None)` once `src`
    /// is exhausted with no packet; partial payload is carried over.
    pub fn decode_buf(&mut self, src: &mut BytesMut, decode_ascii: bool) -> Result<Option<Packet>> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Scan::Frame(payload) = self.push_byte(byte)? {
                if let Some(packet) = self.emit(payload, decode_ascii)? {
                    return Ok(Some(packet));
                }
            }
        }
        Ok(None)
    }

    /// Advance the state machine by one byte.
    pub fn push_byte(&mut self, byte: u8) -> Result<Scan> {
        if byte == self.config.head {
            self.discarding = false;
            if !self.buf.is_empty() {
                debug!(discarded = self.buf.len(), "head marker restarted frame");
            }
            self.buf.clear();
            return Ok(Scan::Continue);
        }

        if self.discarding {
            if byte == self.config.tail {
                trace!("end of discarded frame");
                self.discarding = false;
            }
            return Ok(Scan::Continue);
        }

        if byte == self.config.tail {
            return Ok(Scan::Frame(self.buf.split().freeze()));
        }

        if self.buf.len() >= self.config.max_payload_size {
            let size = self.buf.len() + 1;
            debug!(size, max = self.config.max_payload_size, "discarding oversized frame");
            self.buf.clear();
            self.discarding = true;
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.config.max_payload_size,
            });
        }

        self.buf.extend_from_slice(&[byte]);
        Ok(Scan::Continue)
    }

    /// Turn a completed frame payload into a packet according to the policies.
    pub fn emit(&self, payload: Bytes, decode_ascii: bool) -> Result<Option<Packet>> {
        if payload.is_empty() {
            return match self.config.empty_frame {
                EmptyFramePolicy::Collapse => {
                    trace!("empty frame collapsed");
                    Ok(None)
                }
                EmptyFramePolicy::Reject => Err(FrameError::MalformedFrame),
            };
        }

        trace!(len = payload.len(), "frame complete");

        if !decode_ascii {
            return Ok(Some(Packet::Raw(payload)));
        }

        match payload.iter().position(|b| !b.is_ascii()) {
            None => Ok(Some(Packet::Text(
                payload.iter().map(|&b| char::from(b)).collect(),
            ))),
            Some(position) => match self.config.decode {
                DecodePolicy::Strict => Err(FrameError::Decoding {
                    byte: payload[position],
                    position,
                }),
                DecodePolicy::FallbackRaw => {
                    debug!(position, "payload is not ASCII; returning raw bytes");
                    Ok(Some(Packet::Raw(payload)))
                }
            },
        }
    }

    /// Bytes accumulated for the frame in progress.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Update maximum payload size for subsequent frames.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use uartframe_transport::{MemoryStream, TransportError};

    use super::*;

    fn read_one(wire: &[u8], decode_ascii: bool) -> Result<Option<Packet>> {
        let mut source = MemoryStream::with_input(wire).close_on_drain();
        FrameDecoder::new().next_packet(&mut source, decode_ascii)
    }

    #[test]
    fn framed_payload_is_recovered() {
        let packet = read_one(b"@hello#", true).unwrap();
        assert_eq!(packet, Some(Packet::Text("hello".to_string())));
    }

    #[test]
    fn raw_payload_when_not_decoding() {
        let packet = read_one(b"@\x01\x02\xff#", false).unwrap();
        assert_eq!(packet, Some(Packet::Raw(Bytes::from_static(b"\x01\x02\xff"))));
    }

    #[test]
    fn repeated_head_discards_partial_frame() {
        let packet = read_one(b"@AAA@BBB#", true).unwrap();
        assert_eq!(packet, Some(Packet::from("BBB")));
    }

    #[test]
    fn empty_frame_collapses_to_none() {
        assert_eq!(read_one(b"@#", true).unwrap(), None);
    }

    #[test]
    fn stray_tail_collapses_to_none() {
        assert_eq!(read_one(b"#", true).unwrap(), None);
    }

    #[test]
    fn empty_frame_rejected_when_configured() {
        let config = FrameConfig {
            empty_frame: EmptyFramePolicy::Reject,
            ..FrameConfig::default()
        };
        let mut source = MemoryStream::with_input(b"@#");
        let err = FrameDecoder::with_config(config)
            .next_packet(&mut source, true)
            .unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame));
    }

    #[test]
    fn bytes_before_first_head_are_kept_without_head() {
        assert_eq!(read_one(b"xy#", true).unwrap(), Some(Packet::from("xy")));
    }

    #[test]
    fn leading_noise_dropped_by_head() {
        assert_eq!(read_one(b"noise@ok#", true).unwrap(), Some(Packet::from("ok")));
    }

    #[test]
    fn consecutive_packets() {
        let mut source = MemoryStream::with_input(b"@one#@two#junk@three#");
        let mut decoder = FrameDecoder::new();

        let mut got = Vec::new();
        for _ in 0..3 {
            got.push(decoder.next_packet(&mut source, true).unwrap().unwrap());
        }
        assert_eq!(
            got,
            vec![Packet::from("one"), Packet::from("two"), Packet::from("three")]
        );
    }

    #[test]
    fn custom_markers() {
        let mut source = MemoryStream::with_input(b"<@#>");
        let mut decoder = FrameDecoder::with_config(FrameConfig::with_markers(b'<', b'>'));
        let packet = decoder.next_packet(&mut source, true).unwrap();
        assert_eq!(packet, Some(Packet::from("@#")));
    }

    #[test]
    fn non_ascii_payload_is_decoding_error() {
        let err = read_one(b"@ab\xc3#", true).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Decoding {
                byte: 0xC3,
                position: 2
            }
        ));
    }

    #[test]
    fn non_ascii_payload_falls_back_to_raw() {
        let config = FrameConfig {
            decode: DecodePolicy::FallbackRaw,
            ..FrameConfig::default()
        };
        let mut source = MemoryStream::with_input(b"@ab\xc3#");
        let packet = FrameDecoder::with_config(config)
            .next_packet(&mut source, true)
            .unwrap();
        assert_eq!(packet, Some(Packet::Raw(Bytes::from_static(b"ab\xc3"))));
    }

    #[test]
    fn timeout_keeps_partial_frame() {
        let mut source = MemoryStream::with_input(b"@par");
        let mut decoder = FrameDecoder::new();

        let err = decoder.next_packet(&mut source, true).unwrap_err();
        assert!(matches!(err, FrameError::Timeout));
        assert_eq!(decoder.pending(), b"par");

        source.feed(b"tial#");
        let packet = decoder.next_packet(&mut source, true).unwrap();
        assert_eq!(packet, Some(Packet::from("partial")));
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn end_of_stream_is_connection_closed() {
        let err = read_one(b"@incomplete", true).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn transport_errors_propagate() {
        struct Broken;
        impl ByteSource for Broken {
            fn read_byte(&mut self) -> uartframe_transport::Result<Option<u8>> {
                Err(TransportError::Io(std::io::Error::other("line fault")))
            }
        }

        let err = FrameDecoder::new()
            .next_packet(&mut Broken, true)
            .unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Io(_))));
    }

    #[test]
    fn oversized_frame_discarded() {
        let config = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(config);
        let mut source = MemoryStream::with_input(b"@TEMP=1234567#@ok#");

        let err = decoder.next_packet(&mut source, true).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 5, max: 4 }));

        // the rest of the oversized frame never surfaces
        assert_eq!(decoder.next_packet(&mut source, true).unwrap(), Some(Packet::from("ok")));
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn head_marker_ends_discard() {
        let config = FrameConfig {
            max_payload_size: 2,
            ..FrameConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(config);
        let mut src = BytesMut::from(&b"@abcde@hi#"[..]);

        let err = decoder.decode_buf(&mut src, true).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 3, max: 2 }));
        assert_eq!(decoder.decode_buf(&mut src, true).unwrap(), Some(Packet::from("hi")));
    }

    #[test]
    fn reset_clears_discard_state() {
        let config = FrameConfig {
            max_payload_size: 1,
            ..FrameConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(config);
        assert!(decoder.push_byte(b'a').is_ok());
        assert!(decoder.push_byte(b'b').is_err());

        decoder.reset();
        assert_eq!(decoder.push_byte(b'z').unwrap(), Scan::Continue);
        assert_eq!(decoder.push_byte(b'#').unwrap(), Scan::Frame(Bytes::from_static(b"z")));
    }

    #[test]
    fn decode_buf_skips_empty_frames_and_keeps_rest() {
        let mut decoder = FrameDecoder::new();
        let mut src = BytesMut::from(&b"@#@first#@sec"[..]);

        let packet = decoder.decode_buf(&mut src, true).unwrap();
        assert_eq!(packet, Some(Packet::from("first")));
        assert_eq!(src.as_ref(), b"@sec");

        assert_eq!(decoder.decode_buf(&mut src, true).unwrap(), None);
        assert!(src.is_empty());
        assert_eq!(decoder.pending(), b"sec");

        src.extend_from_slice(b"ond#");
        let packet = decoder.decode_buf(&mut src, true).unwrap();
        assert_eq!(packet, Some(Packet::from("second")));
    }

    #[test]
    fn push_byte_reports_frames() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push_byte(b'@').unwrap(), Scan::Continue);
        assert_eq!(decoder.push_byte(b'z').unwrap(), Scan::Continue);
        assert_eq!(
            decoder.push_byte(b'#').unwrap(),
            Scan::Frame(Bytes::from_static(b"z"))
        );
        assert_eq!(decoder.push_byte(b'#').unwrap(), Scan::Frame(Bytes::new()));
    }

    #[test]
    fn framing_is_transparent_for_marker_free_payloads() {
        let payloads: [&[u8]; 4] = [b"a", b"hello world", b"\x00\x01\x02", b"1005001219993"];
        for payload in payloads {
            let mut wire = vec![b'@'];
            wire.extend_from_slice(payload);
            wire.push(b'#');
            let packet = read_one(&wire, false).unwrap().unwrap();
            assert_eq!(packet.as_bytes(), payload);
        }
    }
}
