//! Head/tail delimited packet framing for serial links.
//!
//! Outgoing values are encoded as:
//! - integer arrays: 4-byte ASCII tokens (sign flag + 3 zero-padded digits)
//! - scalars: 4-byte big-endian two's complement
//! - text: 7-bit ASCII
//!
//! each optionally bracketed by head/tail bytes. Incoming bytes are scanned
//! for a one-byte head marker and a one-byte tail marker; the bytes between
//! them are one packet.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod link;
pub mod packet;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use config::{
    DecodePolicy, EmptyFramePolicy, FrameConfig, OverflowPolicy, DEFAULT_HEAD,
    DEFAULT_MAX_PAYLOAD, DEFAULT_TAIL,
};
pub use decoder::{FrameDecoder, Scan};
pub use encoder::{
    decode_int_array, decode_scalar_int, encode_int_array, encode_scalar_int, encode_text,
    put_int_array, put_scalar_int, put_text, SCALAR_LEN, TOKEN_LEN,
};
pub use error::{FrameError, Result};
pub use link::SerialLink;
pub use packet::Packet;

#[cfg(feature = "async")]
pub use tokio_codec::DelimiterCodec;
