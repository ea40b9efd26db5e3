//! Outgoing encodings: integer-array tokens, big-endian scalars, ASCII text.
//!
//! Array wire format, one token per value, no separators:
//! ```text
//! ┌───────────┬─────────────────────┐
//! │ Sign (1B) │ Magnitude (3B)      │    5   -> "1005"
//! │ '1' >= 0  │ |value|, 0-padded   │    -12 -> "0012"
//! │ '0' <  0  │ "000" ..= "999"     │
//! └───────────┴─────────────────────┘
//! ```
//! Scalars are 4 bytes big-endian two's complement. Text is ASCII. Every
//! encoding may be bracketed by caller-supplied head/tail bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::config::OverflowPolicy;
use crate::error::{FrameError, Result};

/// Width of one array token in bytes.
pub const TOKEN_LEN: usize = 4;

/// Width of an encoded scalar in bytes.
pub const SCALAR_LEN: usize = 4;

/// Largest magnitude a token can carry.
pub const MAX_TOKEN_MAGNITUDE: u32 = 999;

const SIGN_NON_NEGATIVE: u8 = b'1';
const SIGN_NEGATIVE: u8 = b'0';

/// Encode an integer array, rejecting values outside `-999..=999`.
pub fn encode_int_array(
    values: &[i32],
    head: Option<&[u8]>,
    tail: Option<&[u8]>,
) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    put_int_array(&mut dst, values, head, tail, OverflowPolicy::Reject)?;
    Ok(dst.freeze())
}

/// Encode a single integer as 4 big-endian bytes.
pub fn encode_scalar_int(value: i32, head: Option<&[u8]>, tail: Option<&[u8]>) -> Bytes {
    let mut dst = BytesMut::new();
    put_scalar_int(&mut dst, value, head, tail);
    dst.freeze()
}

/// Encode `head ‖ payload ‖ tail` as ASCII.
pub fn encode_text(payload: &str, head: Option<&str>, tail: Option<&str>) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    put_text(&mut dst, payload, head, tail)?;
    Ok(dst.freeze())
}

/// Append an encoded integer array to `dst`.
///
/// On error nothing is written.
pub fn put_int_array(
    dst: &mut BytesMut,
    values: &[i32],
    head: Option<&[u8]>,
    tail: Option<&[u8]>,
    overflow: OverflowPolicy,
) -> Result<()> {
    if overflow == OverflowPolicy::Reject {
        if let Some(&value) = values
            .iter()
            .find(|v| v.unsigned_abs() > MAX_TOKEN_MAGNITUDE)
        {
            return Err(FrameError::ValueOutOfRange { value });
        }
    }

    let head = head.unwrap_or_default();
    let tail = tail.unwrap_or_default();
    dst.reserve(head.len() + values.len() * TOKEN_LEN + tail.len());
    dst.put_slice(head);
    for &value in values {
        put_token(dst, value);
    }
    dst.put_slice(tail);
    Ok(())
}

/// Append a 4-byte big-endian integer to `dst`.
pub fn put_scalar_int(dst: &mut BytesMut, value: i32, head: Option<&[u8]>, tail: Option<&[u8]>) {
    let head = head.unwrap_or_default();
    let tail = tail.unwrap_or_default();
    dst.reserve(head.len() + SCALAR_LEN + tail.len());
    dst.put_slice(head);
    dst.put_i32(value);
    dst.put_slice(tail);
}

/// Append `head ‖ payload ‖ tail` to `dst` as ASCII.
///
/// All three parts are checked before anything is written.
pub fn put_text(
    dst: &mut BytesMut,
    payload: &str,
    head: Option<&str>,
    tail: Option<&str>,
) -> Result<()> {
    let head = head.unwrap_or_default();
    let tail = tail.unwrap_or_default();
    for part in [head, payload, tail] {
        check_ascii(part)?;
    }

    dst.reserve(head.len() + payload.len() + tail.len());
    dst.put_slice(head.as_bytes());
    dst.put_slice(payload.as_bytes());
    dst.put_slice(tail.as_bytes());
    Ok(())
}

/// Decode a run of 4-byte array tokens back into integers.
pub fn decode_int_array(src: &[u8]) -> Result<Vec<i32>> {
    if src.len() % TOKEN_LEN != 0 {
        return Err(FrameError::MalformedToken {
            index: src.len() / TOKEN_LEN,
        });
    }

    src.chunks_exact(TOKEN_LEN)
        .enumerate()
        .map(|(index, token)| decode_token(token).ok_or(FrameError::MalformedToken { index }))
        .collect()
}

/// Decode exactly 4 big-endian bytes.
pub fn decode_scalar_int(src: &[u8]) -> Result<i32> {
    if src.len() != SCALAR_LEN {
        return Err(FrameError::InvalidLength {
            expected: SCALAR_LEN,
            actual: src.len(),
        });
    }
    let mut src = src;
    Ok(src.get_i32())
}

fn put_token(dst: &mut BytesMut, value: i32) {
    dst.put_u8(if value >= 0 {
        SIGN_NON_NEGATIVE
    } else {
        SIGN_NEGATIVE
    });
    let digits = format!("{:03}", value.unsigned_abs());
    dst.put_slice(digits.as_bytes());
}

fn decode_token(token: &[u8]) -> Option<i32> {
    let (&sign, digits) = token.split_first()?;
    let mut magnitude = 0i32;
    for &digit in digits {
        if !digit.is_ascii_digit() {
            return None;
        }
        magnitude = magnitude * 10 + i32::from(digit - b'0');
    }
    match sign {
        SIGN_NON_NEGATIVE => Some(magnitude),
        SIGN_NEGATIVE => Some(-magnitude),
        _ => None,
    }
}

fn check_ascii(text: &str) -> Result<()> {
    match text.chars().enumerate().find(|(_, ch)| !ch.is_ascii()) {
        Some((index, ch)) => Err(FrameError::Encoding { ch, index }),
        None => Ok(()),
    }
}
