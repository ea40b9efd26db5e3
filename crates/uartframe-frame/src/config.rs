//! Framing configuration and the policies for ambiguous wire cases.

/// Default head marker: `@`.
pub const DEFAULT_HEAD: u8 = b'@';

/// Default tail marker: `#`.
pub const DEFAULT_TAIL: u8 = b'#';

/// Default maximum accumulated payload: 4 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 4 * 1024;

/// What to do with an array value whose magnitude needs more than 3 digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Fail with `ValueOutOfRange` before producing any bytes.
    #[default]
    Reject,
    /// Emit the wider token (e.g. `1234` -> `"11234"`), as legacy peers do.
    Extend,
}

/// What a tail marker with an empty accumulator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyFramePolicy {
    /// Report "no packet" (`Ok(None)`).
    #[default]
    Collapse,
    /// Fail with `MalformedFrame`.
    Reject,
}

/// What to do when ASCII decoding of a payload fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Fail with `Decoding`.
    #[default]
    Strict,
    /// Hand back the raw bytes instead.
    FallbackRaw,
}

/// Configuration for encoding and packet recovery.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Single-byte head marker. Default: `@`.
    pub head: u8,
    /// Single-byte tail marker. Default: `#`.
    pub tail: u8,
    /// Maximum accumulated payload size in bytes. Default: 4 KiB.
    pub max_payload_size: usize,
    /// Array token overflow handling. Default: reject.
    pub overflow: OverflowPolicy,
    /// Empty frame handling. Default: collapse to no packet.
    pub empty_frame: EmptyFramePolicy,
    /// ASCII decode failure handling. Default: strict.
    pub decode: DecodePolicy,
}

impl FrameConfig {
    /// Configuration with custom markers and default policies.
    pub fn with_markers(head: u8, tail: u8) -> Self {
        Self {
            head,
            tail,
            ..Self::default()
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            head: DEFAULT_HEAD,
            tail: DEFAULT_TAIL,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            overflow: OverflowPolicy::default(),
            empty_frame: EmptyFramePolicy::default(),
            decode: DecodePolicy::default(),
        }
    }
}
