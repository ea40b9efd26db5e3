use uartframe_transport::TransportError;

/// Errors that can occur while encoding, decoding or exchanging packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A character outside 7-bit ASCII was given for text encoding.
    #[error("cannot encode {ch:?} at index {index} as ASCII")]
    Encoding { ch: char, index: usize },

    /// A received payload byte is not 7-bit ASCII.
    #[error("cannot decode byte 0x{byte:02X} at position {position} as ASCII")]
    Decoding { byte: u8, position: usize },

    /// A tail marker arrived with nothing accumulated.
    #[error("malformed frame (tail marker with empty payload)")]
    MalformedFrame,

    /// An integer does not fit the 3-digit array token.
    #[error("value {value} out of range for array token (-999..=999)")]
    ValueOutOfRange { value: i32 },

    /// An array token is not a sign flag followed by three digits.
    #[error("malformed array token at index {index}")]
    MalformedToken { index: usize },

    /// A fixed-width block had the wrong number of bytes.
    #[error("invalid length ({actual} bytes, expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    /// A payload contains a marker byte and cannot be delimited.
    #[error("marker byte 0x{byte:02X} at position {position} inside payload")]
    MarkerInPayload { byte: u8, position: usize },

    /// The accumulated payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The transport timed out before a complete packet arrived.
    #[error("timed out waiting for packet")]
    Timeout,

    /// The stream ended before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// An I/O error occurred in a codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for FrameError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => FrameError::ConnectionClosed,
            other => FrameError::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
