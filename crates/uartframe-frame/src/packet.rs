use bytes::Bytes;

/// A payload recovered from between a head and a tail marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Payload decoded as ASCII text.
    Text(String),
    /// Payload bytes as received.
    Raw(Bytes),
}

impl Packet {
    /// The payload bytes, regardless of representation.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Packet::Text(text) => text.as_bytes(),
            Packet::Raw(bytes) => bytes.as_ref(),
        }
    }

    /// The payload as text, if it was decoded.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Packet::Text(text) => Some(text),
            Packet::Raw(_) => None,
        }
    }

    /// Consume the packet and return its bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Packet::Text(text) => Bytes::from(text),
            Packet::Raw(bytes) => bytes,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Packet {
    fn from(text: String) -> Self {
        Packet::Text(text)
    }
}

impl From<&str> for Packet {
    fn from(text: &str) -> Self {
        Packet::Text(text.to_string())
    }
}

impl From<Bytes> for Packet {
    fn from(bytes: Bytes) -> Self {
        Packet::Raw(bytes)
    }
}

impl From<Vec<u8>> for Packet {
    fn from(bytes: Vec<u8>) -> Self {
        Packet::Raw(Bytes::from(bytes))
    }
}
