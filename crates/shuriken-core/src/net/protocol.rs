use serde::Serialize;
use serde::de::DeserializeOwned;

use super::messages::{CommitMsg, Envelope, MessageType};
use super::outbox::Outbound;

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode an outbound commit or RPC to wire format.
pub fn encode_outbound<P: Serialize>(msg: &Outbound<P>) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        Outbound::Commit(m) => encode_message(MessageType::Commit, m),
        Outbound::Rpc(m) => encode_message(MessageType::Rpc, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a commit or RPC.
pub fn decode_inbound<P: DeserializeOwned>(data: &[u8]) -> Result<Outbound<P>, ProtocolError> {
    match decode_message_type(data)? {
        MessageType::Commit => Ok(Outbound::Commit(decode_payload::<CommitMsg>(data)?)),
        MessageType::Rpc => Ok(Outbound::Rpc(decode_payload::<Envelope<P>>(data)?)),
    }
}

/// Encode an object's replicated field set as a commit payload.
pub fn encode_state<T: Serialize>(state: &T) -> Result<Vec<u8>, ProtocolError> {
    let bytes =
        rmp_serde::to_vec(state).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(bytes.len()));
    }
    Ok(bytes)
}

pub fn decode_state<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ProtocolError> {
    rmp_serde::from_slice(payload).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}
