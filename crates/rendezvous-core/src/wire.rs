//! Channel wire format.
//!
//! Every message on a channel is an 8-byte `FrameHeader` followed by a JSON
//! body of `size` bytes. TCP readers pull the header first and then exactly
//! `size` bytes; UDP carries header and body in a single datagram.
//!
//! Header fields are little-endian on the wire regardless of host order.

use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::error::Status;
use crate::types::{ServiceSource, TopicSource};

/// "RDVS"
pub const FRAME_MAGIC: u32 = 0x5244_5653;

pub const HEADER_LEN: usize = 8;

/// Default cap on a single frame body.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct FrameHeader {
    pub magic: u32,
    /// Body length in bytes, not including this header.
    pub size: u32,
}

assert_eq_size!(FrameHeader, [u8; HEADER_LEN]);

impl FrameHeader {
    pub fn new(size: u32) -> Self {
        Self {
            magic: FRAME_MAGIC.to_le(),
            size: size.to_le(),
        }
    }

    /// Validate a received header and return the body length it announces.
    pub fn parse(bytes: &[u8], max_body: usize) -> Result<usize, Status> {
        let header = FrameHeader::read_from(bytes)
            .ok_or_else(|| Status::data_loss("Truncated frame header."))?;
        let magic = u32::from_le(header.magic);
        if magic != FRAME_MAGIC {
            return Err(Status::data_loss(format!("Bad frame magic: {magic:#010x}")));
        }
        let size = u32::from_le(header.size) as usize;
        if size > max_body {
            return Err(Status::aborted(format!(
                "Message size {size} exceeds limit {max_body}."
            )));
        }
        Ok(size)
    }
}

/// Everything that travels over a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Rendezvous push: a publisher's location.
    TopicSource(TopicSource),
    /// Watcher push: a topic lost its publisher.
    TopicClosed { topic: String },
    /// Rendezvous push: a service server's location.
    ServiceSource(ServiceSource),
    HeartBeat { client_id: u32 },
    /// Application data on a topic.
    Data {
        topic: String,
        payload: serde_json::Value,
    },
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::TopicSource(_) => "topic_source",
            Message::TopicClosed { .. } => "topic_closed",
            Message::ServiceSource(_) => "service_source",
            Message::HeartBeat { .. } => "heart_beat",
            Message::Data { .. } => "data",
        }
    }
}

/// Serialize `message` into one frame, header included.
pub fn encode(message: &Message, max_body: usize) -> Result<Vec<u8>, Status> {
    let body = serde_json::to_vec(message).map_err(|e| Status::internal(e.to_string()))?;
    if body.len() > max_body {
        return Err(Status::aborted(format!(
            "Message size {} exceeds limit {max_body}.",
            body.len()
        )));
    }
    let header = FrameHeader::new(body.len() as u32);
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

pub fn decode_body(body: &[u8]) -> Result<Message, Status> {
    Ok(serde_json::from_slice(body)?)
}

/// Decode a whole frame held in one buffer, as received in a datagram.
pub fn decode_frame(frame: &[u8], max_body: usize) -> Result<Message, Status> {
    if frame.len() < HEADER_LEN {
        return Err(Status::data_loss("Truncated frame header."));
    }
    let size = FrameHeader::parse(&frame[..HEADER_LEN], max_body)?;
    let body = &frame[HEADER_LEN..];
    if body.len() != size {
        return Err(Status::data_loss(format!(
            "Frame announces {size} bytes but carries {}.",
            body.len()
        )));
    }
    decode_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Endpoint, TransportKind};
    use crate::error::Code;

    #[test]
    fn header_is_little_endian() {
        let header = FrameHeader::new(3);
        assert_eq!(header.as_bytes(), &[0x53, 0x56, 0x44, 0x52, 3, 0, 0, 0]);
    }

    #[test]
    fn frame_decodes_back_to_message() {
        let msg = Message::TopicSource(TopicSource::new(
            "cam/0",
            TransportKind::Tcp,
            Endpoint::new("127.0.0.1", 4000),
        ));
        let frame = encode(&msg, DEFAULT_MAX_MESSAGE_BYTES).unwrap();
        assert_eq!(decode_frame(&frame, DEFAULT_MAX_MESSAGE_BYTES).unwrap(), msg);
    }

    #[test]
    fn bad_magic_is_data_loss() {
        let mut frame = encode(&Message::HeartBeat { client_id: 1 }, 1024).unwrap();
        frame[0] ^= 0xff;
        let err = decode_frame(&frame, 1024).unwrap_err();
        assert_eq!(err.code(), Code::DataLoss);
    }

    #[test]
    fn oversized_body_is_aborted() {
        let msg = Message::Data {
            topic: "t".into(),
            payload: serde_json::Value::String("x".repeat(64)),
        };
        assert_eq!(encode(&msg, 16).unwrap_err().code(), Code::Aborted);

        let frame = encode(&msg, 1024).unwrap();
        assert_eq!(
            FrameHeader::parse(&frame[..HEADER_LEN], 16).unwrap_err().code(),
            Code::Aborted
        );
    }

    #[test]
    fn truncated_datagram_is_data_loss() {
        let frame = encode(&Message::HeartBeat { client_id: 7 }, 1024).unwrap();
        let err = decode_frame(&frame[..frame.len() - 1], 1024).unwrap_err();
        assert_eq!(err.code(), Code::DataLoss);
    }

    #[test]
    fn message_is_internally_tagged() {
        let json = serde_json::to_value(Message::TopicClosed { topic: "a".into() }).unwrap();
        assert_eq!(json["type"], "topic_closed");
        assert_eq!(json["topic"], "a");
    }
}
