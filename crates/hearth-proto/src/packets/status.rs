use bytes::BytesMut;

use super::{empty_codec, packet};
use crate::{ConnectionProtocol, Decode, DecodeError, Encode, PacketFrame, ServerboundPackets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRequestC2s;

packet!(StatusRequestC2s, 0x00, Status, Serverbound);
empty_codec!(StatusRequestC2s);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingRequestC2s {
    pub payload: i64,
}

packet!(PingRequestC2s, 0x01, Status, Serverbound);

impl Encode for PingRequestC2s {
    fn encode(&self, buf: &mut BytesMut) {
        self.payload.encode(buf);
    }
}

impl Decode for PingRequestC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            payload: i64::decode(buf)?,
        })
    }
}

/// The server list entry, as a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponseS2c {
    pub json: String,
}

packet!(StatusResponseS2c, 0x00, Status, Clientbound);

impl Encode for StatusResponseS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.json.encode(buf);
    }
}

impl Decode for StatusResponseS2c {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            json: String::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PongResponseS2c {
    pub payload: i64,
}

packet!(PongResponseS2c, 0x01, Status, Clientbound);

impl Encode for PongResponseS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.payload.encode(buf);
    }
}

impl Decode for PongResponseS2c {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            payload: i64::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusC2s {
    StatusRequest(StatusRequestC2s),
    PingRequest(PingRequestC2s),
}

impl ServerboundPackets for StatusC2s {
    const PROTOCOL: ConnectionProtocol = ConnectionProtocol::Status;

    fn decode_frame(frame: &PacketFrame) -> Result<Self, DecodeError> {
        match frame.id {
            0x00 => frame.decode().map(Self::StatusRequest),
            0x01 => frame.decode().map(Self::PingRequest),
            id => Err(DecodeError::UnknownPacket {
                id,
                protocol: Self::PROTOCOL,
            }),
        }
    }
}
