use bytes::BytesMut;

use super::packet;
use crate::{
    ConnectionProtocol, Decode, DecodeError, Encode, PacketFrame, ServerboundPackets, VarInt,
    codec::decode_bounded_string,
};

/// What the client wants to do after the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeNextState {
    Status,
    Login,
}

impl Encode for HandshakeNextState {
    fn encode(&self, buf: &mut BytesMut) {
        let id = match self {
            Self::Status => 1,
            Self::Login => 2,
        };
        VarInt(id).encode(buf);
    }
}

impl Decode for HandshakeNextState {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        match VarInt::decode(buf)?.0 {
            1 => Ok(Self::Status),
            2 => Ok(Self::Login),
            value => Err(DecodeError::InvalidValue {
                field: "next_state",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeC2s {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: HandshakeNextState,
}

packet!(HandshakeC2s, 0x00, Handshaking, Serverbound);

impl Encode for HandshakeC2s {
    fn encode(&self, buf: &mut BytesMut) {
        VarInt(self.protocol_version).encode(buf);
        self.server_address.encode(buf);
        self.server_port.encode(buf);
        self.next_state.encode(buf);
    }
}

impl Decode for HandshakeC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            protocol_version: VarInt::decode(buf)?.0,
            server_address: decode_bounded_string(buf, 255)?,
            server_port: u16::decode(buf)?,
            next_state: HandshakeNextState::decode(buf)?,
        })
    }
}

impl ServerboundPackets for HandshakeC2s {
    const PROTOCOL: ConnectionProtocol = ConnectionProtocol::Handshaking;

    fn decode_frame(frame: &PacketFrame) -> Result<Self, DecodeError> {
        match frame.id {
            0x00 => frame.decode(),
            id => Err(DecodeError::UnknownPacket {
                id,
                protocol: Self::PROTOCOL,
            }),
        }
    }
}
