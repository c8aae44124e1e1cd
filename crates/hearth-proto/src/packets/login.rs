use bytes::BytesMut;
use uuid::Uuid;

use super::{empty_codec, packet};
use crate::{
    ConnectionProtocol, Decode, DecodeError, Encode, PacketFrame, ServerboundPackets, VarInt,
    codec::decode_bounded_string,
};

/// Sent by the client to start logging in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginHelloC2s {
    pub username: String,
    pub profile_id: Uuid,
}

packet!(LoginHelloC2s, 0x00, Login, Serverbound);

impl Encode for LoginHelloC2s {
    fn encode(&self, buf: &mut BytesMut) {
        self.username.encode(buf);
        self.profile_id.encode(buf);
    }
}

impl Decode for LoginHelloC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            username: decode_bounded_string(buf, 16)?,
            profile_id: Uuid::decode(buf)?,
        })
    }
}

/// The client accepted [`LoginSuccessS2c`] and switches to the configuration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAcknowledgedC2s;

packet!(LoginAcknowledgedC2s, 0x03, Login, Serverbound);
empty_codec!(LoginAcknowledgedC2s);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDisconnectS2c {
    /// JSON text component.
    pub reason: String,
}

packet!(LoginDisconnectS2c, 0x00, Login, Clientbound);

impl Encode for LoginDisconnectS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.reason.encode(buf);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccessS2c {
    pub uuid: Uuid,
    pub username: String,
}

packet!(LoginSuccessS2c, 0x02, Login, Clientbound);

impl Encode for LoginSuccessS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.uuid.encode(buf);
        self.username.encode(buf);
        // no profile properties in offline mode
        VarInt(0).encode(buf);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginC2s {
    Hello(LoginHelloC2s),
    Acknowledged(LoginAcknowledgedC2s),
}

impl ServerboundPackets for LoginC2s {
    const PROTOCOL: ConnectionProtocol = ConnectionProtocol::Login;

    fn decode_frame(frame: &PacketFrame) -> Result<Self, DecodeError> {
        match frame.id {
            0x00 => frame.decode().map(Self::Hello),
            0x03 => frame.decode().map(Self::Acknowledged),
            id => Err(DecodeError::UnknownPacket {
                id,
                protocol: Self::PROTOCOL,
            }),
        }
    }
}
