use bytes::{Bytes, BytesMut};

use super::{empty_codec, packet};
use crate::{
    ConnectionProtocol, Decode, DecodeError, Encode, PacketFrame, ServerboundPackets, VarInt,
    codec::decode_bounded_string,
    listener::ServerConfigurationPacketListener,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatVisibility {
    Full,
    System,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainHand {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInformationC2s {
    pub language: String,
    pub view_distance: i8,
    pub chat_visibility: ChatVisibility,
    pub chat_colors: bool,
    pub model_customisation: u8,
    pub main_hand: MainHand,
    pub text_filtering_enabled: bool,
    pub allows_listing: bool,
}

packet!(ClientInformationC2s, 0x00, Configuration, Serverbound);

impl Encode for ClientInformationC2s {
    fn encode(&self, buf: &mut BytesMut) {
        self.language.encode(buf);
        self.view_distance.encode(buf);
        VarInt(match self.chat_visibility {
            ChatVisibility::Full => 0,
            ChatVisibility::System => 1,
            ChatVisibility::Hidden => 2,
        })
        .encode(buf);
        self.chat_colors.encode(buf);
        self.model_customisation.encode(buf);
        VarInt(match self.main_hand {
            MainHand::Left => 0,
            MainHand::Right => 1,
        })
        .encode(buf);
        self.text_filtering_enabled.encode(buf);
        self.allows_listing.encode(buf);
    }
}

impl Decode for ClientInformationC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        let language = decode_bounded_string(buf, 16)?;
        let view_distance = i8::decode(buf)?;
        let chat_visibility = match VarInt::decode(buf)?.0 {
            0 => ChatVisibility::Full,
            1 => ChatVisibility::System,
            2 => ChatVisibility::Hidden,
            value => {
                return Err(DecodeError::InvalidValue {
                    field: "chat_visibility",
                    value,
                });
            }
        };
        let chat_colors = bool::decode(buf)?;
        let model_customisation = u8::decode(buf)?;
        let main_hand = match VarInt::decode(buf)?.0 {
            0 => MainHand::Left,
            1 => MainHand::Right,
            value => {
                return Err(DecodeError::InvalidValue {
                    field: "main_hand",
                    value,
                });
            }
        };

        Ok(Self {
            language,
            view_distance,
            chat_visibility,
            chat_colors,
            model_customisation,
            main_hand,
            text_filtering_enabled: bool::decode(buf)?,
            allows_listing: bool::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomPayloadC2s {
    pub channel: String,
    pub data: Bytes,
}

packet!(CustomPayloadC2s, 0x01, Configuration, Serverbound);

impl Encode for CustomPayloadC2s {
    fn encode(&self, buf: &mut BytesMut) {
        self.channel.encode(buf);
        self.data.encode(buf);
    }
}

impl Decode for CustomPayloadC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            channel: String::decode(buf)?,
            data: Bytes::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishConfigurationC2s;

packet!(FinishConfigurationC2s, 0x02, Configuration, Serverbound);
empty_codec!(FinishConfigurationC2s);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveC2s {
    pub id: i64,
}

packet!(KeepAliveC2s, 0x03, Configuration, Serverbound);

impl Encode for KeepAliveC2s {
    fn encode(&self, buf: &mut BytesMut) {
        self.id.encode(buf);
    }
}

impl Decode for KeepAliveC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            id: i64::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PongC2s {
    pub id: i32,
}

packet!(PongC2s, 0x04, Configuration, Serverbound);

impl Encode for PongC2s {
    fn encode(&self, buf: &mut BytesMut) {
        self.id.encode(buf);
    }
}

impl Decode for PongC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            id: i32::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePackAction {
    SuccessfullyLoaded,
    Declined,
    FailedDownload,
    Accepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePackC2s {
    pub action: ResourcePackAction,
}

packet!(ResourcePackC2s, 0x05, Configuration, Serverbound);

impl Encode for ResourcePackC2s {
    fn encode(&self, buf: &mut BytesMut) {
        VarInt(match self.action {
            ResourcePackAction::SuccessfullyLoaded => 0,
            ResourcePackAction::Declined => 1,
            ResourcePackAction::FailedDownload => 2,
            ResourcePackAction::Accepted => 3,
        })
        .encode(buf);
    }
}

impl Decode for ResourcePackC2s {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        let action = match VarInt::decode(buf)?.0 {
            0 => ResourcePackAction::SuccessfullyLoaded,
            1 => ResourcePackAction::Declined,
            2 => ResourcePackAction::FailedDownload,
            3 => ResourcePackAction::Accepted,
            value => {
                return Err(DecodeError::InvalidValue {
                    field: "resource_pack_action",
                    value,
                });
            }
        };
        Ok(Self { action })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomPayloadS2c {
    pub channel: String,
    pub data: Bytes,
}

packet!(CustomPayloadS2c, 0x00, Configuration, Clientbound);

impl Encode for CustomPayloadS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.channel.encode(buf);
        self.data.encode(buf);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectS2c {
    /// JSON text component.
    pub reason: String,
}

packet!(DisconnectS2c, 0x01, Configuration, Clientbound);

impl Encode for DisconnectS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.reason.encode(buf);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishConfigurationS2c;

packet!(FinishConfigurationS2c, 0x02, Configuration, Clientbound);
empty_codec!(FinishConfigurationS2c);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveS2c {
    pub id: i64,
}

packet!(KeepAliveS2c, 0x03, Configuration, Clientbound);

impl Encode for KeepAliveS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.id.encode(buf);
    }
}

/// Every serverbound packet of the configuration phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationC2s {
    ClientInformation(ClientInformationC2s),
    CustomPayload(CustomPayloadC2s),
    FinishConfiguration(FinishConfigurationC2s),
    KeepAlive(KeepAliveC2s),
    Pong(PongC2s),
    ResourcePack(ResourcePackC2s),
}

impl ConfigurationC2s {
    /// Hands the packet to the matching listener method.
    pub fn handle<L>(self, listener: &mut L)
    where
        L: ServerConfigurationPacketListener + ?Sized,
    {
        debug_assert_eq!(listener.protocol(), ConnectionProtocol::Configuration);

        if !listener.is_accepting_messages() {
            tracing::debug!("dropping configuration packet for a closed listener");
            return;
        }

        match self {
            Self::ClientInformation(packet) => listener.handle_client_information(packet),
            Self::CustomPayload(packet) => listener.handle_custom_payload(packet),
            Self::FinishConfiguration(packet) => listener.handle_configuration_finished(packet),
            Self::KeepAlive(packet) => listener.handle_keep_alive(packet),
            Self::Pong(packet) => listener.handle_pong(packet),
            Self::ResourcePack(packet) => listener.handle_resource_pack_response(packet),
        }
    }
}

impl ServerboundPackets for ConfigurationC2s {
    const PROTOCOL: ConnectionProtocol = ConnectionProtocol::Configuration;

    fn decode_frame(frame: &PacketFrame) -> Result<Self, DecodeError> {
        match frame.id {
            0x00 => frame.decode().map(Self::ClientInformation),
            0x01 => frame.decode().map(Self::CustomPayload),
            0x02 => frame.decode().map(Self::FinishConfiguration),
            0x03 => frame.decode().map(Self::KeepAlive),
            0x04 => frame.decode().map(Self::Pong),
            0x05 => frame.decode().map(Self::ResourcePack),
            id => Err(DecodeError::UnknownPacket {
                id,
                protocol: Self::PROTOCOL,
            }),
        }
    }
}
