use hearth_proto::{
    Decode,
    listener::{ServerCommonPacketListener, ServerConfigurationPacketListener},
    packets::configuration::{
        ClientInformationC2s, CustomPayloadC2s, FinishConfigurationC2s, KeepAliveC2s, PongC2s,
        ResourcePackC2s,
    },
};
use tracing::{debug, info};
use uuid::Uuid;

pub const BRAND_CHANNEL: &str = "minecraft:brand";

/// State of one client in the configuration phase.
#[derive(Debug)]
pub struct ConfigurationHandler {
    pub username: String,
    pub uuid: Uuid,
    pub client_information: Option<ClientInformationC2s>,
    pub client_brand: Option<String>,
    pub last_keep_alive: Option<i64>,
    finished: bool,
    disconnected: bool,
}

impl ConfigurationHandler {
    #[must_use]
    pub const fn new(username: String, uuid: Uuid) -> Self {
        Self {
            username,
            uuid,
            client_information: None,
            client_brand: None,
            last_keep_alive: None,
            finished: false,
            disconnected: false,
        }
    }

    /// The client acknowledged the end of configuration.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Brand payloads carry a single length-prefixed string.
fn decode_brand(mut data: &[u8]) -> Option<String> {
    String::decode(&mut data).ok()
}

impl ServerCommonPacketListener for ConfigurationHandler {
    fn handle_keep_alive(&mut self, packet: KeepAliveC2s) {
        self.last_keep_alive = Some(packet.id);
    }

    fn handle_pong(&mut self, packet: PongC2s) {
        debug!("pong {} from {}", packet.id, self.username);
    }

    fn handle_custom_payload(&mut self, packet: CustomPayloadC2s) {
        if packet.channel == BRAND_CHANNEL {
            self.client_brand = decode_brand(&packet.data);
            debug!("{} uses client brand {:?}", self.username, self.client_brand);
        } else {
            debug!("ignoring custom payload on {}", packet.channel);
        }
    }

    fn handle_resource_pack_response(&mut self, packet: ResourcePackC2s) {
        debug!("{} resource pack response {:?}", self.username, packet.action);
    }

    fn handle_client_information(&mut self, packet: ClientInformationC2s) {
        self.client_information = Some(packet);
    }

    fn on_disconnect(&mut self, reason: &str) {
        self.disconnected = true;
        info!("{} lost connection: {reason}", self.username);
    }

    fn is_accepting_messages(&self) -> bool {
        !self.finished && !self.disconnected
    }
}

impl ServerConfigurationPacketListener for ConfigurationHandler {
    fn handle_configuration_finished(&mut self, _packet: FinishConfigurationC2s) {
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};
    use hearth_proto::{
        Encode,
        packets::configuration::{ConfigurationC2s, ResourcePackAction},
    };

    use super::*;

    fn handler() -> ConfigurationHandler {
        ConfigurationHandler::new("alex".to_owned(), Uuid::nil())
    }

    #[test]
    fn brand_and_keep_alive_are_recorded() {
        let mut handler = handler();

        let mut data = BytesMut::new();
        "vanilla".encode(&mut data);
        ConfigurationC2s::CustomPayload(CustomPayloadC2s {
            channel: BRAND_CHANNEL.to_owned(),
            data: data.freeze(),
        })
        .handle(&mut handler);
        ConfigurationC2s::KeepAlive(KeepAliveC2s { id: 9 }).handle(&mut handler);
        ConfigurationC2s::ResourcePack(ResourcePackC2s {
            action: ResourcePackAction::Declined,
        })
        .handle(&mut handler);

        assert_eq!(handler.client_brand.as_deref(), Some("vanilla"));
        assert_eq!(handler.last_keep_alive, Some(9));
        assert!(!handler.is_finished());
    }

    #[test]
    fn nothing_is_accepted_after_finishing() {
        let mut handler = handler();

        ConfigurationC2s::FinishConfiguration(FinishConfigurationC2s).handle(&mut handler);
        assert!(handler.is_finished());

        ConfigurationC2s::KeepAlive(KeepAliveC2s { id: 1 }).handle(&mut handler);
        assert_eq!(handler.last_keep_alive, None);
    }

    #[test]
    fn malformed_brand_is_ignored() {
        let mut handler = handler();
        handler.handle_custom_payload(CustomPayloadC2s {
            channel: BRAND_CHANNEL.to_owned(),
            data: Bytes::from_static(&[0x05, b'a']),
        });
        assert_eq!(handler.client_brand, None);
    }
}
