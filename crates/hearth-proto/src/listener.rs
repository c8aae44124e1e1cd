//! Server-side packet listeners, one trait per protocol phase.

use crate::{
    ConnectionProtocol,
    packets::configuration::{
        ClientInformationC2s, CustomPayloadC2s, FinishConfigurationC2s, KeepAliveC2s, PongC2s,
        ResourcePackC2s,
    },
};

/// Packets every post-login phase understands.
pub trait ServerCommonPacketListener {
    fn handle_keep_alive(&mut self, packet: KeepAliveC2s);

    fn handle_pong(&mut self, packet: PongC2s);

    fn handle_custom_payload(&mut self, packet: CustomPayloadC2s);

    fn handle_resource_pack_response(&mut self, packet: ResourcePackC2s);

    fn handle_client_information(&mut self, packet: ClientInformationC2s);

    /// Called once when the connection goes away, for whatever reason.
    fn on_disconnect(&mut self, reason: &str);

    /// Packets arriving after the listener stops accepting are dropped.
    fn is_accepting_messages(&self) -> bool {
        true
    }
}

/// Listener for the configuration phase, between login and play.
pub trait ServerConfigurationPacketListener: ServerCommonPacketListener {
    fn protocol(&self) -> ConnectionProtocol {
        ConnectionProtocol::Configuration
    }

    /// The client has applied everything it was sent and is ready to enter play.
    fn handle_configuration_finished(&mut self, packet: FinishConfigurationC2s);
}
