use bytes::Bytes;
use hearth_proto::{
    ConnectionProtocol, DecodeError, PacketDecoder, PacketEncoder, ServerboundPackets,
    listener::{ServerCommonPacketListener, ServerConfigurationPacketListener},
    packets::configuration::{
        ChatVisibility, ClientInformationC2s, ConfigurationC2s, CustomPayloadC2s,
        FinishConfigurationC2s, KeepAliveC2s, MainHand, PongC2s, ResourcePackAction,
        ResourcePackC2s,
    },
};

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    closed: bool,
}

impl ServerCommonPacketListener for Recorder {
    fn handle_keep_alive(&mut self, packet: KeepAliveC2s) {
        self.events.push(format!("keep_alive {}", packet.id));
    }

    fn handle_pong(&mut self, packet: PongC2s) {
        self.events.push(format!("pong {}", packet.id));
    }

    fn handle_custom_payload(&mut self, packet: CustomPayloadC2s) {
        self.events.push(format!("payload {}", packet.channel));
    }

    fn handle_resource_pack_response(&mut self, packet: ResourcePackC2s) {
        self.events.push(format!("resource_pack {:?}", packet.action));
    }

    fn handle_client_information(&mut self, packet: ClientInformationC2s) {
        self.events.push(format!("client_information {}", packet.language));
    }

    fn on_disconnect(&mut self, reason: &str) {
        self.events.push(format!("disconnect {reason}"));
    }

    fn is_accepting_messages(&self) -> bool {
        !self.closed
    }
}

impl ServerConfigurationPacketListener for Recorder {
    fn handle_configuration_finished(&mut self, _packet: FinishConfigurationC2s) {
        self.events.push("finished".to_owned());
        self.closed = true;
    }
}

fn frames(encoder: &mut PacketEncoder) -> Vec<ConfigurationC2s> {
    let mut decoder = PacketDecoder::new();
    decoder.queue_slice(&encoder.take());

    let mut packets = Vec::new();
    while let Some(frame) = decoder.try_next_frame().unwrap() {
        packets.push(ConfigurationC2s::decode_frame(&frame).unwrap());
    }
    packets
}

#[test]
fn configuration_listener_reports_its_phase() {
    let recorder = Recorder::default();
    assert_eq!(recorder.protocol(), ConnectionProtocol::Configuration);
}

#[test]
fn packets_are_dispatched_until_configuration_finishes() {
    let mut encoder = PacketEncoder::new();
    encoder.append_packet(&ClientInformationC2s {
        language: "en_us".to_owned(),
        view_distance: 12,
        chat_visibility: ChatVisibility::Full,
        chat_colors: true,
        model_customisation: 0x7F,
        main_hand: MainHand::Right,
        text_filtering_enabled: false,
        allows_listing: true,
    });
    encoder.append_packet(&CustomPayloadC2s {
        channel: "minecraft:brand".to_owned(),
        data: Bytes::from_static(b"\x07vanilla"),
    });
    encoder.append_packet(&KeepAliveC2s { id: 99 });
    encoder.append_packet(&PongC2s { id: -3 });
    encoder.append_packet(&ResourcePackC2s {
        action: ResourcePackAction::Declined,
    });
    encoder.append_packet(&FinishConfigurationC2s);
    encoder.append_packet(&KeepAliveC2s { id: 100 });

    let mut recorder = Recorder::default();
    for packet in frames(&mut encoder) {
        packet.handle(&mut recorder);
    }

    assert_eq!(recorder.events, [
        "client_information en_us",
        "payload minecraft:brand",
        "keep_alive 99",
        "pong -3",
        "resource_pack Declined",
        "finished",
    ]);
}

#[test]
fn unknown_configuration_packet_ids_are_rejected() {
    let frame = hearth_proto::PacketFrame {
        id: 0x42,
        body: Bytes::new(),
    };

    assert_eq!(
        ConfigurationC2s::decode_frame(&frame),
        Err(DecodeError::UnknownPacket {
            id: 0x42,
            protocol: ConnectionProtocol::Configuration,
        })
    );
}
