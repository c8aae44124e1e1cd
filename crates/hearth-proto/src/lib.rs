//! Wire types for the handshake, status, login and configuration phases of the game protocol.
//!
//! The play phase is intentionally limited to what is needed to disconnect a client cleanly.

mod codec;
mod frame;
pub mod listener;
pub mod packets;
mod protocol;

pub use codec::{Decode, DecodeError, Encode, VarInt};
pub use frame::{MAX_PACKET_SIZE, PacketDecoder, PacketEncoder, PacketFrame};
pub use protocol::{ConnectionProtocol, PacketFlow};

/// The protocol version this crate speaks.
pub const PROTOCOL_VERSION: i32 = 764;

/// The stringified name of the game version matching [`PROTOCOL_VERSION`].
pub const MINECRAFT_VERSION: &str = "1.20.2";

/// A packet with a fixed id inside one protocol phase.
pub trait Packet: Encode {
    /// The id written before the packet body.
    const ID: i32;
    /// Human readable name, used for logging.
    const NAME: &'static str;
    /// The phase this packet belongs to.
    const PROTOCOL: ConnectionProtocol;
    /// Which side sends the packet.
    const FLOW: PacketFlow;
}

/// Serverbound packets of one phase, decoded from a raw frame by id.
pub trait ServerboundPackets: Sized {
    /// The phase the packets belong to.
    const PROTOCOL: ConnectionProtocol;

    fn decode_frame(frame: &PacketFrame) -> Result<Self, DecodeError>;
}
