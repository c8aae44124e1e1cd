//! Packet definitions grouped by protocol phase.

pub mod configuration;
pub mod handshake;
pub mod login;
pub mod play;
pub mod status;

macro_rules! packet {
    ($ty:ident, $id:literal, $protocol:ident, $flow:ident) => {
        impl $crate::Packet for $ty {
            const FLOW: $crate::PacketFlow = $crate::PacketFlow::$flow;
            const ID: i32 = $id;
            const NAME: &'static str = stringify!($ty);
            const PROTOCOL: $crate::ConnectionProtocol = $crate::ConnectionProtocol::$protocol;
        }
    };
}

pub(crate) use packet;

/// Packets with no body.
macro_rules! empty_codec {
    ($ty:ident) => {
        impl $crate::Encode for $ty {
            fn encode(&self, _buf: &mut bytes::BytesMut) {}
        }

        impl $crate::Decode for $ty {
            fn decode(_buf: &mut &[u8]) -> Result<Self, $crate::DecodeError> {
                Ok(Self)
            }
        }
    };
}

pub(crate) use empty_codec;
