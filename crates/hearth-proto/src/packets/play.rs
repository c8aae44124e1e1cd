use bytes::BytesMut;

use super::packet;
use crate::Encode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectS2c {
    /// JSON text component.
    pub reason: String,
}

packet!(DisconnectS2c, 0x1B, Play, Clientbound);

impl Encode for DisconnectS2c {
    fn encode(&self, buf: &mut BytesMut) {
        self.reason.encode(buf);
    }
}
