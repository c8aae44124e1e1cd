use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Decode, DecodeError, Encode, Packet, VarInt};

/// The maximum number of bytes that can be sent in a single packet.
pub const MAX_PACKET_SIZE: usize = 0x001F_FFFF;

/// A complete, undecoded packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacketFrame {
    /// The ID of the decoded packet.
    pub id: i32,
    /// The contents of the packet after the leading VarInt ID.
    pub body: Bytes,
}

impl PacketFrame {
    /// Decodes the body as `P`, requiring that the whole body is consumed.
    pub fn decode<P: Packet + Decode>(&self) -> Result<P, DecodeError> {
        let mut body = &self.body[..];
        let packet = P::decode(&mut body)?;

        if !body.is_empty() {
            return Err(DecodeError::TrailingBytes {
                packet: P::NAME,
                remaining: body.len(),
            });
        }

        Ok(packet)
    }
}

/// A buffer for saving bytes that are not yet decoded.
#[derive(Default, Debug)]
pub struct PacketDecoder {
    buf: BytesMut,
}

impl PacketDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Mutable access for reading straight from a socket.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Splits off the next complete frame, or returns `None` if more bytes are needed.
    pub fn try_next_frame(&mut self) -> Result<Option<PacketFrame>, DecodeError> {
        let mut remaining = &self.buf[..];

        let len = match VarInt::decode(&mut remaining) {
            Ok(VarInt(len)) => len,
            Err(DecodeError::Incomplete) => return Ok(None),
            Err(e) => return Err(e),
        };

        let frame_len = usize::try_from(len)
            .ok()
            .filter(|&len| len > 0 && len <= MAX_PACKET_SIZE)
            .ok_or(DecodeError::FrameLength(len))?;

        if remaining.len() < frame_len {
            return Ok(None);
        }

        let header_len = self.buf.len() - remaining.len();
        self.buf.advance(header_len);

        let data = self.buf.split_to(frame_len).freeze();

        let mut cursor = &data[..];
        let VarInt(id) = VarInt::decode(&mut cursor)?;
        let body = data.slice(data.len() - cursor.len()..);

        Ok(Some(PacketFrame { id, body }))
    }
}

/// Accumulates length-prefixed packets ready to be written to a socket.
#[derive(Default, Debug)]
pub struct PacketEncoder {
    buf: BytesMut,
    scratch: BytesMut,
}

impl PacketEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_packet<P: Packet>(&mut self, packet: &P) {
        self.scratch.clear();
        VarInt(P::ID).encode(&mut self.scratch);
        packet.encode(&mut self.scratch);

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_possible_wrap,
            reason = "packets are bounded by MAX_PACKET_SIZE"
        )]
        VarInt(self.scratch.len() as i32).encode(&mut self.buf);
        self.buf.put_slice(&self.scratch);

        tracing::trace!(packet = P::NAME, len = self.scratch.len(), "encoded packet");
    }

    /// Takes all encoded bytes, leaving the encoder empty.
    pub fn take(&mut self) -> BytesMut {
        self.buf.split()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::status::{PingRequestC2s, PongResponseS2c};

    #[test]
    fn frames_split_across_reads() {
        let mut encoder = PacketEncoder::new();
        encoder.append_packet(&PongResponseS2c { payload: 42 });
        encoder.append_packet(&PongResponseS2c { payload: 7 });
        let bytes = encoder.take();

        let mut decoder = PacketDecoder::new();
        let (first, second) = bytes.split_at(3);

        decoder.queue_slice(first);
        assert_eq!(decoder.try_next_frame(), Ok(None));

        decoder.queue_slice(second);
        let frame = decoder.try_next_frame().unwrap().unwrap();
        assert_eq!(frame.id, 0x01);
        assert_eq!(frame.decode::<PingRequestC2s>().unwrap().payload, 42);

        let frame = decoder.try_next_frame().unwrap().unwrap();
        assert_eq!(frame.decode::<PingRequestC2s>().unwrap().payload, 7);

        assert_eq!(decoder.try_next_frame(), Ok(None));
    }

    #[test]
    fn rejects_zero_length_frames() {
        let mut decoder = PacketDecoder::new();
        decoder.queue_slice(&[0x00]);
        assert_eq!(decoder.try_next_frame(), Err(DecodeError::FrameLength(0)));
    }

    #[test]
    fn trailing_bytes_are_an_error() {
        let frame = PacketFrame {
            id: 0x01,
            body: Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 1, 0xFF]),
        };
        assert!(matches!(
            frame.decode::<PingRequestC2s>(),
            Err(DecodeError::TrailingBytes { remaining: 1, .. })
        ));
    }
}
