use bytes::{Buf, BufMut, Bytes, BytesMut};
use uuid::Uuid;

/// Maximum number of UTF-16 code units a protocol string may carry by default.
const DEFAULT_MAX_STRING_CHARS: usize = 32_767;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before the value did. For framing this means "read more bytes".
    #[error("unexpected end of buffer")]
    Incomplete,
    #[error("VarInt is too large")]
    VarIntTooLarge,
    #[error("frame length {0} is out of bounds")]
    FrameLength(i32),
    #[error("string of {len} bytes exceeds the limit of {max} characters")]
    StringTooLong { len: usize, max: usize },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid value {value} for {field}")]
    InvalidValue { field: &'static str, value: i32 },
    #[error("unknown packet id {id:#04x} in the {protocol} phase")]
    UnknownPacket {
        id: i32,
        protocol: crate::ConnectionProtocol,
    },
    #[error("{remaining} trailing bytes after {packet}")]
    TrailingBytes {
        packet: &'static str,
        remaining: usize,
    },
}

pub trait Encode {
    fn encode(&self, buf: &mut BytesMut);
}

pub trait Decode: Sized {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError>;
}

/// A variable length, little-endian base-128 `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarInt(pub i32);

impl VarInt {
    /// The maximum number of bytes a `VarInt` can occupy.
    pub const MAX_SIZE: usize = 5;

    /// The number of bytes this value occupies when written.
    #[must_use]
    pub const fn written_size(self) -> usize {
        match self.0 {
            0 => 1,
            n => (31 - n.leading_zeros() as usize) / 7 + 1,
        }
    }
}

impl Encode for VarInt {
    fn encode(&self, buf: &mut BytesMut) {
        #[expect(clippy::cast_sign_loss, reason = "the bit pattern is what is written")]
        let mut value = self.0 as u32;
        loop {
            #[expect(clippy::cast_possible_truncation, reason = "masked to seven bits")]
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                buf.put_u8(byte);
                return;
            }
            buf.put_u8(byte | 0x80);
        }
    }
}

impl Decode for VarInt {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        let mut value = 0_i32;
        for i in 0..Self::MAX_SIZE {
            let Some(&byte) = buf.first() else {
                return Err(DecodeError::Incomplete);
            };
            buf.advance(1);
            value |= i32::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(Self(value));
            }
        }
        Err(DecodeError::VarIntTooLarge)
    }
}

macro_rules! impl_number {
    ($($ty:ty => $get:ident, $put:ident);* $(;)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, buf: &mut BytesMut) {
                    buf.$put(*self);
                }
            }

            impl Decode for $ty {
                fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
                    if buf.remaining() < size_of::<$ty>() {
                        return Err(DecodeError::Incomplete);
                    }
                    Ok(buf.$get())
                }
            }
        )*
    };
}

impl_number! {
    u8 => get_u8, put_u8;
    i8 => get_i8, put_i8;
    u16 => get_u16, put_u16;
    i32 => get_i32, put_i32;
    i64 => get_i64, put_i64;
}

impl Encode for bool {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(u8::from(*self));
    }
}

impl Decode for bool {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::decode(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidValue {
                field: "bool",
                value: i32::from(other),
            }),
        }
    }
}

impl Encode for Uuid {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u128(self.as_u128());
    }
}

impl Decode for Uuid {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        if buf.remaining() < 16 {
            return Err(DecodeError::Incomplete);
        }
        Ok(Self::from_u128(buf.get_u128()))
    }
}

impl Encode for str {
    fn encode(&self, buf: &mut BytesMut) {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_possible_wrap,
            reason = "protocol strings are bounded well below i32::MAX"
        )]
        VarInt(self.len() as i32).encode(buf);
        buf.put_slice(self.as_bytes());
    }
}

impl Encode for String {
    fn encode(&self, buf: &mut BytesMut) {
        self.as_str().encode(buf);
    }
}

impl Decode for String {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        decode_bounded_string(buf, DEFAULT_MAX_STRING_CHARS)
    }
}

/// Reads a length-prefixed string holding at most `max_chars` characters.
pub(crate) fn decode_bounded_string(
    buf: &mut &[u8],
    max_chars: usize,
) -> Result<String, DecodeError> {
    let VarInt(len) = VarInt::decode(buf)?;
    let len = usize::try_from(len).map_err(|_| DecodeError::InvalidValue {
        field: "string length",
        value: len,
    })?;

    if len > max_chars * 3 {
        return Err(DecodeError::StringTooLong {
            len,
            max: max_chars,
        });
    }

    if buf.remaining() < len {
        return Err(DecodeError::Incomplete);
    }

    let (head, tail) = (*buf).split_at(len);
    let string = std::str::from_utf8(head).map_err(|_| DecodeError::InvalidUtf8)?;

    if string.encode_utf16().count() > max_chars {
        return Err(DecodeError::StringTooLong {
            len,
            max: max_chars,
        });
    }

    *buf = tail;
    Ok(string.to_owned())
}

impl Encode for Bytes {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self);
    }
}

/// Consumes everything left in the buffer. Only valid as the last field of a packet.
impl Decode for Bytes {
    fn decode(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        let rest = Self::copy_from_slice(buf);
        *buf = &[];
        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: i32) -> Vec<u8> {
        let mut buf = BytesMut::new();
        VarInt(value).encode(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn var_int_known_encodings() {
        assert_eq!(encoded(0), [0x00]);
        assert_eq!(encoded(1), [0x01]);
        assert_eq!(encoded(127), [0x7F]);
        assert_eq!(encoded(128), [0x80, 0x01]);
        assert_eq!(encoded(25565), [0xDD, 0xC7, 0x01]);
        assert_eq!(encoded(-1), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn var_int_written_size_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 2_097_151, i32::MAX, -1, i32::MIN] {
            assert_eq!(VarInt(value).written_size(), encoded(value).len(), "{value}");
        }
    }

    #[test]
    fn var_int_reports_incomplete_input() {
        let mut slice: &[u8] = &[0x80, 0x80];
        assert_eq!(VarInt::decode(&mut slice), Err(DecodeError::Incomplete));
    }

    #[test]
    fn var_int_rejects_six_byte_values() {
        let mut slice: &[u8] = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert_eq!(VarInt::decode(&mut slice), Err(DecodeError::VarIntTooLarge));
    }

    #[test]
    fn bounded_string_rejects_oversized_names() {
        let mut buf = BytesMut::new();
        "abcdefghijklmnopq".encode(&mut buf);
        let mut slice = &buf[..];
        assert!(matches!(
            decode_bounded_string(&mut slice, 16),
            Err(DecodeError::StringTooLong { .. })
        ));
    }

    #[test]
    fn bool_rejects_values_other_than_zero_and_one() {
        let mut slice: &[u8] = &[2];
        assert!(matches!(
            bool::decode(&mut slice),
            Err(DecodeError::InvalidValue { field: "bool", .. })
        ));
    }
}
