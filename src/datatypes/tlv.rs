use crate::codec::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Optional parameter tags used by this crate (Section 5.3.2).
pub mod tags {
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const MESSAGE_STATE: u16 = 0x0427;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tlv {
    /// The Tag field is used to uniquely identify the particular optional parameter in question.
    pub tag: u16,

    /// The Value field contains the actual data for the optional parameter in question.
    /// Its length is written on the wire as the Length field.
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn from_u8(tag: u16, value: u8) -> Self {
        Self::new(tag, vec![value])
    }

    pub fn from_u16(tag: u16, value: u16) -> Self {
        Self::new(tag, value.to_be_bytes().to_vec())
    }

    /// The value as a single octet integer, if it is one
    pub fn as_u8(&self) -> Option<u8> {
        match self.value.as_ref() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// The value as a two octet integer, if it is one
    pub fn as_u16(&self) -> Option<u16> {
        match self.value.as_ref() {
            [high, low] => Some(u16::from_be_bytes([*high, *low])),
            _ => None,
        }
    }

    /// The value as a C-Octet String (trailing NUL optional)
    pub fn as_cstring(&self) -> Option<&str> {
        let raw = self.value.as_ref();
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
        std::str::from_utf8(raw).ok()
    }

    pub fn encoded_size(&self) -> usize {
        4 + self.value.len()
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = u16::try_from(self.value.len()).map_err(|_| {
            CodecError::TlvError(format!(
                "value of tag {:#06x} is {} octets, more than a TLV can carry",
                self.tag,
                self.value.len()
            ))
        })?;
        buf.put_u16(self.tag);
        buf.put_u16(length);
        buf.put_slice(&self.value);
        Ok(())
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::TlvError(format!(
                "{} trailing octets cannot hold a TLV header",
                buf.remaining()
            )));
        }
        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(CodecError::TlvError(format!(
                "tag {tag:#06x} declares {length} octets, {} available",
                buf.remaining()
            )));
        }
        Ok(Self {
            tag,
            value: buf.copy_to_bytes(length),
        })
    }
}

/// Decode every TLV left in a bounded PDU body
pub fn decode_tlvs(buf: &mut Cursor<&[u8]>) -> Result<Vec<Tlv>, CodecError> {
    let mut tlvs = Vec::new();
    while buf.has_remaining() {
        tlvs.push(Tlv::decode(buf)?);
    }
    Ok(tlvs)
}

pub fn encode_tlvs(tlvs: &[Tlv], buf: &mut BytesMut) -> Result<(), CodecError> {
    for tlv in tlvs {
        tlv.encode(buf)?;
    }
    Ok(())
}

/// First TLV carrying `tag`
pub fn find_tlv(tlvs: &[Tlv], tag: u16) -> Option<&Tlv> {
    tlvs.iter().find(|tlv| tlv.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_accessors() {
        assert_eq!(Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, 3).as_u8(), Some(3));
        assert_eq!(Tlv::from_u16(tags::SAR_MSG_REF_NUM, 0x1234).as_u16(), Some(0x1234));
        assert_eq!(Tlv::from_u16(tags::SAR_MSG_REF_NUM, 1).as_u8(), None);
    }

    #[test]
    fn cstring_accessor_strips_terminator() {
        let tlv = Tlv::new(tags::RECEIPTED_MESSAGE_ID, b"abc123\0".to_vec());
        assert_eq!(tlv.as_cstring(), Some("abc123"));
    }

    #[test]
    fn decodes_sequence_until_body_ends() {
        let mut buf = BytesMut::new();
        encode_tlvs(
            &[
                Tlv::from_u16(tags::SAR_MSG_REF_NUM, 7),
                Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, 2),
            ],
            &mut buf,
        )
        .unwrap();

        let mut cursor = Cursor::new(buf.as_ref());
        let tlvs = decode_tlvs(&mut cursor).unwrap();
        assert_eq!(tlvs.len(), 2);
        assert_eq!(find_tlv(&tlvs, tags::SAR_TOTAL_SEGMENTS).and_then(Tlv::as_u8), Some(2));
    }

    #[test]
    fn truncated_value_is_an_error() {
        let data: &[u8] = &[0x04, 0x24, 0x00, 0x05, b'h', b'i'];
        let result = Tlv::decode(&mut Cursor::new(data));
        assert!(matches!(result, Err(CodecError::TlvError(_))));
    }
}
