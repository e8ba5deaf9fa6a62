// SMPP v3.4 codec: header framing, field helpers and the `Frame` union.
//
// Each PDU implements `Encodable`/`Decodable`; the `PduRegistry` maps a
// command_id to the decoder for that PDU so the connection layer never has to
// know about individual PDU layouts.

use crate::datatypes::{
    BindTransceiver, BindTransceiverResponse, CommandId, CommandStatus, DataSm, DataSmResponse,
    DeliverSm, DeliverSmResponse, EnquireLink, EnquireLinkResponse, GenericNack, SubmitSm,
    SubmitSmResponse, Unbind, UnbindResponse, command_id::is_response_id,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion attacks
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
///
/// `command_id` is kept raw so that PDUs this crate does not model can still
/// be framed, logged and answered.
#[derive(Debug, Clone, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: u32,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode PDU header from buffer with validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id = buf.get_u32();
        let command_status = CommandStatus::from(buf.get_u32());
        let sequence_number = buf.get_u32();

        if !(Self::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        // SMPP v3.4 rule: requests must have command_status = 0
        if !is_response_id(command_id) && command_status != CommandStatus::Ok {
            return Err(CodecError::InvalidRequestStatus {
                command_id,
                command_status,
            });
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id);
        buf.put_u32(self.command_status as u32);
        buf.put_u32(self.sequence_number);
    }

    /// The typed command, if this crate knows it
    pub fn command(&self) -> Option<CommandId> {
        CommandId::try_from(self.command_id).ok()
    }
}

/// Identity shared by every PDU type
pub trait Pdu {
    const COMMAND_ID: CommandId;

    fn command_status(&self) -> CommandStatus;

    fn sequence_number(&self) -> u32;
}

/// Trait for types that can be encoded to bytes
pub trait Encodable: Pdu {
    /// Encode everything after the 16 byte header
    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Encode header and body, patching command_length once the body size
    /// is known.
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let start = buf.len();
        PduHeader {
            command_length: 0,
            command_id: Self::COMMAND_ID as u32,
            command_status: self.command_status(),
            sequence_number: self.sequence_number(),
        }
        .encode(buf);

        self.encode_body(buf)?;

        let length = buf.len() - start;
        if length > MAX_PDU_SIZE as usize {
            return Err(CodecError::InvalidPduLength {
                length: length as u32,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }
        buf[start..start + 4].copy_from_slice(&(length as u32).to_be_bytes());
        Ok(())
    }

    /// Convert this PDU to bytes (convenience method)
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from bytes
pub trait Decodable: Pdu + Sized {
    /// Decode the body. `buf` is bounded to this PDU: everything left in it
    /// belongs to the body.
    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    fn decode(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if header.command_id != Self::COMMAND_ID as u32 {
            return Err(CodecError::UnexpectedCommandId {
                expected: Self::COMMAND_ID,
                actual: header.command_id,
            });
        }
        Self::decode_body(header, buf)
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid PDU length: {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("Request PDU {command_id:#010x} has non-zero status: {command_status}")]
    InvalidRequestStatus {
        command_id: u32,
        command_status: CommandStatus,
    },

    #[error("Unexpected command_id: expected {expected:?}, got {actual:#010x}")]
    UnexpectedCommandId { expected: CommandId, actual: u32 },

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("TLV parsing error: {0}")]
    TlvError(String),

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Decode a variable length C-Octet String.
///
/// `max_len` includes the NUL terminator, as in the field tables of the
/// SMPP v3.4 specification.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field: &'static str,
) -> Result<String, CodecError> {
    let window = &buf.chunk()[..buf.remaining().min(max_len)];

    let Some(end) = window.iter().position(|&b| b == 0) else {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("no NUL terminator within {max_len} octets"),
        });
    };

    let value = window[..end].to_vec();
    buf.advance(end + 1);

    String::from_utf8(value).map_err(|source| CodecError::Utf8Error { field, source })
}

/// Encode a variable length C-Octet String, rejecting values that would not
/// fit in `max_len` octets including the terminator.
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field: &'static str,
) -> Result<(), CodecError> {
    if value.len() >= max_len {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("{} octets exceeds maximum of {}", value.len(), max_len - 1),
        });
    }
    if value.as_bytes().contains(&0) {
        return Err(CodecError::FieldValidation {
            field,
            reason: "embedded NUL".to_string(),
        });
    }

    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
    Ok(())
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(truncated(field));
    }
    Ok(buf.get_u8())
}

/// Decode a 16-bit big-endian integer
pub fn decode_u16(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(truncated(field));
    }
    Ok(buf.get_u16())
}

/// Decode `len` raw octets
pub fn decode_octets(
    buf: &mut Cursor<&[u8]>,
    len: usize,
    field: &'static str,
) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(truncated(field));
    }
    Ok(buf.copy_to_bytes(len))
}

fn truncated(field: &'static str) -> CodecError {
    CodecError::FieldValidation {
        field,
        reason: "PDU body ends before this field".to_string(),
    }
}

/// Generic frame type that can hold any PDU this session exchanges
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    // Bind PDUs
    BindTransceiver(BindTransceiver),
    BindTransceiverResp(BindTransceiverResponse),

    // Keep-alive PDUs
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResponse),

    // Message PDUs
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResponse),
    DataSm(Box<DataSm>),
    DataSmResp(DataSmResponse),

    // Session management PDUs
    Unbind(Unbind),
    UnbindResp(UnbindResponse),
    GenericNack(GenericNack),

    // For unknown PDUs (forward compatibility)
    Unknown { header: PduHeader, body: Bytes },
}

/// Registry of PDU decoders for extensible parsing
type DecoderFn =
    Box<dyn Fn(&PduHeader, &mut Cursor<&[u8]>) -> Result<Frame, CodecError> + Send + Sync>;

pub struct PduRegistry {
    decoders: HashMap<CommandId, DecoderFn>,
}

impl PduRegistry {
    /// Create a new registry with the PDUs a transceiver session exchanges
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        registry.register_pdu(Frame::BindTransceiver);
        registry.register_pdu(Frame::BindTransceiverResp);
        registry.register_pdu(Frame::EnquireLink);
        registry.register_pdu(Frame::EnquireLinkResp);
        registry.register_pdu(|pdu: SubmitSm| Frame::SubmitSm(Box::new(pdu)));
        registry.register_pdu(Frame::SubmitSmResp);
        registry.register_pdu(|pdu: DeliverSm| Frame::DeliverSm(Box::new(pdu)));
        registry.register_pdu(Frame::DeliverSmResp);
        registry.register_pdu(|pdu: DataSm| Frame::DataSm(Box::new(pdu)));
        registry.register_pdu(Frame::DataSmResp);
        registry.register_pdu(Frame::Unbind);
        registry.register_pdu(Frame::UnbindResp);
        registry.register_pdu(Frame::GenericNack);

        registry
    }

    /// Register a PDU type and the `Frame` variant that wraps it
    pub fn register_pdu<T, F>(&mut self, frame_constructor: F)
    where
        T: Decodable + 'static,
        F: Fn(T) -> Frame + Send + Sync + 'static,
    {
        let decoder = Box::new(move |header: &PduHeader, buf: &mut Cursor<&[u8]>| {
            let pdu = T::decode(header, buf)?;
            Ok(frame_constructor(pdu))
        });
        self.decoders.insert(T::COMMAND_ID, decoder);
    }

    /// Decode a PDU given its header and a cursor over exactly its body
    pub fn decode_pdu(
        &self,
        header: PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Frame, CodecError> {
        let decoder = header
            .command()
            .and_then(|command_id| self.decoders.get(&command_id));

        match decoder {
            Some(decoder) => decoder(&header, buf),
            None => {
                let body = buf.copy_to_bytes(buf.remaining());
                tracing::warn!(
                    command_id = format_args!("{:#010x}", header.command_id),
                    sequence_number = header.sequence_number,
                    "unknown PDU, treating as opaque data"
                );
                Ok(Frame::Unknown { header, body })
            }
        }
    }

    /// Check if a command_id is registered
    pub fn is_registered(&self, command_id: CommandId) -> bool {
        self.decoders.contains_key(&command_id)
    }
}

impl std::fmt::Debug for PduRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.decoders.keys()).finish()
    }
}

impl Default for PduRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Check whether `buf` starts with a complete PDU.
    ///
    /// Returns the PDU length when it does, `None` when more data is needed
    /// and an error when the length field is out of bounds.
    pub fn check(buf: &[u8]) -> Result<Option<usize>, CodecError> {
        if buf.len() < 4 {
            return Ok(None);
        }

        let command_length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if !(PduHeader::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        let length = command_length as usize;
        Ok((buf.len() >= length).then_some(length))
    }

    /// Parse one complete PDU. `pdu` must hold exactly the bytes `check`
    /// reported.
    pub fn parse(pdu: &[u8], registry: &PduRegistry) -> Result<Frame, CodecError> {
        let mut cursor = Cursor::new(pdu);
        let header = PduHeader::decode(&mut cursor)?;
        if header.command_length as usize != pdu.len() {
            return Err(CodecError::InvalidPduLength {
                length: header.command_length,
                min: PduHeader::SIZE as u32,
                max: pdu.len() as u32,
            });
        }
        registry.decode_pdu(header, &mut cursor)
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Frame::BindTransceiver(pdu) => pdu.encode(buf),
            Frame::BindTransceiverResp(pdu) => pdu.encode(buf),
            Frame::EnquireLink(pdu) => pdu.encode(buf),
            Frame::EnquireLinkResp(pdu) => pdu.encode(buf),
            Frame::SubmitSm(pdu) => pdu.encode(buf),
            Frame::SubmitSmResp(pdu) => pdu.encode(buf),
            Frame::DeliverSm(pdu) => pdu.encode(buf),
            Frame::DeliverSmResp(pdu) => pdu.encode(buf),
            Frame::DataSm(pdu) => pdu.encode(buf),
            Frame::DataSmResp(pdu) => pdu.encode(buf),
            Frame::Unbind(pdu) => pdu.encode(buf),
            Frame::UnbindResp(pdu) => pdu.encode(buf),
            Frame::GenericNack(pdu) => pdu.encode(buf),
            Frame::Unknown { header, body } => {
                let header = PduHeader {
                    command_length: (PduHeader::SIZE + body.len()) as u32,
                    ..header.clone()
                };
                header.encode(buf);
                buf.put_slice(body);
                Ok(())
            }
        }
    }

    /// Get the raw command_id for this frame
    pub fn command_id(&self) -> u32 {
        match self {
            Frame::BindTransceiver(_) => CommandId::BindTransceiver as u32,
            Frame::BindTransceiverResp(_) => CommandId::BindTransceiverResp as u32,
            Frame::EnquireLink(_) => CommandId::EnquireLink as u32,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp as u32,
            Frame::SubmitSm(_) => CommandId::SubmitSm as u32,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp as u32,
            Frame::DeliverSm(_) => CommandId::DeliverSm as u32,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp as u32,
            Frame::DataSm(_) => CommandId::DataSm as u32,
            Frame::DataSmResp(_) => CommandId::DataSmResp as u32,
            Frame::Unbind(_) => CommandId::Unbind as u32,
            Frame::UnbindResp(_) => CommandId::UnbindResp as u32,
            Frame::GenericNack(_) => CommandId::GenericNack as u32,
            Frame::Unknown { header, .. } => header.command_id,
        }
    }

    /// Get the sequence number for this frame
    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::BindTransceiver(pdu) => pdu.sequence_number,
            Frame::BindTransceiverResp(pdu) => pdu.sequence_number,
            Frame::EnquireLink(pdu) => pdu.sequence_number,
            Frame::EnquireLinkResp(pdu) => pdu.sequence_number,
            Frame::SubmitSm(pdu) => pdu.sequence_number,
            Frame::SubmitSmResp(pdu) => pdu.sequence_number,
            Frame::DeliverSm(pdu) => pdu.sequence_number,
            Frame::DeliverSmResp(pdu) => pdu.sequence_number,
            Frame::DataSm(pdu) => pdu.sequence_number,
            Frame::DataSmResp(pdu) => pdu.sequence_number,
            Frame::Unbind(pdu) => pdu.sequence_number,
            Frame::UnbindResp(pdu) => pdu.sequence_number,
            Frame::GenericNack(pdu) => pdu.sequence_number,
            Frame::Unknown { header, .. } => header.sequence_number,
        }
    }

    /// Protocol name of the PDU, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Frame::BindTransceiver(_) => "bind_transceiver",
            Frame::BindTransceiverResp(_) => "bind_transceiver_resp",
            Frame::EnquireLink(_) => "enquire_link",
            Frame::EnquireLinkResp(_) => "enquire_link_resp",
            Frame::SubmitSm(_) => "submit_sm",
            Frame::SubmitSmResp(_) => "submit_sm_resp",
            Frame::DeliverSm(_) => "deliver_sm",
            Frame::DeliverSmResp(_) => "deliver_sm_resp",
            Frame::DataSm(_) => "data_sm",
            Frame::DataSmResp(_) => "data_sm_resp",
            Frame::Unbind(_) => "unbind",
            Frame::UnbindResp(_) => "unbind_resp",
            Frame::GenericNack(_) => "generic_nack",
            Frame::Unknown { .. } => "unknown",
        }
    }

    /// Check if this frame is a response PDU
    pub fn is_response(&self) -> bool {
        is_response_id(self.command_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{EnquireLink, EnquireLinkResponse, GenericNack, Unbind};

    fn parse(bytes: &[u8]) -> Frame {
        let registry = PduRegistry::new();
        let length = Frame::check(bytes).unwrap().expect("complete PDU");
        Frame::parse(&bytes[..length], &registry).unwrap()
    }

    #[test]
    fn pdu_header_encode_decode() {
        let header = PduHeader {
            command_length: 24,
            command_id: CommandId::EnquireLink as u32,
            command_status: CommandStatus::Ok,
            sequence_number: 42,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf);

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = PduHeader::decode(&mut cursor).unwrap();

        assert_eq!(header, decoded);
        assert_eq!(decoded.command(), Some(CommandId::EnquireLink));
    }

    #[test]
    fn pdu_header_validation() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x08, // command_length too small
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let result = PduHeader::decode(&mut Cursor::new(data));
        assert!(matches!(result, Err(CodecError::InvalidPduLength { .. })));

        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x15, // enquire_link is a request
            0x00, 0x00, 0x00, 0x08, // but carries a status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let result = PduHeader::decode(&mut Cursor::new(data));
        assert!(matches!(result, Err(CodecError::InvalidRequestStatus { .. })));
    }

    #[test]
    fn vendor_status_on_response_is_tolerated() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x80, 0x00, 0x00, 0x15, // enquire_link_resp
            0x00, 0x00, 0x04, 0x01, // vendor specific status
            0x00, 0x00, 0x00, 0x07, // sequence_number
        ];
        let header = PduHeader::decode(&mut Cursor::new(data)).unwrap();
        assert_eq!(header.command_status, CommandStatus::UnknownError);
    }

    #[test]
    fn decode_cstring_variable_length() {
        let data = b"hello\0world\0";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(decode_cstring(&mut cursor, 16, "a").unwrap(), "hello");
        assert_eq!(decode_cstring(&mut cursor, 16, "b").unwrap(), "world");
        assert!(!cursor.has_remaining());
    }

    #[test]
    fn decode_cstring_requires_terminator_within_limit() {
        let data = b"abcdefgh\0";
        let mut cursor = Cursor::new(&data[..]);
        let result = decode_cstring(&mut cursor, 5, "system_id");
        assert!(matches!(
            result,
            Err(CodecError::FieldValidation { field: "system_id", .. })
        ));
    }

    #[test]
    fn encode_cstring_enforces_limit() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "hello", 6, "f").unwrap();
        assert_eq!(buf.as_ref(), b"hello\0");

        let result = encode_cstring(&mut buf, "toolong", 6, "f");
        assert!(matches!(result, Err(CodecError::FieldValidation { .. })));
    }

    #[test]
    fn check_reports_length_only_when_complete() {
        let bytes = EnquireLink::new(1).to_bytes().unwrap();
        assert_eq!(Frame::check(&bytes[..10]).unwrap(), None);
        assert_eq!(Frame::check(&bytes).unwrap(), Some(16));

        let mut two = BytesMut::new();
        two.put_slice(&bytes);
        two.put_slice(&bytes[..3]);
        assert_eq!(Frame::check(&two).unwrap(), Some(16));
    }

    #[test]
    fn check_rejects_absurd_lengths() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0x15];
        assert!(matches!(
            Frame::check(&data),
            Err(CodecError::InvalidPduLength { .. })
        ));
    }

    #[test]
    fn registry_decodes_header_only_pdus() {
        assert_eq!(
            parse(&EnquireLink::new(42).to_bytes().unwrap()),
            Frame::EnquireLink(EnquireLink::new(42))
        );
        assert_eq!(
            parse(&EnquireLinkResponse::new(43).to_bytes().unwrap()),
            Frame::EnquireLinkResp(EnquireLinkResponse::new(43))
        );
        assert_eq!(
            parse(&Unbind::new(2).to_bytes().unwrap()),
            Frame::Unbind(Unbind::new(2))
        );
        assert!(matches!(
            parse(&GenericNack::system_error(3).to_bytes().unwrap()),
            Frame::GenericNack(GenericNack { sequence_number: 3, .. })
        ));
    }

    #[test]
    fn registry_decode_unknown_pdu() {
        let mut pdu = Vec::new();
        pdu.extend_from_slice(&20u32.to_be_bytes());
        pdu.extend_from_slice(&0x0000_0102u32.to_be_bytes()); // alert_notification
        pdu.extend_from_slice(&0u32.to_be_bytes());
        pdu.extend_from_slice(&9u32.to_be_bytes());
        pdu.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);

        match parse(&pdu) {
            Frame::Unknown { header, body } => {
                assert_eq!(header.command_id, 0x0000_0102);
                assert_eq!(header.sequence_number, 9);
                assert_eq!(body.as_ref(), &[0x01, 0x02, 0x03, 0x04]);
            }
            other => panic!("Expected Unknown frame, got {other:?}"),
        }
    }

    #[test]
    fn unknown_frame_reencodes_verbatim() {
        let frame = Frame::Unknown {
            header: PduHeader {
                command_length: 0,
                command_id: 0x0001_0200,
                command_status: CommandStatus::Ok,
                sequence_number: 5,
            },
            body: Bytes::from_static(b"xyz"),
        };
        let mut buf = BytesMut::new();
        frame.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), 19);
        assert_eq!(parse(&buf).sequence_number(), 5);
    }

    #[test]
    fn header_only_pdu_with_body_is_rejected() {
        let mut bytes = BytesMut::new();
        bytes.put_u32(20);
        bytes.put_u32(CommandId::EnquireLink as u32);
        bytes.put_u32(0);
        bytes.put_u32(1);
        bytes.put_u32(0xDEAD_BEEF);

        let result = Frame::parse(&bytes, &PduRegistry::new());
        assert!(matches!(result, Err(CodecError::FieldValidation { .. })));
    }

    #[test]
    fn frame_accessors() {
        let frame = Frame::EnquireLink(EnquireLink::new(42));
        assert_eq!(frame.command_id(), CommandId::EnquireLink as u32);
        assert_eq!(frame.sequence_number(), 42);
        assert_eq!(frame.name(), "enquire_link");
        assert!(!frame.is_response());

        let frame = Frame::EnquireLinkResp(EnquireLinkResponse::new(43));
        assert_eq!(frame.sequence_number(), 43);
        assert!(frame.is_response());
    }
}
