use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, encode_tlvs, find_tlv, tags};
use crate::datatypes::{CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, TypeOfNumber};
use crate::macros::impl_pdu;
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Field widths from Section 4.1, NUL terminator included
pub const SYSTEM_ID_LEN: usize = 16;
pub const PASSWORD_LEN: usize = 9;
pub const SYSTEM_TYPE_LEN: usize = 13;
pub const ADDRESS_RANGE_LEN: usize = 41;

/// BindTransceiver is used to bind a transceiver ESME to the SMSC.
/// A transceiver ESME can both send and receive messages through a single connection.
#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiver {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// 5.2.1 system_id: identification of the ESME requesting to bind.
    ///       Up to 15 octets.
    pub system_id: String,

    /// 5.2.2 password: used by the SMSC to authenticate the ESME.
    ///       Up to 8 octets, empty when the SMSC requires none.
    pub password: String,

    /// 5.2.3 system_type: categorises the ESME, e.g. "VMS". Up to 12 octets.
    pub system_type: String,

    /// 5.2.4 interface_version: SMPP version supported by the ESME.
    pub interface_version: InterfaceVersion,

    /// 5.2.5 addr_ton / 5.2.6 addr_npi: numbering of the ESME address range.
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,

    /// 5.2.7 address_range: SME addresses served by this ESME. Up to 40 octets.
    pub address_range: String,
}

impl BindTransceiver {
    pub fn new(
        sequence_number: u32,
        system_id: impl Into<String>,
        password: impl Into<String>,
        system_type: impl Into<String>,
    ) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: system_id.into(),
            password: password.into(),
            system_type: system_type.into(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        }
    }
}

/// bind_transceiver_resp. An error response may omit the body entirely.
#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiverResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// SMSC identifier
    pub system_id: String,

    /// sc_interface_version TLV: the SMPP version the SMSC supports
    pub sc_interface_version: Option<u8>,
}

impl BindTransceiverResponse {
    pub fn new(sequence_number: u32, system_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: system_id.into(),
            sc_interface_version: Some(InterfaceVersion::SmppV34 as u8),
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            command_status: status,
            sequence_number,
            system_id: String::new(),
            sc_interface_version: None,
        }
    }
}

impl_pdu!(BindTransceiver, CommandId::BindTransceiver);
impl_pdu!(BindTransceiverResponse, CommandId::BindTransceiverResp);

impl Encodable for BindTransceiver {
    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        encode_cstring(buf, &self.system_id, SYSTEM_ID_LEN, "system_id")?;
        encode_cstring(buf, &self.password, PASSWORD_LEN, "password")?;
        encode_cstring(buf, &self.system_type, SYSTEM_TYPE_LEN, "system_type")?;
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(buf, &self.address_range, ADDRESS_RANGE_LEN, "address_range")
    }
}

impl Decodable for BindTransceiver {
    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let system_id = decode_cstring(buf, SYSTEM_ID_LEN, "system_id")?;
        let password = decode_cstring(buf, PASSWORD_LEN, "password")?;
        let system_type = decode_cstring(buf, SYSTEM_TYPE_LEN, "system_type")?;
        let version = decode_u8(buf, "interface_version")?;
        let interface_version =
            InterfaceVersion::try_from(version).map_err(|_| CodecError::FieldValidation {
                field: "interface_version",
                reason: format!("unsupported version {version:#04x}"),
            })?;
        let addr_ton = TypeOfNumber::from(decode_u8(buf, "addr_ton")?);
        let addr_npi = NumericPlanIndicator::from(decode_u8(buf, "addr_npi")?);
        let address_range = decode_cstring(buf, ADDRESS_RANGE_LEN, "address_range")?;

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

impl Encodable for BindTransceiverResponse {
    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if !self.command_status.is_ok() && self.system_id.is_empty() {
            return Ok(());
        }
        encode_cstring(buf, &self.system_id, SYSTEM_ID_LEN, "system_id")?;
        if let Some(version) = self.sc_interface_version {
            encode_tlvs(&[Tlv::from_u8(tags::SC_INTERFACE_VERSION, version)], buf)?;
        }
        Ok(())
    }
}

impl Decodable for BindTransceiverResponse {
    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if !buf.has_remaining() {
            return Ok(Self {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                system_id: String::new(),
                sc_interface_version: None,
            });
        }

        let system_id = decode_cstring(buf, SYSTEM_ID_LEN, "system_id")?;
        let tlvs = decode_tlvs(buf)?;

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            sc_interface_version: find_tlv(&tlvs, tags::SC_INTERFACE_VERSION)
                .and_then(Tlv::as_u8),
        })
    }
}
