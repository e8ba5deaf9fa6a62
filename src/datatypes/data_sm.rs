use crate::codec::{CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring};
use crate::datatypes::address::DATA_SM_ADDRESS_LEN;
use crate::datatypes::submit_sm::SERVICE_TYPE_LEN;
use crate::datatypes::tlv::{Tlv, decode_tlvs, encode_tlvs, find_tlv, tags};
use crate::datatypes::{Address, CommandId, CommandStatus, DataCoding};
use crate::macros::{impl_message_id_response, impl_pdu};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// data_sm (Section 4.7.1): an alternative to submit_sm/deliver_sm with the
/// body in the message_payload TLV. A session only ever receives these.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DataSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub service_type: String,
    /// Up to 64 octets, unlike the 20 of submit_sm
    pub source_addr: Address,
    pub dest_addr: Address,
    pub esm_class: u8,
    pub registered_delivery: u8,
    pub data_coding: DataCoding,
    pub tlvs: Vec<Tlv>,
}

impl DataSm {
    pub fn payload(&self) -> &[u8] {
        find_tlv(&self.tlvs, tags::MESSAGE_PAYLOAD).map_or(&[][..], |tlv| tlv.value.as_ref())
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct DataSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl_pdu!(DataSm, CommandId::DataSm);
impl_message_id_response!(DataSmResponse, CommandId::DataSmResp);

impl Encodable for DataSm {
    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        encode_cstring(buf, &self.service_type, SERVICE_TYPE_LEN, "service_type")?;
        self.source_addr.encode(buf, DATA_SM_ADDRESS_LEN, "source_addr")?;
        self.dest_addr.encode(buf, DATA_SM_ADDRESS_LEN, "destination_addr")?;
        buf.put_u8(self.esm_class);
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.data_coding.to_byte());
        encode_tlvs(&self.tlvs, buf)
    }
}

impl Decodable for DataSm {
    fn decode_body(header: &PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let service_type = decode_cstring(buf, SERVICE_TYPE_LEN, "service_type")?;
        let source_addr = Address::decode(buf, DATA_SM_ADDRESS_LEN, "source_addr")?;
        let dest_addr = Address::decode(buf, DATA_SM_ADDRESS_LEN, "destination_addr")?;
        let esm_class = decode_u8(buf, "esm_class")?;
        let registered_delivery = decode_u8(buf, "registered_delivery")?;
        let data_coding = DataCoding::from_byte(decode_u8(buf, "data_coding")?);
        let tlvs = decode_tlvs(buf)?;

        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type,
            source_addr,
            dest_addr,
            esm_class,
            registered_delivery,
            data_coding,
            tlvs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Frame, PduRegistry};

    #[test]
    fn accepts_long_addresses() {
        let pdu = DataSm {
            sequence_number: 5,
            source_addr: Address::alphanumeric("a".repeat(40)),
            dest_addr: Address::international("447700900123"),
            tlvs: vec![Tlv::new(tags::MESSAGE_PAYLOAD, b"ping".to_vec())],
            ..Default::default()
        };
        let bytes = pdu.to_bytes().unwrap();
        let frame = Frame::parse(&bytes, &PduRegistry::new()).unwrap();
        match frame {
            Frame::DataSm(decoded) => {
                assert_eq!(decoded.payload(), b"ping");
                assert_eq!(*decoded, pdu);
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn response_tolerates_trailing_tlvs() {
        let mut bytes = DataSmResponse::new(5, "m1").to_bytes().unwrap().to_vec();
        bytes.extend_from_slice(&[0x04, 0x20, 0x00, 0x01, 0x00]);
        let length = bytes.len() as u32;
        bytes[..4].copy_from_slice(&length.to_be_bytes());

        let frame = Frame::parse(&bytes, &PduRegistry::new()).unwrap();
        assert_eq!(frame, Frame::DataSmResp(DataSmResponse::new(5, "m1")));
    }
}
