use crate::datatypes::tlv::{Tlv, find_tlv, tags};
use crate::datatypes::{Address, CommandId, CommandStatus, DataCoding};
use crate::macros::{impl_message_id_response, impl_short_message_pdu};
use bytes::Bytes;

/// esm_class message type bits (2..5)
const ESM_MESSAGE_TYPE_MASK: u8 = 0b0011_1100;

/// esm_class message type: SMSC delivery receipt
pub const ESM_CLASS_DELIVERY_RECEIPT: u8 = 0b0000_0100;

/// deliver_sm (Section 4.6.1): the SMSC routes a mobile originated message,
/// or a delivery receipt for an earlier submission, to the ESME. Same
/// mandatory parameters as submit_sm; schedule_delivery_time,
/// validity_period and replace_if_present_flag are always empty here.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DeliverSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub service_type: String,
    pub source_addr: Address,
    pub dest_addr: Address,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,
    pub tlvs: Vec<Tlv>,
}

impl DeliverSm {
    /// True when esm_class flags this PDU as a delivery receipt
    pub fn is_delivery_receipt(&self) -> bool {
        self.esm_class & ESM_MESSAGE_TYPE_MASK == ESM_CLASS_DELIVERY_RECEIPT
    }

    /// The message body, whether in short_message or message_payload
    pub fn payload(&self) -> &[u8] {
        if self.short_message.is_empty() {
            if let Some(tlv) = find_tlv(&self.tlvs, tags::MESSAGE_PAYLOAD) {
                return &tlv.value;
            }
        }
        &self.short_message
    }

    /// The body decoded with the PDU's data_coding
    pub fn text(&self) -> String {
        self.data_coding.decode(self.payload())
    }
}

/// deliver_sm_resp: message_id is unused and always empty
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl_short_message_pdu!(DeliverSm, CommandId::DeliverSm);
impl_message_id_response!(DeliverSmResponse, CommandId::DeliverSmResp);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Encodable, Frame, PduRegistry};

    fn receipt_pdu() -> DeliverSm {
        DeliverSm {
            sequence_number: 11,
            source_addr: Address::international("447700900123"),
            dest_addr: Address::alphanumeric("ACME"),
            esm_class: ESM_CLASS_DELIVERY_RECEIPT,
            short_message: Bytes::from_static(
                b"id:abc123 sub:001 dlvrd:001 submit date:2401011200 \
done date:2401011201 stat:DELIVRD err:000 text:Hello",
            ),
            ..Default::default()
        }
    }

    #[test]
    fn recognises_delivery_receipts() {
        let pdu = receipt_pdu();
        assert!(pdu.is_delivery_receipt());

        let plain = DeliverSm {
            esm_class: 0,
            ..receipt_pdu()
        };
        assert!(!plain.is_delivery_receipt());

        // store-and-forward mode bits do not change the message type
        let with_mode = DeliverSm {
            esm_class: ESM_CLASS_DELIVERY_RECEIPT | 0b11,
            ..receipt_pdu()
        };
        assert!(with_mode.is_delivery_receipt());
    }

    #[test]
    fn roundtrip_and_text() {
        let pdu = receipt_pdu();
        let bytes = pdu.to_bytes().unwrap();
        let frame = Frame::parse(&bytes, &PduRegistry::new()).unwrap();
        match frame {
            Frame::DeliverSm(decoded) => {
                assert!(decoded.text().starts_with("id:abc123 "));
                assert_eq!(*decoded, pdu);
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn response_has_empty_message_id() {
        let resp = DeliverSmResponse::new(11, "");
        let bytes = resp.to_bytes().unwrap();
        assert_eq!(&bytes[16..], &[0]);
    }
}
