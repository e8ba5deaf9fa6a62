use crate::datatypes::tlv::{Tlv, find_tlv, tags};
use crate::datatypes::{Address, CommandId, CommandStatus, DataCoding};
use crate::macros::{impl_message_id_response, impl_short_message_pdu};
use bytes::Bytes;

/// service_type width, NUL included
pub const SERVICE_TYPE_LEN: usize = 6;

/// schedule_delivery_time / validity_period width, NUL included
pub const TIME_LEN: usize = 17;

/// message_id width in the *_resp PDUs, NUL included
pub const MESSAGE_ID_LEN: usize = 65;

/// Largest short_message a single octet sm_length can announce. Longer
/// content travels in the message_payload TLV.
pub const MAX_SHORT_MESSAGE_LEN: usize = 254;

/// registered_delivery value requesting an SMSC delivery receipt on final
/// outcome (success or failure)
pub const REGISTERED_DELIVERY_RECEIPT: u8 = 0x01;

/// This operation is used by an ESME to submit a short message to the SMSC for onward transmission
/// to a specified short message entity (SME).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SubmitSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// 5.2.11 service_type: SMS application service, empty for the SMSC default
    pub service_type: String,

    /// Originator: source_addr_ton, source_addr_npi, source_addr
    pub source_addr: Address,

    /// Recipient: dest_addr_ton, dest_addr_npi, destination_addr
    pub dest_addr: Address,

    /// 5.2.12 esm_class: messaging mode and type
    pub esm_class: u8,

    /// 5.2.13 protocol_id: network specific, usually 0
    pub protocol_id: u8,

    /// 5.2.14 priority_flag
    pub priority_flag: u8,

    /// 5.2.15 schedule_delivery_time: empty for immediate delivery
    pub schedule_delivery_time: String,

    /// 5.2.16 validity_period: empty for the SMSC default
    pub validity_period: String,

    /// 5.2.17 registered_delivery: receipt / acknowledgement requests
    pub registered_delivery: u8,

    /// 5.2.18 replace_if_present_flag
    pub replace_if_present_flag: u8,

    /// 5.2.19 data_coding: character set of short_message
    pub data_coding: DataCoding,

    /// 5.2.20 sm_default_msg_id: canned message index, 0 when unused
    pub sm_default_msg_id: u8,

    /// 5.2.22 short_message: up to 254 octets. sm_length is derived from it.
    pub short_message: Bytes,

    /// Optional parameters
    pub tlvs: Vec<Tlv>,
}

impl SubmitSm {
    pub fn new(sequence_number: u32, source_addr: Address, dest_addr: Address) -> Self {
        Self {
            sequence_number,
            source_addr,
            dest_addr,
            ..Default::default()
        }
    }

    /// The message body, whether it travels in short_message or in the
    /// message_payload TLV
    pub fn payload(&self) -> &[u8] {
        if self.short_message.is_empty() {
            if let Some(tlv) = find_tlv(&self.tlvs, tags::MESSAGE_PAYLOAD) {
                return &tlv.value;
            }
        }
        &self.short_message
    }
}

/// submit_sm_resp: carries the SMSC message id on success
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl_short_message_pdu!(SubmitSm, CommandId::SubmitSm);
impl_message_id_response!(SubmitSmResponse, CommandId::SubmitSmResp);
