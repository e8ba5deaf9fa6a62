use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// enquire_link (Section 4.11.1): link confidence check, sent by either
/// side. Header only.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLink {
    // Always Ok for a request
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

/// enquire_link_resp (Section 4.11.2), echoing the request's sequence number.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLinkResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
impl_complete_header_only_pdu!(EnquireLinkResponse, CommandId::EnquireLinkResp);
