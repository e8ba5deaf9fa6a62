// ABOUTME: Macros that remove boilerplate from PDU implementations
// ABOUTME: Covers header-only PDUs and the Pdu identity impl every PDU shares

/// Implement `Pdu` for a struct with `command_status` and `sequence_number`
/// fields.
macro_rules! impl_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Pdu for $pdu_type {
            const COMMAND_ID: $crate::datatypes::CommandId = $command_id;

            fn command_status(&self) -> $crate::datatypes::CommandStatus {
                self.command_status
            }

            fn sequence_number(&self) -> u32 {
                self.sequence_number
            }
        }
    };
}

/// Macro for implementing codec traits on header-only PDUs (no body)
///
/// Generates `Pdu`, `Encodable` and `Decodable`. Decoding rejects a
/// non-empty body.
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_pdu!($pdu_type, $command_id);

        impl $crate::codec::Decodable for $pdu_type {
            fn decode_body(
                header: &$crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                if buf.has_remaining() {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: concat!(stringify!($pdu_type), "_body"),
                        reason: concat!(stringify!($pdu_type), " PDU should have no body")
                            .to_string(),
                    });
                }

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode_body(
                &self,
                _buf: &mut bytes::BytesMut,
            ) -> Result<(), $crate::codec::CodecError> {
                Ok(())
            }
        }
    };
}

/// Macro for generating constructor methods for header-only PDUs
///
/// - `new(sequence_number: u32)` - Creates PDU with Ok status
/// - `error(sequence_number: u32, status: CommandStatus)` - Creates PDU with error status
macro_rules! impl_header_only_constructors {
    ($pdu_type:ident) => {
        impl $pdu_type {
            /// Create a new PDU with Ok status
            pub fn new(sequence_number: u32) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                }
            }

            /// Create a PDU with error status
            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }
    };
}

/// Codec implementation plus constructors for header-only PDUs
macro_rules! impl_complete_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type);
    };
}

/// Codec for submit_sm and deliver_sm, whose bodies share one layout
/// (Sections 4.4.1 and 4.6.1): mandatory parameters, then TLVs.
///
/// The PDU struct must use the field names of `SubmitSm`.
macro_rules! impl_short_message_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_pdu!($pdu_type, $command_id);

        impl $crate::codec::Encodable for $pdu_type {
            fn encode_body(
                &self,
                buf: &mut bytes::BytesMut,
            ) -> Result<(), $crate::codec::CodecError> {
                use $crate::codec::encode_cstring;
                use $crate::datatypes::submit_sm::{
                    MAX_SHORT_MESSAGE_LEN, SERVICE_TYPE_LEN, TIME_LEN,
                };
                use $crate::datatypes::address::SM_ADDRESS_LEN;
                use bytes::BufMut;

                if self.short_message.len() > MAX_SHORT_MESSAGE_LEN {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: "short_message",
                        reason: format!(
                            "{} octets exceeds maximum of {}, use message_payload",
                            self.short_message.len(),
                            MAX_SHORT_MESSAGE_LEN
                        ),
                    });
                }

                encode_cstring(buf, &self.service_type, SERVICE_TYPE_LEN, "service_type")?;
                self.source_addr.encode(buf, SM_ADDRESS_LEN, "source_addr")?;
                self.dest_addr.encode(buf, SM_ADDRESS_LEN, "destination_addr")?;
                buf.put_u8(self.esm_class);
                buf.put_u8(self.protocol_id);
                buf.put_u8(self.priority_flag);
                encode_cstring(buf, &self.schedule_delivery_time, TIME_LEN, "schedule_delivery_time")?;
                encode_cstring(buf, &self.validity_period, TIME_LEN, "validity_period")?;
                buf.put_u8(self.registered_delivery);
                buf.put_u8(self.replace_if_present_flag);
                buf.put_u8(self.data_coding.to_byte());
                buf.put_u8(self.sm_default_msg_id);
                buf.put_u8(self.short_message.len() as u8);
                buf.put_slice(&self.short_message);
                $crate::datatypes::tlv::encode_tlvs(&self.tlvs, buf)
            }
        }

        impl $crate::codec::Decodable for $pdu_type {
            fn decode_body(
                header: &$crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use $crate::codec::{decode_cstring, decode_octets, decode_u8};
                use $crate::datatypes::address::{Address, SM_ADDRESS_LEN};
                use $crate::datatypes::submit_sm::{SERVICE_TYPE_LEN, TIME_LEN};

                let service_type = decode_cstring(buf, SERVICE_TYPE_LEN, "service_type")?;
                let source_addr = Address::decode(buf, SM_ADDRESS_LEN, "source_addr")?;
                let dest_addr = Address::decode(buf, SM_ADDRESS_LEN, "destination_addr")?;
                let esm_class = decode_u8(buf, "esm_class")?;
                let protocol_id = decode_u8(buf, "protocol_id")?;
                let priority_flag = decode_u8(buf, "priority_flag")?;
                let schedule_delivery_time =
                    decode_cstring(buf, TIME_LEN, "schedule_delivery_time")?;
                let validity_period = decode_cstring(buf, TIME_LEN, "validity_period")?;
                let registered_delivery = decode_u8(buf, "registered_delivery")?;
                let replace_if_present_flag = decode_u8(buf, "replace_if_present_flag")?;
                let data_coding =
                    $crate::datatypes::DataCoding::from_byte(decode_u8(buf, "data_coding")?);
                let sm_default_msg_id = decode_u8(buf, "sm_default_msg_id")?;
                let sm_length = decode_u8(buf, "sm_length")? as usize;
                let short_message = decode_octets(buf, sm_length, "short_message")?;
                let tlvs = $crate::datatypes::tlv::decode_tlvs(buf)?;

                Ok(Self {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    service_type,
                    source_addr,
                    dest_addr,
                    esm_class,
                    protocol_id,
                    priority_flag,
                    schedule_delivery_time,
                    validity_period,
                    registered_delivery,
                    replace_if_present_flag,
                    data_coding,
                    sm_default_msg_id,
                    short_message,
                    tlvs,
                })
            }
        }
    };
}

/// submit_sm_resp, deliver_sm_resp and data_sm_resp: a message_id C-Octet
/// String that an error response may leave out.
macro_rules! impl_message_id_response {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_pdu!($pdu_type, $command_id);

        impl $pdu_type {
            pub fn new(sequence_number: u32, message_id: impl Into<String>) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                    message_id: message_id.into(),
                }
            }

            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                    message_id: String::new(),
                }
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode_body(
                &self,
                buf: &mut bytes::BytesMut,
            ) -> Result<(), $crate::codec::CodecError> {
                if !self.command_status.is_ok() && self.message_id.is_empty() {
                    return Ok(());
                }
                $crate::codec::encode_cstring(
                    buf,
                    &self.message_id,
                    $crate::datatypes::submit_sm::MESSAGE_ID_LEN,
                    "message_id",
                )
            }
        }

        impl $crate::codec::Decodable for $pdu_type {
            fn decode_body(
                header: &$crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                let message_id = if buf.has_remaining() {
                    $crate::codec::decode_cstring(
                        buf,
                        $crate::datatypes::submit_sm::MESSAGE_ID_LEN,
                        "message_id",
                    )?
                } else {
                    String::new()
                };
                // data_sm_resp may append TLVs; they carry nothing this crate uses
                buf.advance(buf.remaining());

                Ok(Self {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    message_id,
                })
            }
        }
    };
}

pub(crate) use {
    impl_complete_header_only_pdu, impl_header_only_constructors, impl_header_only_pdu, impl_pdu,
    impl_message_id_response, impl_short_message_pdu,
};
