pub mod address;
pub mod bind_transceiver;
pub mod command_id;
mod command_status;
mod data_coding;
mod data_sm;
pub mod deliver_sm;
mod enquire_link;
mod generic_nack;
pub mod gsm7;
mod interface_version;
mod numeric_plan_indicator;
pub mod submit_sm;
pub mod tlv;
mod type_of_number;
mod unbind;

pub use address::{Address, AddressError};
pub use bind_transceiver::{BindTransceiver, BindTransceiverResponse};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::{CodingWidth, DataCoding, EncodedText, EncodingError};
pub use data_sm::{DataSm, DataSmResponse};
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use submit_sm::{SubmitSm, SubmitSmResponse};
pub use tlv::Tlv;
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};
