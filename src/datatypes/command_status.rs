use num_enum::FromPrimitive;
use std::fmt;

/// The command_status field of an SMPP response indicates the success or
/// failure of the request it answers. Requests always carry `Ok`.
///
/// Codes outside the table (reserved or vendor specific) decode as
/// `UnknownError` so a response from a non-conforming SMSC still correlates.
#[derive(FromPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// No Error
    Ok = 0x00000000,
    /// Message Length is invalid
    InvalidMsgLength = 0x00000001,
    /// Command Length is invalid
    InvalidCommandLength = 0x00000002,
    /// Invalid Command ID
    InvalidCommandId = 0x00000003,
    /// Incorrect BIND Status for given command
    IncorrectBindStatus = 0x00000004,
    /// ESME Already in Bound State
    AlreadyBoundState = 0x00000005,
    /// Invalid Priority Flag
    InvalidPriorityFlag = 0x00000006,
    /// Invalid Registered Delivery Flag
    InvalidRegisteredDeliveryFlag = 0x00000007,
    /// System Error
    SystemError = 0x00000008,
    /// Invalid Source Address
    InvalidSourceAddress = 0x0000000A,
    /// Invalid Dest Addr
    InvalidDestinationAddress = 0x0000000B,
    /// Message ID is invalid
    InvalidMessageId = 0x0000000C,
    /// Bind Failed
    BindFailed = 0x0000000D,
    /// Invalid Password
    InvalidPassword = 0x0000000E,
    /// Invalid System ID
    InvalidSystemId = 0x0000000F,
    /// Cancel SM Failed
    CancelSmFailed = 0x00000011,
    /// Replace SM Failed
    ReplaceSmFailed = 0x00000013,
    /// Message Queue Full
    MessageQueueFull = 0x00000014,
    /// Invalid Service Type
    InvalidServiceType = 0x00000015,
    /// Invalid number of destinations
    InvalidNumberOfDestinations = 0x00000033,
    /// Invalid Distribution List name
    InvalidDistributionListName = 0x00000034,
    /// Destination flag is invalid (submit_multi)
    InvalidDestinationFlag = 0x00000040,
    /// Invalid 'submit with replace' request
    InvalidSubmitWithReplaceRequest = 0x00000042,
    /// Invalid esm_class field data
    InvalidEsmClassFieldData = 0x00000043,
    /// Cannot Submit to Distribution List
    CannotSubmitToDistributionList = 0x00000044,
    /// submit_sm or submit_multi failed
    SubmitFailed = 0x00000045,
    /// Invalid Source address TON
    InvalidSourceAddressTon = 0x00000048,
    /// Invalid Source address NPI
    InvalidSourceAddressNpi = 0x00000049,
    /// Invalid Destination address TON
    InvalidDestinationAddressTon = 0x00000050,
    /// Invalid Destination address NPI
    InvalidDestinationAddressNpi = 0x00000051,
    /// Invalid system_type field
    InvalidSystemTypeField = 0x00000053,
    /// Invalid replace_if_present flag
    InvalidReplaceIfPresentFlag = 0x00000054,
    /// Invalid number of messages
    InvalidNumberOfMessages = 0x00000055,
    /// Throttling error (ESME has exceeded allowed message limits)
    ThrottlingError = 0x00000058,
    /// Invalid Scheduled Delivery Time
    InvalidScheduledDeliveryTime = 0x00000061,
    /// Invalid message validity period (Expiry time)
    InvalidExpiryTime = 0x00000062,
    /// Predefined Message Invalid or Not Found
    InvalidPredefinedMessageId = 0x00000063,
    /// ESME Receiver Temporary App Error Code
    ReceiverTemporaryAppError = 0x00000064,
    /// ESME Receiver Permanent App Error Code
    ReceiverPermanentAppError = 0x00000065,
    /// ESME Receiver Reject Message Error Code
    ReceiverRejectMessageError = 0x00000066,
    /// query_sm request failed
    QuerySmRequestFailed = 0x00000067,
    /// Error in the optional part of the PDU Body.
    ErrorInOptionalPartOfPduBody = 0x000000C0,
    /// Optional Parameter not allowed
    OptionalParameterNotAllowed = 0x000000C1,
    /// Invalid Parameter Length.
    InvalidParameterLength = 0x000000C2,
    /// Expected Optional Parameter missing
    ExpectedOptionalParameterMissing = 0x000000C3,
    /// Invalid Optional Parameter Value
    InvalidOptionalParameterValue = 0x000000C4,
    /// Delivery Failure (used for data_sm_resp)
    DeliveryFailed = 0x000000FE,
    /// Unknown Error, also used for codes this crate does not recognise
    #[num_enum(default)]
    UnknownError = 0x000000FF,
}

impl CommandStatus {
    pub fn is_ok(&self) -> bool {
        *self == CommandStatus::Ok
    }

    /// Statuses an SMSC uses to ask the ESME to slow down and try again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CommandStatus::MessageQueueFull
                | CommandStatus::ThrottlingError
                | CommandStatus::ReceiverTemporaryAppError
        )
    }
}

impl Default for CommandStatus {
    fn default() -> Self {
        CommandStatus::Ok
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:#010x})", self, *self as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        assert_eq!(CommandStatus::from(0x0000_000E), CommandStatus::InvalidPassword);
        assert_eq!(CommandStatus::ThrottlingError as u32, 0x58);
    }

    #[test]
    fn vendor_codes_fall_back_to_unknown_error() {
        assert_eq!(CommandStatus::from(0x0000_0401), CommandStatus::UnknownError);
        assert_eq!(CommandStatus::from(0x0000_0009), CommandStatus::UnknownError);
    }

    #[test]
    fn display_includes_hex_code() {
        assert_eq!(CommandStatus::BindFailed.to_string(), "BindFailed (0x0000000d)");
    }
}
