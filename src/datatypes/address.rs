// ABOUTME: SME address (TON, NPI and address string) shared by submit_sm, deliver_sm and data_sm
// ABOUTME: Validates address format against the Type of Number before anything reaches the wire

use crate::codec::{CodecError, decode_cstring, decode_u8, encode_cstring};
use crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// Address field width in submit_sm/deliver_sm, NUL included
pub const SM_ADDRESS_LEN: usize = 21;

/// Address field width in data_sm, NUL included
pub const DATA_SM_ADDRESS_LEN: usize = 65;

/// An SME address as carried by the message PDUs
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Address {
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
    pub addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is {actual_len} octets, at most {max_len} allowed")]
    TooLong { max_len: usize, actual_len: usize },

    #[error("invalid {ton:?} address: {reason}")]
    InvalidFormat { ton: TypeOfNumber, reason: String },
}

impl Address {
    pub fn new(ton: TypeOfNumber, npi: NumericPlanIndicator, addr: impl Into<String>) -> Self {
        Self {
            ton,
            npi,
            addr: addr.into(),
        }
    }

    /// An E.164 number: TON international, NPI ISDN
    pub fn international(addr: impl Into<String>) -> Self {
        Self::new(TypeOfNumber::International, NumericPlanIndicator::Isdn, addr)
    }

    /// An alphanumeric sender id: TON alphanumeric, NPI unknown
    pub fn alphanumeric(addr: impl Into<String>) -> Self {
        Self::new(TypeOfNumber::Alphanumeric, NumericPlanIndicator::Unknown, addr)
    }

    /// Check length and character set for the address's TON
    pub fn validate(&self) -> Result<(), AddressError> {
        if self.addr.len() >= SM_ADDRESS_LEN {
            return Err(AddressError::TooLong {
                max_len: SM_ADDRESS_LEN - 1,
                actual_len: self.addr.len(),
            });
        }

        let (valid, reason) = match self.ton {
            TypeOfNumber::International => (
                self.addr.chars().all(|c| c.is_ascii_digit() || c == '+'),
                "international numbers must contain only digits and optional +",
            ),
            TypeOfNumber::National
            | TypeOfNumber::NetworkSpecific
            | TypeOfNumber::SubscriberNumber => (
                self.addr.chars().all(|c| c.is_ascii_digit()),
                "numeric addresses must contain only digits",
            ),
            TypeOfNumber::Alphanumeric => (
                self.addr.chars().all(|c| c.is_ascii() && !c.is_ascii_control()),
                "alphanumeric addresses must be printable ASCII",
            ),
            TypeOfNumber::Abbreviated | TypeOfNumber::Unknown => (
                self.addr.chars().all(|c| c.is_ascii() && !c.is_ascii_control()),
                "addresses must be printable ASCII",
            ),
        };

        if valid {
            Ok(())
        } else {
            Err(AddressError::InvalidFormat {
                ton: self.ton,
                reason: reason.to_string(),
            })
        }
    }

    pub(crate) fn encode(
        &self,
        buf: &mut BytesMut,
        max_len: usize,
        field: &'static str,
    ) -> Result<(), CodecError> {
        buf.put_u8(self.ton as u8);
        buf.put_u8(self.npi as u8);
        encode_cstring(buf, &self.addr, max_len, field)
    }

    pub(crate) fn decode(
        buf: &mut Cursor<&[u8]>,
        max_len: usize,
        field: &'static str,
    ) -> Result<Self, CodecError> {
        let ton = TypeOfNumber::from(decode_u8(buf, field)?);
        let npi = NumericPlanIndicator::from(decode_u8(buf, field)?);
        let addr = decode_cstring(buf, max_len, field)?;
        Ok(Self { ton, npi, addr })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_ton_and_npi() {
        let dest = Address::international("447712345678");
        assert_eq!(dest.ton, TypeOfNumber::International);
        assert_eq!(dest.npi, NumericPlanIndicator::Isdn);

        let source = Address::alphanumeric("MelroseLabs");
        assert_eq!(source.ton, TypeOfNumber::Alphanumeric);
        assert!(source.validate().is_ok());
    }

    #[test]
    fn validation_follows_ton() {
        assert!(Address::international("+447712345678").validate().is_ok());
        assert!(matches!(
            Address::international("4477-123").validate(),
            Err(AddressError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Address::international("1".repeat(21)).validate(),
            Err(AddressError::TooLong { max_len: 20, .. })
        ));
    }

    #[test]
    fn wire_form_is_ton_npi_cstring() {
        let mut buf = BytesMut::new();
        Address::international("4477")
            .encode(&mut buf, SM_ADDRESS_LEN, "destination_addr")
            .unwrap();
        assert_eq!(buf.as_ref(), &[0x01, 0x01, b'4', b'4', b'7', b'7', 0]);

        let decoded =
            Address::decode(&mut Cursor::new(buf.as_ref()), SM_ADDRESS_LEN, "addr").unwrap();
        assert_eq!(decoded, Address::international("4477"));
    }
}
