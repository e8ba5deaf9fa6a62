// ABOUTME: SMPP data_coding scheme with text encoding into the octets each scheme puts on the wire
// ABOUTME: Tracks character boundaries in encoding units so long text can be split without breaking characters

use crate::datatypes::gsm7::{self, Septet};
use std::fmt;
use thiserror::Error;

/// Data coding scheme of a short message (Section 5.2.19)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataCoding {
    /// SMSC Default Alphabet, taken to be the GSM 03.38 7-bit alphabet
    #[default]
    SmscDefault,
    /// IA5 (CCITT T.50)/ASCII encoding
    Ascii,
    /// 8-bit binary data; text is carried as UTF-8
    Binary,
    /// Latin-1 (ISO-8859-1) character set
    Latin1,
    /// UCS-2 (ISO/IEC-10646), written as UTF-16BE
    Ucs2,
    /// Any other value; passed through on inbound frames, not encodable
    Custom(u8),
}

/// Size class used to pick a segment capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingWidth {
    SevenBit,
    EightBit,
    SixteenBit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("character {character:?} cannot be encoded as {data_coding}")]
    Unencodable {
        character: char,
        data_coding: DataCoding,
    },

    #[error("data coding {0} is not supported for outbound text")]
    UnsupportedDataCoding(DataCoding),
}

/// Text encoded for one data coding, with the end of every character
/// recorded as `(octet_end, unit_end)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedText {
    octets: Vec<u8>,
    boundaries: Vec<(usize, usize)>,
}

impl EncodedText {
    fn push(&mut self, octets: &[u8], units: usize) {
        self.octets.extend_from_slice(octets);
        let unit_end = self.units() + units;
        self.boundaries.push((self.octets.len(), unit_end));
    }

    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    /// Length in encoding units: septets, octets or UTF-16 code units
    pub fn units(&self) -> usize {
        self.boundaries.last().map_or(0, |&(_, units)| units)
    }

    /// Character boundaries in order
    pub fn boundaries(&self) -> &[(usize, usize)] {
        &self.boundaries
    }

    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }
}

impl DataCoding {
    /// Creates a DataCoding from a raw u8 value
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => DataCoding::SmscDefault,
            0x01 => DataCoding::Ascii,
            0x02 | 0x04 => DataCoding::Binary,
            0x03 => DataCoding::Latin1,
            0x08 => DataCoding::Ucs2,
            _ => DataCoding::Custom(value),
        }
    }

    /// Returns the raw u8 value for wire protocol
    pub fn to_byte(&self) -> u8 {
        match self {
            DataCoding::SmscDefault => 0x00,
            DataCoding::Ascii => 0x01,
            DataCoding::Binary => 0x02,
            DataCoding::Latin1 => 0x03,
            DataCoding::Ucs2 => 0x08,
            DataCoding::Custom(value) => *value,
        }
    }

    /// The size class of this coding. Unknown codings are treated as 8-bit.
    pub fn width(&self) -> CodingWidth {
        match self {
            DataCoding::SmscDefault | DataCoding::Ascii => CodingWidth::SevenBit,
            DataCoding::Binary | DataCoding::Latin1 | DataCoding::Custom(_) => {
                CodingWidth::EightBit
            }
            DataCoding::Ucs2 => CodingWidth::SixteenBit,
        }
    }

    /// Returns the character set name for this encoding
    pub fn charset_name(&self) -> &'static str {
        match self {
            DataCoding::SmscDefault => "GSM 7-bit Default",
            DataCoding::Ascii => "ASCII/IA5",
            DataCoding::Binary => "Binary",
            DataCoding::Latin1 => "ISO-8859-1",
            DataCoding::Ucs2 => "UCS-2",
            DataCoding::Custom(_) => "Custom/Reserved",
        }
    }

    /// Encode `text` into this coding's octets
    pub fn encode(&self, text: &str) -> Result<EncodedText, EncodingError> {
        let mut encoded = EncodedText::default();
        let unencodable = |character| EncodingError::Unencodable {
            character,
            data_coding: *self,
        };

        for c in text.chars() {
            match self {
                DataCoding::SmscDefault => match gsm7::lookup(c).ok_or_else(|| unencodable(c))? {
                    Septet::Basic(code) => encoded.push(&[code], 1),
                    Septet::Extended(code) => encoded.push(&[gsm7::ESCAPE, code], 2),
                },
                DataCoding::Ascii => {
                    if !c.is_ascii() {
                        return Err(unencodable(c));
                    }
                    encoded.push(&[c as u8], 1);
                }
                DataCoding::Latin1 => {
                    let byte = u8::try_from(u32::from(c)).map_err(|_| unencodable(c))?;
                    encoded.push(&[byte], 1);
                }
                DataCoding::Binary => {
                    let mut utf8 = [0u8; 4];
                    let bytes = c.encode_utf8(&mut utf8).as_bytes();
                    encoded.push(bytes, bytes.len());
                }
                DataCoding::Ucs2 => {
                    let mut units = [0u16; 2];
                    let units = c.encode_utf16(&mut units);
                    let mut octets = [0u8; 4];
                    for (i, unit) in units.iter().enumerate() {
                        octets[i * 2..i * 2 + 2].copy_from_slice(&unit.to_be_bytes());
                    }
                    encoded.push(&octets[..units.len() * 2], units.len());
                }
                DataCoding::Custom(_) => return Err(EncodingError::UnsupportedDataCoding(*self)),
            }
        }
        Ok(encoded)
    }

    /// Decode inbound octets. Never fails: invalid input is replaced with
    /// U+FFFD.
    pub fn decode(&self, octets: &[u8]) -> String {
        match self {
            DataCoding::SmscDefault => gsm7::decode(octets),
            DataCoding::Ascii | DataCoding::Latin1 => octets.iter().map(|&b| char::from(b)).collect(),
            DataCoding::Ucs2 => {
                let units = octets
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                char::decode_utf16(units)
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
            DataCoding::Binary | DataCoding::Custom(_) => String::from_utf8_lossy(octets).into_owned(),
        }
    }
}

impl fmt::Display for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCoding::Custom(value) => write!(f, "Custom({value:#04x})"),
            other => f.write_str(other.charset_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_mapping() {
        assert_eq!(DataCoding::from_byte(0x08), DataCoding::Ucs2);
        assert_eq!(DataCoding::from_byte(0x04), DataCoding::Binary);
        assert_eq!(DataCoding::from_byte(0xF0), DataCoding::Custom(0xF0));
        assert_eq!(DataCoding::Latin1.to_byte(), 0x03);
    }

    #[test]
    fn gsm_counts_extension_characters_twice() {
        let encoded = DataCoding::SmscDefault.encode("a€b").unwrap();
        assert_eq!(encoded.octets(), &[0x61, 0x1B, 0x65, 0x62]);
        assert_eq!(encoded.units(), 4);
        assert_eq!(encoded.boundaries(), &[(1, 1), (3, 3), (4, 4)]);
    }

    #[test]
    fn gsm_rejects_characters_outside_the_alphabet() {
        assert_eq!(
            DataCoding::SmscDefault.encode("hi 日本"),
            Err(EncodingError::Unencodable {
                character: '日',
                data_coding: DataCoding::SmscDefault
            })
        );
    }

    #[test]
    fn ucs2_counts_utf16_units() {
        let encoded = DataCoding::Ucs2.encode("Hé😀").unwrap();
        assert_eq!(encoded.units(), 4);
        assert_eq!(encoded.octets().len(), 8);
        assert_eq!(encoded.boundaries(), &[(2, 1), (4, 2), (8, 4)]);
        assert_eq!(DataCoding::Ucs2.decode(encoded.octets()), "Hé😀");
    }

    #[test]
    fn latin1_and_ascii_limits() {
        assert!(DataCoding::Latin1.encode("café").is_ok());
        assert!(DataCoding::Latin1.encode("€").is_err());
        assert!(DataCoding::Ascii.encode("café").is_err());
        assert_eq!(DataCoding::Latin1.decode(&[0x63, 0xE9]), "cé");
    }

    #[test]
    fn binary_carries_utf8() {
        let encoded = DataCoding::Binary.encode("né").unwrap();
        assert_eq!(encoded.units(), 3);
        assert_eq!(encoded.boundaries(), &[(1, 1), (3, 3)]);
    }

    #[test]
    fn custom_codings_are_not_encodable() {
        assert_eq!(
            DataCoding::Custom(0xF5).encode("x"),
            Err(EncodingError::UnsupportedDataCoding(DataCoding::Custom(0xF5)))
        );
    }
}
