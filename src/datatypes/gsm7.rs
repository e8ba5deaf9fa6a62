// GSM 03.38 default alphabet and its extension table.
//
// Septets are carried unpacked, one per octet, which is how SMPP transports
// the SMSC default alphabet in short_message.

/// Escape to the extension table
pub const ESCAPE: u8 = 0x1B;

#[rustfmt::skip]
const BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

const EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{0c}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

/// How a character is written in the default alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Septet {
    Basic(u8),
    /// Written as `ESCAPE` followed by the code, costing two septets
    Extended(u8),
}

impl Septet {
    pub fn units(&self) -> usize {
        match self {
            Septet::Basic(_) => 1,
            Septet::Extended(_) => 2,
        }
    }
}

pub fn lookup(c: char) -> Option<Septet> {
    if let Some(code) = BASIC.iter().position(|&b| b == c) {
        if code as u8 != ESCAPE {
            return Some(Septet::Basic(code as u8));
        }
    }
    EXTENSION
        .iter()
        .find(|(_, ext)| *ext == c)
        .map(|(code, _)| Septet::Extended(*code))
}

/// Decode unpacked septets. Unknown escape codes fall back to the basic
/// table, a trailing lone escape decodes as a space.
pub fn decode(septets: &[u8]) -> String {
    let mut text = String::with_capacity(septets.len());
    let mut iter = septets.iter().map(|b| b & 0x7F);

    while let Some(septet) = iter.next() {
        if septet != ESCAPE {
            text.push(BASIC[septet as usize]);
            continue;
        }
        match iter.next() {
            Some(code) => text.push(
                EXTENSION
                    .iter()
                    .find(|(ext, _)| *ext == code)
                    .map(|(_, c)| *c)
                    .unwrap_or(BASIC[code as usize]),
            ),
            None => text.push(' '),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_and_extension_lookup() {
        assert_eq!(lookup('A'), Some(Septet::Basic(0x41)));
        assert_eq!(lookup('@'), Some(Septet::Basic(0x00)));
        assert_eq!(lookup('€'), Some(Septet::Extended(0x65)));
        assert_eq!(lookup('{').map(|s| s.units()), Some(2));
        assert_eq!(lookup('\u{1b}'), None);
        assert_eq!(lookup('ł'), None);
    }

    #[test]
    fn decode_handles_escapes() {
        assert_eq!(decode(&[0x48, 0x69, ESCAPE, 0x65]), "Hi€");
        assert_eq!(decode(&[0x41, ESCAPE]), "A ");
    }
}
