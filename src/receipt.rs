// ABOUTME: Parses SMSC delivery receipts carried in the text of deliver_sm
// ABOUTME: Fixed-order "id:... sub:... dlvrd:..." grammar, no partial results

use regex::Regex;
use std::fmt;
use thiserror::Error;

/// The receipt grammar from Appendix B of SMPP v3.4. Fields are fixed in
/// order; the text label appears as either "text" or "Text". Digit and word
/// classes are ASCII only.
const RECEIPT_PATTERN: &str = r"(?s)id:([A-Za-z0-9_]+) sub:([0-9]+) dlvrd:([0-9]+) submit date:([0-9]+) done date:([0-9]+) stat:([A-Za-z0-9_]+) err:([0-9]+) [Tt]ext:(.+)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("text does not match the delivery receipt grammar: {text:?}")]
pub struct ReceiptParseError {
    pub text: String,
}

/// A delivery receipt. Numeric fields keep their original text so leading
/// zeros survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub id: String,
    pub submitted: String,
    pub delivered: String,
    pub submit_date: String,
    pub done_date: String,
    pub stat: String,
    pub err: String,
    pub text: String,
}

impl DeliveryReceipt {
    pub fn status(&self) -> DeliveryStatus {
        DeliveryStatus::from_stat(&self.stat)
    }
}

impl fmt::Display for DeliveryReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id:{} sub:{} dlvrd:{} submit date:{} done date:{} stat:{} err:{} text:{}",
            self.id,
            self.submitted,
            self.delivered,
            self.submit_date,
            self.done_date,
            self.stat,
            self.err,
            self.text
        )
    }
}

/// Message state reported in the receipt's stat field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Enroute,
    Delivered,
    Expired,
    Deleted,
    Undeliverable,
    Accepted,
    Rejected,
    Skipped,
    Unknown,
}

impl DeliveryStatus {
    /// Map the stat token. Unrecognised tokens are `Unknown`.
    pub fn from_stat(stat: &str) -> Self {
        match stat {
            "ENROUTE" => Self::Enroute,
            "DELIVRD" => Self::Delivered,
            "EXPIRED" => Self::Expired,
            "DELETED" => Self::Deleted,
            "UNDELIV" => Self::Undeliverable,
            "ACCEPTD" => Self::Accepted,
            "REJECTD" => Self::Rejected,
            "SKIPPED" => Self::Skipped,
            _ => Self::Unknown,
        }
    }

    /// No further receipts will follow a final state
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Expired | Self::Deleted | Self::Undeliverable | Self::Rejected
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enroute => "ENROUTE",
            Self::Delivered => "DELIVRD",
            Self::Expired => "EXPIRED",
            Self::Deleted => "DELETED",
            Self::Undeliverable => "UNDELIV",
            Self::Accepted => "ACCEPTD",
            Self::Rejected => "REJECTD",
            Self::Skipped => "SKIPPED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Owns the compiled receipt grammar. Build one per session and reuse it.
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    pattern: Regex,
}

impl ReceiptParser {
    pub fn new() -> Self {
        // The pattern is a constant, so compilation cannot fail at runtime
        let pattern = Regex::new(RECEIPT_PATTERN).expect("receipt pattern is valid");
        Self { pattern }
    }

    pub fn parse(&self, text: &str) -> Result<DeliveryReceipt, ReceiptParseError> {
        let captures = self.pattern.captures(text).ok_or_else(|| ReceiptParseError {
            text: text.to_string(),
        })?;
        let field = |i: usize| captures.get(i).map_or("", |m| m.as_str()).to_string();

        Ok(DeliveryReceipt {
            id: field(1),
            submitted: field(2),
            delivered: field(3),
            submit_date: field(4),
            done_date: field(5),
            stat: field(6),
            err: field(7),
            text: field(8),
        })
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id:ABC123 sub:001 dlvrd:001 submit date:2401010101 \
done date:2401010102 stat:DELIVRD err:000 text:Hello";

    #[test]
    fn parses_all_fields() {
        let receipt = ReceiptParser::new().parse(SAMPLE).unwrap();
        assert_eq!(receipt.id, "ABC123");
        assert_eq!(receipt.submitted, "001");
        assert_eq!(receipt.delivered, "001");
        assert_eq!(receipt.submit_date, "2401010101");
        assert_eq!(receipt.done_date, "2401010102");
        assert_eq!(receipt.stat, "DELIVRD");
        assert_eq!(receipt.err, "000");
        assert_eq!(receipt.text, "Hello");
        assert_eq!(receipt.status(), DeliveryStatus::Delivered);
    }

    #[test]
    fn capitalised_text_label() {
        let text = SAMPLE.replace("text:", "Text:");
        let receipt = ReceiptParser::new().parse(&text).unwrap();
        assert_eq!(receipt.text, "Hello");
    }

    #[test]
    fn display_reparses_to_same_fields() {
        let parser = ReceiptParser::new();
        let receipt = parser.parse(SAMPLE).unwrap();
        assert_eq!(receipt.to_string(), SAMPLE);
        assert_eq!(parser.parse(&receipt.to_string()).unwrap(), receipt);
    }

    #[test]
    fn missing_fields_fail() {
        let parser = ReceiptParser::new();
        let text = "id:123 sub:1 dlvrd:1 stat:DELIVRD err:000 text:hi";
        assert_eq!(
            parser.parse(text),
            Err(ReceiptParseError {
                text: text.to_string()
            })
        );
    }

    #[test]
    fn reordered_fields_fail() {
        let text = "sub:001 id:ABC123 dlvrd:001 submit date:2401010101 \
done date:2401010102 stat:DELIVRD err:000 text:Hello";
        assert!(ReceiptParser::new().parse(text).is_err());
    }

    #[test]
    fn empty_text_tail_fails() {
        let text = SAMPLE.replace("text:Hello", "text:");
        assert!(ReceiptParser::new().parse(&text).is_err());
    }

    #[test]
    fn text_tail_keeps_line_breaks() {
        let text = SAMPLE.replace("text:Hello", "text:line one\nline two");
        let receipt = ReceiptParser::new().parse(&text).unwrap();
        assert_eq!(receipt.text, "line one\nline two");
    }

    #[test]
    fn non_ascii_digits_and_letters_fail() {
        let parser = ReceiptParser::new();
        let arabic_digits = SAMPLE.replace("sub:001", "sub:١٢");
        assert!(parser.parse(&arabic_digits).is_err());

        let accented_id = SAMPLE.replace("id:ABC123", "id:ÀBC123");
        assert!(parser.parse(&accented_id).is_err());

        // the free text tail takes anything
        let text = SAMPLE.replace("text:Hello", "text:héllo ١٢");
        assert_eq!(parser.parse(&text).unwrap().text, "héllo ١٢");
    }

    #[test]
    fn status_classification() {
        assert!(DeliveryStatus::from_stat("UNDELIV").is_final());
        assert!(!DeliveryStatus::from_stat("UNDELIV").is_success());
        assert!(!DeliveryStatus::from_stat("ENROUTE").is_final());
        assert_eq!(DeliveryStatus::from_stat("garbage"), DeliveryStatus::Unknown);
        assert_eq!(DeliveryStatus::Rejected.as_str(), "REJECTD");
    }
}
