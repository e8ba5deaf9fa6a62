// ABOUTME: Error types for the session engine, from bind failures to per-segment outcomes
// ABOUTME: SmppError covers whole operations; SegmentError reports one segment of a submission

use crate::client::config::ConfigError;
use crate::client::state::SessionState;
use crate::codec::CodecError;
use crate::connection::ConnectionError;
use crate::datatypes::{AddressError, CommandStatus, DataCoding, EncodingError};
use crate::receipt::ReceiptParseError;
use std::io;
use thiserror::Error;

/// Error type for session operations
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during network operations (connect, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The bind handshake did not complete. `status` is set when the SMSC
    /// answered with an error status or a generic_nack.
    #[error("Bind failed: {reason}")]
    BindFailure {
        status: Option<CommandStatus>,
        reason: String,
    },

    /// enquire_link went unanswered `failures` times in a row
    #[error("Keep-alive failed {failures} times in a row")]
    KeepAliveExhausted { failures: u32 },

    #[error("Session is not bound (state: {0})")]
    SessionNotReady(SessionState),

    #[error("Session is rebinding, submission refused")]
    SessionRebinding,

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Segment capacity {capacity} is unusable for {data_coding}")]
    InvalidSegmentCapacity {
        data_coding: DataCoding,
        capacity: usize,
    },

    #[error("Message needs {segments} segments, at most 255 allowed")]
    MessageTooLong { segments: usize },

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptParseError),

    /// Data validation error outside the cases above (missing builder
    /// fields and the like)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Operation timeout")]
    Timeout,

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

impl SmppError {
    /// Errors a caller can reasonably retry once the session recovers
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SmppError::Connection(_)
                | SmppError::SessionRebinding
                | SmppError::Timeout
                | SmppError::ConnectionClosed
        )
    }
}

impl From<ConnectionError> for SmppError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Io(err) => SmppError::Connection(err),
            ConnectionError::Codec(err) => SmppError::Codec(err),
            ConnectionError::Malformed { source, .. } => SmppError::Codec(source),
            ConnectionError::IncompleteFrame { .. } => SmppError::ConnectionClosed,
        }
    }
}

/// Why a single segment of a submission did not get a message id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    /// submit_sm_resp carried an error status
    #[error("rejected by SMSC: {0}")]
    Rejected(CommandStatus),

    /// The SMSC answered with generic_nack
    #[error("protocol rejection: {0}")]
    ProtocolRejected(CommandStatus),

    #[error("no response within the submission timeout")]
    TimedOut,

    /// The link dropped or the session stopped before a response arrived
    #[error("interrupted before a response arrived")]
    Interrupted,

    #[error("write failed: {0}")]
    WriteFailed(String),

    /// The submit_sm could not be encoded, so nothing was written
    #[error("not encodable: {0}")]
    Unencodable(String),
}

impl SegmentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SegmentError::Rejected(status) | SegmentError::ProtocolRejected(status) => {
                status.is_transient()
            }
            SegmentError::TimedOut | SegmentError::Interrupted | SegmentError::WriteFailed(_) => {
                true
            }
            SegmentError::Unencodable(_) => false,
        }
    }
}

/// Result of one submitted segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOutcome {
    /// 1-based position within the message
    pub segment_index: u8,
    /// Set once the segment was handed to the session
    pub sequence_number: Option<u32>,
    /// The SMSC message id, or why there is none
    pub result: Result<String, SegmentError>,
}

impl SegmentOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn message_id(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(SmppError::SessionRebinding.is_retryable());
        assert!(SmppError::Timeout.is_retryable());
        assert!(!SmppError::EmptyMessage.is_retryable());
        assert!(!SmppError::SessionNotReady(SessionState::Failed).is_retryable());

        assert!(SegmentError::Interrupted.is_retryable());
        assert!(SegmentError::Rejected(CommandStatus::ThrottlingError).is_retryable());
        assert!(!SegmentError::Rejected(CommandStatus::InvalidDestinationAddress).is_retryable());
        assert!(!SegmentError::Unencodable("too long".into()).is_retryable());
        assert!(!SmppError::KeepAliveExhausted { failures: 3 }.is_retryable());
    }

    #[test]
    fn outcome_accessors() {
        let ok = SegmentOutcome {
            segment_index: 1,
            sequence_number: Some(4),
            result: Ok("abc".to_string()),
        };
        assert!(ok.is_success());
        assert_eq!(ok.message_id(), Some("abc"));

        let failed = SegmentOutcome {
            segment_index: 2,
            sequence_number: None,
            result: Err(SegmentError::Interrupted),
        };
        assert_eq!(failed.message_id(), None);
    }

    #[test]
    fn connection_errors_convert() {
        let err: SmppError = ConnectionError::IncompleteFrame { buffered: 3 }.into();
        assert!(matches!(err, SmppError::ConnectionClosed));
    }
}
