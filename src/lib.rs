//! Client-side SMPP v3.4 session engine.
//!
//! A [`Session`](client::Session) binds to a message center as a transceiver,
//! keeps the link alive with `enquire_link`, rebinds when the link drops,
//! submits outbound messages (splitting long ones into linked segments) and
//! routes inbound frames, parsing delivery receipts along the way.
//!
//! ```rust,no_run
//! use smpp_session::client::{BindCredentials, OutboundMessage, SessionBuilder, SessionConfig};
//! use smpp_session::datatypes::{Address, DataCoding};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new("localhost:2775", BindCredentials::new("system_id", "password"));
//!
//! let session = SessionBuilder::new(config)
//!     .on_receipt(|receipt| println!("receipt for {}: {}", receipt.id, receipt.stat))
//!     .start()
//!     .await?;
//!
//! let message = OutboundMessage::builder()
//!     .from(Address::alphanumeric("MelroseLabs"))
//!     .to(Address::international("447712345678"))
//!     .text("Hello World")
//!     .data_coding(DataCoding::Ucs2)
//!     .with_delivery_receipt()
//!     .build()?;
//!
//! for outcome in session.submit(&message).await? {
//!     println!("segment {}: {:?}", outcome.segment_index, outcome.result);
//! }
//!
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod receipt;

mod macros;


pub use codec::{CodecError, Decodable, Encodable, Frame, Pdu, PduHeader, PduRegistry};
pub use connection::{Connection, ConnectionError, Connector, TcpConnector};
pub use receipt::{DeliveryReceipt, DeliveryStatus, ReceiptParseError, ReceiptParser};

pub use client::{
    OutboundMessage, SegmentError, SegmentOutcome, Session, SessionBuilder, SessionConfig,
    SessionState, SmppError, SmppResult,
};
