// ABOUTME: SMPP transceiver session: lifecycle, submission pipeline and inbound dispatch
// ABOUTME: Exports the session handle, its builder, configuration, outcomes and error types

//! SMPP Session Module
//!
//! One [`Session`] owns one bound transceiver link to an SMSC:
//!
//! * **Lifecycle** - bind, keep-alive, rebind after link loss, orderly stop
//! * **Submission** - long text is split into SAR-linked segments, each
//!   correlated with its `submit_sm_resp` by sequence number
//! * **Inbound routing** - delivery receipts are parsed and handed to
//!   receipt handlers; other traffic goes to unsolicited handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_session::client::{BindCredentials, OutboundMessage, Session, SessionConfig};
//! use smpp_session::datatypes::Address;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new("localhost:2775", BindCredentials::new("system_id", "password"));
//! let session = Session::start(config).await?;
//!
//! let message = OutboundMessage::new(
//!     Address::alphanumeric("ACME"),
//!     Address::international("447700900123"),
//!     "Hello!",
//! )?;
//! let outcomes = session.submit(&message).await?;
//! println!("message id: {:?}", outcomes[0].message_id());
//!
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Keep-Alive and Rebinding
//!
//! `enquire_link` is sent every keep-alive interval. A missed response, a
//! read timeout or a dropped transport moves the session to `Rebinding`; it
//! binds again after the policy's delay. Misses are counted across rebinds,
//! and reaching the ceiling fails the session for good:
//!
//! ```rust,no_run
//! use smpp_session::client::{
//!     BindCredentials, KeepAliveConfig, RebindPolicy, RebindingSubmissions, Session,
//!     SessionConfig, SessionState,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new("localhost:2775", BindCredentials::new("id", "pass"))
//!     .with_keepalive(KeepAliveConfig::new(Duration::from_secs(30)).with_max_failures(3))
//!     .with_rebind_policy(RebindPolicy::new(5, Duration::from_secs(1)))
//!     .with_rebinding_submissions(RebindingSubmissions::Queue);
//! let session = Session::start(config).await?;
//!
//! let mut states = session.watch_state();
//! while states.changed().await.is_ok() {
//!     if *states.borrow() == SessionState::Failed {
//!         println!("session failed, keep-alive: {:?}", session.keepalive_status());
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
mod dispatcher;
pub mod error;
mod handlers;
pub mod keepalive;
mod pending;
mod pipeline;
pub mod segmenter;
mod session;
pub mod state;
pub mod types;

// Re-export the main types for easy access
pub use builder::SessionBuilder;
pub use config::{BindCredentials, ConfigError, RebindPolicy, RebindingSubmissions, SessionConfig};
pub use error::{SegmentError, SegmentOutcome, SmppError, SmppResult};
pub use handlers::{ReceiptHandler, Unsolicited, UnsolicitedHandler};
pub use keepalive::{KeepAliveConfig, KeepAliveManager, KeepAliveStatus};
pub use segmenter::{
    Concatenation, MessageSegment, ReferenceLease, ReferencePool, SegmentCapacities,
    SegmentedMessage, Segmenter,
};
pub use session::Session;
pub use state::SessionState;
pub use types::{OutboundMessage, OutboundMessageBuilder};
