// ABOUTME: Session builder: registers handlers before the first frame can arrive, then starts
// ABOUTME: start() binds over TCP; start_with() takes any Connector

use crate::client::config::SessionConfig;
use crate::client::error::SmppResult;
use crate::client::handlers::{Handlers, ReceiptHandler, Unsolicited, UnsolicitedHandler};
use crate::client::session::Session;
use crate::connection::{Connector, TcpConnector};
use crate::receipt::DeliveryReceipt;
use std::sync::Arc;

/// Builder for a [`Session`]
///
/// Handlers registered here are in place before the bind completes, so no
/// receipt that arrives right after binding is missed.
///
/// ```rust,no_run
/// use smpp_session::client::{BindCredentials, SessionBuilder, SessionConfig, Unsolicited};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new("localhost:2775", BindCredentials::new("esme", "secret"));
/// let session = SessionBuilder::new(config)
///     .on_receipt(|receipt| println!("{} is {}", receipt.id, receipt.stat))
///     .on_unsolicited(|event| {
///         if let Unsolicited::UnparsedReceipt { text, .. } = event {
///             println!("mobile originated: {text}");
///         }
///     })
///     .start()
///     .await?;
/// # session.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    config: SessionConfig,
    receipt: Vec<ReceiptHandler>,
    unsolicited: Vec<UnsolicitedHandler>,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            receipt: Vec::new(),
            unsolicited: Vec::new(),
        }
    }

    /// Add a delivery receipt handler
    pub fn on_receipt<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DeliveryReceipt) + Send + Sync + 'static,
    {
        self.receipt.push(Arc::new(handler));
        self
    }

    /// Add a handler for everything else the SMSC sends unprompted
    pub fn on_unsolicited<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Unsolicited) + Send + Sync + 'static,
    {
        self.unsolicited.push(Arc::new(handler));
        self
    }

    /// Connect over TCP and bind
    pub async fn start(self) -> SmppResult<Session> {
        self.start_with(TcpConnector).await
    }

    /// Open the transport with `connector`, then bind. The connector is
    /// used again for every rebind.
    pub async fn start_with<C: Connector>(self, connector: C) -> SmppResult<Session<C>> {
        let handlers = Handlers::new(self.receipt, self.unsolicited);
        Session::launch(self.config, connector, handlers).await
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("receipt_handlers", &self.receipt.len())
            .field("unsolicited_handlers", &self.unsolicited.len())
            .finish()
    }
}
