// ABOUTME: Caller-registered callbacks for delivery receipts and unsolicited inbound traffic
// ABOUTME: Handlers run on the reader task and may be added while the session runs

use crate::datatypes::DataSm;
use crate::receipt::{DeliveryReceipt, ReceiptParseError};
use std::sync::{Arc, PoisonError, RwLock};

/// Inbound traffic that is not a response to anything this session sent
#[derive(Debug, Clone, PartialEq)]
pub enum Unsolicited {
    /// A data_sm from the SMSC, passed through as received
    Data(Box<DataSm>),

    /// A deliver_sm whose text is not a delivery receipt
    UnparsedReceipt {
        sequence_number: u32,
        text: String,
        error: ReceiptParseError,
    },

    /// A PDU the dispatcher has no route for
    UnhandledFrameKind {
        command_id: u32,
        sequence_number: u32,
    },
}

pub type ReceiptHandler = Arc<dyn Fn(&DeliveryReceipt) + Send + Sync>;
pub type UnsolicitedHandler = Arc<dyn Fn(&Unsolicited) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Handlers {
    receipt: RwLock<Vec<ReceiptHandler>>,
    unsolicited: RwLock<Vec<UnsolicitedHandler>>,
}

impl Handlers {
    pub(crate) fn new(receipt: Vec<ReceiptHandler>, unsolicited: Vec<UnsolicitedHandler>) -> Self {
        Self {
            receipt: RwLock::new(receipt),
            unsolicited: RwLock::new(unsolicited),
        }
    }

    pub(crate) fn add_receipt(&self, handler: ReceiptHandler) {
        self.receipt
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    pub(crate) fn add_unsolicited(&self, handler: UnsolicitedHandler) {
        self.unsolicited
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    // Handlers are called on a snapshot so one may register another
    pub(crate) fn emit_receipt(&self, receipt: &DeliveryReceipt) {
        let handlers = self
            .receipt
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler(receipt);
        }
    }

    pub(crate) fn emit_unsolicited(&self, event: &Unsolicited) {
        let handlers = self
            .unsolicited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler(event);
        }
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let receipt = self.receipt.read().map_or(0, |handlers| handlers.len());
        let unsolicited = self.unsolicited.read().map_or(0, |handlers| handlers.len());
        f.debug_struct("Handlers")
            .field("receipt", &receipt)
            .field("unsolicited", &unsolicited)
            .finish()
    }
}
