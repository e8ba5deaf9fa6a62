// ABOUTME: Outbound message value and its builder
// ABOUTME: Validates addresses up front so nothing invalid reaches the segmenter or the wire

use crate::client::error::{SmppError, SmppResult};
use crate::datatypes::{Address, DataCoding};

/// A message to submit, immutable once built
///
/// The text is kept as written; the segmenter encodes it into the
/// requested data coding and splits it when it does not fit one PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    source: Address,
    destination: Address,
    text: String,
    data_coding: DataCoding,
    delivery_receipt: bool,
}

impl OutboundMessage {
    /// Create a message with default options (GSM 7-bit, no receipt)
    pub fn new(
        source: Address,
        destination: Address,
        text: impl Into<String>,
    ) -> SmppResult<Self> {
        Self::builder()
            .from(source)
            .to(destination)
            .text(text)
            .build()
    }

    /// Create a builder for constructing messages
    pub fn builder() -> OutboundMessageBuilder {
        OutboundMessageBuilder::default()
    }

    pub fn source(&self) -> &Address {
        &self.source
    }

    pub fn destination(&self) -> &Address {
        &self.destination
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn data_coding(&self) -> DataCoding {
        self.data_coding
    }

    pub fn requests_delivery_receipt(&self) -> bool {
        self.delivery_receipt
    }
}

/// Builder for constructing messages with fluent API
#[derive(Debug, Default)]
pub struct OutboundMessageBuilder {
    source: Option<Address>,
    destination: Option<Address>,
    text: Option<String>,
    data_coding: DataCoding,
    delivery_receipt: bool,
}

impl OutboundMessageBuilder {
    /// Set source address
    pub fn from(mut self, source: Address) -> Self {
        self.source = Some(source);
        self
    }

    /// Set destination address
    pub fn to(mut self, destination: Address) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Set message text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set data coding scheme
    pub fn data_coding(mut self, data_coding: DataCoding) -> Self {
        self.data_coding = data_coding;
        self
    }

    /// Request delivery receipt
    pub fn with_delivery_receipt(mut self) -> Self {
        self.delivery_receipt = true;
        self
    }

    /// Build the message
    pub fn build(self) -> SmppResult<OutboundMessage> {
        let source = self
            .source
            .ok_or_else(|| SmppError::InvalidData("source address is required".into()))?;
        let destination = self
            .destination
            .ok_or_else(|| SmppError::InvalidData("destination address is required".into()))?;
        let text = self
            .text
            .ok_or_else(|| SmppError::InvalidData("message text is required".into()))?;

        source.validate()?;
        destination.validate()?;

        Ok(OutboundMessage {
            source,
            destination,
            text,
            data_coding: self.data_coding,
            delivery_receipt: self.delivery_receipt,
        })
    }
}
