//! # Message Bus Glue
//!
//! Blocks exchange PDUs: an (empty) metadata map paired with a byte blob.
//!
//! This module handles:
//! - The `Pdu` message shape and port names
//! - Publishing into a channel from any thread (`ChannelSink`)
//! - Driving a block from its inbox one message at a time (`run_block`)

use std::collections::BTreeMap;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{Result, ZigbeeLinkError};

/// Deframer output port
pub const PORT_DATA: &str = "data";

/// Block inbound port
pub const PORT_PDU_IN: &str = "pdu in";

/// Block outbound port
pub const PORT_PDU_OUT: &str = "pdu out";

/// A message on the bus
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pdu {
    /// Metadata dictionary; always empty for the blocks in this crate
    pub metadata: BTreeMap<String, String>,

    /// Frame bytes
    pub blob: Bytes,
}

impl Pdu {
    /// Wrap frame bytes with empty metadata
    pub fn new(blob: impl Into<Bytes>) -> Self {
        Self {
            metadata: BTreeMap::new(),
            blob: blob.into(),
        }
    }

    /// Frame bytes
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }
}

/// Outbound side of a port
#[cfg_attr(test, mockall::automock)]
pub trait PduSink: Send + Sync {
    /// Publish one message downstream
    fn publish(&self, pdu: Pdu) -> Result<()>;
}

/// A block driven by message delivery
///
/// Called for every inbound message; returns the message to publish on the
/// block's outbound port, if any. Frame-level problems are handled inside
/// the block and never surface here.
pub trait PduHandler: Send {
    /// Block name for diagnostics
    fn name(&self) -> &'static str;

    /// Handle one inbound message
    fn handle_pdu(&mut self, pdu: Pdu) -> Option<Pdu>;
}

/// Sink that forwards into an unbounded tokio channel
///
/// `send` never blocks, so this is safe to call from the deframer thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Pdu>,
    port: &'static str,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Pdu>, port: &'static str) -> Self {
        Self { tx, port }
    }
}

impl PduSink for ChannelSink {
    fn publish(&self, pdu: Pdu) -> Result<()> {
        trace!("Publishing {} bytes on '{}'", pdu.blob.len(), self.port);
        self.tx
            .send(pdu)
            .map_err(|_| ZigbeeLinkError::ChannelClosed(format!("receiver of '{}' dropped", self.port)))
    }
}

/// Create a connected sink/receiver pair for a named port
pub fn channel(port: &'static str) -> (ChannelSink, mpsc::UnboundedReceiver<Pdu>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink::new(tx, port), rx)
}

/// Drive a block until its inbox closes
///
/// Messages are handled strictly in arrival order, one at a time, by the
/// task that owns the block. The block is handed back when the inbox
/// closes so callers can inspect its final state.
///
/// # Errors
///
/// Returns `ChannelClosed` if the downstream receiver has gone away.
pub async fn run_block<H, S>(mut block: H, mut inbox: mpsc::UnboundedReceiver<Pdu>, outbox: S) -> Result<H>
where
    H: PduHandler,
    S: PduSink,
{
    debug!("{} block running", block.name());

    while let Some(pdu) = inbox.recv().await {
        if let Some(out) = block.handle_pdu(pdu) {
            outbox.publish(out)?;
        }
    }

    debug!("{} block inbox closed", block.name());
    Ok(block)
}
