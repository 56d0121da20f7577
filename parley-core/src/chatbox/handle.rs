//! Producer-side handle to the outbound scheduler.
//!
//! Every call is a non-blocking `try_send` on a bounded channel, so a producer
//! is never held up by the scheduler's pacing. A full channel surfaces as
//! [`ParleyError::Backpressure`].

use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, warn};

use super::format::{format_notification, split_message};
use super::ChatboxConfig;
use crate::error::{ParleyError, Result};
use crate::events::NotificationCategory;

/// A request applied by the scheduler thread at the start of its next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    /// Display-ready chunks of one message, in order.
    Enqueue(Vec<String>),
    /// Install a formatted notification, or clear a matching one when `text`
    /// is empty.
    Notify {
        text: String,
        category: NotificationCategory,
    },
    /// Drop queue + slot and reset timing.
    Clear,
    Typing(bool),
}

#[derive(Clone)]
pub struct OutboundHandle {
    tx: Sender<OutboundRequest>,
    config: Arc<ChatboxConfig>,
}

impl OutboundHandle {
    pub fn new(tx: Sender<OutboundRequest>, config: Arc<ChatboxConfig>) -> Self {
        Self { tx, config }
    }

    /// Split `text` and append its chunks to the message queue.
    ///
    /// Whitespace-only text is ignored.
    pub fn enqueue(&self, text: &str) -> Result<()> {
        let chunks = split_message(text, &self.config);
        if chunks.is_empty() {
            return Ok(());
        }
        debug!(chunks = chunks.len(), "enqueue message");
        self.submit(OutboundRequest::Enqueue(chunks))
    }

    /// Format and install a notification, overwriting any pending one.
    ///
    /// Empty `text` clears the pending notification only if it has the same
    /// `category`.
    pub fn set_notification(&self, text: &str, category: NotificationCategory) -> Result<()> {
        let text = format_notification(text, &self.config);
        self.submit(OutboundRequest::Notify { text, category })
    }

    /// Empty the queue and notification slot immediately.
    pub fn clear(&self) -> Result<()> {
        self.submit(OutboundRequest::Clear)
    }

    pub fn set_typing(&self, typing: bool) -> Result<()> {
        self.submit(OutboundRequest::Typing(typing))
    }

    fn submit(&self, request: OutboundRequest) -> Result<()> {
        match self.tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                warn!(request = ?dropped, "outbound channel full — request dropped");
                Err(ParleyError::Backpressure)
            }
            Err(TrySendError::Disconnected(_)) => Err(ParleyError::ChannelClosed),
        }
    }
}
