//! Control messages from clients.
//!
//! Messages are published on a [`ControlBus`] and consumed by one
//! [`ControlListener`] task registered at startup and torn down at shutdown.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::deployment::Lifecycle;

/// Message type that promotes the waiting deployment.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// A client control message, `{ "type": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ControlMessage {
    pub fn skip_waiting() -> Self {
        Self {
            kind: SKIP_WAITING.to_string(),
        }
    }
}

/// Publishing side of the control channel.
#[derive(Debug, Clone)]
pub struct ControlBus {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl ControlBus {
    /// Queue a message; false if the listener has been torn down.
    pub fn publish(&self, message: ControlMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// The task reacting to control messages.
pub struct ControlListener {
    handle: JoinHandle<()>,
}

impl ControlListener {
    /// Spawn the listener and return the bus that feeds it.
    pub fn register(lifecycle: Arc<Lifecycle>) -> (ControlBus, ControlListener) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ControlMessage>();

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let acted = lifecycle.handle_message(&message).await;
                tracing::debug!(kind = %message.kind, acted, "Control message processed");
            }
        });

        tracing::debug!("Control listener registered");
        (ControlBus { tx }, ControlListener { handle })
    }

    /// Stop reacting to messages.
    pub fn teardown(self) {
        self.handle.abort();
        tracing::debug!("Control listener torn down");
    }
}
