//! Scoring-service integration: session refresh, the push connection,
//! and the REST clients for the service and the board controller.

pub mod api;
pub mod auth;
pub mod board;
pub mod connection;

use tokio::sync::mpsc;
use tracing::debug;

use crate::dto::upstream::{Subscription, SubscriptionKind};

/// Sender half of the live push connection.
///
/// Cheap to clone; dropping every clone ends the connection's write side.
#[derive(Clone, Debug)]
pub struct UpstreamLink {
    tx: mpsc::UnboundedSender<String>,
}

impl UpstreamLink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Start receiving frames for `topic` on `channel`.
    pub fn subscribe(&self, channel: &str, topic: impl Into<String>) {
        self.send_control(Subscription {
            channel: channel.into(),
            kind: SubscriptionKind::Subscribe,
            topic: topic.into(),
        });
    }

    /// Stop receiving frames for `topic` on `channel`.
    pub fn unsubscribe(&self, channel: &str, topic: impl Into<String>) {
        self.send_control(Subscription {
            channel: channel.into(),
            kind: SubscriptionKind::Unsubscribe,
            topic: topic.into(),
        });
    }

    fn send_control(&self, frame: Subscription) {
        debug!(channel = %frame.channel, topic = %frame.topic, kind = ?frame.kind, "subscription change");
        if let Ok(text) = serde_json::to_string(&frame) {
            let _ = self.tx.send(text);
        }
    }
}
