//! Envelope and control-frame shapes for the push connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel carrying match state frames.
pub const CHANNEL_MATCHES: &str = "autodarts.matches";
/// Channel carrying board hardware events.
pub const CHANNEL_BOARDS: &str = "autodarts.boards";
/// Channel carrying account-scoped events such as lobby membership.
pub const CHANNEL_USERS: &str = "autodarts.users";
/// Channel carrying lobby rosters and lifecycle events.
pub const CHANNEL_LOBBIES: &str = "autodarts.lobbies";

/// Outer envelope of every inbound push frame.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Logical channel the frame belongs to.
    pub channel: Option<String>,
    /// Channel-specific payload.
    #[serde(default)]
    pub data: Value,
}

/// Direction of a subscription control frame.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionKind {
    /// Start receiving frames for a topic.
    Subscribe,
    /// Stop receiving frames for a topic.
    Unsubscribe,
}

/// Control frame sent to manage topic subscriptions.
#[derive(Debug, Serialize)]
pub struct Subscription {
    /// Channel namespace of the topic.
    pub channel: String,
    /// `subscribe` or `unsubscribe`.
    #[serde(rename = "type")]
    pub kind: SubscriptionKind,
    /// Topic, e.g. `<board-id>.events` or `<match-id>.state`.
    pub topic: String,
}

/// Lifecycle event as carried on the boards, users, and lobbies channels.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChannelEvent {
    /// Event name (`start`, `finish`, `delete`, hardware status labels, ...).
    pub event: Option<String>,
    /// Subject identifier, when the event carries one at the top level.
    pub id: Option<String>,
    /// Event body for account-scoped events.
    pub body: Value,
}

/// One player entry in a lobby roster.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LobbyPlayer {
    /// Display name.
    pub name: Option<String>,
    /// Account id, used to diff rosters between frames.
    pub user_id: Option<String>,
    /// Board the player is attached to.
    pub board_id: Option<String>,
}

/// Lobby state frame; either a lifecycle event or a roster update.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LobbyFrame {
    /// Lifecycle event name, when present.
    pub event: Option<String>,
    /// Lobby identifier.
    pub id: Option<String>,
    /// Current roster, when the frame is a state update.
    pub players: Option<Vec<LobbyPlayer>>,
}
