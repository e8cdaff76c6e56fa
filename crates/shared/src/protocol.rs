use serde::{Deserialize, Serialize};

/// Presence payload published when the broker connection is established,
/// and the value remote consumers treat as "daemon alive".
pub const ONLINE_PAYLOAD: &str = "1";
/// Presence payload for the broker last-will and the deterministic
/// shutdown publish.
pub const OFFLINE_PAYLOAD: &str = "0";

/// Topic set the daemon speaks on. Defaults match the original device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    /// Inbound mode-selection commands (payload = exact mode name).
    pub command: String,
    /// Outbound online/offline presence, also used as the last-will topic.
    pub presence: String,
    /// Outbound state-changed events (payload = current mode name).
    pub state: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            command: "oled/set".into(),
            presence: "oled/status".into(),
            state: "oled/state".into(),
        }
    }
}

/// An outbound publish. Ephemeral, best-effort, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub topic: String,
    pub payload: String,
    pub retained: bool,
}

impl StatusEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retained: false,
        }
    }
}
