use async_trait::async_trait;

mod handler;
mod link;
mod state;

pub use handler::ModeCommandHandler;
pub use link::{BrokerConfig, MqttLink};
pub use state::{ControlHandle, ControlSnapshot};

/// Callbacks the control channel invokes from its own task. The render
/// loop never blocks on these; they rendezvous with it only through the
/// shared control state.
#[async_trait]
pub trait ControlEvents: Send + Sync {
    async fn on_connected(&self);
    async fn on_command(&self, payload: &[u8]);
    async fn on_disconnected(&self, reason: &str);
}

/// Best-effort outbound publishing. No delivery confirmation is awaited
/// and a failed publish is never retried.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str, retain: bool);
}

/// Publisher for running without a broker attached.
pub struct NoopPublisher;

#[async_trait]
impl StatusPublisher for NoopPublisher {
    async fn publish(&self, _topic: &str, _payload: &str, _retain: bool) {}
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
