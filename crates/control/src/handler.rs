use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::ModeRegistry;
use tracing::{debug, info};

use crate::{ControlEvents, ControlHandle};

/// Translates control-channel events into shared-state transitions.
pub struct ModeCommandHandler {
    state: ControlHandle,
    registry: Arc<ModeRegistry>,
}

impl ModeCommandHandler {
    pub fn new(state: ControlHandle, registry: Arc<ModeRegistry>) -> Self {
        Self { state, registry }
    }
}

#[async_trait]
impl ControlEvents for ModeCommandHandler {
    async fn on_connected(&self) {
        self.state.set_connected(true).await;
        info!("control channel connected");
    }

    async fn on_command(&self, payload: &[u8]) {
        // Non-UTF8 payloads cannot match any registered name and resolve
        // to the default mode like any other unknown command.
        let payload = String::from_utf8_lossy(payload);
        let selected = self.state.apply_command(&payload, &self.registry).await;
        debug!(payload = %payload, mode = %self.registry.name(selected), "mode command applied");
    }

    async fn on_disconnected(&self, reason: &str) {
        self.state.set_connected(false).await;
        debug!(reason, "control channel disconnected");
    }
}
