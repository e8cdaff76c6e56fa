use std::sync::Arc;

use shared::domain::{ModeId, ModeRegistry};
use tokio::sync::Mutex;
use tracing::debug;

/// The contested state shared by the control listener and the render
/// loop. All three fields change together under one lock so no reader
/// ever observes a torn update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ControlState {
    current: ModeId,
    entered: bool,
    connected: bool,
    generation: u64,
}

/// Point-in-time copy of the control state, taken atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSnapshot {
    pub current: ModeId,
    pub entered: bool,
    pub connected: bool,
    /// Entry counter, bumped on every command. Lets a later
    /// [`ControlHandle::clear_entered`] tell this entry apart from one
    /// that raced in since the snapshot was taken.
    pub generation: u64,
}

/// Cloneable handle to the shared control state. Created once at startup
/// with the configured default mode; lives for the process lifetime.
#[derive(Clone)]
pub struct ControlHandle {
    inner: Arc<Mutex<ControlState>>,
}

impl ControlHandle {
    pub fn new(default: ModeId) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControlState {
                current: default,
                entered: true,
                connected: false,
                generation: 0,
            })),
        }
    }

    pub async fn snapshot(&self) -> ControlSnapshot {
        let state = self.inner.lock().await;
        ControlSnapshot {
            current: state.current,
            entered: state.entered,
            connected: state.connected,
            generation: state.generation,
        }
    }

    /// Applies an inbound command payload: an exact mode-name match
    /// selects that mode, anything else selects the default. Either way
    /// the transition counts as a fresh entry, even when the id does not
    /// change.
    pub async fn apply_command(&self, payload: &str, registry: &ModeRegistry) -> ModeId {
        let target = match registry.resolve(payload) {
            Some(id) => id,
            None => {
                debug!(payload, "unknown command payload; selecting default mode");
                registry.default_mode()
            }
        };
        let mut state = self.inner.lock().await;
        state.current = target;
        state.entered = true;
        state.generation = state.generation.wrapping_add(1);
        target
    }

    pub async fn set_connected(&self, connected: bool) {
        self.inner.lock().await.connected = connected;
    }

    /// Marks the entry observed in `generation` as rendered and
    /// published-or-skipped. Only the render loop calls this. A command
    /// that landed since that snapshot bumped the counter; its fresh
    /// entry stays intact and publishes on the next pass.
    pub async fn clear_entered(&self, generation: u64) {
        let mut state = self.inner.lock().await;
        if state.generation == generation {
            state.entered = false;
        }
    }

    /// Corrects an out-of-range id to the default before any reader acts
    /// on it. Returns the id now in effect.
    pub async fn correct(&self, registry: &ModeRegistry) -> ModeId {
        let mut state = self.inner.lock().await;
        let corrected = registry.clamp(state.current);
        if corrected != state.current {
            debug!(stale = state.current.0, now = corrected.0, "corrected out-of-range mode id");
            state.current = corrected;
        }
        corrected
    }
}
