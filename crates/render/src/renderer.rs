use std::{sync::Arc, time::Duration};

use control::{ControlHandle, ControlSnapshot, StatusPublisher};
use providers::{Panel, ProviderTable};
use shared::{domain::ModeRegistry, protocol::Topics};
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{draw, surface::DisplaySurface, DisplayError, Frame};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub interval: Duration,
    pub wait_for_connection: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            padding: 2,
            interval: Duration::from_secs(2),
            wait_for_connection: false,
        }
    }
}

/// The periodic half of the daemon: wakes on a fixed interval, reads the
/// shared control state, dispatches to the active mode's provider and
/// pushes the frame. Rendezvous with the control listener happens only
/// through [`ControlHandle`].
pub struct RenderLoop {
    options: RenderOptions,
    state: ControlHandle,
    registry: Arc<ModeRegistry>,
    table: ProviderTable,
    surface: Box<dyn DisplaySurface>,
    publisher: Arc<dyn StatusPublisher>,
    topics: Topics,
    frame: Frame,
}

impl RenderLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        options: RenderOptions,
        state: ControlHandle,
        registry: Arc<ModeRegistry>,
        table: ProviderTable,
        surface: Box<dyn DisplaySurface>,
        publisher: Arc<dyn StatusPublisher>,
        topics: Topics,
    ) -> Self {
        let frame = Frame::new(options.width, options.height);
        Self {
            options,
            state,
            registry,
            table,
            surface,
            publisher,
            topics,
            frame,
        }
    }

    /// Runs until the shutdown channel fires. Everything except a display
    /// write failure is absorbed before it reaches this loop.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), DisplayError> {
        if self.options.wait_for_connection {
            self.wait_until_connected(&mut shutdown).await?;
            if *shutdown.borrow() {
                return Ok(());
            }
        }

        let mut ticker = interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await?,
                _ = shutdown.changed() => {
                    info!("render loop stopping");
                    return Ok(());
                }
            }
        }
    }

    /// One render pass of the mode state machine.
    pub async fn tick(&mut self) -> Result<(), DisplayError> {
        let mut snapshot = self.state.snapshot().await;
        if !self.registry.contains(snapshot.current) {
            self.state.correct(&self.registry).await;
            snapshot = self.state.snapshot().await;
        }

        if self.registry.is_off(snapshot.current) {
            // Clear once on entry, then stay idle: no provider runs and
            // nothing is redrawn until a different mode is selected.
            if snapshot.entered {
                self.surface.clear()?;
                self.finish_entry(&snapshot).await;
            }
            return Ok(());
        }

        let panel = match self.table.get(snapshot.current) {
            Some(provider) => provider.panel().await,
            None => Panel::placeholder(None),
        };
        self.frame.reset();
        draw::panel(&mut self.frame, self.options.padding, &panel);
        self.surface.present(&self.frame)?;

        if snapshot.entered {
            self.finish_entry(&snapshot).await;
        }
        Ok(())
    }

    /// First render pass for a mode entry: the publish decision is made
    /// here, exactly once. While disconnected the event is suppressed and
    /// never delivered later for this entry; the publish itself is
    /// best-effort, so the flag clears regardless of its outcome.
    async fn finish_entry(&self, snapshot: &ControlSnapshot) {
        if snapshot.connected {
            let name = self.registry.name(snapshot.current);
            self.publisher.publish(&self.topics.state, name, false).await;
        } else {
            debug!(
                mode = self.registry.name(snapshot.current),
                "state publish suppressed while disconnected"
            );
        }
        self.state.clear_entered(snapshot.generation).await;
    }

    async fn wait_until_connected(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), DisplayError> {
        info!("waiting for control channel before first render");
        loop {
            if self.state.snapshot().await.connected {
                self.surface.clear()?;
                return Ok(());
            }
            self.frame.reset();
            draw::waiting(&mut self.frame, self.options.padding);
            self.surface.present(&self.frame)?;
            tokio::select! {
                _ = tokio::time::sleep(self.options.interval) => {}
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}
