use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;
use control::{ControlHandle, ModeCommandHandler, MqttLink, StatusPublisher};
use providers::ProviderTable;
use render::{DisplaySurface, RenderLoop, RenderOptions, TraceSurface};
use shared::domain::ModeRegistry;
use tokio::sync::watch;
use tracing::{error, info};

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "oled.toml")]
    config: PathBuf,
    /// Log filter, e.g. `info` or `render=trace`.
    #[arg(long, default_value = "info")]
    log: String,
}

fn build_surface(settings: &Settings) -> Result<Box<dyn DisplaySurface>> {
    match settings.display.backend.as_str() {
        "trace" => Ok(Box::new(TraceSurface)),
        other => bail!("unknown display backend '{other}'"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_env_filter(args.log.as_str()).init();

    let settings = load_settings(&args.config);
    if settings.modes.is_empty() {
        bail!("at least one display mode must be configured");
    }

    let registry = Arc::new(ModeRegistry::new(
        settings.modes.clone(),
        settings.default_mode,
    ));
    let state = ControlHandle::new(registry.default_mode());
    let handler = Arc::new(ModeCommandHandler::new(state.clone(), Arc::clone(&registry)));
    let link = MqttLink::connect(&settings.broker_config(), settings.topics.clone(), handler);

    let table = ProviderTable::for_registry(
        &registry,
        &settings.wifi_interface,
        &settings.eth_interface,
    );
    let surface = build_surface(&settings)?;
    let options = RenderOptions {
        width: settings.display.width,
        height: settings.display.height,
        padding: settings.display.padding,
        interval: Duration::from_secs(settings.refresh_interval_secs.max(1)),
        wait_for_connection: settings.wait_for_connection,
    };
    let publisher: Arc<dyn StatusPublisher> = link.clone();
    let mut render = RenderLoop::new(
        options,
        state,
        Arc::clone(&registry),
        table,
        surface,
        publisher,
        settings.topics.clone(),
    );

    info!(
        broker = %settings.broker.host,
        port = settings.broker.port,
        modes = registry.len(),
        default = %registry.name(registry.default_mode()),
        "status display daemon starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => error!(%err, "signal handler failed"),
        }
    });

    let result = render.run(shutdown_rx).await;
    // Orderly exit announces offline explicitly instead of leaning on the
    // broker's last-will, which only covers abnormal loss.
    link.shutdown().await;

    if let Err(err) = &result {
        error!(%err, "display failure; exiting for supervisor restart");
    }
    result?;
    Ok(())
}
