use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{ModeId, ModeRegistry};
use tracing::warn;

mod clock;
mod net;
mod system;

pub use clock::ClockProvider;
pub use net::InterfaceAddressProvider;
pub use system::{CpuTempProvider, DiskUsageProvider, LoadProvider, MemoryProvider};

/// Content shown when a provider's underlying read fails.
pub const PLACEHOLDER: &str = "N/A";

/// Renderable content for one panel: an optional small heading and the
/// main value drawn large below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub heading: Option<String>,
    pub value: String,
}

impl Panel {
    pub fn new(heading: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            value: value.into(),
        }
    }

    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            heading: None,
            value: value.into(),
        }
    }

    pub fn placeholder(heading: Option<&str>) -> Self {
        Self {
            heading: heading.map(str::to_owned),
            value: PLACEHOLDER.into(),
        }
    }
}

/// Produces content for one mode. Infallible from the state machine's
/// point of view: implementations absorb their own read failures and
/// degrade to placeholder content.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn panel(&self) -> Panel;
}

/// Dispatch table `ModeId -> Provider`. The off mode has no entry and is
/// never dispatched; an unrecognized id is an explicit lookup of the
/// default-mode entry.
pub struct ProviderTable {
    entries: Vec<Option<Arc<dyn Provider>>>,
    default: ModeId,
}

impl ProviderTable {
    pub fn new(entries: Vec<Option<Arc<dyn Provider>>>, default: ModeId) -> Self {
        Self { entries, default }
    }

    /// Binds the built-in providers to a registry by mode name. Names
    /// without a known provider get no entry and render as placeholders.
    pub fn for_registry(registry: &ModeRegistry, wifi_interface: &str, eth_interface: &str) -> Self {
        let entries = registry
            .modes()
            .iter()
            .map(|mode| {
                if registry.is_off(mode.id) {
                    return None;
                }
                let provider: Option<Arc<dyn Provider>> = match mode.name.as_str() {
                    "Wifi" => Some(Arc::new(InterfaceAddressProvider::new(
                        wifi_interface,
                        "Wifi",
                    ))),
                    "Ethernet" => Some(Arc::new(InterfaceAddressProvider::new(
                        eth_interface,
                        "Ethernet",
                    ))),
                    "Clock" => Some(Arc::new(ClockProvider)),
                    "Load" => Some(Arc::new(LoadProvider::default())),
                    "Disk usage" => Some(Arc::new(DiskUsageProvider::default())),
                    "CPU Temp" => Some(Arc::new(CpuTempProvider::default())),
                    "RAM" => Some(Arc::new(MemoryProvider::default())),
                    other => {
                        warn!(mode = other, "no provider bound for configured mode");
                        None
                    }
                };
                provider
            })
            .collect();
        Self {
            entries,
            default: registry.default_mode(),
        }
    }

    pub fn get(&self, id: ModeId) -> Option<Arc<dyn Provider>> {
        let index = if id.0 < self.entries.len() {
            id.0
        } else {
            self.default.0
        };
        self.entries.get(index).and_then(Clone::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl Provider for FixedProvider {
        async fn panel(&self) -> Panel {
            Panel::bare(self.0)
        }
    }

    #[tokio::test]
    async fn unknown_id_dispatches_to_default_entry() {
        let table = ProviderTable::new(
            vec![
                None,
                Some(Arc::new(FixedProvider("one"))),
                Some(Arc::new(FixedProvider("two"))),
            ],
            ModeId(2),
        );

        let provider = table.get(ModeId(17)).expect("default entry");
        assert_eq!(provider.panel().await.value, "two");
    }

    #[test]
    fn off_mode_has_no_entry() {
        let registry = ModeRegistry::builtin();
        let table = ProviderTable::for_registry(&registry, "wlan0", "eth0");
        assert!(table.get(ModeId(0)).is_none());
        assert!(table.get(ModeId(3)).is_some());
    }
}
