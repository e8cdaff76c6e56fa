use std::net::IpAddr;

use async_trait::async_trait;
use tracing::warn;

use crate::{Panel, Provider, PLACEHOLDER};

/// IPv4 address of a named network interface.
///
/// "No Conn." and "Not found" are successful reads of an absent address,
/// not failures; only an enumeration error degrades to the placeholder.
pub struct InterfaceAddressProvider {
    interface: String,
    heading: String,
}

impl InterfaceAddressProvider {
    pub fn new(interface: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            heading: heading.into(),
        }
    }
}

fn ipv4_of(interface: &str) -> String {
    match if_addrs::get_if_addrs() {
        Ok(addrs) => {
            let mut interface_present = false;
            for addr in addrs.iter().filter(|addr| addr.name == interface) {
                interface_present = true;
                if let IpAddr::V4(v4) = addr.ip() {
                    return v4.to_string();
                }
            }
            if interface_present {
                "No Conn.".into()
            } else {
                "Not found".into()
            }
        }
        Err(err) => {
            warn!(%err, interface, "interface enumeration failed");
            PLACEHOLDER.into()
        }
    }
}

#[async_trait]
impl Provider for InterfaceAddressProvider {
    async fn panel(&self) -> Panel {
        let interface = self.interface.clone();
        let value = match tokio::task::spawn_blocking(move || ipv4_of(&interface)).await {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "interface lookup task failed");
                PLACEHOLDER.into()
            }
        };
        Panel::new(self.heading.clone(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_interface_reads_as_not_found() {
        let provider = InterfaceAddressProvider::new("does-not-exist0", "Wifi");
        let panel = provider.panel().await;
        assert_eq!(panel.heading.as_deref(), Some("Wifi"));
        assert_eq!(panel.value, "Not found");
    }

    #[tokio::test]
    async fn loopback_resolves_to_an_ipv4_address() {
        let panel = InterfaceAddressProvider::new("lo", "Wifi").panel().await;
        // CI containers without a loopback interface name still take the
        // successful-read paths.
        assert!(panel.value == "127.0.0.1" || panel.value == "No Conn." || panel.value == "Not found");
    }
}
