use std::{fs, path::Path};

use control::BrokerConfig;
use serde::Deserialize;
use shared::protocol::Topics;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    /// Display backend to bind behind the surface seam. `trace` logs
    /// frames; hardware drivers register their own name here.
    pub backend: String,
    /// Bus address of the panel, for hardware backends. The `trace`
    /// backend ignores it.
    pub address: Option<u16>,
    /// GPIO pin wired to the panel's reset line, for hardware backends.
    pub reset_pin: Option<u8>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            padding: 2,
            backend: "trace".into(),
            address: None,
            reset_pin: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
    pub bind_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub qos: u8,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            keep_alive_secs: 60,
            bind_address: None,
            username: None,
            password: None,
            client_id: "oled".into(),
            qos: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub refresh_interval_secs: u64,
    pub default_mode: usize,
    pub wait_for_connection: bool,
    pub broker: BrokerSettings,
    pub topics: Topics,
    pub modes: Vec<String>,
    pub wifi_interface: String,
    pub eth_interface: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display: DisplaySettings::default(),
            refresh_interval_secs: 2,
            default_mode: 3,
            wait_for_connection: false,
            broker: BrokerSettings::default(),
            topics: Topics::default(),
            modes: [
                "Turn off",
                "Wifi",
                "Ethernet",
                "Clock",
                "Load",
                "Disk usage",
                "CPU Temp",
                "RAM",
            ]
            .map(String::from)
            .to_vec(),
            wifi_interface: "wlan0".into(),
            eth_interface: "eth0".into(),
        }
    }
}

impl Settings {
    pub fn broker_config(&self) -> BrokerConfig {
        BrokerConfig {
            host: self.broker.host.clone(),
            port: self.broker.port,
            keep_alive_secs: self.broker.keep_alive_secs,
            bind_address: self.broker.bind_address.clone(),
            username: self.broker.username.clone(),
            password: self.broker.password.clone(),
            client_id: self.broker.client_id.clone(),
            qos: self.broker.qos,
        }
    }
}

/// Defaults, overridden by the TOML file when present, overridden in
/// turn by `OLED__*` environment variables.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<Settings>(&raw) {
            Ok(file_settings) => settings = file_settings,
            Err(err) => {
                warn!(%err, path = %path.display(), "ignoring unparseable config file");
            }
        }
    }

    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("OLED__BROKER_HOST") {
        settings.broker.host = v;
    }
    if let Some(v) = var("OLED__BROKER_PORT") {
        if let Ok(port) = v.parse() {
            settings.broker.port = port;
        }
    }
    if let Some(v) = var("OLED__BROKER_USERNAME") {
        settings.broker.username = Some(v);
    }
    if let Some(v) = var("OLED__BROKER_PASSWORD") {
        settings.broker.password = Some(v);
    }
    if let Some(v) = var("OLED__CLIENT_ID") {
        settings.broker.client_id = v;
    }
    if let Some(v) = var("OLED__DEFAULT_MODE") {
        if let Ok(mode) = v.parse() {
            settings.default_mode = mode;
        }
    }
    if let Some(v) = var("OLED__REFRESH_INTERVAL_SECS") {
        if let Ok(secs) = v.parse() {
            settings.refresh_interval_secs = secs;
        }
    }
    if let Some(v) = var("OLED__WAIT_FOR_CONNECTION") {
        if let Ok(wait) = v.parse() {
            settings.wait_for_connection = wait;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_device() {
        let settings = Settings::default();
        assert_eq!(settings.refresh_interval_secs, 2);
        assert_eq!(settings.default_mode, 3);
        assert_eq!(settings.modes.len(), 8);
        assert_eq!(settings.modes[0], "Turn off");
        assert_eq!(settings.broker.port, 1883);
        assert_eq!(settings.topics.command, "oled/set");
        assert!(!settings.wait_for_connection);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let settings: Settings = toml::from_str(
            r#"
            default_mode = 1
            wait_for_connection = true

            [broker]
            host = "broker.lan"
            qos = 1
            "#,
        )
        .expect("parse");

        assert_eq!(settings.default_mode, 1);
        assert!(settings.wait_for_connection);
        assert_eq!(settings.broker.host, "broker.lan");
        assert_eq!(settings.broker.qos, 1);
        // Untouched sections keep their defaults.
        assert_eq!(settings.broker.port, 1883);
        assert_eq!(settings.display.width, 128);
        assert_eq!(settings.modes.len(), 8);
    }

    #[test]
    fn display_driver_parameters_parse_from_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [display]
            backend = "trace"
            address = 0x3C
            reset_pin = 24
            "#,
        )
        .expect("parse");

        assert_eq!(settings.display.address, Some(0x3C));
        assert_eq!(settings.display.reset_pin, Some(24));
        assert_eq!(settings.display.width, 128);
        assert_eq!(Settings::default().display.address, None);
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |key| match key {
            "OLED__BROKER_HOST" => Some("10.0.0.5".into()),
            "OLED__BROKER_PORT" => Some("8883".into()),
            "OLED__DEFAULT_MODE" => Some("7".into()),
            _ => None,
        });

        assert_eq!(settings.broker.host, "10.0.0.5");
        assert_eq!(settings.broker.port, 8883);
        assert_eq!(settings.default_mode, 7);
    }

    #[test]
    fn invalid_numeric_overrides_are_ignored() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |key| match key {
            "OLED__BROKER_PORT" => Some("not-a-port".into()),
            _ => None,
        });
        assert_eq!(settings.broker.port, 1883);
    }
}
