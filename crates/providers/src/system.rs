use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use tokio::{process::Command, time::timeout};
use tracing::warn;

use crate::{Panel, Provider};

/// Upper bound on any external command a provider shells out to. A hung
/// utility degrades that tick's panel to a placeholder instead of
/// stalling the state machine.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

async fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let run = Command::new(program).args(args).output();
    match timeout(COMMAND_TIMEOUT, run).await {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(Ok(output)) => {
            warn!(program, code = ?output.status.code(), "system command failed");
            None
        }
        Ok(Err(err)) => {
            warn!(program, %err, "system command could not be spawned");
            None
        }
        Err(_) => {
            warn!(program, "system command timed out");
            None
        }
    }
}

/// One-minute load average, read from /proc.
pub struct LoadProvider {
    path: PathBuf,
}

impl Default for LoadProvider {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/proc/loadavg"),
        }
    }
}

impl LoadProvider {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn one_minute_load(loadavg: &str) -> Option<String> {
    loadavg.split_whitespace().next().map(str::to_owned)
}

#[async_trait]
impl Provider for LoadProvider {
    async fn panel(&self) -> Panel {
        let value = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => one_minute_load(&raw),
            Err(err) => {
                warn!(%err, path = %self.path.display(), "loadavg read failed");
                None
            }
        };
        match value {
            Some(value) => Panel::new("LOAD", value),
            None => Panel::placeholder(Some("LOAD")),
        }
    }
}

/// Used percentage of the root filesystem, via `df`.
pub struct DiskUsageProvider {
    program: String,
}

impl Default for DiskUsageProvider {
    fn default() -> Self {
        Self {
            program: "df".into(),
        }
    }
}

impl DiskUsageProvider {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn root_usage_percent(df_output: &str) -> Option<String> {
    for line in df_output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.last() == Some(&"/") && fields.len() >= 2 {
            return Some(fields[fields.len() - 2].to_owned());
        }
    }
    None
}

#[async_trait]
impl Provider for DiskUsageProvider {
    async fn panel(&self) -> Panel {
        let value = match command_stdout(&self.program, &["-h", "/"]).await {
            Some(stdout) => root_usage_percent(&stdout),
            None => None,
        };
        match value {
            Some(value) => Panel::new("SD", value),
            None => Panel::placeholder(Some("SD")),
        }
    }
}

/// SoC temperature, via the firmware's `vcgencmd` utility.
pub struct CpuTempProvider {
    program: String,
}

impl Default for CpuTempProvider {
    fn default() -> Self {
        Self {
            program: "vcgencmd".into(),
        }
    }
}

impl CpuTempProvider {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn temperature_value(raw: &str) -> Option<String> {
    // vcgencmd prints `temp=48.3'C`
    raw.trim().strip_prefix("temp=").map(str::to_owned)
}

#[async_trait]
impl Provider for CpuTempProvider {
    async fn panel(&self) -> Panel {
        let value = match command_stdout(&self.program, &["measure_temp"]).await {
            Some(stdout) => temperature_value(&stdout),
            None => None,
        };
        match value {
            Some(value) => Panel::new("CPU", value),
            None => Panel::placeholder(Some("CPU")),
        }
    }
}

/// Used memory percentage, read from /proc/meminfo.
pub struct MemoryProvider {
    path: PathBuf,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/proc/meminfo"),
        }
    }
}

impl MemoryProvider {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn meminfo_kib(meminfo: &str, key: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

fn memory_used_percent(meminfo: &str) -> Option<String> {
    let total = meminfo_kib(meminfo, "MemTotal")?;
    let available = meminfo_kib(meminfo, "MemAvailable")?;
    if total == 0 || available > total {
        return None;
    }
    let used = (total - available) as f64 * 100.0 / total as f64;
    Some(format!("{used:.2}%"))
}

#[async_trait]
impl Provider for MemoryProvider {
    async fn panel(&self) -> Panel {
        let value = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => memory_used_percent(&raw),
            Err(err) => {
                warn!(%err, path = %self.path.display(), "meminfo read failed");
                None
            }
        };
        match value {
            Some(value) => Panel::new("RAM", value),
            None => Panel::placeholder(Some("RAM")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::PLACEHOLDER;

    use super::*;

    #[test]
    fn parses_one_minute_load() {
        assert_eq!(
            one_minute_load("0.42 0.37 0.31 1/123 4567\n"),
            Some("0.42".into())
        );
        assert_eq!(one_minute_load(""), None);
    }

    #[test]
    fn parses_root_usage_from_df_output() {
        let output = "\
Filesystem      Size  Used Avail Use% Mounted on
/dev/root        29G  4.1G   24G  15% /
tmpfs           432M     0  432M   0% /dev/shm
";
        assert_eq!(root_usage_percent(output), Some("15%".into()));
        assert_eq!(root_usage_percent("tmpfs 432M 0 432M 0% /dev/shm\n"), None);
    }

    #[test]
    fn parses_vcgencmd_temperature() {
        assert_eq!(temperature_value("temp=48.3'C\n"), Some("48.3'C".into()));
        assert_eq!(temperature_value("garbage"), None);
    }

    #[test]
    fn computes_used_memory_percentage() {
        let meminfo = "\
MemTotal:        1000000 kB
MemFree:          200000 kB
MemAvailable:     400000 kB
";
        assert_eq!(memory_used_percent(meminfo), Some("60.00%".into()));
        assert_eq!(memory_used_percent("MemTotal: 0 kB\nMemAvailable: 0 kB\n"), None);
        assert_eq!(memory_used_percent(""), None);
    }

    #[tokio::test]
    async fn failing_command_degrades_to_placeholder() {
        let provider = DiskUsageProvider::with_program("/nonexistent/df-test-binary");
        let panel = provider.panel().await;
        assert_eq!(panel.heading.as_deref(), Some("SD"));
        assert_eq!(panel.value, PLACEHOLDER);
    }

    #[tokio::test]
    async fn missing_proc_file_degrades_to_placeholder() {
        let provider = LoadProvider::with_path("/nonexistent/loadavg-test");
        let panel = provider.panel().await;
        assert_eq!(panel.value, PLACEHOLDER);
    }
}
