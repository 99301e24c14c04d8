//! Panel configuration loading (`panel.toml`).

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::PanelError;

pub const DEFAULT_URL: &str = "http://192.168.4.1";
pub const DEFAULT_CONFIG_FILE: &str = "panel.toml";
pub const URL_ENV: &str = "TRAPMESH_URL";

const DEFAULT_TIMEOUT_MS: u64 = 3000;
const DEFAULT_REFRESH_MS: u64 = 5000;
const DEFAULT_SETTLE_MS: u64 = 2500;
const MIN_REFRESH_MS: u64 = 250;
const MAX_OFFSET_MINUTES: i32 = 18 * 60;
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub url: SmolStr,
    pub timeout: Duration,
    pub refresh: Duration,
    pub log_level: SmolStr,
    pub log_file: Option<PathBuf>,
    pub settle: Duration,
    /// Overrides the host's UTC offset for time sync and the host clock.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            url: SmolStr::new(DEFAULT_URL),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            refresh: Duration::from_millis(DEFAULT_REFRESH_MS),
            log_level: SmolStr::new("info"),
            log_file: None,
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            utc_offset_minutes: None,
        }
    }
}

impl PanelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PanelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            PanelError::InvalidConfig(format!("{}: {err}", path.display()).into())
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, PanelError> {
        let raw: PanelToml = toml::from_str(text)
            .map_err(|err| PanelError::InvalidConfig(format!("panel.toml: {err}").into()))?;
        raw.into_config()
    }

    /// Loads `path` if given, else `panel.toml` in the working directory if
    /// present, else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, PanelError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// Points the panel at another module.
    pub fn set_url(&mut self, url: &str) -> Result<(), PanelError> {
        self.url = validate_url(url)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PanelToml {
    device: Option<DeviceSection>,
    panel: Option<PanelSection>,
    graph: Option<GraphSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceSection {
    url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PanelSection {
    refresh_ms: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphSection {
    settle_ms: Option<u64>,
}

impl PanelToml {
    fn into_config(self) -> Result<PanelConfig, PanelError> {
        let device = self.device.unwrap_or_default();
        let panel = self.panel.unwrap_or_default();
        let graph = self.graph.unwrap_or_default();

        let url = validate_url(device.url.as_deref().unwrap_or(DEFAULT_URL))?;
        let timeout_ms = device.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(PanelError::InvalidConfig(
                "device.timeout_ms must be greater than zero".into(),
            ));
        }
        let refresh_ms = panel.refresh_ms.unwrap_or(DEFAULT_REFRESH_MS);
        if refresh_ms < MIN_REFRESH_MS {
            return Err(PanelError::InvalidConfig(
                format!("panel.refresh_ms must be at least {MIN_REFRESH_MS}").into(),
            ));
        }
        let log_level = panel
            .log_level
            .as_deref()
            .unwrap_or("info")
            .trim()
            .to_ascii_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(PanelError::InvalidConfig(
                format!("invalid panel.log_level '{log_level}'").into(),
            ));
        }
        if let Some(offset) = panel.utc_offset_minutes {
            if offset.abs() > MAX_OFFSET_MINUTES {
                return Err(PanelError::InvalidConfig(
                    format!("panel.utc_offset_minutes {offset} out of range").into(),
                ));
            }
        }
        let settle_ms = graph.settle_ms.unwrap_or(DEFAULT_SETTLE_MS);
        if settle_ms == 0 {
            return Err(PanelError::InvalidConfig(
                "graph.settle_ms must be greater than zero".into(),
            ));
        }
        Ok(PanelConfig {
            url,
            timeout: Duration::from_millis(timeout_ms),
            refresh: Duration::from_millis(refresh_ms),
            log_level: log_level.into(),
            log_file: panel.log_file,
            settle: Duration::from_millis(settle_ms),
            utc_offset_minutes: panel.utc_offset_minutes,
        })
    }
}

fn validate_url(url: &str) -> Result<SmolStr, PanelError> {
    let url = url.trim().trim_end_matches('/');
    let host = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match host {
        Some(host) if !host.is_empty() => Ok(url.into()),
        _ => Err(PanelError::InvalidConfig(
            format!("invalid device url '{url}' (expected http://host)").into(),
        )),
    }
}
