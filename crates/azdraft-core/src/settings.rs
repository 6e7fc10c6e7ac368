//! User settings and the on-disk data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SettingsError;

pub const DEFAULT_GENERATOR_ENDPOINT: &str = "http://127.0.0.1:8000";
const SETTINGS_FILE: &str = "settings.json";

/// Resolve the global data directory (~/.azdraft/).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".azdraft")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioSettings {
    /// Base URL of the architecture generator; `/stream` is appended.
    pub generator_endpoint: String,
    /// Connect timeout and longest silence allowed between stream reads.
    pub request_timeout_secs: u64,
    /// Simulated latency of the deployment collaborator.
    pub deploy_latency_ms: u64,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            generator_endpoint: DEFAULT_GENERATOR_ENDPOINT.to_string(),
            request_timeout_secs: 120,
            deploy_latency_ms: 2000,
        }
    }
}

pub fn read_settings() -> StudioSettings {
    read_settings_from(&data_dir())
}

/// Missing or unreadable settings fall back to defaults.
pub fn read_settings_from(dir: &Path) -> StudioSettings {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        return StudioSettings::default();
    }
    match fs::read_to_string(&path)
        .map_err(SettingsError::from)
        .and_then(|raw| serde_json::from_str(&raw).map_err(SettingsError::from))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            StudioSettings::default()
        }
    }
}

pub fn write_settings(settings: &StudioSettings) -> Result<(), SettingsError> {
    write_settings_to(&data_dir(), settings)
}

pub fn write_settings_to(dir: &Path, settings: &StudioSettings) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(settings)?;
    write_atomic(&dir.join(SETTINGS_FILE), &json)?;
    Ok(())
}

/// Write via temp file + rename so readers never observe a half-written file.
pub fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.tmp", name));
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}
