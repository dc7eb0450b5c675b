//! Persisted user settings for the `handmark` binary.
//!
//! Two small TOML files under `<config_dir>/handmark/`:
//!
//! - `config.toml` — model and provider chosen with `handmark conf`
//! - `credentials.toml` — API key stored with `handmark auth` (0600 on Unix)
//!
//! Environment variables always win over the stored key: it is only exported
//! to the provider's variable when that variable is unset.

use crate::models::api_key_env;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<config_dir>/handmark/`, e.g. `~/.config/handmark/` on Linux.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("handmark"))
        .unwrap_or_else(|| PathBuf::from(".handmark"))
}

pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

pub fn default_credentials_path() -> PathBuf {
    default_config_dir().join("credentials.toml")
}

/// Model selection saved by `handmark conf`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> io::Result<Self> {
        read_toml(path)
    }

    /// Missing file means default settings.
    pub fn load_default() -> io::Result<Self> {
        let path = default_settings_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        write_toml(path, self, false)
    }

    pub fn save_default(&self) -> io::Result<PathBuf> {
        let path = default_settings_path();
        self.save(&path)?;
        Ok(path)
    }
}

/// API key saved by `handmark auth`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub provider: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
        }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        read_toml(path)
    }

    /// `None` when nothing has been stored yet.
    pub fn load_default() -> io::Result<Option<Self>> {
        let path = default_credentials_path();
        if path.exists() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        write_toml(path, self, true)
    }

    pub fn save_default(&self) -> io::Result<PathBuf> {
        let path = default_credentials_path();
        self.save(&path)?;
        Ok(path)
    }

    /// Environment variable the key belongs in.
    pub fn env_var(&self) -> Option<&'static str> {
        api_key_env(&self.provider)
    }

    /// Export the key unless the variable is already set. Returns the
    /// variable name when it was exported.
    pub fn export_to_env(&self) -> Option<&'static str> {
        let var = self.env_var()?;
        if std::env::var(var).is_ok_and(|v| !v.is_empty()) {
            debug!("{} already set; stored credential not used", var);
            return None;
        }
        std::env::set_var(var, &self.api_key);
        debug!("Exported stored credential to {}", var);
        Some(var)
    }
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> io::Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Cannot parse {}: {e}", path.display()),
        )
    })
}

fn write_toml<T: Serialize>(path: &Path, value: &T, private: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    std::fs::write(path, content)?;
    if private {
        restrict_permissions(path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
