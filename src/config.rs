//! `config.toml` loading.
//!
//! ```toml
//! sasl_user = "monitor"
//! sasl_password = "hunter2"
//!
//! [color]
//! selected_fg = 0
//! selected_bg = 6
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::hypervisor::Credentials;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Terminal colour codes (0-255) per screen role.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    pub name_column_fg: u8,
    pub name_column_bg: u8,
    pub active_row_fg: u8,
    pub active_row_bg: u8,
    pub inactive_row_fg: u8,
    pub inactive_row_bg: u8,
    pub box_fg: u8,
    pub box_bg: u8,
    pub selected_fg: u8,
    pub selected_bg: u8,
    #[serde(flatten)]
    unknown: BTreeMap<String, toml::Value>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            name_column_fg: 6,
            name_column_bg: 0,
            active_row_fg: 2,
            active_row_bg: 0,
            inactive_row_fg: 8,
            inactive_row_bg: 0,
            box_fg: 4,
            box_bg: 0,
            selected_fg: 0,
            selected_bg: 6,
            unknown: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sasl_user: Option<String>,
    pub sasl_password: Option<String>,
    pub color: ColorConfig,
    #[serde(flatten)]
    unknown: BTreeMap<String, toml::Value>,
}

impl Config {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`. A missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Keys this program does not know, as dotted paths.
    pub fn unknown_keys(&self) -> Vec<String> {
        let top = self.unknown.keys().cloned();
        let color = self.color.unknown.keys().map(|k| format!("color.{}", k));
        top.chain(color).collect()
    }

    pub fn warn_unknown_keys(&self) {
        for key in self.unknown_keys() {
            tracing::warn!(key = %key, "unknown config key ignored");
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.sasl_user.clone(),
            passphrase: self.sasl_password.clone(),
        }
    }
}

/// `$XDG_CONFIG_HOME/virttop/config.toml`, else `~/.config/virttop/config.toml`.
pub fn default_config_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("virttop").join("config.toml")
}
