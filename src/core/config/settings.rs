use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::profile::Profile;
use crate::core::error::{UpdaterError, UpdaterResult};

pub const CONFIG_FILE: &str = "updater.json";

/// Optional overrides read from `updater.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub profile: Option<Profile>,
    pub tool_name: Option<String>,
    pub base_url: Option<String>,
    pub server_marker: Option<String>,
    pub client_markers: Option<Vec<String>>,
    pub channel: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Startup parameters supplied by the caller (the CLI).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub profile: Option<Profile>,
    pub channel: Option<String>,
    pub base_url: Option<String>,
    pub install_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub profile: Profile,
    pub tool_name: String,
    pub base_url: String,
    pub server_marker: String,
    pub client_markers: Vec<String>,
    /// Explicit channel; when `None` it is derived from the executable name.
    pub channel: Option<String>,
    pub install_dir: PathBuf,
    pub timeout_secs: Option<u64>,
}

impl UpdaterConfig {
    /// Profile defaults with nothing overridden.
    pub fn for_profile(profile: Profile, install_dir: PathBuf) -> Self {
        let defaults = profile.defaults();
        Self {
            profile,
            tool_name: defaults.tool_name.to_string(),
            base_url: defaults.base_url.to_string(),
            server_marker: defaults.server_marker.to_string(),
            client_markers: defaults
                .client_markers
                .iter()
                .map(|m| m.to_string())
                .collect(),
            channel: None,
            install_dir,
            timeout_secs: None,
        }
    }

    /// Layer profile defaults, the config file and caller overrides, in that order.
    pub fn load(overrides: ConfigOverrides, default_install_dir: PathBuf) -> UpdaterResult<Self> {
        let install_dir = overrides
            .install_dir
            .clone()
            .unwrap_or(default_install_dir);

        let file = match &overrides.config_path {
            Some(path) => Some(read_config_file(path)?),
            None => {
                let path = install_dir.join(CONFIG_FILE);
                if path.is_file() {
                    Some(read_config_file(&path)?)
                } else {
                    None
                }
            }
        }
        .unwrap_or_default();

        let profile = overrides.profile.or(file.profile).unwrap_or_default();
        let mut config = Self::for_profile(profile, install_dir);

        if let Some(tool_name) = file.tool_name {
            config.tool_name = tool_name;
        }
        if let Some(server_marker) = file.server_marker {
            config.server_marker = server_marker;
        }
        if let Some(client_markers) = file.client_markers {
            config.client_markers = client_markers;
        }
        config.base_url = overrides
            .base_url
            .or(file.base_url)
            .unwrap_or(config.base_url);
        config.channel = overrides.channel.or(file.channel);
        config.timeout_secs = overrides.timeout_secs.or(file.timeout_secs);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> UpdaterResult<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(UpdaterError::Config(format!(
                "base URL must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.tool_name.is_empty() {
            return Err(UpdaterError::Config("tool name must not be empty".into()));
        }
        if self.server_marker.is_empty() || self.client_markers.is_empty() {
            return Err(UpdaterError::Config(
                "server and client markers must be set".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn read_config_file(path: &Path) -> UpdaterResult<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| UpdaterError::Config(format!("{}: {e}", path.display())))?;
    let file = serde_json::from_str(&raw)?;
    debug!("Loaded config overrides from {:?}", path);
    Ok(file)
}
