// ─── Mode Resolver ───
// Works out which channel to sync against and whether the install directory
// holds a client or a server.

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::core::config::UpdaterConfig;
use crate::core::error::{UpdaterError, UpdaterResult};

pub const DEFAULT_CHANNEL: &str = "release";

/// Installation variant being updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    /// Name used in manifest URLs (`versions/{channel}/{role}.txt`).
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved (channel, role) pair for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    pub channel: String,
    pub role: Role,
}

/// Derive the release channel from an executable file name.
///
/// `Tool-Beta.exe` gives `beta`, `Tool.exe` (or plain `Tool`) gives `release`.
/// A hyphenated name without an extension, or a name that is not the tool's,
/// is rejected.
pub fn derive_channel(file_name: &str, tool_name: &str) -> UpdaterResult<String> {
    let invalid = || UpdaterError::InvalidChannelName {
        file_name: file_name.to_string(),
        tool: tool_name.to_string(),
    };

    match file_name.rsplit_once('-') {
        Some((_, suffix)) => {
            let (channel, _ext) = suffix.rsplit_once('.').ok_or_else(invalid)?;
            if channel.is_empty() {
                return Err(invalid());
            }
            Ok(channel.to_lowercase())
        }
        None => {
            let stem = file_name
                .rsplit_once('.')
                .map_or(file_name, |(stem, _)| stem);
            if stem == tool_name {
                Ok(DEFAULT_CHANNEL.to_string())
            } else {
                Err(invalid())
            }
        }
    }
}

/// Probe the install directory for role markers.
///
/// The server marker is checked first and any client marker overrides it.
pub fn detect_role(
    install_dir: &Path,
    server_marker: &str,
    client_markers: &[String],
) -> UpdaterResult<Role> {
    let mut role = None;

    if install_dir.join(server_marker).exists() {
        debug!("Found server marker {}", server_marker);
        role = Some(Role::Server);
    }
    if let Some(marker) = client_markers
        .iter()
        .find(|marker| install_dir.join(marker).exists())
    {
        debug!("Found client marker {}", marker);
        role = Some(Role::Client);
    }

    role.ok_or_else(|| UpdaterError::NoInstallationFound {
        dir: install_dir.to_path_buf(),
        expected: expected_layout(server_marker, client_markers),
    })
}

fn expected_layout(server_marker: &str, client_markers: &[String]) -> String {
    let mut names: Vec<&str> = client_markers.iter().map(String::as_str).collect();
    names.push(server_marker);
    names.join(" or ")
}

/// Resolve the channel (explicit override first, executable name otherwise)
/// and the role.
pub fn resolve_mode(config: &UpdaterConfig, exe_file_name: &str) -> UpdaterResult<Mode> {
    let channel = match config.channel.as_deref().map(str::trim) {
        Some("") => {
            return Err(UpdaterError::Config(
                "channel override must not be empty".into(),
            ))
        }
        Some(channel) => channel.to_lowercase(),
        None => derive_channel(exe_file_name, &config.tool_name)?,
    };
    info!("Using the {} channel", channel);

    let role = detect_role(
        &config.install_dir,
        &config.server_marker,
        &config.client_markers,
    )?;
    info!("Updating {} in {:?}", role, config.install_dir);

    Ok(Mode { channel, role })
}
