use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::core::error::UpdaterError;

/// The mod distributions this updater knows how to service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Dmp,
    Kmp,
}

/// Names and locations that differ between distributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub tool_name: &'static str,
    pub base_url: &'static str,
    pub server_marker: &'static str,
    pub client_markers: &'static [&'static str],
}

const KSP_CLIENT_MARKERS: &[&str] = &["KSP.exe", "KSP.app", "KSP.x86", "KSP.x86_64"];

impl Profile {
    pub fn defaults(self) -> ProfileDefaults {
        match self {
            Profile::Dmp => ProfileDefaults {
                tool_name: "DMPUpdater",
                base_url: "http://chrisand.no-ip.info/dmp/updater/",
                server_marker: "DMPServer.exe",
                client_markers: KSP_CLIENT_MARKERS,
            },
            Profile::Kmp => ProfileDefaults {
                tool_name: "KMPUpdater",
                base_url: "http://godarklight.kerbalcentral.com:82/kmp/updater/",
                server_marker: "KMPServer.exe",
                client_markers: KSP_CLIENT_MARKERS,
            },
        }
    }

    /// Short product name used in user-facing messages.
    pub fn product(self) -> &'static str {
        match self {
            Profile::Dmp => "DMP",
            Profile::Kmp => "KMP",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Dmp => f.write_str("dmp"),
            Profile::Kmp => f.write_str("kmp"),
        }
    }
}

impl FromStr for Profile {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dmp" => Ok(Profile::Dmp),
            "kmp" => Ok(Profile::Kmp),
            other => Err(UpdaterError::Config(format!(
                "unknown profile {other:?} (expected dmp or kmp)"
            ))),
        }
    }
}
