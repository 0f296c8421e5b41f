use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which remote document a network failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    ChannelIndex,
    Manifest,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::ChannelIndex => f.write_str("channel index"),
            FetchStage::Manifest => f.write_str("file manifest"),
        }
    }
}

/// Central error type for the updater.
/// Every stage returns `Result<T, UpdaterError>`; all variants are terminal.
#[derive(Debug, Error)]
pub enum UpdaterError {
    // ── Mode ────────────────────────────────────────────
    #[error("Badly formatted executable name {file_name:?}: expected {tool}-(channel).exe or {tool}.exe")]
    InvalidChannelName { file_name: String, tool: String },

    #[error("Cannot find a client or server in {dir:?}: place the updater next to {expected}")]
    NoInstallationFound { dir: PathBuf, expected: String },

    // ── Network ─────────────────────────────────────────
    #[error("Failed to download the {stage}: {message}")]
    Network { stage: FetchStage, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Channel {channel:?} does not exist, current channels are: {}", .valid_channels.join(", "))]
    UnknownChannel {
        channel: String,
        valid_channels: Vec<String>,
    },

    // ── Reconcile ───────────────────────────────────────
    #[error("Failed to update {path}: {cause}")]
    FileSync { path: String, cause: String },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-256 mismatch for {path:?}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Config ──────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type UpdaterResult<T> = Result<T, UpdaterError>;

impl UpdaterError {
    /// Process exit code for the stage this error aborted.
    pub fn exit_code(&self) -> i32 {
        match self {
            UpdaterError::InvalidChannelName { .. } => 1,
            UpdaterError::NoInstallationFound { .. } => 2,
            UpdaterError::Network {
                stage: FetchStage::ChannelIndex,
                ..
            } => 3,
            UpdaterError::UnknownChannel { .. } => 4,
            UpdaterError::Network {
                stage: FetchStage::Manifest,
                ..
            } => 5,
            UpdaterError::FileSync { .. }
            | UpdaterError::Http(_)
            | UpdaterError::DownloadFailed { .. }
            | UpdaterError::HashMismatch { .. }
            | UpdaterError::Io { .. } => 6,
            UpdaterError::Config(_) | UpdaterError::Json(_) => 7,
        }
    }

    pub(crate) fn network(stage: FetchStage, err: impl fmt::Display) -> Self {
        UpdaterError::Network {
            stage,
            message: err.to_string(),
        }
    }

    pub(crate) fn file_sync(path: &str, cause: impl fmt::Display) -> Self {
        UpdaterError::FileSync {
            path: path.to_string(),
            cause: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_pipeline_stages() {
        let bad_name = UpdaterError::InvalidChannelName {
            file_name: "x".into(),
            tool: "DMPUpdater".into(),
        };
        let no_install = UpdaterError::NoInstallationFound {
            dir: PathBuf::from("."),
            expected: "KSP.exe".into(),
        };
        let index = UpdaterError::network(FetchStage::ChannelIndex, "refused");
        let unknown = UpdaterError::UnknownChannel {
            channel: "nightly".into(),
            valid_channels: vec!["release".into()],
        };
        let manifest = UpdaterError::network(FetchStage::Manifest, "404");
        let sync = UpdaterError::file_sync("a.txt", "reset");

        assert_eq!(bad_name.exit_code(), 1);
        assert_eq!(no_install.exit_code(), 2);
        assert_eq!(index.exit_code(), 3);
        assert_eq!(unknown.exit_code(), 4);
        assert_eq!(manifest.exit_code(), 5);
        assert_eq!(sync.exit_code(), 6);
        assert_eq!(UpdaterError::Config("bad".into()).exit_code(), 7);
    }

    #[test]
    fn unknown_channel_lists_valid_channels() {
        let err = UpdaterError::UnknownChannel {
            channel: "nightly".into(),
            valid_channels: vec!["release".into(), "dev".into()],
        };
        assert_eq!(
            err.to_string(),
            "Channel \"nightly\" does not exist, current channels are: release, dev"
        );
    }
}
