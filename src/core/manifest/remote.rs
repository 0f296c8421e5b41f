// ─── Manifest Fetcher ───
// Fetches the channel index and per-channel manifests from the update server.

use reqwest::Client;
use tracing::{debug, info};

use crate::core::error::{FetchStage, UpdaterError, UpdaterResult};
use crate::core::mode::Role;

/// Read-only view of the update server layout.
#[derive(Debug, Clone)]
pub struct UpdateServer {
    client: Client,
    base_url: String,
}

impl UpdateServer {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn index_url(&self) -> String {
        format!("{}/index.txt", self.base_url)
    }

    pub fn manifest_url(&self, channel: &str, role: Role) -> String {
        format!("{}/versions/{}/{}.txt", self.base_url, channel, role)
    }

    pub fn object_url(&self, channel: &str, hash: &str) -> String {
        format!("{}/versions/{}/objects/{}", self.base_url, channel, hash)
    }

    /// `GET index.txt`: every channel the server publishes.
    pub async fn fetch_channel_index(&self) -> UpdaterResult<Vec<String>> {
        info!("Downloading channel index...");
        let lines = self
            .fetch_lines(&self.index_url(), FetchStage::ChannelIndex)
            .await?;
        debug!("Channel index has {} lines", lines.len());
        Ok(lines)
    }

    /// `GET versions/{channel}/{role}.txt`: raw manifest lines.
    pub async fn fetch_manifest(&self, channel: &str, role: Role) -> UpdaterResult<Vec<String>> {
        info!("Downloading {} {} manifest...", channel, role);
        let lines = self
            .fetch_lines(&self.manifest_url(channel, role), FetchStage::Manifest)
            .await?;
        debug!("Manifest has {} lines", lines.len());
        Ok(lines)
    }

    /// Split on `\n` only; a trailing `\r` stays part of the line.
    async fn fetch_lines(&self, url: &str, stage: FetchStage) -> UpdaterResult<Vec<String>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdaterError::network(stage, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::network(
                stage,
                format!("{url} returned HTTP {}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpdaterError::network(stage, e))?;
        Ok(body.split('\n').map(str::to_string).collect())
    }
}

/// The channel must appear verbatim in the fetched index.
pub fn validate_channel(channel: &str, valid_channels: &[String]) -> UpdaterResult<()> {
    if valid_channels.iter().any(|c| c == channel) {
        return Ok(());
    }
    Err(UpdaterError::UnknownChannel {
        channel: channel.to_string(),
        valid_channels: valid_channels
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(base: &str) -> UpdateServer {
        UpdateServer::new(Client::new(), base)
    }

    #[test]
    fn urls_ignore_trailing_slash() {
        let a = server("http://example.com/dmp/updater/");
        let b = server("http://example.com/dmp/updater");
        assert_eq!(a.index_url(), "http://example.com/dmp/updater/index.txt");
        assert_eq!(a.index_url(), b.index_url());
        assert_eq!(
            a.manifest_url("release", Role::Server),
            "http://example.com/dmp/updater/versions/release/server.txt"
        );
        assert_eq!(
            b.object_url("dev", "abc"),
            "http://example.com/dmp/updater/versions/dev/objects/abc"
        );
    }

    #[test]
    fn channel_must_match_verbatim() {
        let valid = vec!["release".to_string(), "dev".to_string(), String::new()];
        assert!(validate_channel("dev", &valid).is_ok());

        match validate_channel("Dev", &valid).unwrap_err() {
            UpdaterError::UnknownChannel {
                channel,
                valid_channels,
            } => {
                assert_eq!(channel, "Dev");
                assert_eq!(valid_channels, vec!["release", "dev"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
