use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::core::error::{UpdaterError, UpdaterResult};

const READ_CHUNK: usize = 64 * 1024;

/// Sequential, SHA-256 validated object downloader.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Stream `url` into a freshly created file at `dest`.
    ///
    /// The digest is computed while writing and must equal `sha256_expected`.
    /// Returns the number of bytes written.
    pub async fn download_object(
        &self,
        url: &str,
        dest: &Path,
        sha256_expected: &str,
    ) -> UpdaterResult<u64> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut hasher = Sha256::new();
        let mut written = 0u64;
        {
            let mut file =
                tokio::fs::File::create(dest)
                    .await
                    .map_err(|source| UpdaterError::Io {
                        path: dest.to_path_buf(),
                        source,
                    })?;

            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                hasher.update(&chunk);
                file.write_all(&chunk)
                    .await
                    .map_err(|source| UpdaterError::Io {
                        path: dest.to_path_buf(),
                        source,
                    })?;
                written += chunk.len() as u64;
            }

            file.flush().await.map_err(|source| UpdaterError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
            // handle dropped before the digest check
        }

        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(sha256_expected) {
            return Err(UpdaterError::HashMismatch {
                path: dest.to_path_buf(),
                expected: sha256_expected.to_string(),
                actual,
            });
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }

    /// Lowercase hex SHA-256 of a local file, read in chunks.
    pub async fn file_sha256(path: &Path) -> UpdaterResult<String> {
        let io_err = |source| UpdaterError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::open(path).await.map_err(io_err)?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).await.map_err(io_err)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Whether the file at `path` is absent or hashes to something else.
    pub async fn needs_update(path: &Path, sha256_expected: &str) -> UpdaterResult<bool> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(source) => {
                return Err(UpdaterError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
        let actual = Self::file_sha256(path).await?;
        Ok(!actual.eq_ignore_ascii_case(sha256_expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[tokio::test]
    async fn hashes_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();
        assert_eq!(Downloader::file_sha256(&path).await.unwrap(), HELLO_SHA256);
    }

    #[tokio::test]
    async fn missing_or_changed_files_need_update() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        assert!(Downloader::needs_update(&path, HELLO_SHA256).await.unwrap());

        tokio::fs::write(&path, b"hello").await.unwrap();
        assert!(!Downloader::needs_update(&path, HELLO_SHA256).await.unwrap());
        assert!(!Downloader::needs_update(&path, &HELLO_SHA256.to_uppercase())
            .await
            .unwrap());

        tokio::fs::write(&path, b"hello!").await.unwrap();
        assert!(Downloader::needs_update(&path, HELLO_SHA256).await.unwrap());
    }
}
