// ─── Reconciler ───
// Makes the install directory match a manifest: verify every listed file,
// download whatever is missing or stale. Files not in the manifest are left
// alone.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::core::downloader::Downloader;
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::manifest::{ManifestEntry, UpdateServer};

/// Progress notifications emitted while reconciling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent<'a> {
    UpToDate { path: &'a str },
    Downloading { path: &'a str },
    Downloaded { path: &'a str, bytes: u64 },
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries whose local hash already matched.
    pub verified: usize,
    /// Entries fetched from the object store.
    pub downloaded: usize,
    pub bytes_written: u64,
}

pub struct Reconciler<'a> {
    server: &'a UpdateServer,
    downloader: Downloader,
    channel: &'a str,
    install_root: &'a Path,
}

impl<'a> Reconciler<'a> {
    pub fn new(server: &'a UpdateServer, channel: &'a str, install_root: &'a Path) -> Self {
        Self {
            server,
            downloader: Downloader::new(server.client().clone()),
            channel,
            install_root,
        }
    }

    /// Walk the manifest in order. The first failing entry aborts the run.
    pub async fn reconcile<F>(
        &self,
        manifest: &[ManifestEntry],
        mut on_event: F,
    ) -> UpdaterResult<SyncReport>
    where
        F: FnMut(&SyncEvent<'_>),
    {
        info!(
            "Reconciling {} entries against {:?}",
            manifest.len(),
            self.install_root
        );
        let mut report = SyncReport::default();

        for entry in manifest {
            match self.sync_entry(entry, &mut on_event).await? {
                Some(bytes) => {
                    report.downloaded += 1;
                    report.bytes_written += bytes;
                }
                None => report.verified += 1,
            }
        }

        info!(
            "Reconciled: {} verified, {} downloaded",
            report.verified, report.downloaded
        );
        Ok(report)
    }

    /// Returns `Some(bytes)` when the entry was downloaded.
    async fn sync_entry<F>(
        &self,
        entry: &ManifestEntry,
        on_event: &mut F,
    ) -> UpdaterResult<Option<u64>>
    where
        F: FnMut(&SyncEvent<'_>),
    {
        let fail = |cause: &dyn std::fmt::Display| UpdaterError::file_sync(&entry.path, cause);

        let target = entry
            .local_path(self.install_root)
            .ok_or_else(|| fail(&"path escapes the install directory"))?;

        if let Some(dir) = entry.parent_dir() {
            ensure_dir_tree(self.install_root, Path::new(dir))
                .await
                .map_err(|e| fail(&e))?;
        }

        if !Downloader::needs_update(&target, &entry.hash)
            .await
            .map_err(|e| fail(&e))?
        {
            debug!("Up to date: {}", entry.path);
            on_event(&SyncEvent::UpToDate { path: &entry.path });
            return Ok(None);
        }

        on_event(&SyncEvent::Downloading { path: &entry.path });
        remove_existing(&target).await.map_err(|e| fail(&e))?;

        let url = self.server.object_url(self.channel, &entry.hash);
        let bytes = self
            .downloader
            .download_object(&url, &target, &entry.hash)
            .await
            .map_err(|e| fail(&e))?;

        on_event(&SyncEvent::Downloaded {
            path: &entry.path,
            bytes,
        });
        Ok(Some(bytes))
    }
}

/// Create every missing directory of `relative` under `root`, outermost first.
///
/// Existing directories are left untouched. Returns the directories created.
pub async fn ensure_dir_tree(root: &Path, relative: &Path) -> UpdaterResult<Vec<PathBuf>> {
    let mut current = root.to_path_buf();
    let mut created = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => current.push(part),
            Component::CurDir => continue,
            _ => {
                return Err(UpdaterError::Io {
                    path: relative.to_path_buf(),
                    source: std::io::Error::new(
                        ErrorKind::InvalidInput,
                        "directory must be relative to the install root",
                    ),
                })
            }
        }

        match tokio::fs::metadata(&current).await {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => {
                return Err(UpdaterError::Io {
                    path: current,
                    source: std::io::Error::new(
                        ErrorKind::AlreadyExists,
                        "a file is in the way of a directory",
                    ),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(UpdaterError::Io {
                    path: current,
                    source,
                })
            }
        }

        match tokio::fs::create_dir(&current).await {
            Ok(()) => {
                debug!("Created directory {:?}", current);
                created.push(current.clone());
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(source) => {
                return Err(UpdaterError::Io {
                    path: current,
                    source,
                })
            }
        }
    }

    Ok(created)
}

async fn remove_existing(path: &Path) -> UpdaterResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(UpdaterError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_missing_directories_outermost_first() {
        let root = TempDir::new().unwrap();
        let created = ensure_dir_tree(root.path(), Path::new("x/y")).await.unwrap();
        assert_eq!(
            created,
            vec![root.path().join("x"), root.path().join("x").join("y")]
        );
        assert!(root.path().join("x/y").is_dir());
    }

    #[tokio::test]
    async fn existing_directories_are_untouched() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("GameData/DMP")).unwrap();
        std::fs::write(root.path().join("GameData/DMP/keep.txt"), b"keep").unwrap();

        let created = ensure_dir_tree(root.path(), Path::new("GameData/DMP/Plugins"))
            .await
            .unwrap();
        assert_eq!(created, vec![root.path().join("GameData/DMP/Plugins")]);
        assert_eq!(
            std::fs::read(root.path().join("GameData/DMP/keep.txt")).unwrap(),
            b"keep"
        );

        let again = ensure_dir_tree(root.path(), Path::new("GameData/DMP/Plugins"))
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn file_in_the_way_is_an_error() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("x"), b"not a dir").unwrap();
        let err = ensure_dir_tree(root.path(), Path::new("x/y")).await.unwrap_err();
        assert!(matches!(err, UpdaterError::Io { .. }));
    }

    #[tokio::test]
    async fn remove_existing_ignores_missing_files() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("gone.txt");
        remove_existing(&path).await.unwrap();
        std::fs::write(&path, b"x").unwrap();
        remove_existing(&path).await.unwrap();
        assert!(!path.exists());
    }
}
