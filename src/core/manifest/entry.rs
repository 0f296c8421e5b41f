// ─── Manifest Entries ───
// `path=hash` lines describing every file an installation must contain.

use std::path::{Component, Path, PathBuf};

/// One file the installation must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// `/`-separated path relative to the install root.
    pub path: String,
    /// Lowercase hex SHA-256 of the expected content.
    pub hash: String,
}

impl ManifestEntry {
    /// Parse a single manifest line, splitting on the last `=`.
    ///
    /// Returns `None` for lines without a separator. The hash side is trimmed
    /// and lowercased; the path is kept as written.
    pub fn parse(line: &str) -> Option<Self> {
        let (path, hash) = line.rsplit_once('=')?;
        Some(Self {
            path: path.to_string(),
            hash: hash.trim().to_ascii_lowercase(),
        })
    }

    /// Parent directory portion of the path, if the path has one.
    pub fn parent_dir(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(dir, _)| dir)
    }

    /// Resolve the entry under `root`, refusing anything that would escape it.
    pub fn local_path(&self, root: &Path) -> Option<PathBuf> {
        let relative = Path::new(&self.path);
        if self.path.is_empty() {
            return None;
        }
        let mut out = root.to_path_buf();
        for component in relative.components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (out != root).then_some(out)
    }
}

/// Parse raw manifest lines, silently skipping those without `=`.
pub fn parse_manifest<S: AsRef<str>>(lines: &[S]) -> Vec<ManifestEntry> {
    lines
        .iter()
        .filter_map(|line| ManifestEntry::parse(line.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_entry() {
        let entry = ManifestEntry::parse("a/b/c.dat=deadbeef").unwrap();
        assert_eq!(entry.path, "a/b/c.dat");
        assert_eq!(entry.hash, "deadbeef");
        assert_eq!(entry.parent_dir(), Some("a/b"));
    }

    #[test]
    fn splits_on_last_separator() {
        let entry = ManifestEntry::parse("GameData/key=value.cfg=ABCDEF\r").unwrap();
        assert_eq!(entry.path, "GameData/key=value.cfg");
        assert_eq!(entry.hash, "abcdef");
    }

    #[test]
    fn lines_without_separator_are_skipped() {
        let lines = ["# comment", "", "readme.txt=00ff", "junk"];
        let entries = parse_manifest(&lines);
        assert_eq!(
            entries,
            vec![ManifestEntry {
                path: "readme.txt".into(),
                hash: "00ff".into()
            }]
        );
        assert_eq!(entries[0].parent_dir(), None);
    }

    #[test]
    fn local_path_stays_under_root() {
        let root = Path::new("/srv/ksp");
        let ok = ManifestEntry::parse("GameData/DMP/Plugins/a.dll=00").unwrap();
        assert_eq!(
            ok.local_path(root).unwrap(),
            root.join("GameData").join("DMP").join("Plugins").join("a.dll")
        );

        for bad in ["../outside.txt=00", "/etc/passwd=00", "a/../../b=00", "=00"] {
            let entry = ManifestEntry::parse(bad).unwrap();
            assert!(entry.local_path(root).is_none(), "{bad} should be refused");
        }
    }
}
