//! Release tree discovery.
//!
//! The release root is a directory tree that acts as the database for the
//! whole site:
//!
//! ```text
//! files/                                   # Release root
//! ├── 9.3.0.b2174.g1a2b3c4/                # One directory per release
//! │   ├── patcher/                         # Variant
//! │   │   ├── patcher-9.3.0.zip            # Artifact
//! │   │   ├── patcher-9.3.0.zip.md5sum     # Checksum sidecar
//! │   │   └── patcher-9.3.0.zip.sha256sum
//! │   └── utilities/
//! │       └── utilities-9.3.0.zip
//! ├── 9.2.0.b2100.g0f9e8d7/
//! │   └── ...
//! └── README.txt                           # Not a directory: skipped
//! ```
//!
//! Access to the tree goes through [`ReleaseRepository`] so the scanning
//! rules below can run against an in-memory tree in tests. The rules:
//!
//! - every directory in the root must be named by a valid [`VersionKey`];
//!   anything else that is not a directory is skipped and reported
//! - a file is a checksum sidecar when its extension ends in `sum`; sidecars
//!   never become [`FileEntry`] values, they only fill in `checksums` of the
//!   artifact they sit next to
//! - files are returned sorted by `(variant, name)`

use crate::types::{ChecksumAlgorithm, FileEntry};
use crate::version::{VersionError, VersionKey};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    MalformedVersion(#[from] VersionError),
}

/// An immediate child of the release root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    pub name: String,
    pub is_dir: bool,
}

/// A plain file inside a variant directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
}

/// Read access to a release tree.
///
/// Paths passed in are names relative to the release root, joined with `/`.
pub trait ReleaseRepository: Sync {
    /// Whether the release root exists at all.
    fn exists(&self) -> bool;

    /// Immediate children of the release root.
    fn entries(&self) -> Result<Vec<RootEntry>, ScanError>;

    /// Variant names inside a release directory.
    fn variants(&self, release: &str) -> Result<Vec<String>, ScanError>;

    /// Files inside a variant directory.
    fn files(&self, release: &str, variant: &str) -> Result<Vec<StoredFile>, ScanError>;

    /// Whether a file exists at `rel_path`.
    fn contains(&self, rel_path: &str) -> bool;
}

/// A release tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsReleaseRepository {
    root: PathBuf,
}

impl FsReleaseRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ReleaseRepository for FsReleaseRepository {
    fn exists(&self) -> bool {
        self.root.exists()
    }

    fn entries(&self) -> Result<Vec<RootEntry>, ScanError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            entries.push(RootEntry {
                name: entry_name(&path),
                is_dir: path.is_dir(),
            });
        }
        Ok(entries)
    }

    fn variants(&self, release: &str) -> Result<Vec<String>, ScanError> {
        let mut variants = Vec::new();
        for entry in fs::read_dir(self.root.join(release))? {
            variants.push(entry_name(&entry?.path()));
        }
        Ok(variants)
    }

    fn files(&self, release: &str, variant: &str) -> Result<Vec<StoredFile>, ScanError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(self.root.join(release).join(variant))? {
            let entry = entry?;
            let metadata = fs::metadata(entry.path())?;
            if metadata.is_dir() {
                continue;
            }
            files.push(StoredFile {
                name: entry_name(&entry.path()),
                size: metadata.len(),
            });
        }
        Ok(files)
    }

    fn contains(&self, rel_path: &str) -> bool {
        self.root.join(rel_path).is_file()
    }
}

/// Releases found in the root, newest first, plus the names that were skipped.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub versions: Vec<VersionKey>,
    pub skipped: Vec<String>,
}

/// List every release in the root, sorted newest first.
///
/// Non-directory entries are skipped and reported in [`Discovery::skipped`].
/// A directory whose name is not a valid version fails the whole scan.
pub fn discover_releases(repo: &impl ReleaseRepository) -> Result<Discovery, ScanError> {
    let mut entries = repo.entries()?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut discovery = Discovery::default();
    for entry in entries {
        if !entry.is_dir {
            discovery.skipped.push(entry.name);
            continue;
        }
        discovery.versions.push(VersionKey::parse(&entry.name)?);
    }

    discovery.versions.sort_by(|a, b| b.cmp(a));
    Ok(discovery)
}

/// Collect the artifacts of one release with their checksum sidecars.
pub fn scan_release_files(
    repo: &impl ReleaseRepository,
    version: &VersionKey,
) -> Result<Vec<FileEntry>, ScanError> {
    let release = version.dir_name();
    let mut files = Vec::new();

    for variant in repo.variants(release)? {
        for stored in repo.files(release, &variant)? {
            if is_checksum_sidecar(&stored.name) {
                continue;
            }

            let path = format!("{}/{}/{}", release, variant, stored.name);
            let checksums: BTreeMap<ChecksumAlgorithm, String> = ChecksumAlgorithm::ALL
                .iter()
                .map(|algo| (*algo, algo.sidecar_name(&path)))
                .filter(|(_, sidecar)| repo.contains(sidecar))
                .collect();

            files.push(FileEntry {
                variant: variant.clone(),
                path,
                name: stored.name,
                size: stored.size,
                checksums,
            });
        }
    }

    files.sort_by(|a, b| (&a.variant, &a.name).cmp(&(&b.variant, &b.name)));
    Ok(files)
}

/// `foo.zip.md5sum`, `foo.sum` → true; `foo.zip`, `.md5sum`, `checksum` → false.
fn is_checksum_sidecar(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().ends_with("sum"))
        .unwrap_or(false)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::io;
    use tempfile::TempDir;

    /// In-memory release tree: release → variant → files.
    #[derive(Debug, Default)]
    pub struct MemoryRepository {
        pub missing: bool,
        pub stray_files: Vec<String>,
        pub releases: BTreeMap<String, BTreeMap<String, Vec<StoredFile>>>,
    }

    impl MemoryRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn missing() -> Self {
            Self {
                missing: true,
                ..Self::default()
            }
        }

        /// Add a file, creating its release and variant on the way.
        pub fn with_file(mut self, release: &str, variant: &str, name: &str, size: u64) -> Self {
            self.releases
                .entry(release.to_string())
                .or_default()
                .entry(variant.to_string())
                .or_default()
                .push(StoredFile {
                    name: name.to_string(),
                    size,
                });
            self
        }

        pub fn with_stray_file(mut self, name: &str) -> Self {
            self.stray_files.push(name.to_string());
            self
        }

        fn not_found(path: &str) -> ScanError {
            ScanError::Io(io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }
    }

    impl ReleaseRepository for MemoryRepository {
        fn exists(&self) -> bool {
            !self.missing
        }

        fn entries(&self) -> Result<Vec<RootEntry>, ScanError> {
            if self.missing {
                return Err(Self::not_found("."));
            }
            let dirs = self.releases.keys().map(|name| RootEntry {
                name: name.clone(),
                is_dir: true,
            });
            let files = self.stray_files.iter().map(|name| RootEntry {
                name: name.clone(),
                is_dir: false,
            });
            Ok(dirs.chain(files).collect())
        }

        fn variants(&self, release: &str) -> Result<Vec<String>, ScanError> {
            self.releases
                .get(release)
                .map(|variants| variants.keys().cloned().collect())
                .ok_or_else(|| Self::not_found(release))
        }

        fn files(&self, release: &str, variant: &str) -> Result<Vec<StoredFile>, ScanError> {
            self.releases
                .get(release)
                .and_then(|variants| variants.get(variant))
                .cloned()
                .ok_or_else(|| Self::not_found(&format!("{release}/{variant}")))
        }

        fn contains(&self, rel_path: &str) -> bool {
            let mut parts = rel_path.splitn(3, '/');
            let (Some(release), Some(variant), Some(name)) =
                (parts.next(), parts.next(), parts.next())
            else {
                return false;
            };
            self.releases
                .get(release)
                .and_then(|variants| variants.get(variant))
                .is_some_and(|files| files.iter().any(|f| f.name == name))
        }
    }

    fn names(files: &[FileEntry]) -> Vec<(&str, &str)> {
        files
            .iter()
            .map(|f| (f.variant.as_str(), f.name.as_str()))
            .collect()
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    #[test]
    fn discovers_releases_newest_first() {
        let repo = MemoryRepository::new()
            .with_file("1.0.0.b1.caaa", "main", "a.zip", 1)
            .with_file("1.0.10.b3.cccc", "main", "c.zip", 1)
            .with_file("1.0.2.b2.cbbb", "main", "b.zip", 1);

        let discovery = discover_releases(&repo).unwrap();
        let refs: Vec<&str> = discovery.versions.iter().map(|v| v.commit_ref()).collect();
        assert_eq!(refs, vec!["ccc", "bbb", "aaa"]);
        assert!(discovery.skipped.is_empty());
    }

    #[test]
    fn non_directories_are_skipped() {
        let repo = MemoryRepository::new()
            .with_file("1.0.0.b1.caaa", "main", "a.zip", 1)
            .with_stray_file("README.txt")
            .with_stray_file("index.html");

        let discovery = discover_releases(&repo).unwrap();
        assert_eq!(discovery.versions.len(), 1);
        assert_eq!(discovery.skipped, vec!["README.txt", "index.html"]);
    }

    #[test]
    fn malformed_directory_name_is_error() {
        let repo = MemoryRepository::new()
            .with_file("1.0.0.b1.caaa", "main", "a.zip", 1)
            .with_file("backup", "main", "a.zip", 1);

        let result = discover_releases(&repo);
        assert!(matches!(result, Err(ScanError::MalformedVersion(_))));
    }

    // =========================================================================
    // File scanning
    // =========================================================================

    #[test]
    fn checksum_discovery_records_only_existing_sidecars() {
        let release = "1.0.0.b1.caaa";
        let repo = MemoryRepository::new()
            .with_file(release, "main", "foo.zip", 100)
            .with_file(release, "main", "foo.zip.md5sum", 40)
            .with_file(release, "main", "foo.zip.sha256sum", 80);
        let version = VersionKey::parse(release).unwrap();

        let files = scan_release_files(&repo, &version).unwrap();
        assert_eq!(files.len(), 1);

        let algos: Vec<ChecksumAlgorithm> = files[0].checksums.keys().copied().collect();
        assert_eq!(
            algos,
            vec![ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha256]
        );
        assert_eq!(
            files[0].checksums[&ChecksumAlgorithm::Md5],
            "1.0.0.b1.caaa/main/foo.zip.md5sum"
        );
    }

    #[test]
    fn sidecars_never_become_entries() {
        let release = "1.0.0.b1.caaa";
        let repo = MemoryRepository::new()
            .with_file(release, "main", "foo.zip.md5sum", 40)
            .with_file(release, "main", "orphan.sha1sum", 40)
            .with_file(release, "main", "notes.sum", 1);
        let version = VersionKey::parse(release).unwrap();

        let files = scan_release_files(&repo, &version).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn files_sorted_by_variant_then_name() {
        let release = "1.0.0.b1.caaa";
        let repo = MemoryRepository::new()
            .with_file(release, "utilities", "b.zip", 1)
            .with_file(release, "patcher", "z.apk", 1)
            .with_file(release, "patcher", "a.zip", 1)
            .with_file(release, "utilities", "a.zip", 1);
        let version = VersionKey::parse(release).unwrap();

        let files = scan_release_files(&repo, &version).unwrap();
        assert_eq!(
            names(&files),
            vec![
                ("patcher", "a.zip"),
                ("patcher", "z.apk"),
                ("utilities", "a.zip"),
                ("utilities", "b.zip"),
            ]
        );
    }

    #[test]
    fn file_paths_are_relative_to_root() {
        let release = "1.0.0.b1.caaa";
        let repo = MemoryRepository::new().with_file(release, "main", "foo.zip", 7);
        let version = VersionKey::parse(release).unwrap();

        let files = scan_release_files(&repo, &version).unwrap();
        assert_eq!(files[0].path, "1.0.0.b1.caaa/main/foo.zip");
        assert_eq!(files[0].size, 7);
    }

    #[test]
    fn sidecar_detection() {
        assert!(is_checksum_sidecar("foo.zip.md5sum"));
        assert!(is_checksum_sidecar("foo.sha512sum"));
        assert!(is_checksum_sidecar("foo.sum"));
        assert!(!is_checksum_sidecar("foo.zip"));
        assert!(!is_checksum_sidecar("checksum"));
        assert!(!is_checksum_sidecar(".md5sum"));
        assert!(!is_checksum_sidecar("foo.sums.zip"));
    }

    // =========================================================================
    // Filesystem repository
    // =========================================================================

    fn write_file(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn fs_repository_scans_real_tree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(&root.join("2.0.0.b5.cbbb/patcher/p.zip"), b"12345");
        write_file(&root.join("2.0.0.b5.cbbb/patcher/p.zip.sha1sum"), b"x");
        write_file(&root.join("1.0.0.b1.caaa/patcher/p.zip"), b"1");
        write_file(&root.join("stray.txt"), b"");

        let repo = FsReleaseRepository::new(root);
        let discovery = discover_releases(&repo).unwrap();
        assert_eq!(discovery.skipped, vec!["stray.txt"]);
        assert_eq!(discovery.versions[0].to_string(), "2.0.0.b5.cbbb");

        let files = scan_release_files(&repo, &discovery.versions[0]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 5);
        assert_eq!(
            files[0].checksums[&ChecksumAlgorithm::Sha1],
            "2.0.0.b5.cbbb/patcher/p.zip.sha1sum"
        );
    }

    #[test]
    fn fs_repository_uses_raw_directory_name() {
        let tmp = TempDir::new().unwrap();
        write_file(&tmp.path().join("01.0.0.b1.caaa/main/a.zip"), b"a");

        let repo = FsReleaseRepository::new(tmp.path());
        let discovery = discover_releases(&repo).unwrap();
        let files = scan_release_files(&repo, &discovery.versions[0]).unwrap();
        assert_eq!(files[0].path, "01.0.0.b1.caaa/main/a.zip");
    }

    #[test]
    fn fs_repository_missing_root() {
        let tmp = TempDir::new().unwrap();
        let repo = FsReleaseRepository::new(tmp.path().join("files"));
        assert!(!repo.exists());
        assert!(matches!(discover_releases(&repo), Err(ScanError::Io(_))));
    }

    #[test]
    fn fs_repository_unreadable_variant_is_error() {
        let tmp = TempDir::new().unwrap();
        // A plain file where a variant directory is expected
        write_file(&tmp.path().join("1.0.0.b1.caaa/notes.txt"), b"");

        let repo = FsReleaseRepository::new(tmp.path());
        let version = VersionKey::parse("1.0.0.b1.caaa").unwrap();
        assert!(matches!(
            scan_release_files(&repo, &version),
            Err(ScanError::Io(_))
        ));
    }
}
