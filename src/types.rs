//! The build model handed from assembly to rendering.
//!
//! All of these are plain data: built once during a run, never mutated
//! afterwards, and serializable so `check --json` can dump the model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Digest algorithms that may have a sidecar file next to an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 6] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Sidecar name for an artifact: `foo.zip` → `foo.zip.sha256sum`.
    pub fn sidecar_name(self, artifact: &str) -> String {
        format!("{}.{}sum", artifact, self.as_str())
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A downloadable artifact inside one variant of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Variant directory the artifact lives in (device, flavor, ...)
    pub variant: String,
    /// `<release>/<variant>/<file>`, relative to the release root
    pub path: String,
    pub name: String,
    pub size: u64,
    /// Algorithm → sidecar path relative to the release root. Only sidecars
    /// that exist are listed.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<ChecksumAlgorithm, String>,
}

/// One commit in a build's changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub id: String,
    pub short_id: String,
    /// First line of the commit subject
    pub message: String,
}

impl CommitEntry {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        let id = id.into();
        let short_id = id.chars().take(7).collect();
        Self {
            id,
            short_id,
            message: message.into(),
        }
    }
}

/// One published release with its files and changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub version: String,
    /// Commit date as rendered by the history backend, kept verbatim
    pub timestamp: String,
    /// Sorted by `(variant, name)`
    pub files: Vec<FileEntry>,
    /// Empty only for the oldest release
    pub commits: Vec<CommitEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_first_seven_chars() {
        let c = CommitEntry::new("0123456789abcdef", "Fix things");
        assert_eq!(c.short_id, "0123456");
        assert_eq!(c.message, "Fix things");
    }

    #[test]
    fn short_id_of_short_ref_is_whole_ref() {
        assert_eq!(CommitEntry::new("abc", "x").short_id, "abc");
    }

    #[test]
    fn sidecar_name_appends_algorithm() {
        assert_eq!(
            ChecksumAlgorithm::Sha256.sidecar_name("foo.zip"),
            "foo.zip.sha256sum"
        );
        assert_eq!(ChecksumAlgorithm::Md5.sidecar_name("a"), "a.md5sum");
    }

    #[test]
    fn checksums_serialize_with_algorithm_names() {
        let mut checksums = BTreeMap::new();
        checksums.insert(ChecksumAlgorithm::Sha512, "r/v/f.sha512sum".to_string());
        checksums.insert(ChecksumAlgorithm::Md5, "r/v/f.md5sum".to_string());
        let file = FileEntry {
            variant: "v".to_string(),
            path: "r/v/f".to_string(),
            name: "f".to_string(),
            size: 3,
            checksums,
        };

        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["checksums"]["md5"], "r/v/f.md5sum");
        assert_eq!(json["checksums"]["sha512"], "r/v/f.sha512sum");

        let back: FileEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, file);
    }
}
