//! Release version identifiers.
//!
//! Every release directory is named after the build that produced it:
//!
//! ```text
//! MAJOR.MINOR.PATCH.bBUILD.cCOMMIT
//! 9.3.0.b2174.g1a2b3c4
//! ```
//!
//! The fourth field carries a one-character tag in front of the build number
//! and the fifth a one-character tag in front of the commit ref. Tags are
//! stripped before parsing but remembered so the canonical string form keeps
//! them.
//!
//! ## Ordering
//!
//! [`VersionKey`] orders by `(major, minor, patch, build)` only. The commit ref
//! takes no part in equality, ordering or hashing: two keys that differ only
//! in their commit ref are equal. Directory names double as the release order,
//! so filesystem mtimes are never consulted.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed version '{raw}': expected 5 dot-separated fields, found {found}")]
    TooFewFields { raw: String, found: usize },
    #[error("Malformed version '{raw}': {field} field '{value}' is not a valid integer")]
    InvalidNumber {
        raw: String,
        field: &'static str,
        value: String,
    },
    #[error("Malformed version '{raw}': empty commit ref")]
    EmptyCommitRef { raw: String },
    #[error("Malformed version '{raw}': commit ref '{commit_ref}' starts with '-'")]
    OptionLikeCommitRef { raw: String, commit_ref: String },
}

/// A parsed, totally ordered release version.
#[derive(Debug, Clone)]
pub struct VersionKey {
    major: u64,
    minor: u64,
    patch: u64,
    build: u64,
    build_tag: char,
    commit_tag: char,
    commit_ref: String,
    /// Name exactly as found on disk. Needed to address the release
    /// directory when the canonical form differs (leading zeros).
    raw: String,
}

impl VersionKey {
    /// Parse `MAJOR.MINOR.PATCH.bBUILD.cREF`.
    ///
    /// The string is split into at most five fields, so the commit ref keeps
    /// anything after the fourth dot verbatim.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let fields: Vec<&str> = raw.splitn(5, '.').collect();
        if fields.len() < 5 {
            return Err(VersionError::TooFewFields {
                raw: raw.to_string(),
                found: fields.len(),
            });
        }

        let number = |field: &'static str, value: &str| {
            value.parse::<u64>().map_err(|_| VersionError::InvalidNumber {
                raw: raw.to_string(),
                field,
                value: value.to_string(),
            })
        };

        let (build_tag, build) = split_tag(fields[3]);
        let (commit_tag, commit_ref) = split_tag(fields[4]);

        if commit_ref.is_empty() {
            return Err(VersionError::EmptyCommitRef {
                raw: raw.to_string(),
            });
        }
        // Refs are handed to the history backend as arguments
        if commit_ref.starts_with('-') {
            return Err(VersionError::OptionLikeCommitRef {
                raw: raw.to_string(),
                commit_ref: commit_ref.to_string(),
            });
        }

        Ok(Self {
            major: number("major", fields[0])?,
            minor: number("minor", fields[1])?,
            patch: number("patch", fields[2])?,
            build: number("build", build)?,
            build_tag: build_tag.unwrap_or('b'),
            commit_tag: commit_tag.unwrap_or('c'),
            commit_ref: commit_ref.to_string(),
            raw: raw.to_string(),
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn build(&self) -> u64 {
        self.build
    }

    /// Source-control revision that produced this release.
    pub fn commit_ref(&self) -> &str {
        &self.commit_ref
    }

    /// The release directory name this key was parsed from.
    pub fn dir_name(&self) -> &str {
        &self.raw
    }

    fn sort_key(&self) -> (u64, u64, u64, u64) {
        (self.major, self.minor, self.patch, self.build)
    }
}

/// Split off the leading tag character of a field.
fn split_tag(field: &str) -> (Option<char>, &str) {
    let mut chars = field.chars();
    match chars.next() {
        Some(tag) => (Some(tag), chars.as_str()),
        None => (None, field),
    }
}

impl FromStr for VersionKey {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form: numbers without leading zeros, tags and commit ref kept.
impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}{}.{}{}",
            self.major,
            self.minor,
            self.patch,
            self.build_tag,
            self.build,
            self.commit_tag,
            self.commit_ref
        )
    }
}

impl PartialEq for VersionKey {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for VersionKey {}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl Hash for VersionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}
