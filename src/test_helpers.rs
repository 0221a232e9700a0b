//! Shared test utilities for the release-site test suite.
//!
//! Lookup helpers and bulk extractors over the assembled build model, plus a
//! builder for on-disk release trees.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let builds = assemble(&repo, &history, None).unwrap();
//! let build = find_build(&builds, "1.0.1.b2.cbbb");
//! assert_eq!(commit_messages(build), vec!["Fix crash"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::types::Build;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a release root in a temp directory from `release/variant/file` paths.
///
/// Each file's contents are its own path, so sizes are predictable.
pub fn release_tree(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for rel in paths {
        write_file(tmp.path(), rel);
    }
    tmp
}

pub fn write_file(root: &Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, rel).unwrap();
}

// =========================================================================
// Model lookups — panics with a clear message on miss
// =========================================================================

/// Find a build by version string. Panics if not found.
pub fn find_build<'a>(builds: &'a [Build], version: &str) -> &'a Build {
    builds
        .iter()
        .find(|b| b.version == version)
        .unwrap_or_else(|| {
            let versions = build_versions(builds);
            panic!("build '{version}' not found. Available: {versions:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All build versions in model order.
pub fn build_versions(builds: &[Build]) -> Vec<&str> {
    builds.iter().map(|b| b.version.as_str()).collect()
}

/// All file names of a build in order.
pub fn file_names(build: &Build) -> Vec<&str> {
    build.files.iter().map(|f| f.name.as_str()).collect()
}

/// All commit messages of a build in order.
pub fn commit_messages(build: &Build) -> Vec<&str> {
    build.commits.iter().map(|c| c.message.as_str()).collect()
}
