//! Build model assembly.
//!
//! Combines the release tree and the commit history into the ordered list of
//! [`Build`] records the renderer consumes:
//!
//! ```text
//! releases/  ──discover──►  [v3, v2, v1]   (newest first)
//!                              │
//!             for each vN:  timestamp(vN.commit)
//!                           files(vN)
//!                           commits(vN-1.commit .. vN.commit)   (none for v1)
//!                              │
//!                              ▼
//!                        [Build v3, Build v2, Build v1]
//! ```
//!
//! The commit log of a release is the history between it and the release
//! immediately older by *version order*, never by timestamp.
//!
//! ## Parallelism
//!
//! Releases are independent once the sorted order is known, so they are
//! assembled on the rayon pool. The indexed parallel iterator collects into
//! `Result<Vec<_>, _>`, which keeps newest-first order regardless of which
//! worker finishes first and stops at the first error. No partial model is
//! ever returned.

use crate::history::{HistoryBackend, HistoryError, resolve_commit_range, resolve_timestamp};
use crate::releases::{ReleaseRepository, ScanError, discover_releases, scan_release_files};
use crate::types::Build;
use crate::version::VersionKey;
use rayon::prelude::*;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Progress reported while assembling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleEvent {
    /// A non-directory entry in the release root was ignored.
    ReleaseSkipped { name: String },
    /// A release finished assembling.
    BuildAssembled {
        version: String,
        timestamp: String,
        file_count: usize,
        commit_count: usize,
    },
}

/// Assemble every release under the repository root, newest first.
///
/// A missing root means nothing has been published yet and yields an empty
/// list. Any scan or history failure aborts the whole assembly.
pub fn assemble(
    repo: &impl ReleaseRepository,
    history: &impl HistoryBackend,
    events: Option<Sender<AssembleEvent>>,
) -> Result<Vec<Build>, AssembleError> {
    if !repo.exists() {
        return Ok(Vec::new());
    }

    let discovery = discover_releases(repo)?;
    if let Some(tx) = &events {
        for name in discovery.skipped {
            tx.send(AssembleEvent::ReleaseSkipped { name }).ok();
        }
    }

    let versions = &discovery.versions;
    (0..versions.len())
        .into_par_iter()
        .map(|i| -> Result<Build, AssembleError> {
            let build = assemble_build(repo, history, &versions[i], versions.get(i + 1))?;
            if let Some(tx) = &events {
                tx.send(AssembleEvent::BuildAssembled {
                    version: build.version.clone(),
                    timestamp: build.timestamp.clone(),
                    file_count: build.files.len(),
                    commit_count: build.commits.len(),
                })
                .ok();
            }
            Ok(build)
        })
        .collect()
}

/// Assemble one release. `previous` is the next older release, if any.
fn assemble_build(
    repo: &impl ReleaseRepository,
    history: &impl HistoryBackend,
    version: &VersionKey,
    previous: Option<&VersionKey>,
) -> Result<Build, AssembleError> {
    let timestamp = resolve_timestamp(history, version.commit_ref())?;
    let files = scan_release_files(repo, version)?;
    let commits = match previous {
        Some(older) => resolve_commit_range(history, older.commit_ref(), version.commit_ref())?,
        None => Vec::new(),
    };

    Ok(Build {
        version: version.to_string(),
        timestamp,
        files,
        commits,
    })
}
