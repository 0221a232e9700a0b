//! # Release Site
//!
//! A static download and changelog site generator for release builds. The
//! release directory tree is the data source: every release directory is
//! named after its version, and every version names the commit it was built
//! from, so the commit history between two releases becomes that release's
//! changelog.
//!
//! # Architecture: Assemble, Render, Publish
//!
//! ```text
//! 1. Assemble  files/ + git history  →  Vec<Build>      (all the logic)
//! 2. Render    Vec<Build> + devices  →  staging dir     (HTML pages)
//! 3. Publish   staging dir           →  target dir      (replace old pages)
//! ```
//!
//! Assembly is a pure function of the release tree and the history backend.
//! It touches no output location, so a run that fails part way leaves the
//! published site exactly as it was.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`version`] | `MAJOR.MINOR.PATCH.bBUILD.cREF` parser and total order |
//! | [`releases`] | Walks the release tree: releases, variants, artifacts, checksum sidecars |
//! | [`history`] | Commit timestamps and commit ranges from the version-control backend |
//! | [`assemble`] | Combines the above into the newest-first build model |
//! | [`types`] | The build model (`Build`, `FileEntry`, `CommitEntry`) |
//! | [`generate`] | Renders the model into HTML using Maud |
//! | [`publish`] | Moves the rendered site into the live output directory |
//! | [`config`] | `config.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Version Order, Not Time Order
//!
//! Releases are ordered by their version numbers alone. Mirrors and rsync do
//! not preserve mtimes, and commit dates can be rewritten, but the version in
//! the directory name is fixed at build time. The changelog for a release is
//! the commit range from the next older release *by version* to this one.
//!
//! ## Fail Fast
//!
//! A malformed release directory, an unknown commit, or an empty commit range
//! aborts the run. A changelog site with silently missing history is worse
//! than an old site that is still correct.
//!
//! ## Swappable Backends
//!
//! The release tree and the commit history both sit behind traits
//! ([`releases::ReleaseRepository`], [`history::HistoryBackend`]), so the whole
//! assembly runs in tests against in-memory fakes, without git installed.

pub mod assemble;
pub mod config;
pub mod generate;
pub mod history;
pub mod output;
pub mod publish;
pub mod releases;
pub mod types;
pub mod version;

#[cfg(test)]
pub(crate) mod test_helpers;
