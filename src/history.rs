//! Version-control history lookups.
//!
//! Each release embeds the commit ref that produced it. Two questions are
//! asked of the history for every release:
//!
//! 1. When was that commit made? ([`resolve_timestamp`])
//! 2. Which commits lie between this release and the one before it by
//!    version order? ([`resolve_commit_range`])
//!
//! Both go through the [`HistoryBackend`] trait. The production backend is
//! [`GitBackend`], which shells out to the `git` CLI; tests use a recording
//! mock with canned answers.
//!
//! An empty answer is always an error here. A release whose commit cannot be
//! found, or that has no commits over its predecessor, points at a broken
//! publish and must not be rendered as "no changes".

use crate::types::CommitEntry;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to determine timestamp for commit: {commit}{}", reason_suffix(.reason))]
    MissingTimestamp {
        commit: String,
        reason: Option<String>,
    },
    #[error("Failed to get commit list between {old} and {new}{}", reason_suffix(.reason))]
    EmptyRange {
        old: String,
        new: String,
        reason: Option<String>,
    },
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(" ({reason})"),
        None => String::new(),
    }
}

/// Source of commit metadata.
pub trait HistoryBackend: Sync {
    /// Commit date of `commit_ref` in the backend's native format.
    /// Returns an empty string if the backend has nothing to say, or a
    /// [`HistoryError::MissingTimestamp`] when it can say why.
    fn commit_date(&self, commit_ref: &str) -> Result<String, HistoryError>;

    /// `(id, subject)` pairs reachable from `new_ref` but not from `old_ref`,
    /// in the backend's native order.
    fn commits_between(
        &self,
        old_ref: &str,
        new_ref: &str,
    ) -> Result<Vec<(String, String)>, HistoryError>;
}

/// Look up the timestamp of the commit that produced a release.
pub fn resolve_timestamp(
    backend: &impl HistoryBackend,
    commit_ref: &str,
) -> Result<String, HistoryError> {
    let date = backend.commit_date(commit_ref)?;
    let date = date.trim();
    if date.is_empty() {
        return Err(HistoryError::MissingTimestamp {
            commit: commit_ref.to_string(),
            reason: None,
        });
    }
    Ok(date.to_string())
}

/// List the commits in `(old_ref, new_ref]`.
pub fn resolve_commit_range(
    backend: &impl HistoryBackend,
    old_ref: &str,
    new_ref: &str,
) -> Result<Vec<CommitEntry>, HistoryError> {
    let commits = backend.commits_between(old_ref, new_ref)?;
    if commits.is_empty() {
        return Err(HistoryError::EmptyRange {
            old: old_ref.to_string(),
            new: new_ref.to_string(),
            reason: None,
        });
    }
    Ok(commits
        .into_iter()
        .map(|(id, subject)| CommitEntry::new(id, first_line(&subject)))
        .collect())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// History backend that runs `git` against a local repository.
#[derive(Debug, Clone)]
pub struct GitBackend {
    repo_dir: PathBuf,
    first_parent: bool,
}

impl GitBackend {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            first_parent: false,
        }
    }

    /// Only follow the first parent of merge commits in range queries.
    pub fn first_parent(mut self, enabled: bool) -> Self {
        self.first_parent = enabled;
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Run git and return stdout.
    ///
    /// A ref that does not exist makes git exit non-zero with nothing on
    /// stdout; that case comes back as [`Lookup::NotFound`] with git's
    /// stderr so the caller reports it as a missing lookup rather than a
    /// command failure.
    fn run(&self, args: &[&str]) -> Result<Lookup, HistoryError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_dir)
            .args(args)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(Lookup::Found(stdout));
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stdout.trim().is_empty() {
            return Ok(Lookup::NotFound(first_line(&stderr).to_string()));
        }
        Err(HistoryError::Command {
            args: args.join(" "),
            stderr,
        })
    }
}

/// Answer of a git query that may legitimately find nothing.
enum Lookup {
    Found(String),
    /// Git failed without output; holds the first line of its stderr.
    NotFound(String),
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

impl HistoryBackend for GitBackend {
    fn commit_date(&self, commit_ref: &str) -> Result<String, HistoryError> {
        let args = ["show", "-s", "--format=%cD", "--end-of-options", commit_ref, "--"];
        match self.run(&args)? {
            Lookup::Found(stdout) => Ok(first_line(&stdout).to_string()),
            Lookup::NotFound(stderr) => Err(HistoryError::MissingTimestamp {
                commit: commit_ref.to_string(),
                reason: non_empty(stderr),
            }),
        }
    }

    fn commits_between(
        &self,
        old_ref: &str,
        new_ref: &str,
    ) -> Result<Vec<(String, String)>, HistoryError> {
        let range = format!("{old_ref}..{new_ref}");
        let mut args = vec!["log", "--pretty=format:%H %s"];
        if self.first_parent {
            args.push("--first-parent");
        }
        // Refs come from directory names and must never parse as options
        args.push("--end-of-options");
        args.push(&range);
        args.push("--");

        match self.run(&args)? {
            Lookup::Found(stdout) => Ok(parse_log(&stdout)),
            Lookup::NotFound(stderr) => Err(HistoryError::EmptyRange {
                old: old_ref.to_string(),
                new: new_ref.to_string(),
                reason: non_empty(stderr),
            }),
        }
    }
}

/// Parse `git log --pretty=format:'%H %s'` output.
fn parse_log(stdout: &str) -> Vec<(String, String)> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(' ') {
            Some((id, subject)) => (id.to_string(), subject.to_string()),
            None => (line.to_string(), String::new()),
        })
        .collect()
}
