//! Publishing a staged site into the live output directory.
//!
//! The site is rendered into a staging directory first. Only once rendering
//! has fully succeeded are the previous run's generated entries removed from
//! the target and the staged tree copied over. A failed run leaves the target
//! untouched.
//!
//! The release root usually lives inside the target (`<target>/files/`), so
//! only entries this tool generates are ever removed.

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Top-level files generated by a run.
const GENERATED_FILES: &[&str] = &["index.html", "supported_devices.html"];

/// Top-level directories generated by a run. `css` and `images` are left
/// over from older site layouts.
const GENERATED_DIRS: &[&str] = &["downloads", "res", "css", "images"];

/// Replace the generated part of `target` with the contents of `staging`.
pub fn publish(staging: &Path, target: &Path) -> Result<(), PublishError> {
    fs::create_dir_all(target)?;
    clean_old_target(target)?;
    copy_tree(staging, target)
}

/// Remove everything a previous run generated, ignoring entries that are
/// already gone.
fn clean_old_target(target: &Path) -> io::Result<()> {
    for name in GENERATED_FILES {
        ignore_missing(fs::remove_file(target.join(name)))?;
    }
    for name in GENERATED_DIRS {
        ignore_missing(fs::remove_dir_all(target.join(name)))?;
    }
    Ok(())
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Copy every file under `src` into `dst`, creating directories as needed
/// and overwriting existing files.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), PublishError> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let dst_path = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst_path)?;
        } else {
            fs::copy(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}
