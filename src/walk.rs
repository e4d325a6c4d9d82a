//! Directory traversal. The walker visits every directory under a root, in
//! name order, and hands each one to a per-directory processor. Reserved
//! directories (version control, source markers, posts markers) are neither
//! processed nor descended into.

use crate::config::Config;
use crate::report::Reporter;
use crate::util::relative;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The version control directory, never descended into.
pub const VCS_DIR: &str = ".git";

/// Returns true for directory names the walker skips.
pub fn is_reserved(config: &Config, name: &str) -> bool {
    name == VCS_DIR || config.is_source_marker(name) || config.is_posts_marker(name)
}

/// Walks directory trees, skipping reserved directories.
pub struct Walker<'a> {
    config: &'a Config,
    reporter: &'a dyn Reporter,
    cwd: &'a Path,
}

impl<'a> Walker<'a> {
    pub fn new(config: &'a Config, reporter: &'a dyn Reporter, cwd: &'a Path) -> Walker<'a> {
        Walker {
            config,
            reporter,
            cwd,
        }
    }

    /// Calls `visit` once for `root` and once for every directory below it
    /// that isn't reserved or inside a reserved directory. A subtree that
    /// can't be read is reported and skipped; only a root that can't be read
    /// fails the walk.
    pub fn walk<F: FnMut(&Path)>(&self, root: &Path, mut visit: F) -> Result<()> {
        let metadata = std::fs::metadata(root).map_err(|err| Error::Root {
            path: root.to_owned(),
            err,
        })?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(root.to_owned()));
        }

        let config = self.config;
        let entries = WalkDir::new(root)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .map(|name| is_reserved(config, name))
                        .unwrap_or(false))
            });

        for result in entries {
            match result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        visit(entry.path());
                    }
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| relative(self.cwd, p).display().to_string())
                        .unwrap_or_default();
                    self.reporter.error(&format!("skipping {}: {}", path, err));
                }
            }
        }
        Ok(())
    }
}

/// The result of a walk.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a walk that couldn't start.
#[derive(Debug)]
pub enum Error {
    /// Returned when the root can't be read.
    Root { path: PathBuf, err: io::Error },

    /// Returned when the root is a file.
    NotADirectory(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Root { path, err } => {
                write!(f, "Reading `{}`: {}", path.display(), err)
            }
            Error::NotADirectory(path) => {
                write!(f, "`{}` is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Root { path: _, err } => Some(err),
            Error::NotADirectory(_) => None,
        }
    }
}
