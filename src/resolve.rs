//! Template resolution. Starting at the directory that holds a file, the
//! resolver climbs towards the filesystem root and looks inside each
//! ancestor's source marker directory for template files.
//!
//! Content files resolve to a [`TemplateChain`]: every sub-template met on the
//! way up is collected, innermost first, and the climb stops at the first
//! terminal content template. Markdown files and post summaries resolve to a
//! single template, the nearest one wins.
//!
//! Resolution only asks a [`Tree`] whether paths exist, so it can run against
//! an in-memory tree as easily as against the disk.

use crate::config::Config;
use std::fmt;
use std::path::{Path, PathBuf};

/// The questions template resolution asks of a directory tree.
pub trait Tree {
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
}

/// A [`Tree`] backed by the filesystem.
#[derive(Default, Clone, Copy)]
pub struct DiskTree;

impl Tree for DiskTree {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// A template file found by the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateRef {
    pub path: PathBuf,
}

impl TemplateRef {
    /// The name shown in log messages.
    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// The templates applied to a content file, innermost first. The last entry
/// is always a terminal content template, so a chain is never empty; only
/// [`Resolver::content_chain`] builds one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateChain(Vec<TemplateRef>);

impl TemplateChain {
    pub fn iter(&self) -> impl Iterator<Item = &TemplateRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolves templates for files against a [`Tree`], using the reserved names
/// from a [`Config`].
pub struct Resolver<'a, T: Tree> {
    tree: &'a T,
    config: &'a Config,
}

impl<'a, T: Tree> Resolver<'a, T> {
    pub fn new(tree: &'a T, config: &'a Config) -> Resolver<'a, T> {
        Resolver { tree, config }
    }

    /// Yields the source marker directory of every ancestor of `file` that
    /// has one, nearest first. `file` must be absolute for the climb to reach
    /// the root. The plain marker spelling is preferred over the dotted one.
    pub fn marker_dirs<'p>(&'p self, file: &'p Path) -> impl Iterator<Item = PathBuf> + 'p {
        file.ancestors().skip(1).filter_map(move |dir| {
            self.config
                .source_markers()
                .iter()
                .map(|marker| dir.join(marker))
                .find(|candidate| self.tree.is_dir(candidate))
        })
    }

    /// Resolves the content chain for `file`: sub-templates are collected on
    /// the way up until a terminal content template is found. Without one the
    /// result is [`Error::NoTemplate`], never an empty chain.
    pub fn content_chain(&self, file: &Path) -> Result<TemplateChain> {
        let mut chain = Vec::new();
        for marker in self.marker_dirs(file) {
            let sub = marker.join(&self.config.templates.sub);
            if self.tree.is_file(&sub) {
                chain.push(TemplateRef { path: sub });
            }
            let terminal = marker.join(&self.config.templates.content);
            if self.tree.is_file(&terminal) {
                chain.push(TemplateRef { path: terminal });
                return Ok(TemplateChain(chain));
            }
        }
        Err(Error::NoTemplate(file.to_owned()))
    }

    /// Finds the nearest template called `name` above `file`. Not finding one
    /// is a normal outcome.
    pub fn single(&self, file: &Path, name: &str) -> Option<TemplateRef> {
        self.marker_dirs(file)
            .map(|marker| marker.join(name))
            .find(|candidate| self.tree.is_file(candidate))
            .map(|path| TemplateRef { path })
    }

    /// The nearest Markdown template for `file`.
    pub fn markdown(&self, file: &Path) -> Option<TemplateRef> {
        self.single(file, &self.config.templates.markdown)
    }

    /// The nearest summary template for a posts marker directory.
    pub fn summary(&self, posts_root: &Path) -> Option<TemplateRef> {
        self.single(posts_root, &self.config.templates.summary)
    }
}

/// The result of resolving a [`TemplateChain`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed template resolution.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Returned when no terminal content template exists above a content
    /// file.
    NoTemplate(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoTemplate(path) => {
                write!(f, "no template found for `{}`", path.display())
            }
        }
    }
}

impl std::error::Error for Error {}
