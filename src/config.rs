//! Defines the [`Config`] type which carries every reserved name the generator
//! recognizes (marker directories, template files, the canonical post file)
//! along with the loading logic for the optional `webgen.yaml` project file.

use crate::util::open;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The project file searched for in the build root and its ancestors.
pub const PROJECT_FILE: &str = "webgen.yaml";

/// How post folders are arranged under the posts marker directory.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostLayout {
    /// `{year}/{slug}/index.md`; folders whose name isn't a year are ignored.
    Dated,

    /// `{slug}/index.md`
    Flat,
}

impl Default for PostLayout {
    fn default() -> Self {
        PostLayout::Dated
    }
}

/// The names of the template files looked up inside source marker
/// directories.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Templates {
    /// The terminal template of a content chain.
    pub content: String,

    /// The optional layered template of a content chain.
    pub sub: String,

    /// The single template wrapping converted Markdown.
    pub markdown: String,

    /// The single template producing the post summary.
    pub summary: String,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            content: String::from("CONTENT.template"),
            sub: String::from("SUB.template"),
            markdown: String::from("MARKDOWN.template"),
            summary: String::from("SUMMARY.template"),
        }
    }
}

/// Generator configuration. Every field has a default, so a project file only
/// needs to name what it overrides.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// The source marker directory. Its presence activates template lookup
    /// and file generation for the containing folder. May also appear with a
    /// leading dot.
    pub source_dir: String,

    /// The posts marker directory, nested inside the source marker. May also
    /// appear with a leading dot.
    pub posts_dir: String,

    /// The directory, next to the source marker, that the published post tree
    /// is written to. It is wiped on every aggregation.
    pub post_output_dir: String,

    /// The canonical file inside every post folder.
    pub post_index: String,

    /// The generated content file holding the rendered post summary.
    pub summary_output: String,

    pub post_layout: PostLayout,

    pub templates: Templates,

    /// The program (and leading arguments) used to open a draft preview. The
    /// draft file path is appended as the last argument.
    pub draft_viewer: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_dir: String::from("__src"),
            posts_dir: String::from("POSTS"),
            post_output_dir: String::from("post"),
            post_index: String::from("index.md"),
            summary_output: String::from("index.content"),
            post_layout: PostLayout::default(),
            templates: Templates::default(),
            draft_viewer: default_viewer(),
        }
    }
}

#[cfg(target_os = "macos")]
fn default_viewer() -> Vec<String> {
    vec![String::from("open")]
}

#[cfg(not(target_os = "macos"))]
fn default_viewer() -> Vec<String> {
    vec![String::from("xdg-open")]
}

impl Config {
    /// Searches `dir` and then each of its ancestors for [`PROJECT_FILE`] and
    /// loads the first one found. Returns [`Config::default`] if there is no
    /// project file anywhere up the tree.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_file(&path);
            }
        }
        Ok(Config::default())
    }

    /// Loads a project file from an explicit path.
    pub fn from_file(path: &Path) -> Result<Config> {
        let file = open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
            path: path.to_owned(),
            err,
        })
    }

    /// Returns true if `name` is the source marker, with or without a
    /// leading dot.
    pub fn is_source_marker(&self, name: &str) -> bool {
        matches_marker(name, &self.source_dir)
    }

    /// Returns true if `name` is the posts marker, with or without a leading
    /// dot.
    pub fn is_posts_marker(&self, name: &str) -> bool {
        matches_marker(name, &self.posts_dir)
    }

    /// The spellings of the source marker in probe order.
    pub fn source_markers(&self) -> [String; 2] {
        [self.source_dir.clone(), self.hidden_source_marker()]
    }

    /// The spellings of the posts marker in probe order.
    pub fn posts_markers(&self) -> [String; 2] {
        [self.posts_dir.clone(), format!(".{}", self.posts_dir)]
    }

    /// The dotted source marker that post indexes are staged into.
    pub fn hidden_source_marker(&self) -> String {
        format!(".{}", self.source_dir)
    }
}

fn matches_marker(name: &str, marker: &str) -> bool {
    name == marker || name.strip_prefix('.') == Some(marker)
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML or has fields of the
    /// wrong type.
    Yaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening project file `{}`: {}", path.display(), err)
            }
            Error::Yaml { path, err } => {
                write!(f, "Loading project file `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Yaml { path: _, err } => Some(err),
        }
    }
}
