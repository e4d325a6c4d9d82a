//! Exports the [`Builder`] which stitches together the high-level steps of
//! building a site: aggregating posts ([`crate::post`]), rendering Markdown
//! files and rendering content files ([`crate::render`]).
//!
//! The three stages always run in [`PIPELINE`] order, each as a complete walk
//! of the tree before the next starts. The order matters: aggregation writes
//! staged post indexes and the summary `.content` file, the Markdown stage
//! turns `.md` files (including the staged post indexes) into `.content`
//! files, and the content stage turns every `.content` file into HTML.

use crate::config::Config;
use crate::post::Aggregator;
use crate::render::{Error as RenderError, Renderer, CONTENT_EXTENSION, MARKDOWN_EXTENSION};
use crate::report::Reporter;
use crate::walk::{Error as WalkError, Walker};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One pass over the source tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Publishes post collections and writes their summaries.
    Posts,

    /// Renders `.md` files to `.content` files.
    Markdown,

    /// Renders `.content` files to `.html` files.
    Content,
}

/// The stages of a site build, in the order they must run.
pub const PIPELINE: [Stage; 3] = [Stage::Posts, Stage::Markdown, Stage::Content];

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Stage::Posts => "posts",
            Stage::Markdown => "markdown",
            Stage::Content => "content",
        })
    }
}

/// Builds whole sites or single files.
pub struct Builder<'a> {
    config: &'a Config,
    reporter: &'a dyn Reporter,

    /// The working directory at startup, used to resolve relative paths and
    /// to shorten paths in log messages.
    cwd: PathBuf,
}

impl<'a> Builder<'a> {
    /// Creates a builder rooted at the current working directory. Failing to
    /// read the working directory is fatal.
    pub fn new(config: &'a Config, reporter: &'a dyn Reporter) -> Result<Builder<'a>> {
        let cwd = std::env::current_dir().map_err(Error::CurrentDir)?;
        Ok(Builder::with_cwd(config, reporter, cwd))
    }

    pub fn with_cwd(config: &'a Config, reporter: &'a dyn Reporter, cwd: PathBuf) -> Builder<'a> {
        Builder {
            config,
            reporter,
            cwd,
        }
    }

    fn renderer(&self) -> Renderer<'_> {
        Renderer::new(self.config, self.reporter, &self.cwd)
    }

    /// Runs every stage of [`PIPELINE`] over `root`.
    pub fn build_site(&self, root: &Path) -> Result<()> {
        for stage in PIPELINE.iter() {
            self.run_stage(*stage, root)?;
        }
        Ok(())
    }

    /// Walks `root` once, running `stage`'s processor in every directory.
    /// Per-directory failures are reported by the processors; only a walk
    /// that can't start is returned.
    pub fn run_stage(&self, stage: Stage, root: &Path) -> Result<()> {
        self.reporter.debug(&format!("{} stage", stage));
        let walker = Walker::new(self.config, self.reporter, &self.cwd);
        match stage {
            Stage::Posts => {
                let aggregator = Aggregator::new(self.config, self.reporter, &self.cwd);
                walker.walk(root, |dir| aggregator.process_directory(dir))?;
            }
            Stage::Markdown => {
                let renderer = self.renderer();
                walker.walk(root, |dir| renderer.process_markdown_directory(dir))?;
            }
            Stage::Content => {
                let renderer = self.renderer();
                walker.walk(root, |dir| renderer.process_content_directory(dir))?;
            }
        }
        Ok(())
    }

    /// Renders a single `.content` or `.md` file into `w`.
    pub fn build_file<W: Write>(&self, path: &Path, w: &mut W) -> Result<()> {
        let renderer = self.renderer();
        match extension(path) {
            Some(CONTENT_EXTENSION) => renderer.render_content(path, w)?,
            Some(MARKDOWN_EXTENSION) => renderer.render_markdown(path, w)?,
            _ => return Err(Error::UnknownExtension(path.to_owned())),
        }
        Ok(())
    }

    /// Opens a draft preview of a single Markdown file. Returns the path of
    /// the preview file.
    pub fn draft(&self, path: &Path) -> Result<PathBuf> {
        match extension(path) {
            Some(MARKDOWN_EXTENSION) => Ok(self.renderer().render_draft(path)?),
            _ => Err(Error::UnknownExtension(path.to_owned())),
        }
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site or a file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the working directory can't be determined.
    CurrentDir(std::io::Error),

    /// Returned when a walk can't start at the given root.
    Walk(WalkError),

    /// Returned when a single file fails to render.
    Render(RenderError),

    /// Returned for single files that are neither content nor Markdown.
    UnknownExtension(PathBuf),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CurrentDir(err) => {
                write!(f, "Reading the working directory: {}", err)
            }
            Error::Walk(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::UnknownExtension(path) => {
                write!(f, "unknown file extension {}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CurrentDir(err) => Some(err),
            Error::Walk(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::UnknownExtension(_) => None,
        }
    }
}

impl From<WalkError> for Error {
    /// Converts [`WalkError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WalkError) -> Error {
        Error::Walk(err)
    }
}

impl From<RenderError> for Error {
    /// Converts [`RenderError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::markdown::to_html;
    use crate::report::test::Recorder;
    use crate::resolve::Error as ResolveError;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// A blog with a front page, an about page and two posts.
    fn site(root: &Path) {
        let src = root.join("__src");
        write(
            &src.join("CONTENT.template"),
            "<html><body>{{.Body}}</body></html>",
        );
        write(
            &src.join("MARKDOWN.template"),
            "<article><h1>{{.Title}}</h1><p class=\"date\">{{.FormattedDate}}</p>{{.Body}}</article>",
        );
        write(
            &src.join("SUMMARY.template"),
            "<ul>{{range .Posts}}<li><a href=\"post/{{.Key}}/index.html\">{{.Title}}</a></li>{{end}}</ul>",
        );
        write(&src.join("about.md"), "---\ntitle: About\n---\nWho *I* am.\n");
        write(
            &src.join("POSTS/2023/older/index.md"),
            "---\ntitle: Older\ndate: 2023-03-04\n---\nOld news.\n",
        );
        write(&src.join("POSTS/2023/older/photo.jpg"), "jpeg");
        write(
            &src.join("POSTS/2024/newer/index.md"),
            "---\ntitle: Newer\ndate: 2024-05-06\n---\nNew news.\n",
        );
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(PIPELINE, [Stage::Posts, Stage::Markdown, Stage::Content]);
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");
        site(&root);

        let config = Config::default();
        let reporter = Recorder::default();
        let builder = Builder::with_cwd(&config, &reporter, dir.path().to_owned());
        builder.build_site(&root)?;
        assert!(reporter.errors().is_empty(), "{:?}", reporter.errors());

        assert_eq!(
            fs::read_to_string(root.join("index.html")).unwrap(),
            "<html><body><ul>\
             <li><a href=\"post/2024/newer/index.html\">Newer</a></li>\
             <li><a href=\"post/2023/older/index.html\">Older</a></li>\
             </ul></body></html>"
        );
        assert_eq!(
            fs::read_to_string(root.join("about.html")).unwrap(),
            "<html><body><article><h1>About</h1><p class=\"date\">-</p><p>Who <em>I</em> am.</p>\n</article></body></html>"
        );
        assert_eq!(
            fs::read_to_string(root.join("post/2024/newer/index.html")).unwrap(),
            "<html><body><article><h1>Newer</h1><p class=\"date\">May 6, 2024</p><p>New news.</p>\n</article></body></html>"
        );
        assert!(root.join("post/2023/older/index.html").is_file());
        assert!(root.join("post/2023/older/photo.jpg").is_file());
        assert!(!root.join("__src").join("POSTS").join("2023").join("older").join("index.html").exists());
        Ok(())
    }

    #[test]
    fn test_rebuild_is_idempotent() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");
        site(&root);

        let config = Config::default();
        let reporter = Recorder::default();
        let builder = Builder::with_cwd(&config, &reporter, dir.path().to_owned());
        builder.build_site(&root)?;
        let first = fs::read_to_string(root.join("post/2023/older/index.html")).unwrap();
        builder.build_site(&root)?;
        assert_eq!(
            fs::read_to_string(root.join("post/2023/older/index.html")).unwrap(),
            first
        );
        Ok(())
    }

    #[test]
    fn test_build_file_without_template() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("lonely.content");
        write(&file, "<p>alone</p>");

        let config = Config::default();
        let reporter = Recorder::default();
        let builder = Builder::with_cwd(&config, &reporter, dir.path().to_owned());
        let mut out = Vec::new();
        match builder.build_file(&file, &mut out) {
            Err(Error::Render(RenderError::Resolve(ResolveError::NoTemplate(_)))) => {}
            other => panic!("expected a missing template, got {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_build_markdown_file_without_template() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hello.md");
        write(&file, "---\ntitle: Hello\n---\nPlain *body*.\n");

        let config = Config::default();
        let reporter = Recorder::default();
        let builder = Builder::with_cwd(&config, &reporter, dir.path().to_owned());
        let mut out = Vec::new();
        builder.build_file(&file, &mut out)?;
        assert_eq!(String::from_utf8(out).unwrap(), to_html("Plain *body*.\n"));
        Ok(())
    }

    #[test]
    fn test_build_file_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let reporter = Recorder::default();
        let builder = Builder::with_cwd(&config, &reporter, dir.path().to_owned());
        match builder.build_file(Path::new("notes.txt"), &mut Vec::new()) {
            Err(Error::UnknownExtension(path)) => assert_eq!(path, Path::new("notes.txt")),
            other => panic!("expected an unknown extension, got {:?}", other),
        }
    }
}
