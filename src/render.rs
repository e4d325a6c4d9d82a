//! Renders content and Markdown files through the templates found by
//! [`crate::resolve`].
//!
//! * A `.content` file is pushed through its whole [`TemplateChain`]: the raw
//!   file is the `Body` of the innermost template, whose output is the `Body`
//!   of the next one, and so on out to the terminal content template. Output
//!   lands next to the source marker as `.html`.
//! * A `.md` file has its front matter extracted and its body converted to
//!   HTML, which is then wrapped in the nearest Markdown template, if any.
//!   Output lands in the source marker as `.content`, ready for the content
//!   pass.
//!
//! [`TemplateChain`]: crate::resolve::TemplateChain

use crate::config::Config;
use crate::markdown;
use crate::metadata::extract;
use crate::report::Reporter;
use crate::resolve::{DiskTree, Error as ResolveError, Resolver};
use crate::template::{Error as TemplateError, Template};
use crate::util::{absolute, read_lossy, relative, target_file_name};
use crate::value::ContentRecord;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Extension of files rendered through a content chain.
pub const CONTENT_EXTENSION: &str = "content";

/// Extension of Markdown files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Extension of the final output pages.
pub const HTML_EXTENSION: &str = "html";

/// Renders individual files and the files of one source marker directory.
pub struct Renderer<'a> {
    config: &'a Config,
    reporter: &'a dyn Reporter,

    /// The working directory relative paths are resolved against. Template
    /// lookup needs absolute paths to climb all the way to the root.
    cwd: &'a Path,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a Config, reporter: &'a dyn Reporter, cwd: &'a Path) -> Renderer<'a> {
        Renderer {
            config,
            reporter,
            cwd,
        }
    }

    fn resolver(&self) -> Resolver<'a, DiskTree> {
        Resolver::new(&DiskTree, self.config)
    }

    fn show<'p>(&self, path: &'p Path) -> std::path::Display<'p> {
        relative(self.cwd, path).display()
    }

    /// Renders a `.content` file through its template chain into `w`.
    /// Fails with [`ResolveError::NoTemplate`] if no terminal content template
    /// exists above the file.
    pub fn render_content<W: Write>(&self, file: &Path, w: &mut W) -> Result<()> {
        self.reporter.info(&format!("{}", self.show(file)));
        let chain = self.resolver().content_chain(&absolute(self.cwd, file))?;
        let mut body = read(file)?;
        for template_ref in chain.iter() {
            self.reporter
                .info(&format!("  using template {}", self.show(&template_ref.path)));
            let template = Template::load(template_ref)?;
            body = template.render(&ContentRecord::with_body(body))?;
        }
        w.write_all(body.as_bytes())?;
        Ok(())
    }

    /// Renders a Markdown file into `w`, wrapped in the nearest Markdown
    /// template. Without a template the converted HTML is written as-is.
    pub fn render_markdown<W: Write>(&self, file: &Path, w: &mut W) -> Result<()> {
        self.reporter.info(&format!("{}", self.show(file)));
        let (metadata, body) = extract(&read(file)?);
        let mut output = markdown::to_html(&body);

        if let Some(template_ref) = self.resolver().markdown(&absolute(self.cwd, file)) {
            self.reporter.info(&format!(
                "  using markdown template {}",
                self.show(&template_ref.path)
            ));
            let template = Template::load(&template_ref)?;
            output = template.render(&ContentRecord::from_metadata(&metadata, "", output))?;
        }
        w.write_all(output.as_bytes())?;
        Ok(())
    }

    /// Writes a preview of a Markdown file, without its front matter or any
    /// site template, to a temporary `draft*.html` file and opens it with the
    /// configured viewer. Returns the path of the draft file.
    pub fn render_draft(&self, file: &Path) -> Result<PathBuf> {
        self.reporter.info(&format!("{}", self.show(file)));
        let (_, body) = extract(&read(file)?);
        let page = markdown::draft_page(&markdown::to_html(&body));

        let mut draft = tempfile::Builder::new()
            .prefix("draft")
            .suffix(".html")
            .tempfile()?;
        draft.write_all(page.as_bytes())?;
        let (_, path) = draft.keep().map_err(|err| Error::Io(err.error))?;
        self.reporter
            .info(&format!("Draft file: {}", path.display()));
        self.open_viewer(&path);
        Ok(path)
    }

    fn open_viewer(&self, path: &Path) {
        let (program, args) = match self.config.draft_viewer.split_first() {
            Some(split) => split,
            None => return,
        };
        let status = std::process::Command::new(program)
            .args(args)
            .arg(path)
            .status();
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => self
                .reporter
                .error(&format!("draft viewer `{}` exited with {}", program, status)),
            Err(err) => self
                .reporter
                .error(&format!("launching draft viewer `{}`: {}", program, err)),
        }
    }

    /// Renders every `.content` file in `dir`'s source marker to
    /// `{dir}/{name}.html`. Does nothing if `dir` has no source marker. A file
    /// that fails to render is reported and skipped, and its output file is
    /// left untouched.
    pub fn process_content_directory(&self, dir: &Path) {
        let marker = match source_marker(self.config, dir) {
            Some(marker) => marker,
            None => return,
        };
        for (file, name) in self.files_with_extension(&marker, CONTENT_EXTENSION) {
            let target = dir.join(target_file_name(&name, CONTENT_EXTENSION, HTML_EXTENSION));
            self.render_to_file(&file, &target, |w| self.render_content(&file, w));
        }
    }

    /// Renders every `.md` file in `dir`'s source marker to
    /// `{marker}/{name}.content`. Does nothing if `dir` has no source marker.
    pub fn process_markdown_directory(&self, dir: &Path) {
        let marker = match source_marker(self.config, dir) {
            Some(marker) => marker,
            None => return,
        };
        for (file, name) in self.files_with_extension(&marker, MARKDOWN_EXTENSION) {
            let target = marker.join(target_file_name(&name, MARKDOWN_EXTENSION, CONTENT_EXTENSION));
            self.render_to_file(&file, &target, |w| self.render_markdown(&file, w));
        }
    }

    fn render_to_file<F>(&self, file: &Path, target: &Path, render: F)
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buf: Vec<u8> = Vec::new();
        let result = render(&mut buf).and_then(|_| fs::write(target, &buf).map_err(Error::from));
        match result {
            Ok(()) => self.reporter.info(&format!("  wrote {}", self.show(target))),
            Err(err) => self
                .reporter
                .error(&format!("{}: {}", self.show(file), err)),
        }
    }

    /// Lists the regular files in `dir` with the given extension, sorted by
    /// name. An unreadable directory is treated as empty.
    fn files_with_extension(&self, dir: &Path, extension: &str) -> Vec<(PathBuf, String)> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.reporter
                    .debug(&format!("skipping {}: {}", self.show(dir), err));
                return Vec::new();
            }
        };
        let mut files: Vec<(PathBuf, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                match Path::new(&name).extension() {
                    Some(ext) if ext == extension => Some((entry.path(), name)),
                    _ => None,
                }
            })
            .collect();
        files.sort_by(|a, b| a.1.cmp(&b.1));
        files
    }
}

/// Returns `dir`'s source marker directory, preferring the plain spelling
/// over the dotted one.
pub fn source_marker(config: &Config, dir: &Path) -> Option<PathBuf> {
    config
        .source_markers()
        .iter()
        .map(|marker| dir.join(marker))
        .find(|candidate| candidate.is_dir())
}

fn read(file: &Path) -> Result<String> {
    read_lossy(file).map_err(|err| Error::Read {
        path: file.to_owned(),
        err,
    })
}

/// The result of a rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem rendering a file.
#[derive(Debug)]
pub enum Error {
    /// Returned when a content file has no template chain.
    Resolve(ResolveError),

    /// Returned when a template can't be loaded or executed.
    Template(TemplateError),

    /// Returned when the source file can't be read.
    Read { path: PathBuf, err: io::Error },

    /// Returned for I/O problems writing output.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Resolve(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Read { path, err } => {
                write!(f, "Reading `{}`: {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Resolve(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Read { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<ResolveError> for Error {
    /// Converts a [`ResolveError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: ResolveError) -> Error {
        Error::Resolve(err)
    }
}

impl From<TemplateError> for Error {
    /// Converts a [`TemplateError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
