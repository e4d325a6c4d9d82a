//! Post aggregation. A site publishes posts by keeping them under its posts
//! marker directory:
//!
//! ```text
//! site/
//! ├── __src/
//! │   ├── SUMMARY.template
//! │   └── POSTS/
//! │       ├── 2023/
//! │       │   └── first-post/
//! │       │       ├── index.md
//! │       │       └── diagram.png
//! │       └── 2024/
//! │           └── second-post/
//! │               └── index.md
//! └── post/                       # generated
//!     ├── 2023/first-post/
//!     │   ├── .__src/index.md
//!     │   └── diagram.png
//!     └── 2024/second-post/
//!         └── .__src/index.md
//! ```
//!
//! [`Aggregator::aggregate`] reads every post's front matter, sorts the posts
//! most recent first, rebuilds the published `post/` tree from scratch and
//! renders the summary template into `__src/index.content`. The staged
//! `index.md` files and the summary are then picked up by the Markdown and
//! content passes like any other source file.

use crate::config::{Config, PostLayout};
use crate::metadata::{extract, Metadata};
use crate::report::Reporter;
use crate::resolve::{DiskTree, Resolver};
use crate::template::{Error as TemplateError, Template};
use crate::util::{absolute, read_lossy, relative, rmdir};
use crate::value::{ContentRecord, Summary};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fs::{self, read_dir};
use std::io;
use std::path::{Path, PathBuf};

/// One post folder, described by its front matter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostInfo {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub reading: String,

    /// The post folder relative to the posts marker, `year/slug` or `slug`,
    /// always `/`-separated.
    pub key: String,

    /// The year folder the post was found in. Flat layouts take the year
    /// from the post's date, if it has one.
    pub year: Option<i32>,
}

impl PostInfo {
    fn new(metadata: Metadata, key: String, year: Option<i32>) -> PostInfo {
        PostInfo {
            year: year.or_else(|| metadata.date.map(|d| d.year())),
            title: metadata.title,
            date: metadata.date,
            reading: metadata.reading,
            key,
        }
    }

    /// The post folder relative to the posts marker as a path.
    pub fn relative_path(&self) -> PathBuf {
        self.key.split('/').collect()
    }
}

/// Orders posts most recent first. Undated posts sort last; posts with equal
/// dates keep their discovery order.
pub fn sort_posts(posts: &mut [PostInfo]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Publishes the posts of one posts marker directory.
pub struct Aggregator<'a> {
    config: &'a Config,
    reporter: &'a dyn Reporter,
    cwd: &'a Path,
}

impl<'a> Aggregator<'a> {
    pub fn new(config: &'a Config, reporter: &'a dyn Reporter, cwd: &'a Path) -> Aggregator<'a> {
        Aggregator {
            config,
            reporter,
            cwd,
        }
    }

    fn show<'p>(&self, path: &'p Path) -> std::path::Display<'p> {
        relative(self.cwd, path).display()
    }

    /// Aggregates the posts of `dir` if it has a posts marker (inside either
    /// spelling of its source marker). Failures are reported, never returned,
    /// so one broken post collection doesn't stop the walk.
    pub fn process_directory(&self, dir: &Path) {
        let posts_root = match posts_marker(self.config, dir) {
            Some(posts_root) => posts_root,
            None => return,
        };
        if let Err(err) = self.aggregate(&posts_root) {
            self.reporter.error(&err.to_string());
        }
    }

    /// Runs the four aggregation steps for the posts marker `posts_root`
    /// (which sits at `{site}/{source marker}/{posts marker}`): discover, sort,
    /// rebuild `{site}/{post output dir}`, and write the summary. Returns the
    /// posts in published order.
    pub fn aggregate(&self, posts_root: &Path) -> Result<Vec<PostInfo>> {
        self.reporter.info(&format!("{}", self.show(posts_root)));
        let source_dir = posts_root
            .parent()
            .ok_or_else(|| Error::Layout(posts_root.to_owned()))?;
        let site = source_dir
            .parent()
            .ok_or_else(|| Error::Layout(posts_root.to_owned()))?;

        let mut posts = self.discover(posts_root)?;
        sort_posts(&mut posts);
        self.publish(posts_root, &site.join(&self.config.post_output_dir), &posts)?;
        self.summarize(posts_root, source_dir, &posts)?;
        Ok(posts)
    }

    /// Reads the front matter of every post. Any failure aborts the whole
    /// aggregation: a partial post list is never published.
    pub fn discover(&self, posts_root: &Path) -> Result<Vec<PostInfo>> {
        let mut posts = Vec::new();
        match self.config.post_layout {
            PostLayout::Flat => {
                for slug in self.post_dirs(posts_root)? {
                    posts.push(self.read_post(posts_root, slug, None)?);
                }
            }
            PostLayout::Dated => {
                for year_name in self.post_dirs(posts_root)? {
                    let year = match year_name.parse::<i32>() {
                        Ok(year) => year,
                        Err(_) => continue,
                    };
                    for slug in self.post_dirs(&posts_root.join(&year_name))? {
                        let key = format!("{}/{}", year_name, slug);
                        posts.push(self.read_post(posts_root, key, Some(year))?);
                    }
                }
            }
        }
        Ok(posts)
    }

    /// The names of the subdirectories of `dir` that aren't reserved, sorted.
    fn post_dirs(&self, dir: &Path) -> Result<Vec<String>> {
        let read = |err: io::Error| Error::Read {
            path: dir.to_owned(),
            err,
        };
        let mut names = Vec::new();
        for entry in read_dir(dir).map_err(read)? {
            let entry = entry.map_err(read)?;
            if !entry.file_type().map_err(read)?.is_dir() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => return Err(Error::InvalidFileName(dir.join(name))),
            };
            if crate::walk::is_reserved(self.config, &name) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn read_metadata(&self, posts_root: &Path, key: &Path) -> Result<Metadata> {
        let path = posts_root.join(key).join(&self.config.post_index);
        let contents = read_lossy(&path).map_err(|err| Error::Read { path, err })?;
        Ok(extract(&contents).0)
    }

    fn read_post(&self, posts_root: &Path, key: String, year: Option<i32>) -> Result<PostInfo> {
        let folder: PathBuf = key.split('/').collect();
        let metadata = self.read_metadata(posts_root, &folder)?;
        Ok(PostInfo::new(metadata, key, year))
    }

    /// Wipes and recreates `post_dir`, then copies each post's files into it.
    /// The post index goes into a hidden source marker so the later passes
    /// render it. Failing to recreate `post_dir` is fatal; a post that fails
    /// to copy is reported and skipped.
    fn publish(&self, posts_root: &Path, post_dir: &Path, posts: &[PostInfo]) -> Result<()> {
        self.reporter
            .info(&format!("  removing {}", self.show(post_dir)));
        rmdir(post_dir).map_err(|err| Error::Clean {
            path: post_dir.to_owned(),
            err,
        })?;
        fs::create_dir(post_dir).map_err(|err| Error::Create {
            path: post_dir.to_owned(),
            err,
        })?;

        for post in posts {
            self.reporter.info(&format!("  copying {}", post.key));
            if let Err(err) = self.copy_post(posts_root, post_dir, post) {
                self.reporter.error(&format!("{}: {}", post.key, err));
            }
        }
        Ok(())
    }

    /// Copies the files (not the subfolders) of one post.
    fn copy_post(&self, posts_root: &Path, post_dir: &Path, post: &PostInfo) -> io::Result<()> {
        let src = posts_root.join(post.relative_path());
        let dst = post_dir.join(post.relative_path());
        fs::create_dir_all(&dst)?;

        let mut entries = read_dir(&src)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());
        for entry in entries {
            if entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if name == self.config.post_index.as_str() {
                let staged = dst.join(self.config.hidden_source_marker());
                fs::create_dir_all(&staged)?;
                fs::copy(entry.path(), staged.join(&self.config.post_index))?;
            } else {
                fs::copy(entry.path(), dst.join(&name))?;
            }
        }
        Ok(())
    }

    /// Renders the summary template, found by climbing from `posts_root`,
    /// against every post and writes it to the summary output file in
    /// `source_dir`. Without a summary template the file is written empty.
    fn summarize(&self, posts_root: &Path, source_dir: &Path, posts: &[PostInfo]) -> Result<()> {
        let mut summary = Summary::default();
        for post in posts {
            match self.read_metadata(posts_root, &post.relative_path()) {
                Ok(metadata) => summary.posts.push(ContentRecord::from_metadata(
                    &metadata,
                    &post.key,
                    String::new(),
                )),
                Err(err) => self.reporter.error(&err.to_string()),
            }
        }

        let resolver = Resolver::new(&DiskTree, self.config);
        let output = match resolver.summary(&absolute(self.cwd, posts_root)) {
            Some(template_ref) => {
                self.reporter.info(&format!(
                    "  using summary template {}",
                    self.show(&template_ref.path)
                ));
                Template::load(&template_ref)?.render(&summary)?
            }
            None => String::new(),
        };

        let target = source_dir.join(&self.config.summary_output);
        fs::write(&target, output).map_err(|err| Error::Write {
            path: target.clone(),
            err,
        })?;
        self.reporter.info(&format!("  wrote {}", self.show(&target)));
        Ok(())
    }
}

/// Returns `dir`'s posts marker, looking inside both spellings of the source
/// marker and accepting both spellings of the posts marker.
pub fn posts_marker(config: &Config, dir: &Path) -> Option<PathBuf> {
    for source in config.source_markers().iter() {
        for posts in config.posts_markers().iter() {
            let candidate = dir.join(source).join(posts);
            if candidate.is_dir() {
                return Some(candidate);
            }
        }
    }
    None
}

/// The result of a post aggregation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed post aggregation.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post folder or its index file can't be read.
    Read { path: PathBuf, err: io::Error },

    /// Returned when a post folder name isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned when the posts marker isn't nested two levels deep.
    Layout(PathBuf),

    /// Returned when the old published tree can't be removed.
    Clean { path: PathBuf, err: io::Error },

    /// Returned when the published tree can't be recreated.
    Create { path: PathBuf, err: io::Error },

    /// Returned when the summary template can't be loaded or executed.
    Template(TemplateError),

    /// Returned when the summary can't be written.
    Write { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read { path, err } => {
                write!(f, "Reading `{}`: {}", path.display(), err)
            }
            Error::InvalidFileName(path) => {
                write!(f, "invalid file name: {:?}", path)
            }
            Error::Layout(path) => write!(
                f,
                "posts directory `{}` isn't inside a source directory",
                path.display()
            ),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory `{}`: {}", path.display(), err)
            }
            Error::Create { path, err } => {
                write!(f, "Creating directory `{}`: {}", path.display(), err)
            }
            Error::Template(err) => err.fmt(f),
            Error::Write { path, err } => {
                write!(f, "Writing `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { path: _, err } => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Layout(_) => None,
            Error::Clean { path: _, err } => Some(err),
            Error::Create { path: _, err } => Some(err),
            Error::Template(err) => Some(err),
            Error::Write { path: _, err } => Some(err),
        }
    }
}

impl From<TemplateError> for Error {
    /// Converts a [`TemplateError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::report::test::Recorder;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn post(title: &str, date: &str) -> String {
        format!("---\ntitle: {}\ndate: {}\nreading: 2 min\n---\nBody of {}.\n", title, date, title)
    }

    /// Every file below `dir` with its contents, in a stable order.
    fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        WalkDir::new(dir)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                (
                    entry.path().strip_prefix(dir).unwrap().to_owned(),
                    fs::read(entry.path()).unwrap(),
                )
            })
            .collect()
    }

    fn fixture() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        let posts = site.join("__src").join("POSTS");
        write(&posts.join("2023").join("first").join("index.md"), &post("First", "2023-01-01"));
        write(&posts.join("2023").join("first").join("diagram.png"), "png");
        write(&posts.join("2023").join("first").join("drafts").join("old.md"), "old");
        write(&posts.join("2024").join("latest").join("index.md"), &post("Latest", "2024-06-01"));
        write(&posts.join("2023").join("middle").join("index.md"), &post("Middle", "2023-06-15"));
        write(&posts.join("misc").join("ignored").join("index.md"), &post("Ignored", "2025-01-01"));
        write(
            &site.join("__src").join("SUMMARY.template"),
            "{{range .Posts}}{{.Key}}|{{.Title}}|{{.FormattedDate}}|{{.Reading}}\n{{end}}",
        );
        (dir, site)
    }

    #[test]
    fn test_sort_posts_descending() {
        let mut posts: Vec<PostInfo> = ["2023-01-01", "2024-06-01", "2023-06-15"]
            .iter()
            .map(|date| PostInfo {
                title: String::new(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
                reading: String::new(),
                key: date.to_string(),
                year: None,
            })
            .collect();
        sort_posts(&mut posts);
        let keys: Vec<&str> = posts.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-06-01", "2023-06-15", "2023-01-01"]);
    }

    #[test]
    fn test_undated_posts_sort_last() {
        let mut posts = vec![
            PostInfo::new(Metadata::default(), String::from("undated"), None),
            PostInfo::new(
                Metadata {
                    date: NaiveDate::from_ymd_opt(2001, 1, 1),
                    ..Metadata::default()
                },
                String::from("dated"),
                None,
            ),
        ];
        sort_posts(&mut posts);
        assert_eq!(posts[0].key, "dated");
        assert_eq!(posts[0].year, Some(2001));
        assert_eq!(posts[1].year, None);
    }

    #[test]
    fn test_aggregate() -> Result<()> {
        let (dir, site) = fixture();
        let config = Config::default();
        let reporter = Recorder::default();
        let aggregator = Aggregator::new(&config, &reporter, dir.path());

        let posts = aggregator.aggregate(&site.join("__src").join("POSTS"))?;
        let keys: Vec<&str> = posts.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["2024/latest", "2023/middle", "2023/first"]);
        assert_eq!(posts[0].year, Some(2024));
        assert!(reporter.errors().is_empty());

        let published = site.join("post");
        assert_eq!(
            snapshot(&published)
                .into_iter()
                .map(|(path, _)| path)
                .collect::<Vec<_>>(),
            vec![
                PathBuf::from("2023/first/.__src/index.md"),
                PathBuf::from("2023/first/diagram.png"),
                PathBuf::from("2023/middle/.__src/index.md"),
                PathBuf::from("2024/latest/.__src/index.md"),
            ]
        );
        assert_eq!(
            fs::read_to_string(published.join("2024/latest/.__src/index.md")).unwrap(),
            post("Latest", "2024-06-01")
        );
        assert_eq!(
            fs::read_to_string(site.join("__src").join("index.content")).unwrap(),
            "2024/latest|Latest|Jun 1, 2024|2 min\n\
             2023/middle|Middle|Jun 15, 2023|2 min\n\
             2023/first|First|Jan 1, 2023|2 min\n"
        );
        Ok(())
    }

    #[test]
    fn test_aggregate_is_idempotent() -> Result<()> {
        let (dir, site) = fixture();
        // Stale output from an earlier run must disappear.
        write(&site.join("post").join("1999").join("gone").join("x.txt"), "stale");

        let config = Config::default();
        let reporter = Recorder::default();
        let aggregator = Aggregator::new(&config, &reporter, dir.path());
        let posts_root = site.join("__src").join("POSTS");

        aggregator.aggregate(&posts_root)?;
        let first = snapshot(&site);
        aggregator.aggregate(&posts_root)?;
        assert_eq!(first, snapshot(&site));
        assert!(!site.join("post").join("1999").exists());
        Ok(())
    }

    #[test]
    fn test_missing_index_aborts() {
        let (dir, site) = fixture();
        fs::create_dir_all(site.join("__src/POSTS/2024/unfinished")).unwrap();
        write(&site.join("post").join("keep.txt"), "untouched");

        let config = Config::default();
        let reporter = Recorder::default();
        let aggregator = Aggregator::new(&config, &reporter, dir.path());
        match aggregator.aggregate(&site.join("__src").join("POSTS")) {
            Err(Error::Read { path, .. }) => {
                assert!(path.ends_with("2024/unfinished/index.md"))
            }
            other => panic!("expected a read error, got {:?}", other),
        }
        // Nothing was published.
        assert!(site.join("post").join("keep.txt").exists());
        assert!(!site.join("__src").join("index.content").exists());
    }

    #[test]
    fn test_aggregate_non_utf8_index() -> Result<()> {
        let (dir, site) = fixture();
        let index = site.join("__src/POSTS/2023/middle/index.md");
        let raw: &[u8] = b"---\ntitle: caf\xe9\ndate: 2023-06-15\n---\nBody \xff\n";
        fs::write(&index, raw).unwrap();

        let config = Config::default();
        let reporter = Recorder::default();
        let aggregator = Aggregator::new(&config, &reporter, dir.path());
        let posts = aggregator.aggregate(&site.join("__src").join("POSTS"))?;
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[1].title, "caf\u{fffd}");
        assert!(reporter.errors().is_empty());

        // The published copy keeps the original bytes.
        assert_eq!(
            fs::read(site.join("post/2023/middle/.__src/index.md")).unwrap(),
            raw
        );
        assert!(fs::read_to_string(site.join("__src").join("index.content"))
            .unwrap()
            .contains("2023/middle|caf\u{fffd}|Jun 15, 2023"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_failure_skips_one_post() -> Result<()> {
        let (dir, site) = fixture();
        let latest = site.join("__src/POSTS/2024/latest");
        std::os::unix::fs::symlink(latest.join("..").join(".."), latest.join("link")).unwrap();

        let config = Config::default();
        let reporter = Recorder::default();
        let aggregator = Aggregator::new(&config, &reporter, dir.path());
        let posts = aggregator.aggregate(&site.join("__src").join("POSTS"))?;
        assert_eq!(posts.len(), 3);

        let errors = reporter.errors();
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(errors[0].starts_with("2024/latest: "), "{}", errors[0]);
        assert!(site.join("post/2023/middle/.__src/index.md").is_file());
        assert!(site.join("post/2023/first/.__src/index.md").is_file());
        assert!(site.join("__src").join("index.content").is_file());
        Ok(())
    }

    #[test]
    fn test_summary_without_template_is_empty() -> Result<()> {
        let (dir, site) = fixture();
        fs::remove_file(site.join("__src").join("SUMMARY.template")).unwrap();

        let config = Config::default();
        let reporter = Recorder::default();
        let aggregator = Aggregator::new(&config, &reporter, dir.path());
        aggregator.aggregate(&site.join("__src").join("POSTS"))?;
        assert_eq!(
            fs::read_to_string(site.join("__src").join("index.content")).unwrap(),
            ""
        );
        Ok(())
    }

    #[test]
    fn test_flat_layout() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        let posts_root = site.join(".__src").join("POSTS");
        write(&posts_root.join("alpha").join("index.md"), &post("Alpha", "2020-02-02"));
        write(&posts_root.join("beta").join("index.md"), &post("Beta", "2021-03-03"));
        fs::create_dir_all(posts_root.join(".__src")).unwrap();

        let config = Config {
            post_layout: PostLayout::Flat,
            ..Config::default()
        };
        let reporter = Recorder::default();
        let aggregator = Aggregator::new(&config, &reporter, dir.path());
        assert_eq!(posts_marker(&config, &site), Some(posts_root.clone()));

        let posts = aggregator.aggregate(&posts_root)?;
        let keys: Vec<&str> = posts.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["beta", "alpha"]);
        assert_eq!(posts[0].year, Some(2021));
        assert!(site.join("post/alpha/.__src/index.md").is_file());
        assert!(site.join(".__src/index.content").is_file());
        Ok(())
    }
}
