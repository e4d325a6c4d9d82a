use clap::{crate_version, App, Arg};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use webgen::build::Builder;
use webgen::config::Config;
use webgen::report::{write_fatal, Reporter, TracingReporter};

fn main() {
    let matches = App::new("webgen")
        .version(crate_version!())
        .about("Renders a directory tree of Markdown and content files into a static site")
        .arg(
            Arg::with_name("path")
                .help("The site directory to build, or a single .content or .md file to render to stdout")
                .index(1)
                .default_value("."),
        )
        .arg(
            Arg::with_name("draft")
                .long("draft")
                .short("d")
                .help("Preview a single Markdown file in the draft viewer"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .takes_value(true)
                .value_name("FILE")
                .help("Project file to use instead of searching for webgen.yaml"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Also log debug detail: each stage and every skipped directory"),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));
    let reporter = TracingReporter;

    let path = PathBuf::from(matches.value_of("path").unwrap_or("."));
    if let Err(e) = run(
        &path,
        matches.value_of("config").map(Path::new),
        matches.is_present("draft"),
        &reporter,
    ) {
        let _ = write_fatal(&mut std::io::stderr(), &e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_level(false)
        .with_target(false)
        .init();
}

fn run(path: &Path, config: Option<&Path>, draft: bool, reporter: &dyn Reporter) -> Result<(), String> {
    let config = match config {
        Some(file) => Config::from_file(file),
        None => {
            let dir = if path.is_dir() {
                path
            } else {
                path.parent().unwrap_or_else(|| Path::new("."))
            };
            Config::from_directory(&absolute(dir)?)
        }
    }
    .map_err(|e| e.to_string())?;

    let builder = Builder::new(&config, reporter).map_err(|e| e.to_string())?;
    let metadata = std::fs::metadata(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if metadata.is_dir() {
        if draft {
            return Err(String::from("--draft needs a single Markdown file"));
        }
        builder.build_site(path).map_err(|e| e.to_string())
    } else if draft {
        builder.draft(path).map(|_| ()).map_err(|e| e.to_string())
    } else {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        builder.build_file(path, &mut out).map_err(|e| e.to_string())
    }
}

fn absolute(path: &Path) -> Result<PathBuf, String> {
    let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
    Ok(cwd.join(path))
}
