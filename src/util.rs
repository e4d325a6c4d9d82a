use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub fn open(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Reads a whole file as text. Bytes that aren't valid UTF-8 are replaced
/// with U+FFFD rather than failing the read.
pub fn read_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

/// Removes `dir` and everything below it. A directory that doesn't exist is
/// already clean.
pub fn rmdir(dir: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(e),
        },
    }
}

/// Makes `path` absolute by joining it onto `cwd` if it is relative.
pub fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        cwd.join(path)
    }
}

/// Shortens `path` relative to `base` for log messages. Paths outside of
/// `base` are shown as-is.
pub fn relative<'a>(base: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

/// Replaces the extension of `file_name`. Names without the `from` extension
/// keep their full name and get `to` appended.
pub fn target_file_name(file_name: &str, from: &str, to: &str) -> String {
    let stem = file_name
        .strip_suffix(from)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(file_name);
    format!("{}.{}", stem, to)
}
