//! Front matter extraction. A file may start with a block like
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! reading: 4 min
//! ---
//! # Hello
//! ```
//!
//! Extraction never fails: a missing block, an unterminated block, unknown keys
//! and unparseable dates all degrade to default values.

use chrono::NaiveDate;

/// Opens and closes a front matter block.
pub const FENCE: &str = "---";

/// The format of `date` values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Shown in place of a missing date.
pub const NO_DATE: &str = "-";

/// The fields recognized in a front matter block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,

    /// `None` when the date is missing or doesn't parse.
    pub date: Option<NaiveDate>,

    /// The reading-time hint, e.g. `4 min`.
    pub reading: String,
}

impl Metadata {
    /// Renders the metadata as a front matter block that [`extract`] parses
    /// back into an equal [`Metadata`] (for single-line values).
    pub fn to_front_matter(&self) -> String {
        let mut out = String::new();
        out.push_str(FENCE);
        out.push('\n');
        out.push_str(&format!("title: {}\n", self.title));
        if let Some(date) = self.date {
            out.push_str(&format!("date: {}\n", date.format(DATE_FORMAT)));
        }
        out.push_str(&format!("reading: {}\n", self.reading));
        out.push_str(FENCE);
        out.push('\n');
        out
    }
}

/// Splits `input` into its front matter and the remaining body.
///
/// The first non-blank line must be the fence, otherwise there is no front
/// matter and the input is returned untouched. If the block is never closed
/// the partial parse is thrown away and the input is again returned
/// untouched.
pub fn extract(input: &str) -> (Metadata, String) {
    let lines: Vec<&str> = input.split('\n').collect();
    let mut metadata = Metadata::default();
    let mut opened = false;

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == FENCE {
            if opened {
                return (metadata, lines[i + 1..].join("\n"));
            }
            opened = true;
            continue;
        }
        if !opened {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            apply(&mut metadata, key.trim(), value.trim());
        }
    }

    (Metadata::default(), input.to_owned())
}

fn apply(metadata: &mut Metadata, key: &str, value: &str) {
    match key {
        "title" => metadata.title = value.to_owned(),
        "reading" => metadata.reading = value.to_owned(),
        "date" => metadata.date = parse_date(value),
        _ => {}
    }
}

/// Parses a `YYYY-MM-DD` date. chrono accepts unpadded fields for `%m` and
/// `%d`, so the shape is checked first.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let padded = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !padded {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Formats a date for display as `Jan 2, 2006`, or [`NO_DATE`].
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => String::from(NO_DATE),
    }
}
