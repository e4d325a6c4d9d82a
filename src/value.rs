//! The records handed to templates, and their conversion into template
//! [`Value`]s. Field names follow Go template conventions, so templates
//! address them as `{{.Title}}`, `{{.FormattedDate}}`, `{{.Body}}` and so on.

use crate::metadata::{format_date, Metadata, DATE_FORMAT};
use chrono::NaiveDate;
use gtmpl_value::Value;
use std::collections::HashMap;

/// The data record every template is executed against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentRecord {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub formatted_date: String,
    pub reading: String,

    /// The post's relative path (`year/slug`); empty for anything that isn't
    /// a post.
    pub key: String,

    /// Rendered HTML, inserted into the template verbatim.
    pub body: String,
}

impl ContentRecord {
    /// A record carrying nothing but `body`. Content chains pass each stage's
    /// output to the next this way.
    pub fn with_body(body: String) -> ContentRecord {
        ContentRecord {
            body,
            ..ContentRecord::default()
        }
    }

    /// A record for `metadata`, with the display date filled in.
    pub fn from_metadata(metadata: &Metadata, key: &str, body: String) -> ContentRecord {
        ContentRecord {
            title: metadata.title.clone(),
            date: metadata.date,
            formatted_date: format_date(metadata.date),
            reading: metadata.reading.clone(),
            key: key.to_owned(),
            body,
        }
    }
}

impl From<&ContentRecord> for Value {
    fn from(record: &ContentRecord) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("Title".to_owned(), Value::String(record.title.clone()));
        m.insert(
            "Date".to_owned(),
            Value::String(match record.date {
                Some(date) => date.format(DATE_FORMAT).to_string(),
                None => String::new(),
            }),
        );
        m.insert(
            "FormattedDate".to_owned(),
            Value::String(record.formatted_date.clone()),
        );
        m.insert("Reading".to_owned(), Value::String(record.reading.clone()));
        m.insert("Key".to_owned(), Value::String(record.key.clone()));
        m.insert("Body".to_owned(), Value::String(record.body.clone()));
        Value::Object(m)
    }
}

/// The record the summary template is executed against: every post, most
/// recent first, addressed as `{{range .Posts}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub posts: Vec<ContentRecord>,
}

impl From<&Summary> for Value {
    fn from(summary: &Summary) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "Posts".to_owned(),
            Value::Array(summary.posts.iter().map(Value::from).collect()),
        );
        Value::Object(m)
    }
}
