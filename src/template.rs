//! Loading and executing template files. Templates use Go template syntax
//! (`{{.Title}}`, `{{range .Posts}}...{{end}}`) through [`gtmpl`].

use crate::resolve::TemplateRef;
use crate::util::open;
use gtmpl::Context;
use gtmpl_value::Value;
use std::fmt;
use std::path::PathBuf;

/// A parsed template and the name it is reported under.
pub struct Template {
    pub name: String,
    inner: gtmpl::Template,
}

impl Template {
    /// Parses `source` as a template called `name`.
    pub fn parse(name: &str, source: &str) -> Result<Template> {
        let mut inner = gtmpl::Template::default();
        inner.parse(source).map_err(|err| Error::Parse {
            name: name.to_owned(),
            err,
        })?;
        Ok(Template {
            name: name.to_owned(),
            inner,
        })
    }

    /// Reads and parses the template file a resolver found.
    pub fn load(template: &TemplateRef) -> Result<Template> {
        use std::io::Read;
        let mut source = String::new();
        open(&template.path)
            .and_then(|mut file| file.read_to_string(&mut source))
            .map_err(|err| Error::Open {
                path: template.path.clone(),
                err,
            })?;
        Template::parse(&template.name(), &source)
    }

    /// Executes the template against `value` and returns the output text.
    pub fn render<V: Into<Value>>(&self, value: V) -> Result<String> {
        let execute = |err: String| Error::Execute {
            name: self.name.clone(),
            err,
        };
        let context = Context::from(value.into()).map_err(execute)?;
        let mut out: Vec<u8> = Vec::new();
        self.inner.execute(&mut out, &context).map_err(execute)?;
        String::from_utf8(out).map_err(|err| Error::Execute {
            name: self.name.clone(),
            err: err.to_string(),
        })
    }
}

/// The result of a template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading or executing a template.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems reading a template file.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when a template file isn't a valid template.
    Parse { name: String, err: String },

    /// Returned when executing a template fails, e.g. because it references a
    /// field the record doesn't have.
    Execute { name: String, err: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening template file `{}`: {}", path.display(), err)
            }
            Error::Parse { name, err } => {
                write!(f, "Parsing template `{}`: {}", name, err)
            }
            Error::Execute { name, err } => {
                write!(f, "Executing template `{}`: {}", name, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Parse { .. } => None,
            Error::Execute { .. } => None,
        }
    }
}
