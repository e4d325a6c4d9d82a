//! The observability sink handed to every component. The generator never logs
//! through a global; it calls a [`Reporter`] passed down from the caller, and
//! the binary wires that to [`tracing`] via [`TracingReporter`].

/// Receives progress and failure messages. Reporting is informational only;
/// nothing downstream depends on what a reporter does with a message.
pub trait Reporter {
    /// Detail that is only interesting when debugging a build: stages and
    /// skipped directories.
    fn debug(&self, message: &str);

    /// A file discovered, a template chosen, an output written.
    fn info(&self, message: &str);

    /// A failure that was skipped over.
    fn error(&self, message: &str);
}

/// Forwards messages to the [`tracing`] macros. Errors are emitted as single
/// lines prefixed with `ERROR:`.
#[derive(Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("ERROR: {}", message);
    }
}

/// Writes the message a failed run exits with. It goes straight to `w`
/// rather than through [`tracing`], so no log filter can suppress it.
pub fn write_fatal<W: std::io::Write>(w: &mut W, message: &str) -> std::io::Result<()> {
    writeln!(w, "ERROR: {}", message)
}
