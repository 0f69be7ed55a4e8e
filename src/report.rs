use core::cell::RefCell;

/// How much a reported message matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Progress narration: parsed values, diffs, files changed.
    Info,
    /// Non-fatal failures, like a version string the parse pattern does not match.
    Warning,
}

/// A sink for the messages produced while parsing, serializing and rewriting versions.
///
/// Every operation that narrates what it does takes a `&dyn Reporter`, so callers decide where
/// messages go.
pub trait Reporter {
    /// Records a message with the given severity.
    fn report(&self, severity: Severity, message: &str);

    /// Records an informational message.
    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    /// Records a warning.
    fn warn(&self, message: &str) {
        self.report(Severity::Warning, message);
    }
}

/// Forwards messages to the [`tracing`] macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
        }
    }
}

/// Keeps every message in memory, in the order reported.
#[derive(Debug, Default)]
pub struct Collector {
    entries: RefCell<Vec<(Severity, String)>>,
}

impl Collector {
    /// Returns a new, empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything reported so far.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.borrow().clone()
    }

    /// Returns the messages reported with the given severity.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl Reporter for Collector {
    fn report(&self, severity: Severity, message: &str) {
        self.entries
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}
