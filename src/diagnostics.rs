//! Diagnostic side channel for every recoverable condition.
//!
//! Registry construction never fails on data-shaped problems. Invalid names,
//! conflicts, broken redirects and net-index overflow are reported here and
//! the registry stays consistent and queryable.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// How loud a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Log,
    Warning,
    Error,
}

/// Stable identity of a diagnostic, independent of its message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A row's name was malformed; it was dropped or normalized.
    InvalidTagName,
    /// Two sources explicitly registered the same restricted path, or a
    /// non-restricted row tried to redefine a restricted tag.
    RestrictedTagConflict,
    /// A non-restricted row added an explicit tag under a restricted tag that
    /// does not allow non-restricted children.
    NonRestrictedChildConflict,
    /// The same old name was redirected to two different new names.
    DuplicateRedirect,
    /// A redirect target was invalid, or the redirect chain was too long.
    UnresolvedRedirect,
    /// A redirected old name is still present in the dictionary.
    RedirectedTagStillExists,
    /// A configured common tag is not in the dictionary.
    MissingCommonTag,
    /// More tags than the net-index width can represent.
    NetIndexOverflow,
    /// A received net index is out of range.
    NetIndexDesync,
    /// A strict tag request named an unknown tag.
    MissingTag,
    /// An unknown tag name was found while loading persisted data.
    InvalidTagLoaded,
    /// A tag source name was reused with a different source type.
    SourceTypeMismatch,
    /// A native tag was added after native registration closed.
    NativeTagsClosed,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTagName => "invalid_tag_name",
            Self::RestrictedTagConflict => "restricted_tag_conflict",
            Self::NonRestrictedChildConflict => "non_restricted_child_conflict",
            Self::DuplicateRedirect => "duplicate_redirect",
            Self::UnresolvedRedirect => "unresolved_redirect",
            Self::RedirectedTagStillExists => "redirected_tag_still_exists",
            Self::MissingCommonTag => "missing_common_tag",
            Self::NetIndexOverflow => "net_index_overflow",
            Self::NetIndexDesync => "net_index_desync",
            Self::MissingTag => "missing_tag",
            Self::InvalidTagLoaded => "invalid_tag_loaded",
            Self::SourceTypeMismatch => "source_type_mismatch",
            Self::NativeTagsClosed => "native_tags_closed",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// The tag name, source name or redirect the diagnostic is about.
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Identity used for deduplication: the same kind about the same subject.
    pub fn id(&self) -> (DiagnosticKind, &str) {
        (self.kind, self.subject.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.kind, self.message)
    }
}

/// Receives diagnostics. Implementations must be cheap and non-blocking.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, d: &Diagnostic) {
        match d.severity {
            Severity::Error => {
                tracing::error!(kind = %d.kind, subject = %d.subject, "{}", d.message)
            }
            Severity::Warning => {
                tracing::warn!(kind = %d.kind, subject = %d.subject, "{}", d.message)
            }
            Severity::Log => {
                tracing::info!(kind = %d.kind, subject = %d.subject, "{}", d.message)
            }
        }
    }
}

/// Stores every diagnostic it receives; handy for tests and tooling.
#[derive(Debug, Default)]
pub struct CollectingSink {
    items: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything received so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.items.lock().clone()
    }

    /// Remove and return everything received so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.items.lock())
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.lock().iter().filter(|d| d.kind == kind).count()
    }

    pub fn has(&self, kind: DiagnosticKind, subject: &str) -> bool {
        self.items
            .lock()
            .iter()
            .any(|d| d.kind == kind && d.subject == subject)
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.items.lock().push(diagnostic.clone());
    }
}

/// Observer list owned by a registry.
#[derive(Clone)]
pub struct Diagnostics {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            sinks: vec![Arc::new(TracingSink)],
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Diagnostics {
    /// An observer list with no sinks at all, not even `tracing`.
    pub fn silent() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sinks.push(sink);
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        for sink in &self.sinks {
            sink.report(&diagnostic);
        }
    }

    pub fn error(
        &self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(Diagnostic::new(Severity::Error, kind, subject, message));
    }

    pub fn warn(
        &self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(Diagnostic::new(Severity::Warning, kind, subject, message));
    }

    pub fn log(
        &self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(Diagnostic::new(Severity::Log, kind, subject, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_receives_everything() {
        let sink = CollectingSink::new();
        let mut diagnostics = Diagnostics::silent();
        diagnostics.add_sink(sink.clone());

        diagnostics.error(DiagnosticKind::InvalidTagName, "A..B", "bad");
        diagnostics.warn(DiagnosticKind::MissingCommonTag, "Nope", "missing");

        assert_eq!(sink.diagnostics().len(), 2);
        assert!(sink.has(DiagnosticKind::InvalidTagName, "A..B"));
        assert_eq!(sink.count(DiagnosticKind::MissingCommonTag), 1);

        let taken = sink.take();
        assert_eq!(taken[0].severity, Severity::Error);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        let mut diagnostics = Diagnostics::silent();
        diagnostics.add_sink(Arc::new(move |_: &Diagnostic| *counter.lock() += 1));

        diagnostics.log(DiagnosticKind::MissingTag, "X", "x");
        diagnostics.log(DiagnosticKind::MissingTag, "Y", "y");
        assert_eq!(*seen.lock(), 2);
    }

    #[test]
    fn identity_ignores_message() {
        let a = Diagnostic::new(Severity::Error, DiagnosticKind::MissingTag, "A", "one");
        let b = Diagnostic::new(Severity::Warning, DiagnosticKind::MissingTag, "A", "two");
        assert_eq!(a.id(), b.id());
    }
}
