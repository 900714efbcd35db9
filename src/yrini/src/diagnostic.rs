// yrini/src/diagnostic.rs

//! Non-fatal structural diagnostics.
//!
//! Reads are best effort: a dangling parent, an inheritance cycle or a missing
//! include never aborts anything. Each such condition becomes a [`Diagnostic`]
//! that is logged through the `log` facade and recorded in a [`Diagnostics`]
//! sink kept next to (never inside) the document data.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// A recoverable condition found while reading, resolving or writing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// A parent named by `[Child]:[Parent]` or `$Inherits` is not declared
    #[error("[{section}] inherits from [{parent}], which is not declared in the document")]
    DanglingParent { section: String, parent: String },

    /// The parent graph loops back onto the active resolution path
    #[error("inheritance cycle while resolving [{section}]: [{via}] lists [{parent}] as a parent")]
    InheritanceCycle {
        section: String,
        via: String,
        parent: String,
    },

    /// A header key was redefined with a different value while merging files
    #[error("header key '{key}' overwritten by {file}: '{old}' -> '{new}'")]
    HeaderKeyOverwritten {
        key: String,
        old: String,
        new: String,
        file: String,
    },

    /// A section key was redefined with a different value while merging files
    #[error("[{section}] key '{key}' overwritten by {file}")]
    SectionKeyOverwritten {
        section: String,
        key: String,
        file: String,
    },

    /// Colon-only output was requested for a section with several parents
    #[error("[{section}] has {} parents ({}); colon syntax holds one, inheritance not written", .parents.len(), .parents.join(","))]
    AmbiguousColonInheritance {
        section: String,
        parents: Vec<String>,
    },

    /// An own pair was deleted but an ancestor still provides the key
    #[error("deleted '{key}' from [{section}], but [{ancestor}] still provides it; the game keeps reading the inherited value")]
    ShadowedDelete {
        section: String,
        key: String,
        ancestor: String,
    },

    /// An included file could not be read and was skipped
    #[error("include {} skipped: {reason}", .path.display())]
    MissingInclude { path: PathBuf, reason: String },

    /// An included file was already loaded earlier in the tree
    #[error("include {} already loaded, skipping repeated reference", .path.display())]
    RepeatedInclude { path: PathBuf },

    /// A value could not be written verbatim without changing how it re-reads
    #[error("[{section}] value of '{key}' escaped on output: {value:?}")]
    ValueEscaped {
        section: String,
        key: String,
        value: String,
    },

    /// A line or heading could not be read as written and was recovered
    #[error("{file}:{line}: {reason}: {text}")]
    MalformedLine {
        file: String,
        line: usize,
        text: String,
        reason: String,
    },
}

/// How loudly a diagnostic is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Expected during normal composition (e.g. last-loaded-wins overrides)
    Info,
    /// Output is probably not what the game will see
    Warning,
}

impl Severity {
    /// Log level used when the diagnostic is reported.
    pub fn log_level(self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
        }
    }
}

impl Diagnostic {
    /// Get the severity level of this diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::SectionKeyOverwritten { .. } => Severity::Info,
            Diagnostic::RepeatedInclude { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Section the diagnostic is about, if any.
    pub fn section(&self) -> Option<&str> {
        match self {
            Diagnostic::DanglingParent { section, .. }
            | Diagnostic::InheritanceCycle { section, .. }
            | Diagnostic::SectionKeyOverwritten { section, .. }
            | Diagnostic::AmbiguousColonInheritance { section, .. }
            | Diagnostic::ShadowedDelete { section, .. }
            | Diagnostic::ValueEscaped { section, .. } => Some(section),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    seen: HashSet<Diagnostic>,
}

/// Shared, ordered, deduplicated diagnostic sink.
///
/// Cloning yields another handle to the same log. Reporting the same
/// diagnostic twice records (and logs) it once.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    inner: Arc<Mutex<DiagnosticLog>>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DiagnosticLog> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a diagnostic and log it at its severity.
    pub fn report(&self, diagnostic: Diagnostic) {
        let mut log = self.lock();
        if log.seen.contains(&diagnostic) {
            return;
        }
        log::log!(diagnostic.severity().log_level(), "{}", diagnostic);
        log.seen.insert(diagnostic.clone());
        log.entries.push(diagnostic);
    }

    /// Record several diagnostics in order.
    pub fn extend<I: IntoIterator<Item = Diagnostic>>(&self, diagnostics: I) {
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
    }

    /// Copy of everything recorded so far, in report order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.lock().entries.clone()
    }

    /// Drain the log. Diagnostics taken out may be reported again later.
    pub fn take(&self) -> Vec<Diagnostic> {
        let mut log = self.lock();
        log.seen.clear();
        std::mem::take(&mut log.entries)
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Check if two handles point at the same log.
    pub fn same_sink(&self, other: &Diagnostics) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Check if any recorded diagnostic matches the predicate.
    pub fn any<F: Fn(&Diagnostic) -> bool>(&self, predicate: F) -> bool {
        self.lock().entries.iter().any(predicate)
    }
}
