//! Diagnostics collection for type library projection.
//!
//! Most problems found while projecting a type graph are recoverable: an unsupported
//! type/marshalling combination drops a member, an unresolved reference degrades to
//! `IUnknown`, duplicate explicit dispatch IDs are cleared. None of these abort the run,
//! but every one of them must reach the user. This module provides the sink they are
//! reported to.
//!
//! # Architecture
//!
//! A single [`Diagnostics`] container is shared by every stage of an export:
//! - **Projection**: unsupported type/hint pairs and generic signatures
//! - **Dispatch IDs**: duplicate explicit identifiers
//! - **Resolution**: references that fall back to `IUnknown`
//! - **Layout**: members dropped from interfaces, records and coclasses
//!
//! The container uses `boxcar::Vec` for lock-free append operations, so a sink can be
//! shared behind an [`std::sync::Arc`] without further synchronization.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Thread-safe container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity, code and subject
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Stage of the pipeline that reported the entry
//! - [`HRESULT`] - Result codes attached to diagnostics
//!
//! # Usage Examples
//!
//! ```rust
//! use tlbscope::metadata::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics, HRESULT};
//!
//! let diagnostics = Diagnostics::new();
//!
//! diagnostics.push(
//!     Diagnostic::new(
//!         DiagnosticSeverity::Warning,
//!         DiagnosticCategory::DispatchId,
//!         "Duplicate dispatch ID 5 removed",
//!     )
//!     .with_code(HRESULT::TYPE_E_DUPLICATEID)
//!     .with_subject("Demo.IWidget"),
//! );
//!
//! assert_eq!(diagnostics.with_code(HRESULT::TYPE_E_DUPLICATEID).len(), 1);
//! ```

use std::fmt::{self, Write};

/// Result codes attached to diagnostics.
///
/// The values are the `HRESULT`s that type library tooling traditionally reports for the
/// corresponding condition, so that callers can filter or map them onto existing tooling.
#[allow(non_snake_case)]
pub mod HRESULT {
    /// Two members of one interface claim the same dispatch ID
    pub const TYPE_E_DUPLICATEID: u32 = 0x8002_88C6;
    /// A type cannot be marshalled with the given marshalling hint
    pub const TLBX_E_BAD_NATIVETYPE: u32 = 0x8013_1186;
    /// An interface reference could not be resolved and was replaced by `IUnknown`
    pub const TLBX_I_USEIUNKNOWN: u32 = 0x0013_116F;
    /// A signature uses a generic type instantiation
    pub const TLBX_E_GENERICINST_SIGNATURE: u32 = 0x8013_1AEA;
    /// A generic argument or unsupported input was passed
    pub const E_INVALIDARG: u32 = 0x8007_0057;
}

/// Severity level of a diagnostic entry.
///
/// Determines how the diagnostic should be treated and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    Info,

    /// Warning about a degraded or dropped element.
    ///
    /// The export continues, but the produced library differs from what the
    /// managed declaration asked for.
    Warning,

    /// Error indicating that an element could not be produced at all.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating the stage that reported a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Type projection issues.
    ///
    /// Examples: unsupported marshalling hint, generic instantiation in a signature.
    Projection,

    /// Dispatch ID allocation issues.
    ///
    /// Examples: duplicate explicit dispatch IDs.
    DispatchId,

    /// Reference resolution issues.
    ///
    /// Examples: interface replaced by `IUnknown`, library not found for an assembly.
    Reference,

    /// Layout issues while assembling interfaces, coclasses and records.
    ///
    /// Examples: member dropped, implemented interface skipped.
    Export,

    /// General issues not fitting other categories.
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Projection => write!(f, "Projection"),
            DiagnosticCategory::DispatchId => write!(f, "DispatchId"),
            DiagnosticCategory::Reference => write!(f, "Reference"),
            DiagnosticCategory::Export => write!(f, "Export"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Optional result code, see [`HRESULT`].
    pub code: Option<u32>,

    /// Optional name of the type or member the issue refers to.
    pub subject: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            code: None,
            subject: None,
        }
    }

    /// Adds a result code to the diagnostic.
    #[must_use]
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    /// Adds the name of the affected type or member to the diagnostic.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(code) = self.code {
            write!(f, " (code: 0x{:08x})", code)?;
        }

        if let Some(subject) = &self.subject {
            write!(f, " (in: {})", subject)?;
        }

        Ok(())
    }
}

/// Thread-safe container for collecting diagnostic entries.
///
/// Uses `boxcar::Vec` internally for lock-free concurrent append operations.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning diagnostic.
    ///
    /// # Arguments
    ///
    /// * `category` - Category of the diagnostic
    /// * `message` - Description of the issue
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds a warning diagnostic carrying a result code and subject.
    pub fn report(
        &self,
        category: DiagnosticCategory,
        code: u32,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(
            Diagnostic::new(DiagnosticSeverity::Warning, category, message)
                .with_code(code)
                .with_subject(subject),
        );
    }

    /// Adds an error diagnostic.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry directly.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    /// Returns the number of info-level diagnostics.
    pub fn info_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Info)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    ///
    /// Note: Uses boxcar's iterator which yields `(index, &Diagnostic)` tuples.
    /// The index can be ignored in most cases.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all errors as a vector.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Error)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.category == category)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics carrying the given result code.
    pub fn with_code(&self, code: u32) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.code == Some(code))
            .map(|(_, d)| d)
            .collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let error_count = self.error_count();
        let warning_count = self.warning_count();
        let info_count = self.info_count();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s)",
            error_count, warning_count, info_count
        );

        if error_count > 0 {
            output.push_str("\nErrors:\n");
            for diag in self.errors() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        if warning_count > 0 {
            output.push_str("\nWarnings:\n");
            for diag in self.warnings() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Projection,
            "Test message",
        );

        assert_eq!(diag.severity, DiagnosticSeverity::Warning);
        assert_eq!(diag.category, DiagnosticCategory::Projection);
        assert_eq!(diag.message, "Test message");
        assert!(diag.code.is_none());
        assert!(diag.subject.is_none());
    }

    #[test]
    fn test_diagnostic_with_context() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::DispatchId,
            "Duplicate id",
        )
        .with_code(HRESULT::TYPE_E_DUPLICATEID)
        .with_subject("Demo.IWidget");

        assert_eq!(diag.code, Some(0x8002_88C6));
        assert_eq!(diag.subject.as_deref(), Some("Demo.IWidget"));
    }

    #[test]
    fn test_diagnostics_container() {
        let diagnostics = Diagnostics::new();

        diagnostics.info(DiagnosticCategory::General, "Info message");
        diagnostics.warning(DiagnosticCategory::Reference, "Warning message");
        diagnostics.error(DiagnosticCategory::Export, "Error message");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.info_count(), 1);
        assert!(diagnostics.has_errors());
        assert!(diagnostics.has_warnings());
        assert!(diagnostics.has_any());
    }

    #[test]
    fn test_diagnostics_thread_safety() {
        let diagnostics = Arc::new(Diagnostics::new());
        let mut handles = vec![];

        for i in 0..10 {
            let diag_clone = Arc::clone(&diagnostics);
            handles.push(thread::spawn(move || {
                diag_clone.warning(DiagnosticCategory::General, format!("Thread {} warning", i));
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(diagnostics.count(), 10);
    }

    #[test]
    fn test_diagnostics_by_category_and_code() {
        let diagnostics = Diagnostics::new();

        diagnostics.report(
            DiagnosticCategory::Projection,
            HRESULT::TLBX_E_BAD_NATIVETYPE,
            "Demo.IWidget.Run",
            "bad hint",
        );
        diagnostics.report(
            DiagnosticCategory::Projection,
            HRESULT::TLBX_E_GENERICINST_SIGNATURE,
            "Demo.IWidget.List",
            "generic",
        );
        diagnostics.report(
            DiagnosticCategory::Reference,
            HRESULT::TLBX_I_USEIUNKNOWN,
            "Demo.IWidget.Peer",
            "unresolved",
        );

        assert_eq!(diagnostics.by_category(DiagnosticCategory::Projection).len(), 2);
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Reference).len(), 1);
        assert_eq!(diagnostics.with_code(HRESULT::TLBX_I_USEIUNKNOWN).len(), 1);
        assert_eq!(diagnostics.warning_count(), 3);
    }

    #[test]
    fn test_category_names() {
        let categories = [
            DiagnosticCategory::Projection,
            DiagnosticCategory::DispatchId,
            DiagnosticCategory::Reference,
            DiagnosticCategory::Export,
            DiagnosticCategory::General,
        ];
        let names: Vec<_> = categories.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["Projection", "DispatchId", "Reference", "Export", "General"]);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Projection,
            "Parse failed",
        )
        .with_code(HRESULT::TLBX_E_BAD_NATIVETYPE)
        .with_subject("Demo.Widget");

        let display = format!("{}", diag);
        assert!(display.contains("WARN"));
        assert!(display.contains("Projection"));
        assert!(display.contains("Parse failed"));
        assert!(display.contains("0x80131186"));
        assert!(display.contains("Demo.Widget"));
    }
}
