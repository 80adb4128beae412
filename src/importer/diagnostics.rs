//! Diagnostics collection for module imports.
//!
//! Recoverable problems during an import are reported here and processing
//! continues; only fatal conditions abort. The container is plain and
//! single-threaded, matching the importer's execution model: one import call
//! owns its diagnostics exclusively.

use std::fmt::{self, Write};

use strum::{AsRefStr, Display};

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem
    #[strum(serialize = "INFO")]
    Info,
    /// The import continues, but the affected member may be incomplete
    #[strum(serialize = "WARN")]
    Warning,
    /// Invalid input or an unsupported edit; the affected member is unusable
    #[strum(serialize = "ERROR")]
    Error,
}

/// Stable diagnostic codes for import failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum DiagnosticCode {
    /// Could not find declaring type of edited method in source
    #[strum(serialize = "IM0001")]
    DeclaringTypeNotFound,
    /// Could not find the edited method in source
    #[strum(serialize = "IM0002")]
    EditedMethodNotFound,
    /// Could not resolve a type reference targeting the target module
    #[strum(serialize = "IM0003")]
    TargetTypeRefNotFound,
    /// Could not find a referenced method in either module
    #[strum(serialize = "IM0004")]
    MethodNotFound,
    /// Could not find a referenced field in either module
    #[strum(serialize = "IM0005")]
    FieldNotFound,
    /// Renaming a virtual property is not supported
    #[strum(serialize = "IM0006")]
    VirtualPropertyRename,
    /// Renaming a virtual event is not supported
    #[strum(serialize = "IM0007")]
    VirtualEventRename,
    /// Renaming a virtual method is not supported
    #[strum(serialize = "IM0008")]
    VirtualMethodRename,
    /// Toggling static on the edited method is not supported
    #[strum(serialize = "IM0009")]
    EditedMethodStaticToggle,
    /// Unsupported debug file format (portable or embedded PDB)
    #[strum(serialize = "IM0010")]
    UnsupportedDebugFormat,
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct ImportDiagnostic {
    /// Severity level of this diagnostic
    pub severity: DiagnosticSeverity,
    /// Stable code identifying the failure class
    pub code: DiagnosticCode,
    /// Human-readable description of the issue
    pub message: String,
    /// Optional member or type full name the issue applies to
    pub location: Option<String>,
}

impl ImportDiagnostic {
    /// Creates a new diagnostic entry.
    pub fn new(
        severity: DiagnosticSeverity,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        ImportDiagnostic {
            severity,
            code,
            message: message.into(),
            location: None,
        }
    }

    /// Adds a member/type location to the diagnostic.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ImportDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

/// Container collecting diagnostic entries during one import.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<ImportDiagnostic>,
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Adds a warning diagnostic.
    pub fn warning(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.push(ImportDiagnostic::new(
            DiagnosticSeverity::Warning,
            code,
            message,
        ));
    }

    /// Adds an error diagnostic.
    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.push(ImportDiagnostic::new(
            DiagnosticSeverity::Error,
            code,
            message,
        ));
    }

    /// Adds a diagnostic entry directly.
    ///
    /// Use this for diagnostics that carry location information.
    pub fn push(&mut self, diagnostic: ImportDiagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Returns true if any error-level diagnostics have been collected.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns the total number of diagnostics.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &ImportDiagnostic> {
        self.entries.iter()
    }

    /// Returns diagnostics filtered by code.
    #[must_use]
    pub fn by_code(&self, code: DiagnosticCode) -> Vec<&ImportDiagnostic> {
        self.entries.iter().filter(|d| d.code == code).collect()
    }

    /// Consumes the container and returns the collected entries.
    #[must_use]
    pub fn into_vec(self) -> Vec<ImportDiagnostic> {
        self.entries
    }

    /// Formats a summary of all diagnostics for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let errors = self
            .entries
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count();
        let warnings = self
            .entries
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .count();

        let mut output = String::new();
        let _ = writeln!(output, "Import: {errors} error(s), {warnings} warning(s)");
        for diag in &self.entries {
            let _ = writeln!(output, "  {diag}");
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

    #[test]
    fn code_display_is_stable() {
        assert_eq!(DiagnosticCode::DeclaringTypeNotFound.to_string(), "IM0001");
        assert_eq!(DiagnosticCode::EditedMethodStaticToggle.to_string(), "IM0009");
        assert_eq!(DiagnosticCode::UnsupportedDebugFormat.to_string(), "IM0010");
    }

    #[test]
    fn diagnostic_display() {
        let diag = ImportDiagnostic::new(
            DiagnosticSeverity::Error,
            DiagnosticCode::MethodNotFound,
            "Could not find method 'Helper'",
        )
        .with_location("MyApp.Widget");
        assert_eq!(
            diag.to_string(),
            "[ERROR] IM0004: Could not find method 'Helper' (MyApp.Widget)"
        );
    }

    #[test]
    fn container_counts() {
        let mut diags = Diagnostics::new();
        diags.warning(DiagnosticCode::VirtualMethodRename, "warn");
        assert!(!diags.has_errors());
        diags.error(DiagnosticCode::FieldNotFound, "gone");
        assert!(diags.has_errors());
        assert_eq!(diags.count(), 2);
        assert_eq!(diags.by_code(DiagnosticCode::FieldNotFound).len(), 1);
    }
}
