//! Diagnostic rendering for lowering errors
//!
//! Wraps `codespan-reporting` so unsupported constructs found by the state
//! machine lowering show up with source context, a stable error code and a
//! hint on how to restructure the method.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use termcolor::{ColorChoice, NoColor, StandardStream};

use crate::ast::Span;
use crate::error::StateMachineError;

/// Error code for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// A diagnostic message with source code context
#[derive(Debug, Clone)]
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self.inner = self.inner.with_code(code.0);
        self
    }

    /// Add a primary label (main error location)
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::primary(file_id, span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a note (additional context)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Create diagnostic from a lowering error
    pub fn from_error(error: &StateMachineError, file_id: usize) -> Self {
        use StateMachineError::*;

        let diag = Diagnostic::error(error.to_string()).with_code(error_code(error));
        match error {
            GenericMethodMapping { method, span } => diag
                .with_primary_label(file_id, *span, format!("'{}' declares its own generic parameters", method))
                .with_help("Call the generic method from a non-generator helper and use its result"),

            MissingGenericInfo { type_name, span } => diag
                .with_primary_label(file_id, *span, format!("'{}' has no generic parameters", type_name))
                .with_note("Members reached through a generic instantiation are rebound to the generator's own type parameters"),

            SuspensionInHandler { span } => diag
                .with_primary_label(file_id, *span, "suspension point not allowed here")
                .with_help("Move the yield out of the catch/finally clause, or drop the catch clauses of the protected block"),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Get the underlying codespan diagnostic (for testing/custom rendering)
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(&self, files: &SimpleFiles<String, String>) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        let config = term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)
    }

    /// Render the diagnostic without colors
    pub fn render_to_string(&self, files: &SimpleFiles<String, String>) -> Result<String, codespan_reporting::files::Error> {
        let mut writer = NoColor::new(Vec::new());
        let config = term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Convert to JSON representation for IDE integration
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub code: Option<String>,
    pub severity: String,
    pub message: String,
    pub labels: Vec<JsonLabel>,
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub message: String,
    pub primary: bool,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;
                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: label.message.clone(),
                    primary: label.style == LabelStyle::Primary,
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Get error code for a lowering error
pub fn error_code(error: &StateMachineError) -> ErrorCode {
    use StateMachineError::*;

    match error {
        GenericMethodMapping { .. } => ErrorCode("E5001"),
        MissingGenericInfo { .. } => ErrorCode("E5002"),
        SuspensionInHandler { .. } => ErrorCode("E5003"),
    }
}

/// Helper to create a SimpleFiles instance from source code
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "def items():\n    try:\n        pass\n    ensure:\n        yield 1\n";

    fn yield_in_ensure() -> StateMachineError {
        StateMachineError::SuspensionInHandler {
            span: Span::new(55, 62, 5, 9),
        }
    }

    #[test]
    fn test_error_codes_are_stable() {
        let span = Span::default();
        let errors = [
            StateMachineError::GenericMethodMapping {
                method: "map".to_string(),
                span,
            },
            StateMachineError::MissingGenericInfo {
                type_name: "Plain".to_string(),
                span,
            },
            StateMachineError::SuspensionInHandler { span },
        ];
        let codes: Vec<&str> = errors.iter().map(|e| error_code(e).0).collect();
        assert_eq!(codes, vec!["E5001", "E5002", "E5003"]);
    }

    #[test]
    fn test_from_error_carries_message_and_code() {
        let diag = Diagnostic::from_error(&yield_in_ensure(), 0);
        assert_eq!(diag.inner().severity, Severity::Error);
        assert_eq!(diag.code(), Some(ErrorCode("E5003")));
        assert!(diag.message().contains("exception handler"));
        assert_eq!(diag.inner().labels.len(), 1);
    }

    #[test]
    fn test_render_to_string() {
        let files = create_files("gen.raya", SOURCE);
        let rendered = Diagnostic::from_error(&yield_in_ensure(), 0)
            .render_to_string(&files)
            .unwrap();

        assert!(rendered.contains("error[E5003]"));
        assert!(rendered.contains("gen.raya"));
        assert!(rendered.contains("help:"));
    }

    #[test]
    fn test_json_labels() {
        let files = create_files("gen.raya", SOURCE);
        let json = Diagnostic::from_error(&yield_in_ensure(), 0).to_json(&files).unwrap();

        assert!(json.contains("\"E5003\""));
        assert!(json.contains("\"start_line\": 5"));
        assert!(json.contains("\"primary\": true"));
    }
}
