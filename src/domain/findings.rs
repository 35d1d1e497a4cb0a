//! Core domain models for convention findings and scan results
//!
//! Architecture: Rich Domain Models - Findings are value objects with behavior
//! - A `Finding` locates one rule violation inside a scanned text
//! - A `Violation` is the file-level form of a finding, with line/column context
//! - `ScanReport` acts as an aggregate root managing collections of violations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels for convention findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory findings that should be addressed but don't block builds
    Warning,
    /// Findings that fail CI builds
    Error,
}

impl Severity {
    /// Whether this severity level should cause a check to fail
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A half-open byte range locating a match within scanned text
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Span {
    /// Byte offset of the first matched byte
    pub start: usize,
    /// Byte offset one past the last matched byte (`end >= start`)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no text
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the matched text out of the scanned document
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or("")
    }
}

/// One rule violation reported by a scan, located by span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that produced this finding
    pub rule_id: String,
    /// Severity of the violated rule
    pub severity: Severity,
    /// Location of the offending text
    pub span: Span,
    /// Human-readable description of the violation
    pub message: String,
}

impl Finding {
    /// Create a new finding
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self { rule_id: rule_id.into(), severity, span, message: message.into() }
    }

    /// Whether this finding is blocking (fails CI checks)
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

/// A convention violation annotated with its file location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that detected this violation
    pub rule_id: String,
    /// Severity level of this violation
    pub severity: Severity,
    /// File path where the violation was found
    pub file_path: PathBuf,
    /// Line number (1-indexed) where the violation occurs
    pub line: Option<u32>,
    /// Column number (1-indexed) where the violation starts
    pub column: Option<u32>,
    /// Human-readable description of the violation
    pub message: String,
    /// Source line around the violation
    pub context: Option<String>,
    /// When this violation was detected
    pub detected_at: DateTime<Utc>,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        file_path: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            file_path,
            line: None,
            column: None,
            message: message.into(),
            context: None,
            detected_at: Utc::now(),
        }
    }

    /// Set line and column position
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Add the source line the violation sits on
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Whether this violation is blocking (fails CI checks)
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    /// Format violation for display as `path:line:col [severity] rule: message`
    pub fn format_display(&self) -> String {
        let location = match (self.line, self.column) {
            (Some(line), Some(col)) => format!(":{line}:{col}"),
            (Some(line), None) => format!(":{line}"),
            _ => String::new(),
        };

        format!(
            "{}{} [{}] {}: {}",
            self.file_path.display(),
            location,
            self.severity.as_str(),
            self.rule_id,
            self.message
        )
    }
}

/// Summary statistics for a scan report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Total number of files analyzed
    pub total_files: usize,
    /// Number of violations by severity level
    pub violations_by_severity: SeverityCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when the scan was performed
    pub checked_at: DateTime<Utc>,
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
}

impl SeverityCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning
    }

    /// Whether there are any blocking violations
    pub fn has_blocking(&self) -> bool {
        self.error > 0
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
        }
    }
}

/// Complete scan report containing all violations and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// All violations found during the scan
    pub violations: Vec<Violation>,
    /// Summary statistics
    pub summary: ScanSummary,
    /// Fingerprint of the rule catalog used for this scan
    pub catalog_fingerprint: Option<String>,
}

impl ScanReport {
    /// Create a new empty scan report
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            summary: ScanSummary { checked_at: Utc::now(), ..Default::default() },
            catalog_fingerprint: None,
        }
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        self.summary.violations_by_severity.add(violation.severity);
        self.violations.push(violation);
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether the report contains blocking violations (errors)
    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.has_blocking()
    }

    /// Get violations of a specific severity
    pub fn violations_by_severity(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.severity == severity)
    }

    /// Set the number of files analyzed
    pub fn set_files_analyzed(&mut self, count: usize) {
        self.summary.total_files = count;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the rule catalog fingerprint
    pub fn set_catalog_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.catalog_fingerprint = Some(fingerprint.into());
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: ScanReport) {
        for violation in other.violations {
            self.add_violation(violation);
        }
        self.summary.total_files += other.summary.total_files;
    }

    /// Sort violations by file path and position for consistent output
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then_with(|| a.line.unwrap_or(0).cmp(&b.line.unwrap_or(0)))
                .then_with(|| a.column.unwrap_or(0).cmp(&b.column.unwrap_or(0)))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
    }
}

impl Default for ScanReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during linting
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// Rule catalog could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Rule is malformed (missing id, empty description, bad pattern)
    #[error("Invalid rule: {message}")]
    InvalidRule { message: String },

    /// Rule id collides with an already-registered rule
    #[error("Duplicate rule id '{id}'")]
    DuplicateRule { id: String },

    /// Analysis failed for a specific file
    #[error("Analysis error in {file}: {message}")]
    Analysis { file: String, message: String },

    /// Cache operation failed
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl LintError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create an invalid-rule error
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::InvalidRule { message: message.into() }
    }

    /// Create a duplicate-rule error
    pub fn duplicate_rule(id: impl Into<String>) -> Self {
        Self::DuplicateRule { id: id.into() }
    }

    /// Create an analysis error
    pub fn analysis(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis { file: file.into(), message: message.into() }
    }

    /// Create a cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache { message: message.into() }
    }
}

/// Result type for windlint operations
pub type LintResult<T> = Result<T, LintError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Error.is_blocking());
        assert!(!Severity::Warning.is_blocking());
    }

    #[test]
    fn test_span_slice() {
        let text = "alpha beta gamma";
        let span = Span::new(6, 10);
        assert_eq!(span.slice(text), "beta");
        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_span_slice_out_of_bounds() {
        let span = Span::new(2, 100);
        assert_eq!(span.slice("ab"), "");
    }

    #[test]
    fn test_finding_creation() {
        let finding = Finding::new(
            "no-v3-gradient-syntax",
            Severity::Error,
            Span::new(16, 31),
            "v3 gradient syntax found",
        );

        assert_eq!(finding.rule_id, "no-v3-gradient-syntax");
        assert_eq!(finding.span.start, 16);
        assert!(finding.is_blocking());
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::new(
            "no-hardcoded-color",
            Severity::Error,
            PathBuf::from("app/page.tsx"),
            "hardcoded color `bg-blue-500` found",
        )
        .with_position(12, 18)
        .with_context(r#"<div className="bg-blue-500" />"#);

        assert_eq!(violation.file_path, Path::new("app/page.tsx"));
        assert_eq!(violation.line, Some(12));
        assert_eq!(
            violation.format_display(),
            "app/page.tsx:12:18 [error] no-hardcoded-color: hardcoded color `bg-blue-500` found"
        );
    }

    #[test]
    fn test_scan_report_counts() {
        let mut report = ScanReport::new();

        report.add_violation(Violation::new(
            "no-client-db-import",
            Severity::Error,
            PathBuf::from("app/page.tsx"),
            "database module imported from a client component",
        ));
        report.add_violation(Violation::new(
            "breakpoint-order",
            Severity::Warning,
            PathBuf::from("components/hero.tsx"),
            "responsive prefixes out of ascending order",
        ));

        assert!(report.has_violations());
        assert!(report.has_errors());
        assert_eq!(report.summary.violations_by_severity.total(), 2);
        assert_eq!(report.summary.violations_by_severity.error, 1);
        assert_eq!(report.summary.violations_by_severity.warning, 1);
        assert_eq!(report.violations_by_severity(Severity::Error).count(), 1);
    }

    #[test]
    fn test_report_sorting_is_deterministic() {
        let mut report = ScanReport::new();

        for (file, line, rule) in [
            ("b.tsx", 4, "rule-b"),
            ("a.tsx", 9, "rule-a"),
            ("a.tsx", 2, "rule-b"),
            ("a.tsx", 2, "rule-a"),
        ] {
            report.add_violation(
                Violation::new(rule, Severity::Warning, PathBuf::from(file), "msg")
                    .with_position(line, 1),
            );
        }

        report.sort_violations();

        let order: Vec<_> = report
            .violations
            .iter()
            .map(|v| (v.file_path.display().to_string(), v.line.unwrap(), v.rule_id.clone()))
            .collect();
        assert_eq!(order[0], ("a.tsx".to_string(), 2, "rule-a".to_string()));
        assert_eq!(order[1], ("a.tsx".to_string(), 2, "rule-b".to_string()));
        assert_eq!(order[2], ("a.tsx".to_string(), 9, "rule-a".to_string()));
        assert_eq!(order[3], ("b.tsx".to_string(), 4, "rule-b".to_string()));
    }

    #[test]
    fn test_error_display() {
        let err = LintError::duplicate_rule("no-hardcoded-color");
        assert_eq!(err.to_string(), "Duplicate rule id 'no-hardcoded-color'");

        let err = LintError::invalid_rule("rule id must not be empty");
        assert!(err.to_string().contains("rule id must not be empty"));
    }
}
