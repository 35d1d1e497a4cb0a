//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - formatters translate domain objects
//! - ScanReport (domain) is converted to various external representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Domain logic remains pure while supporting multiple presentation needs

use crate::domain::findings::{LintError, LintResult, ScanReport, Severity, Violation};
use serde_json::Value as JsonValue;
use std::io::Write;

/// Supported output formats for scan reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors and context
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// JUnit XML format for CI integration
    Junit,
    /// SARIF format for code-scanning tools
    Sarif,
    /// GitHub Actions annotation format
    GitHub,
}

impl OutputFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "junit" => Some(Self::Junit),
            "sarif" => Some(Self::Sarif),
            "github" => Some(Self::GitHub),
            _ => None,
        }
    }

    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "junit", "sarif", "github"]
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to show the source line around violations
    pub show_context: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
    /// Minimum severity level to include
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { use_colors: true, show_context: true, max_violations: None, min_severity: None }
    }
}

/// Main report formatter that dispatches to specific formatters
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a scan report in the specified format
    pub fn format_report(&self, report: &ScanReport, format: OutputFormat) -> LintResult<String> {
        let filtered_violations = self.filter_violations(&report.violations);

        match format {
            OutputFormat::Human => self.format_human(report, &filtered_violations),
            OutputFormat::Json => self.format_json(report, &filtered_violations),
            OutputFormat::Junit => self.format_junit(report, &filtered_violations),
            OutputFormat::Sarif => self.format_sarif(report, &filtered_violations),
            OutputFormat::GitHub => self.format_github(report, &filtered_violations),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &ScanReport,
        format: OutputFormat,
        mut writer: W,
    ) -> LintResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes()).map_err(|e| LintError::Io { source: e })?;
        Ok(())
    }

    /// Filter violations based on report options
    fn filter_violations<'a>(&self, violations: &'a [Violation]) -> Vec<&'a Violation> {
        let mut filtered: Vec<&Violation> = violations
            .iter()
            .filter(|v| {
                if let Some(min_severity) = self.options.min_severity {
                    if v.severity < min_severity {
                        return false;
                    }
                }
                true
            })
            .collect();

        if let Some(max) = self.options.max_violations {
            filtered.truncate(max);
        }

        filtered
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &ScanReport, violations: &[&Violation]) -> LintResult<String> {
        let mut output = String::new();

        if violations.is_empty() {
            if self.options.use_colors {
                output.push_str("✅ \x1b[32mNo convention violations found\x1b[0m\n");
            } else {
                output.push_str("✅ No convention violations found\n");
            }
        } else {
            let icon = if report.has_errors() { "❌" } else { "⚠️" };
            if self.options.use_colors {
                let color = if report.has_errors() { "31" } else { "33" };
                output
                    .push_str(&format!("{icon} \x1b[{color}mConvention Violations Found\x1b[0m\n\n"));
            } else {
                output.push_str(&format!("{icon} Convention Violations Found\n\n"));
            }

            // Group violations by file
            let mut by_file: std::collections::BTreeMap<&std::path::Path, Vec<&Violation>> =
                std::collections::BTreeMap::new();

            for violation in violations {
                by_file.entry(&violation.file_path).or_default().push(violation);
            }

            for (file_path, file_violations) in by_file {
                output.push_str(&format!("📁 {}\n", file_path.display()));

                for violation in file_violations {
                    let severity_color = match violation.severity {
                        Severity::Error => "31",
                        Severity::Warning => "33",
                    };

                    let position = match (violation.line, violation.column) {
                        (Some(line), Some(col)) => format!("{line}:{col}"),
                        (Some(line), None) => line.to_string(),
                        _ => "?".to_string(),
                    };

                    if self.options.use_colors {
                        output.push_str(&format!(
                            "  \x1b[2m{}\x1b[0m [\x1b[{}m{}\x1b[0m] {}: {}\n",
                            position,
                            severity_color,
                            violation.severity.as_str(),
                            violation.rule_id,
                            violation.message
                        ));
                    } else {
                        output.push_str(&format!(
                            "  {} [{}] {}: {}\n",
                            position,
                            violation.severity.as_str(),
                            violation.rule_id,
                            violation.message
                        ));
                    }

                    if self.options.show_context {
                        if let Some(context) = &violation.context {
                            if self.options.use_colors {
                                output.push_str(&format!("    \x1b[2m│ {context}\x1b[0m\n"));
                            } else {
                                output.push_str(&format!("    │ {context}\n"));
                            }
                        }
                    }

                    output.push('\n');
                }
            }
        }

        output.push_str(&self.format_summary(report));

        Ok(output)
    }

    /// Format report in JSON format
    fn format_json(&self, report: &ScanReport, violations: &[&Violation]) -> LintResult<String> {
        let json_violations: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                serde_json::json!({
                    "rule_id": v.rule_id,
                    "severity": v.severity.as_str(),
                    "file_path": v.file_path.display().to_string(),
                    "line": v.line,
                    "column": v.column,
                    "message": v.message,
                    "context": v.context,
                    "detected_at": v.detected_at.to_rfc3339()
                })
            })
            .collect();

        let json_report = serde_json::json!({
            "violations": json_violations,
            "summary": {
                "total_files": report.summary.total_files,
                "violations_by_severity": {
                    "error": report.summary.violations_by_severity.error,
                    "warning": report.summary.violations_by_severity.warning
                },
                "execution_time_ms": report.summary.execution_time_ms,
                "checked_at": report.summary.checked_at.to_rfc3339()
            },
            "catalog_fingerprint": report.catalog_fingerprint
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| LintError::config(format!("JSON serialization failed: {e}")))
    }

    /// Format report in JUnit XML format
    fn format_junit(&self, report: &ScanReport, violations: &[&Violation]) -> LintResult<String> {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let total_tests = violations.len();
        let failures = violations.iter().filter(|v| v.severity == Severity::Error).count();
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        xml.push_str(&format!(
            "<testsuite name=\"windlint\" tests=\"{total_tests}\" failures=\"{failures}\" errors=\"0\" time=\"{execution_time:.3}\">\n",
        ));

        for violation in violations {
            xml.push_str(&format!(
                "  <testcase classname=\"{}\" name=\"{}\">\n",
                violation.rule_id,
                escape_xml(&violation.file_path.display().to_string())
            ));

            if violation.severity == Severity::Error {
                xml.push_str(&format!(
                    "    <failure message=\"{}\">\n",
                    escape_xml(&violation.message)
                ));
                xml.push_str(&format!(
                    "      File: {}:{}:{}\n",
                    violation.file_path.display(),
                    violation.line.unwrap_or(0),
                    violation.column.unwrap_or(0)
                ));
                if let Some(context) = &violation.context {
                    xml.push_str(&format!("      Context: {}\n", escape_xml(context)));
                }
                xml.push_str("    </failure>\n");
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        Ok(xml)
    }

    /// Format report in SARIF format
    fn format_sarif(&self, _report: &ScanReport, violations: &[&Violation]) -> LintResult<String> {
        let sarif_results: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                let level = match v.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };

                serde_json::json!({
                    "ruleId": v.rule_id,
                    "level": level,
                    "message": {
                        "text": v.message
                    },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": {
                                "uri": v.file_path.display().to_string()
                            },
                            "region": {
                                "startLine": v.line.unwrap_or(1),
                                "startColumn": v.column.unwrap_or(1)
                            },
                            "contextRegion": v.context.as_ref().map(|c| serde_json::json!({
                                "snippet": {
                                    "text": c
                                }
                            }))
                        }
                    }]
                })
            })
            .collect();

        let sarif_report = serde_json::json!({
            "version": "2.1.0",
            "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": "windlint",
                        "version": env!("CARGO_PKG_VERSION"),
                        "informationUri": "https://github.com/windlint/windlint"
                    }
                },
                "results": sarif_results
            }]
        });

        serde_json::to_string_pretty(&sarif_report)
            .map_err(|e| LintError::config(format!("SARIF serialization failed: {e}")))
    }

    /// Format report for GitHub Actions
    fn format_github(&self, _report: &ScanReport, violations: &[&Violation]) -> LintResult<String> {
        let mut output = String::new();

        for violation in violations {
            let level = match violation.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };

            let position = match (violation.line, violation.column) {
                (Some(line), Some(col)) => format!("line={line},col={col}"),
                (Some(line), None) => format!("line={line}"),
                _ => String::new(),
            };

            let position_part =
                if position.is_empty() { String::new() } else { format!(",{position}") };

            output.push_str(&format!(
                "::{} file={},title={}{}::{}\n",
                level,
                violation.file_path.display(),
                violation.rule_id,
                position_part,
                violation.message
            ));
        }

        Ok(output)
    }

    /// Format the summary section
    fn format_summary(&self, report: &ScanReport) -> String {
        let mut summary = String::new();

        let total_violations = report.summary.violations_by_severity.total();
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        if self.options.use_colors {
            summary.push_str("📊 \x1b[1mSummary:\x1b[0m ");
        } else {
            summary.push_str("📊 Summary: ");
        }

        if total_violations == 0 {
            if self.options.use_colors {
                summary.push_str(&format!(
                    "\x1b[32m0 violations\x1b[0m in {} files ({:.1}s)\n",
                    report.summary.total_files, execution_time
                ));
            } else {
                summary.push_str(&format!(
                    "0 violations in {} files ({:.1}s)\n",
                    report.summary.total_files, execution_time
                ));
            }
        } else {
            let mut parts = Vec::new();

            if report.summary.violations_by_severity.error > 0 {
                let count = report.summary.violations_by_severity.error;
                let text = format!("{} error{}", count, if count == 1 { "" } else { "s" });
                if self.options.use_colors {
                    parts.push(format!("\x1b[31m{text}\x1b[0m"));
                } else {
                    parts.push(text);
                }
            }

            if report.summary.violations_by_severity.warning > 0 {
                let count = report.summary.violations_by_severity.warning;
                let text = format!("{} warning{}", count, if count == 1 { "" } else { "s" });
                if self.options.use_colors {
                    parts.push(format!("\x1b[33m{text}\x1b[0m"));
                } else {
                    parts.push(text);
                }
            }

            summary.push_str(&format!(
                "{} in {} files ({:.1}s)\n",
                parts.join(", "),
                report.summary.total_files,
                execution_time
            ));
        }

        summary
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
