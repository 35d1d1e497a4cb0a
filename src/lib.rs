//! windlint - Advisory linting for Tailwind CSS v4 and Next.js conventions
//!
//! Architecture: Clean Architecture - the library interface is the application layer
//! - Pure domain logic separated from infrastructure concerns
//! - Clean boundaries between the rule engine and external dependencies
//! - The validator API wires catalog, analyzer, cache and reporting together

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod domain;
pub mod report;
pub mod rules;

// Re-export main types for convenient access
pub use domain::findings::{
    Finding, LintError, LintResult, ScanReport, ScanSummary, Severity, SeverityCounts, Span,
    Violation,
};

pub use config::{ConfigBuilder, LintConfig, RuleCategory, RuleKind, RuleSpec};

pub use analyzer::{AnalysisOptions, Analyzer, PathFilter, RuleStats};

pub use rules::{Check, ClassCheck, Findings, Rule, RuleEngine};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use cache::{CacheStatistics, FileCache};

use std::path::{Path, PathBuf};

/// Main validator providing high-level lint operations
pub struct LintValidator {
    analyzer: Analyzer,
    cache: Option<FileCache>,
    report_formatter: ReportFormatter,
}

/// Options for lint workflows
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Whether to use caching for improved performance
    pub use_cache: bool,
    /// Cache file path (defaults to .windlint/cache.json)
    pub cache_path: Option<PathBuf>,
    /// Output format for results
    pub output_format: OutputFormat,
    /// Report options
    pub report_options: ReportOptions,
    /// Analysis options
    pub analysis_options: AnalysisOptions,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            use_cache: false,
            cache_path: None,
            output_format: OutputFormat::Human,
            report_options: ReportOptions::default(),
            analysis_options: AnalysisOptions::default(),
        }
    }
}

impl LintValidator {
    /// Create a new validator with the given configuration
    pub fn new_with_config(config: LintConfig) -> LintResult<Self> {
        let analyzer = Analyzer::new(config)?;
        let report_formatter = ReportFormatter::default();

        Ok(Self { analyzer, cache: None, report_formatter })
    }

    /// Create a validator with the default catalog
    pub fn new() -> LintResult<Self> {
        Self::new_with_config(LintConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        let config = LintConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Enable caching with the specified cache file
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_path: P) -> LintResult<Self> {
        let mut cache = FileCache::new(cache_path);
        cache.load()?;
        cache.set_catalog_fingerprint(self.analyzer.catalog_fingerprint());
        self.cache = Some(cache);
        Ok(self)
    }

    /// Set a custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// Lint files or directories with default options
    pub async fn check_paths<P: AsRef<Path>>(&mut self, paths: Vec<P>) -> LintResult<ScanReport> {
        self.check_with_options(paths, &LintOptions::default()).await
    }

    /// Lint files or directories with custom options
    pub async fn check_with_options<P: AsRef<Path>>(
        &mut self,
        paths: Vec<P>,
        options: &LintOptions,
    ) -> LintResult<ScanReport> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();

        if options.use_cache && self.cache.is_some() {
            self.check_with_cache(&paths, &options.analysis_options)
        } else {
            self.analyzer.analyze_paths(&paths, &options.analysis_options)
        }
    }

    /// Lint a single file
    pub fn check_file<P: AsRef<Path>>(&self, file_path: P) -> LintResult<ScanReport> {
        let violations = self.analyzer.analyze_file(file_path)?;

        let mut report = ScanReport::new();
        for violation in violations {
            report.add_violation(violation);
        }
        report.set_files_analyzed(1);
        report.sort_violations();

        Ok(report)
    }

    /// Lint an entire directory tree
    pub fn check_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> LintResult<ScanReport> {
        self.analyzer.analyze_directory(root, options)
    }

    /// Scan raw text against the configured catalog
    pub fn scan_text(&self, text: &str) -> Findings {
        self.analyzer.scan_text(text)
    }

    /// Format a scan report for output
    pub fn format_report(&self, report: &ScanReport, format: OutputFormat) -> LintResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Get statistics about the configured rules
    pub fn rule_statistics(&self) -> RuleStats {
        self.analyzer.rule_stats()
    }

    /// Get cache statistics (if caching is enabled)
    pub fn cache_statistics(&self) -> Option<CacheStatistics> {
        self.cache.as_ref().map(|c| c.statistics())
    }

    /// Clear cache (if enabled)
    pub fn clear_cache(&mut self) -> LintResult<()> {
        if let Some(cache) = &mut self.cache {
            cache.clear()?;
        }
        Ok(())
    }

    /// Save cache to disk (if enabled and modified)
    pub fn save_cache(&mut self) -> LintResult<()> {
        if let Some(cache) = &mut self.cache {
            cache.save()?;
        }
        Ok(())
    }

    /// Cleanup cache by removing entries for non-existent files
    pub fn cleanup_cache(&mut self) -> LintResult<Option<usize>> {
        if let Some(cache) = &mut self.cache { Ok(Some(cache.cleanup()?)) } else { Ok(None) }
    }

    /// Cache-aware lint that skips files that haven't changed
    fn check_with_cache(
        &mut self,
        paths: &[PathBuf],
        options: &AnalysisOptions,
    ) -> LintResult<ScanReport> {
        let start_time = std::time::Instant::now();
        let fingerprint = self.analyzer.catalog_fingerprint();

        let candidates = self.analyzer.discover_files(paths, options)?;

        let files_to_check = if let Some(cache) = &mut self.cache {
            let mut fresh = Vec::new();
            for file_path in &candidates {
                match cache.needs_analysis(file_path, &fingerprint) {
                    Ok(true) => fresh.push(file_path.clone()),
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("Cache check failed for {}: {}", file_path.display(), e);
                        fresh.push(file_path.clone());
                    }
                }
            }
            fresh
        } else {
            candidates.clone()
        };

        let mut report = ScanReport::new();

        if !files_to_check.is_empty() {
            let fresh_report = self.analyzer.analyze_paths(&files_to_check, options)?;

            if let Some(cache) = &mut self.cache {
                for file_path in &files_to_check {
                    let count = fresh_report
                        .violations
                        .iter()
                        .filter(|v| v.file_path == *file_path)
                        .count();
                    if let Err(e) = cache.update_entry(file_path, count, &fingerprint) {
                        tracing::warn!(
                            "Failed to update cache for {}: {}",
                            file_path.display(),
                            e
                        );
                    }
                }
            }

            for violation in fresh_report.violations {
                report.add_violation(violation);
            }
        }

        report.set_files_analyzed(candidates.len());
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_catalog_fingerprint(fingerprint);
        report.sort_violations();

        Ok(report)
    }
}

/// Convenience function to create a validator with default settings
pub fn create_validator() -> LintResult<LintValidator> {
    LintValidator::new()
}

/// Convenience function to lint files with default settings
pub async fn lint_files<P: AsRef<Path>>(files: Vec<P>) -> LintResult<ScanReport> {
    let mut validator = LintValidator::new()?;
    validator.check_paths(files).await
}

/// Convenience function to lint a directory with default settings
pub fn lint_directory<P: AsRef<Path>>(directory: P) -> LintResult<ScanReport> {
    let validator = LintValidator::new()?;
    validator.check_directory(directory, &AnalysisOptions::default())
}

/// CI integration utilities
pub mod ci {
    use super::*;

    /// Pre-commit check for hook and bot workflows
    ///
    /// Returns an error if any blocking violations are found in the given
    /// files, so callers can gate commits on a clean result.
    pub async fn pre_commit_check<P: AsRef<Path>>(modified_files: Vec<P>) -> LintResult<()> {
        let mut validator = LintValidator::new()?;
        let report = validator.check_paths(modified_files).await?;

        if report.has_errors() {
            let error_count = report.summary.violations_by_severity.error;
            return Err(LintError::config(format!(
                "Pre-commit check failed: {} blocking violation{} found",
                error_count,
                if error_count == 1 { "" } else { "s" }
            )));
        }

        Ok(())
    }

    /// Strict check for CI pipelines, failing on any violation at all
    pub async fn strict_check<P: AsRef<Path>>(files: Vec<P>) -> LintResult<ScanReport> {
        let mut validator = LintValidator::new()?;
        let report = validator.check_paths(files).await?;

        if report.has_violations() {
            return Err(LintError::config(format!(
                "Strict check failed: {} violations found",
                report.violations.len()
            )));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validator_creation() {
        let validator = LintValidator::new().unwrap();
        let stats = validator.rule_statistics();

        assert!(stats.enabled_rules > 0);
    }

    #[tokio::test]
    async fn test_check_paths() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("page.tsx");

        fs::write(&test_file, "<div className=\"bg-gradient-to-r from-primary\" />\n").unwrap();

        let mut validator = LintValidator::new().unwrap();
        let report = validator.check_paths(vec![test_file]).await.unwrap();

        assert!(report.has_violations());
        assert!(report.violations.iter().any(|v| v.rule_id == "no-v3-gradient-syntax"));
    }

    #[test]
    fn test_single_file_check() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("page.tsx");

        fs::write(&test_file, "<div className=\"w-[37px]\" />\n").unwrap();

        let validator = LintValidator::new().unwrap();
        let report = validator.check_file(&test_file).unwrap();

        assert!(report.has_violations());
        assert_eq!(report.summary.total_files, 1);
    }

    #[test]
    fn test_scan_text() {
        let validator = LintValidator::new().unwrap();
        let text = r#"<div className="bg-blue-500" />"#;

        let findings: Vec<_> = validator.scan_text(text).collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "no-hardcoded-color");
    }

    #[test]
    fn test_directory_check() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("app")).unwrap();
        fs::write(root.join("app/page.tsx"), "<div className=\"!mt-4\" />\n").unwrap();
        fs::write(root.join("app/layout.tsx"), "<div className=\"flex gap-4\" />\n").unwrap();

        let validator = LintValidator::new().unwrap();
        let report = validator.check_directory(root, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.summary.total_files, 2);
        assert!(report.has_violations());
        assert!(!report.has_errors());
    }

    #[test]
    fn test_report_formatting() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("page.tsx");

        fs::write(&test_file, "<div className=\"bg-red-500\" />\n").unwrap();

        let validator = LintValidator::new().unwrap();
        let report = validator.check_file(&test_file).unwrap();

        let human = validator.format_report(&report, OutputFormat::Human).unwrap();
        assert!(human.contains("Convention Violations Found"));

        let json = validator.format_report(&report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["violations"].is_array());
    }

    #[tokio::test]
    async fn test_cached_check_skips_unchanged_files() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("page.tsx");
        let cache_path = temp_dir.path().join(".windlint/cache.json");

        fs::write(&test_file, "<div className=\"bg-red-500\" />\n").unwrap();

        let mut validator =
            LintValidator::new().unwrap().with_cache(&cache_path).unwrap();
        let options = LintOptions { use_cache: true, ..Default::default() };

        let first = validator
            .check_with_options(vec![test_file.clone()], &options)
            .await
            .unwrap();
        assert!(first.has_errors());

        // Second run hits the cache for the unchanged file
        let second = validator
            .check_with_options(vec![test_file.clone()], &options)
            .await
            .unwrap();
        assert_eq!(second.summary.total_files, 1);
        assert!(second.violations.is_empty());

        let stats = validator.cache_statistics().unwrap();
        assert!(stats.hits >= 1);
    }

    #[tokio::test]
    async fn test_ci_pre_commit_check() {
        let temp_dir = TempDir::new().unwrap();
        let clean_file = temp_dir.path().join("clean.tsx");
        let dirty_file = temp_dir.path().join("dirty.tsx");

        fs::write(&clean_file, "<div className=\"flex gap-4 bg-primary\" />\n").unwrap();
        fs::write(&dirty_file, "<div className=\"bg-blue-500\" />\n").unwrap();

        assert!(ci::pre_commit_check(vec![clean_file]).await.is_ok());
        assert!(ci::pre_commit_check(vec![dirty_file]).await.is_err());
    }

    #[tokio::test]
    async fn test_ci_strict_check_rejects_warnings() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("page.tsx");

        // A warning-only violation still fails the strict check
        fs::write(&test_file, "<div className=\"space-x-4\" />\n").unwrap();

        assert!(ci::strict_check(vec![test_file]).await.is_err());
    }

    #[test]
    fn test_convenience_functions() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("page.tsx");

        fs::write(&test_file, "<div className=\"flex gap-4\" />\n").unwrap();

        let validator = create_validator().unwrap();
        assert!(validator.rule_statistics().enabled_rules > 0);

        let report = lint_directory(temp_dir.path()).unwrap();
        assert_eq!(report.summary.total_files, 1);
        assert!(!report.has_violations());
    }
}
