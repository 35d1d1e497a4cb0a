//! Main analysis orchestrator for windlint
//!
//! CDD Principle: Domain Services - Analyzer orchestrates the lint workflow
//! - Coordinates path filtering, rule scanning, and result aggregation
//! - Provides a clean interface for linting single files or directory trees
//! - Handles parallel processing and error recovery gracefully

pub mod path_filter;

use crate::config::LintConfig;
use crate::domain::findings::{
    Finding, LintError, LintResult, ScanReport, Violation,
};
use crate::rules::{Findings, RuleEngine};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub use path_filter::PathFilter;

/// Main analyzer that orchestrates the entire lint process
pub struct Analyzer {
    /// Configuration for this analysis
    config: LintConfig,
    /// Rule engine built from the enabled catalog entries
    engine: RuleEngine,
    /// Path filter for determining which files to lint
    path_filter: PathFilter,
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel processing
    pub parallel: bool,
    /// Maximum number of files to lint
    pub max_files: Option<usize>,
    /// Whether to continue on errors or fail fast
    pub fail_fast: bool,
    /// Additional paths to exclude for this run
    pub exclude_patterns: Vec<String>,
    /// Whether to skip .windlintignore files
    pub ignore_ignore_files: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_files: None,
            fail_fast: false,
            exclude_patterns: Vec::new(),
            ignore_ignore_files: false,
        }
    }
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: LintConfig) -> LintResult<Self> {
        let mut engine = RuleEngine::new();

        for (category_name, category, rule) in config.enabled_rules() {
            let severity = config.effective_severity(category, rule);
            engine.add_spec(rule, severity).map_err(|e| {
                LintError::config(format!(
                    "Failed to add rule '{}' in category '{}': {}",
                    rule.id, category_name, e
                ))
            })?;
        }

        let ignore_file = match config.paths.ignore_file.as_deref() {
            Some("") | None => None,
            Some(name) => Some(name.to_string()),
        };

        let path_filter = PathFilter::new(config.paths.patterns.clone(), ignore_file)?;

        Ok(Self { config, engine, path_filter })
    }

    /// Create an analyzer with the default catalog
    pub fn with_defaults() -> LintResult<Self> {
        Self::new(LintConfig::default())
    }

    /// Access the underlying rule engine
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Scan raw text against the configured catalog
    pub fn scan_text(&self, text: &str) -> Findings {
        self.engine.scan(text)
    }

    /// Whether directory discovery considers this file's extension
    pub fn handles_file<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.config.paths.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }

    /// Lint a single file and return its violations
    pub fn analyze_file<P: AsRef<Path>>(&self, file_path: P) -> LintResult<Vec<Violation>> {
        let file_path = file_path.as_ref();

        if !self.path_filter.should_analyze(file_path)? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(file_path).map_err(|e| {
            LintError::analysis(
                file_path.display().to_string(),
                format!("Failed to read file: {e}"),
            )
        })?;

        let violations = self
            .engine
            .scan(&content)
            .map(|finding| self.finding_to_violation(file_path, &content, finding))
            .collect();

        Ok(violations)
    }

    /// Convert an engine finding into a file-level violation
    fn finding_to_violation(&self, file_path: &Path, content: &str, finding: Finding) -> Violation {
        let (line, column, context) = locate(content, finding.span.start);

        Violation::new(finding.rule_id, finding.severity, file_path.to_path_buf(), finding.message)
            .with_position(line, column)
            .with_context(context)
    }

    /// Discover the set of files a run over `paths` would lint
    pub fn discover_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<Vec<PathBuf>> {
        let mut filter = self.path_filter.clone();
        if options.ignore_ignore_files {
            filter = filter.without_ignore_files();
        }
        for pattern in &options.exclude_patterns {
            filter.add_pattern(pattern.clone())?;
        }

        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                // Explicitly named files skip extension gating
                if filter.should_analyze(path)? {
                    files.push(path.to_path_buf());
                }
            } else if path.is_dir() {
                for discovered in filter.find_files(path)? {
                    if self.handles_file(&discovered) {
                        files.push(discovered);
                    }
                }
            }
        }

        if let Some(max_files) = options.max_files {
            files.truncate(max_files);
        }

        Ok(files)
    }

    /// Lint multiple files or directories and return a complete report
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<ScanReport> {
        let start_time = Instant::now();
        let files = self.discover_files(paths, options)?;
        let total_files = files.len();

        let violations = if options.parallel && files.len() > 1 {
            self.analyze_files_parallel(&files, options)?
        } else {
            self.analyze_files_sequential(&files, options)?
        };

        let mut report = ScanReport::new();
        for violation in violations {
            report.add_violation(violation);
        }

        report.set_files_analyzed(total_files);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_catalog_fingerprint(self.config.fingerprint());
        report.sort_violations();

        Ok(report)
    }

    /// Lint files sequentially
    fn analyze_files_sequential(
        &self,
        files: &[PathBuf],
        options: &AnalysisOptions,
    ) -> LintResult<Vec<Violation>> {
        let mut all_violations = Vec::new();

        for file_path in files {
            match self.analyze_file(file_path) {
                Ok(violations) => all_violations.extend(violations),
                Err(e) => {
                    if options.fail_fast {
                        return Err(e);
                    }
                    tracing::warn!("Failed to lint {}: {}", file_path.display(), e);
                }
            }
        }

        Ok(all_violations)
    }

    /// Lint files in parallel
    fn analyze_files_parallel(
        &self,
        files: &[PathBuf],
        options: &AnalysisOptions,
    ) -> LintResult<Vec<Violation>> {
        let violations = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));

        files.par_iter().for_each(|file_path| match self.analyze_file(file_path) {
            Ok(file_violations) => {
                if let Ok(mut v) = violations.lock() {
                    v.extend(file_violations);
                }
            }
            Err(e) => {
                if let Ok(mut errs) = errors.lock() {
                    errs.push((file_path.clone(), e));
                }
            }
        });

        let errors = match Arc::try_unwrap(errors) {
            Ok(mutex) => mutex.into_inner().unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        if !errors.is_empty() {
            if options.fail_fast {
                if let Some((file_path, error)) = errors.into_iter().next() {
                    return Err(LintError::analysis(
                        file_path.display().to_string(),
                        error.to_string(),
                    ));
                }
            } else {
                for (file_path, error) in errors {
                    tracing::warn!("Failed to lint {}: {}", file_path.display(), error);
                }
            }
        }

        let violations = match Arc::try_unwrap(violations) {
            Ok(mutex) => mutex.into_inner().unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        Ok(violations)
    }

    /// Lint a directory tree and return a report
    pub fn analyze_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> LintResult<ScanReport> {
        self.analyze_paths(&[root.as_ref()], options)
    }

    /// Get the catalog fingerprint for cache validation
    pub fn catalog_fingerprint(&self) -> String {
        self.config.fingerprint()
    }

    /// Get statistics about the configured rules
    pub fn rule_stats(&self) -> RuleStats {
        let mut stats = RuleStats::default();

        for category in self.config.rules.values() {
            if category.enabled {
                stats.enabled_categories += 1;

                for rule in &category.rules {
                    if rule.enabled {
                        stats.enabled_rules += 1;
                        match rule.kind {
                            crate::config::RuleKind::Regex => stats.regex_rules += 1,
                            crate::config::RuleKind::ClassAttr => stats.class_attr_rules += 1,
                            crate::config::RuleKind::Import => stats.import_rules += 1,
                        }
                    } else {
                        stats.disabled_rules += 1;
                    }
                }
            } else {
                stats.disabled_categories += 1;
                stats.disabled_rules += category.rules.len();
            }
        }

        stats
    }
}

/// Statistics about configured rules
#[derive(Debug, Default)]
pub struct RuleStats {
    pub enabled_categories: usize,
    pub disabled_categories: usize,
    pub enabled_rules: usize,
    pub disabled_rules: usize,
    pub regex_rules: usize,
    pub class_attr_rules: usize,
    pub import_rules: usize,
}

impl RuleStats {
    pub fn total_categories(&self) -> usize {
        self.enabled_categories + self.disabled_categories
    }

    pub fn total_rules(&self) -> usize {
        self.enabled_rules + self.disabled_rules
    }
}

/// Get 1-indexed line/column and the containing line for a byte offset
fn locate(content: &str, byte_offset: usize) -> (u32, u32, String) {
    let mut line = 1;
    let mut col = 1;
    let mut line_start = 0;

    for (i, ch) in content.char_indices() {
        if i >= byte_offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
            line_start = i + 1;
        } else {
            col += 1;
        }
    }

    let line_end =
        content[line_start..].find('\n').map(|pos| line_start + pos).unwrap_or(content.len());
    let context = content[line_start..line_end].trim().to_string();

    (line, col, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_analyzer_creation() {
        let analyzer = Analyzer::with_defaults().unwrap();
        let stats = analyzer.rule_stats();

        assert!(stats.enabled_rules > 0);
        assert!(stats.regex_rules > 0);
        assert!(stats.class_attr_rules > 0);
        assert!(stats.import_rules > 0);
    }

    #[test]
    fn test_single_file_analysis() -> LintResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("hero.tsx");

        fs::write(
            &file_path,
            "export function Hero() {\n  return <div className=\"bg-gradient-to-r from-primary\" />;\n}\n",
        )?;

        let analyzer = Analyzer::with_defaults()?;
        let violations = analyzer.analyze_file(&file_path)?;

        assert!(!violations.is_empty());
        let gradient = violations.iter().find(|v| v.rule_id == "no-v3-gradient-syntax").unwrap();
        assert_eq!(gradient.line, Some(2));
        assert!(gradient.context.as_deref().unwrap().contains("bg-gradient-to-r"));

        Ok(())
    }

    #[test]
    fn test_directory_analysis_gates_extensions() -> LintResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("app"))?;
        fs::write(root.join("app/page.tsx"), "<div className=\"bg-red-500\" />\n")?;
        fs::write(root.join("app/notes.txt"), "bg-gradient-to-r\n")?;

        let analyzer = Analyzer::with_defaults()?;
        let report = analyzer.analyze_directory(root, &AnalysisOptions::default())?;

        // Only the tsx file is discovered; the txt file never contributes
        assert_eq!(report.summary.total_files, 1);
        assert!(report.violations.iter().all(|v| v.file_path.ends_with("app/page.tsx")));
        assert!(report.has_errors());

        Ok(())
    }

    #[test]
    fn test_explicit_file_skips_extension_gate() -> LintResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("snippet.txt");
        fs::write(&file_path, "<div className=\"bg-gradient-to-r\" />\n")?;

        let analyzer = Analyzer::with_defaults()?;
        let report = analyzer.analyze_paths(&[&file_path], &AnalysisOptions::default())?;

        assert_eq!(report.summary.total_files, 1);
        assert!(report.has_violations());

        Ok(())
    }

    #[test]
    fn test_exclude_patterns_option() -> LintResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("app"))?;
        fs::create_dir_all(root.join("legacy"))?;
        fs::write(root.join("app/page.tsx"), "<div className=\"bg-red-500\" />\n")?;
        fs::write(root.join("legacy/old.tsx"), "<div className=\"bg-red-500\" />\n")?;

        let analyzer = Analyzer::with_defaults()?;
        let options = AnalysisOptions {
            exclude_patterns: vec!["**/legacy/**".to_string()],
            ..Default::default()
        };
        let report = analyzer.analyze_directory(root, &options)?;

        assert_eq!(report.summary.total_files, 1);

        Ok(())
    }

    #[test]
    fn test_max_files_option() -> LintResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("a.tsx"), "<div className=\"mt-1\" />\n")?;
        fs::write(root.join("b.tsx"), "<div className=\"mt-2\" />\n")?;

        let analyzer = Analyzer::with_defaults()?;
        let options = AnalysisOptions { max_files: Some(1), ..Default::default() };
        let report = analyzer.analyze_directory(root, &options)?;

        assert_eq!(report.summary.total_files, 1);

        Ok(())
    }

    #[test]
    fn test_parallel_and_sequential_agree() -> LintResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for i in 0..4 {
            fs::write(
                root.join(format!("f{i}.tsx")),
                "<div className=\"bg-blue-500 w-[37px]\" />\n",
            )?;
        }

        let analyzer = Analyzer::with_defaults()?;
        let parallel = analyzer
            .analyze_directory(root, &AnalysisOptions { parallel: true, ..Default::default() })?;
        let sequential = analyzer
            .analyze_directory(root, &AnalysisOptions { parallel: false, ..Default::default() })?;

        let as_tuples = |r: &ScanReport| {
            r.violations
                .iter()
                .map(|v| (v.file_path.clone(), v.line, v.column, v.rule_id.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(as_tuples(&parallel), as_tuples(&sequential));

        Ok(())
    }

    #[test]
    fn test_locate_positions() {
        let content = "first line\nsecond line here\n";
        let offset = content.find("here").unwrap();
        let (line, col, context) = locate(content, offset);

        assert_eq!(line, 2);
        assert_eq!(col, 13);
        assert_eq!(context, "second line here");
    }
}
