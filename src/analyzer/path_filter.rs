//! Path filtering using .gitignore-style patterns
//!
//! Architecture: Service Layer - PathFilter orchestrates path matching logic
//! - Encapsulates the rules for include/exclude pattern evaluation
//! - Provides a clean interface for deciding whether a path is linted
//! - Handles .windlintignore file discovery and parsing

use crate::domain::findings::{LintError, LintResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Manages path filtering using .gitignore-style patterns
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Include/exclude patterns
    patterns: Vec<FilterPattern>,
    /// Whether to process .windlintignore files
    process_ignore_files: bool,
    /// Name of ignore files to process
    ignore_filename: String,
}

/// A single path filter pattern
#[derive(Debug, Clone)]
struct FilterPattern {
    /// The glob pattern
    pattern: glob::Pattern,
    /// Whether this is an include pattern (starts with !)
    is_include: bool,
    /// Original pattern string
    original: String,
}

fn parse_pattern(pattern_str: &str) -> LintResult<FilterPattern> {
    let (is_include, pattern_str) = if let Some(stripped) = pattern_str.strip_prefix('!') {
        (true, stripped.to_string())
    } else {
        (false, pattern_str.to_string())
    };

    let pattern = glob::Pattern::new(&pattern_str)
        .map_err(|e| LintError::config(format!("Invalid pattern '{pattern_str}': {e}")))?;

    Ok(FilterPattern { pattern, is_include, original: pattern_str })
}

impl PathFilter {
    /// Create a new path filter with the given patterns
    pub fn new(patterns: Vec<String>, ignore_filename: Option<String>) -> LintResult<Self> {
        let filter_patterns =
            patterns.iter().map(|p| parse_pattern(p)).collect::<LintResult<Vec<_>>>()?;

        Ok(Self {
            patterns: filter_patterns,
            process_ignore_files: ignore_filename.is_some(),
            ignore_filename: ignore_filename.unwrap_or_else(|| ".windlintignore".to_string()),
        })
    }

    /// Create a default path filter with sensible exclusions
    pub fn with_defaults() -> LintResult<Self> {
        Self::new(
            vec![
                "**/node_modules/**".to_string(),
                "**/.next/**".to_string(),
                "**/.git/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
                "**/coverage/**".to_string(),
                "**/*.min.*".to_string(),
            ],
            Some(".windlintignore".to_string()),
        )
    }

    /// Disable ignore-file processing for this run
    pub fn without_ignore_files(mut self) -> Self {
        self.process_ignore_files = false;
        self
    }

    /// Check if a file should be linted based on all patterns and ignore files
    pub fn should_analyze<P: AsRef<Path>>(&self, path: P) -> LintResult<bool> {
        let path = path.as_ref();

        // Start with default: include all files; later patterns win, as in
        // .gitignore semantics
        let mut should_include = true;

        for pattern in &self.patterns {
            if self.pattern_matches_path(pattern, path) {
                should_include = pattern.is_include;
            }
        }

        if !should_include {
            return Ok(false);
        }

        if self.process_ignore_files && self.is_ignored_by_files(path)? {
            return Ok(false);
        }

        Ok(true)
    }

    /// Check if path is ignored by .windlintignore files up the directory tree
    fn is_ignored_by_files<P: AsRef<Path>>(&self, path: P) -> LintResult<bool> {
        let path = path.as_ref();
        let mut current_dir = path.parent();
        let mut is_ignored = false;

        while let Some(dir) = current_dir {
            let ignore_file = dir.join(&self.ignore_filename);

            if ignore_file.exists() {
                let patterns = self.load_ignore_file(&ignore_file)?;

                for pattern in patterns {
                    if let Ok(relative_path) = path.strip_prefix(dir) {
                        if self.pattern_matches_path(&pattern, relative_path) {
                            is_ignored = !pattern.is_include;
                        }
                    }
                }
            }

            current_dir = dir.parent();
        }

        Ok(is_ignored)
    }

    /// Load patterns from a .windlintignore file
    fn load_ignore_file<P: AsRef<Path>>(&self, path: P) -> LintResult<Vec<FilterPattern>> {
        let content = fs::read_to_string(&path).map_err(|e| {
            LintError::config(format!(
                "Failed to read ignore file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let mut patterns = Vec::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_pattern(line) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => {
                    // Skip invalid patterns rather than failing the whole run
                    tracing::warn!(
                        "Invalid pattern '{}' in {}: {}",
                        line,
                        path.as_ref().display(),
                        e
                    );
                }
            }
        }

        Ok(patterns)
    }

    /// Get all files that should be linted in a directory tree
    pub fn find_files<P: AsRef<Path>>(&self, root: P) -> LintResult<Vec<PathBuf>> {
        let root = root.as_ref();
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(false).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();

            if path.is_file() && self.should_analyze(path)? {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Filter a list of paths to only those that should be linted
    pub fn filter_paths<P: AsRef<Path>>(&self, paths: &[P]) -> LintResult<Vec<PathBuf>> {
        let mut filtered = Vec::new();

        for path in paths {
            if self.should_analyze(path)? {
                filtered.push(path.as_ref().to_path_buf());
            }
        }

        Ok(filtered)
    }

    /// Add a pattern to the filter
    pub fn add_pattern(&mut self, pattern: String) -> LintResult<()> {
        self.patterns.push(parse_pattern(&pattern)?);
        Ok(())
    }

    /// Check if a pattern matches a path using .gitignore-style rules
    fn pattern_matches_path(&self, pattern: &FilterPattern, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if pattern.original.ends_with('/') {
            // Directory pattern - only match directories
            if !path.is_dir() {
                return false;
            }
            let dir_pattern = pattern.original.trim_end_matches('/');
            return glob::Pattern::new(dir_pattern).map(|p| p.matches(&path_str)).unwrap_or(false);
        }

        if pattern.original.contains('/') {
            // Pattern contains slash - match full path
            pattern.pattern.matches(&path_str)
        } else if let Some(filename) = path.file_name() {
            // No slash - match filename only
            pattern.pattern.matches(&filename.to_string_lossy())
        } else {
            false
        }
    }
}
