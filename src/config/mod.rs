//! Rule catalog loading and management for windlint
//!
//! Architecture: Anti-Corruption Layer - configuration translates external YAML
//! - Raw YAML structures are converted to clean domain rules
//! - The default catalog is embedded in the domain, not infrastructure
//! - Configuration acts as a repository for rule definitions and path filters

use crate::domain::findings::{LintError, LintResult, Severity};
use crate::rules::ClassCheck;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Module specifiers that must never be imported from a client component
pub const DEFAULT_DB_MODULES: &str = r"^(?:@prisma/client|@planetscale/database|@neondatabase/serverless|drizzle-orm(?:/.*)?|pg|postgres|mysql2?|mongodb|mongoose|better-sqlite3|sqlite3|knex|redis|ioredis|server-only|@/(?:lib/)?(?:db|database|prisma)(?:/.*)?)$";

/// Main configuration structure for windlint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// Configuration format version
    pub version: String,
    /// Path filtering configuration
    pub paths: PathConfig,
    /// Rule definitions organized by category
    pub rules: HashMap<String, RuleCategory>,
}

/// Path filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Include/exclude patterns (gitignore-style)
    pub patterns: Vec<String>,
    /// Optional ignore file name (`.windlintignore`)
    pub ignore_file: Option<String>,
    /// File extensions considered during directory discovery
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// A category of rules (e.g. "tailwind", "nextjs")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCategory {
    /// Default severity for rules in this category
    pub severity: Severity,
    /// Whether this category is enabled
    pub enabled: bool,
    /// Individual rule definitions
    pub rules: Vec<RuleSpec>,
}

/// Individual rule definition
#[derive(Debug, Clone, Serialize, Deserialize, Hash)]
pub struct RuleSpec {
    /// Unique identifier for this rule
    pub id: String,
    /// What the rule enforces
    pub description: String,
    /// Kind of check backing the rule
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// The pattern: a regex, a class check name, or a module-specifier regex
    pub pattern: String,
    /// Finding message template; `{match}` expands to the matched text
    pub message: String,
    /// Severity override (uses category default if not specified)
    pub severity: Option<Severity>,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Case sensitivity for regex patterns
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Kinds of checks a rule can be backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Regular expression over the whole document
    Regex,
    /// Built-in check over extracted class attributes
    ClassAttr,
    /// Forbidden-module check over imports in client-marked files
    Import,
}

impl LintConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            LintError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            LintError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> LintResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| LintError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Get default configuration with the built-in catalog
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            paths: PathConfig {
                patterns: vec![
                    "**/node_modules/**".to_string(),
                    "**/.next/**".to_string(),
                    "**/.git/**".to_string(),
                    "**/dist/**".to_string(),
                    "**/build/**".to_string(),
                    "**/coverage/**".to_string(),
                    "**/*.min.*".to_string(),
                ],
                ignore_file: Some(".windlintignore".to_string()),
                extensions: default_extensions(),
            },
            rules: Self::default_rules(),
        }
    }

    /// The built-in rule catalog
    fn default_rules() -> HashMap<String, RuleCategory> {
        let mut rules = HashMap::new();

        rules.insert(
            "tailwind".to_string(),
            RuleCategory {
                severity: Severity::Warning,
                enabled: true,
                rules: vec![
                    RuleSpec {
                        id: "no-hardcoded-color".to_string(),
                        description: "Class attributes must use semantic theme tokens instead of raw palette colors or color literals".to_string(),
                        kind: RuleKind::ClassAttr,
                        pattern: ClassCheck::HardcodedColor.name().to_string(),
                        message: "hardcoded color `{match}` found, use a semantic theme token".to_string(),
                        severity: Some(Severity::Error),
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "no-arbitrary-bracket-spacing".to_string(),
                        description: "Spacing, sizing and z-index must use the native utility scale instead of bracketed pixel values".to_string(),
                        kind: RuleKind::ClassAttr,
                        pattern: ClassCheck::ArbitrarySpacing.name().to_string(),
                        message: "arbitrary pixel value `{match}` found, use a native scale step".to_string(),
                        severity: None,
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "no-v3-gradient-syntax".to_string(),
                        description: "Gradients must use the v4 bg-linear-to-* form".to_string(),
                        kind: RuleKind::Regex,
                        pattern: r"bg-gradient-to-[a-z]*".to_string(),
                        message: "v3 gradient syntax `{match}` found, use bg-linear-to-* instead".to_string(),
                        severity: Some(Severity::Error),
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "breakpoint-order".to_string(),
                        description: "Responsive prefixes must appear in ascending order, mobile-first".to_string(),
                        kind: RuleKind::ClassAttr,
                        pattern: ClassCheck::BreakpointOrder.name().to_string(),
                        message: "responsive prefixes out of ascending order at `{match}`, order classes mobile-first".to_string(),
                        severity: None,
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "no-v3-opacity-utility".to_string(),
                        description: "Opacity is expressed with slash modifiers in v4; the *-opacity-* utilities were removed".to_string(),
                        kind: RuleKind::Regex,
                        pattern: r"\b(?:bg|text|border|divide|ring|placeholder)-opacity-\d+\b".to_string(),
                        message: "removed opacity utility `{match}`, use a slash modifier like bg-black/50".to_string(),
                        severity: Some(Severity::Error),
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "no-deprecated-utility".to_string(),
                        description: "Several v3 utilities were renamed in v4 (shrink-*, grow-*, text-ellipsis, box-decoration-*)".to_string(),
                        kind: RuleKind::Regex,
                        pattern: r"\b(?:flex-shrink|flex-grow)(?:-\d+)?\b|\boverflow-ellipsis\b|\bdecoration-(?:slice|clone)\b".to_string(),
                        message: "deprecated utility `{match}`, use the renamed v4 form".to_string(),
                        severity: None,
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "prefer-gap-over-space".to_string(),
                        description: "Flex and grid layouts use gap utilities instead of space-x/space-y".to_string(),
                        kind: RuleKind::Regex,
                        pattern: r"\bspace-[xy]-(?:\d+(?:\.\d+)?|px|\[[^\]\s]+\])".to_string(),
                        message: "`{match}` found, prefer flex/grid gap utilities".to_string(),
                        severity: None,
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "no-important-modifier".to_string(),
                        description: "Important modifiers mask specificity problems and are not allowed".to_string(),
                        kind: RuleKind::ClassAttr,
                        pattern: ClassCheck::ImportantModifier.name().to_string(),
                        message: "important modifier on `{match}`, fix specificity instead of forcing it".to_string(),
                        severity: None,
                        enabled: true,
                        case_sensitive: true,
                    },
                ],
            },
        );

        rules.insert(
            "nextjs".to_string(),
            RuleCategory {
                severity: Severity::Warning,
                enabled: true,
                rules: vec![
                    RuleSpec {
                        id: "no-client-db-import".to_string(),
                        description: "Database and server-only modules must not be imported from client components".to_string(),
                        kind: RuleKind::Import,
                        pattern: DEFAULT_DB_MODULES.to_string(),
                        message: "database module `{match}` imported from a client component".to_string(),
                        severity: Some(Severity::Error),
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "no-inline-style".to_string(),
                        description: "Styling belongs in utility classes, not inline style attributes".to_string(),
                        kind: RuleKind::Regex,
                        pattern: r#"style=\{\{|style="[^"]*""#.to_string(),
                        message: "inline style attribute found, use utility classes instead".to_string(),
                        severity: None,
                        enabled: true,
                        case_sensitive: true,
                    },
                    RuleSpec {
                        id: "no-raw-img-element".to_string(),
                        description: "Images go through next/image for sizing and optimization".to_string(),
                        kind: RuleKind::Regex,
                        pattern: r"<img\b".to_string(),
                        message: "raw <img> element found, use next/image".to_string(),
                        severity: None,
                        enabled: true,
                        case_sensitive: true,
                    },
                ],
            },
        );

        rules
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> LintResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(LintError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        // Rule ids must be unique across the whole catalog, not just within
        // a category, since the engine registers them into one namespace
        let mut seen = HashSet::new();
        for (category_name, category) in &self.rules {
            for rule in &category.rules {
                if !seen.insert(rule.id.as_str()) {
                    return Err(LintError::config(format!(
                        "Duplicate rule id '{}' (category '{}')",
                        rule.id, category_name
                    )));
                }

                match rule.kind {
                    RuleKind::Regex => {
                        if rule.case_sensitive {
                            regex::Regex::new(&rule.pattern)
                        } else {
                            regex::RegexBuilder::new(&rule.pattern).case_insensitive(true).build()
                        }
                        .map_err(|e| {
                            LintError::config(format!(
                                "Invalid regex pattern in rule '{}': {}",
                                rule.id, e
                            ))
                        })?;
                    }
                    RuleKind::ClassAttr => {
                        if ClassCheck::parse(&rule.pattern).is_none() {
                            return Err(LintError::config(format!(
                                "Unknown class check '{}' in rule '{}'",
                                rule.pattern, rule.id
                            )));
                        }
                    }
                    RuleKind::Import => {
                        regex::Regex::new(&rule.pattern).map_err(|e| {
                            LintError::config(format!(
                                "Invalid module pattern in rule '{}': {}",
                                rule.id, e
                            ))
                        })?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Get all enabled rules across all categories
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&String, &RuleCategory, &RuleSpec)> {
        self.rules.iter().filter(|(_, category)| category.enabled).flat_map(
            |(name, category)| {
                category
                    .rules
                    .iter()
                    .filter(|rule| rule.enabled)
                    .map(move |rule| (name, category, rule))
            },
        )
    }

    /// Get effective severity for a rule (rule override or category default)
    pub fn effective_severity(&self, category: &RuleCategory, rule: &RuleSpec) -> Severity {
        rule.severity.unwrap_or(category.severity)
    }

    /// Find a rule definition by id
    pub fn find_rule(&self, rule_id: &str) -> Option<(&String, &RuleCategory, &RuleSpec)> {
        self.rules.iter().find_map(|(name, category)| {
            category.rules.iter().find(|r| r.id == rule_id).map(|r| (name, category, r))
        })
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> LintResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LintError::config(format!("Failed to serialize config: {e}")))
    }

    /// Create a fingerprint of the catalog for cache validation
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        // Sort categories to ensure consistent ordering
        let mut sorted_categories: Vec<_> = self.rules.iter().collect();
        sorted_categories.sort_by_key(|(name, _)| name.as_str());

        self.version.hash(&mut hasher);
        self.paths.patterns.len().hash(&mut hasher);
        for pattern in &self.paths.patterns {
            pattern.hash(&mut hasher);
        }
        self.paths.ignore_file.hash(&mut hasher);
        for ext in &self.paths.extensions {
            ext.hash(&mut hasher);
        }

        for (category_name, category) in sorted_categories {
            category_name.hash(&mut hasher);
            category.severity.hash(&mut hasher);
            category.enabled.hash(&mut hasher);

            let mut sorted_rules = category.rules.clone();
            sorted_rules.sort_by(|a, b| a.id.cmp(&b.id));

            for rule in sorted_rules {
                rule.hash(&mut hasher);
            }
        }

        format!("{:x}", hasher.finish())
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx", "html", "vue", "svelte", "astro", "mdx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: LintConfig,
}

impl ConfigBuilder {
    /// Create a new builder with the default catalog
    pub fn new() -> Self {
        Self { config: LintConfig::default() }
    }

    /// Add a path pattern
    pub fn add_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.paths.patterns.push(pattern.into());
        self
    }

    /// Set the ignore file name
    pub fn ignore_file(mut self, filename: impl Into<String>) -> Self {
        self.config.paths.ignore_file = Some(filename.into());
        self
    }

    /// Add an analyzed file extension
    pub fn add_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.paths.extensions.push(ext.into());
        self
    }

    /// Add a rule category
    pub fn add_category(mut self, name: impl Into<String>, category: RuleCategory) -> Self {
        self.config.rules.insert(name.into(), category);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> LintResult<LintConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
