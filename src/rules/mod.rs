//! Rule engine for detecting styling-convention violations
//!
//! Architecture: Service Layer - the engine coordinates the different check kinds
//! - Each registered `Rule` wraps one detector (regex, class check, import check,
//!   or a caller-supplied closure) behind a uniform `detect` operation
//! - Scan results are translated to ordered findings at the boundary

pub mod class_attr;
pub mod imports;

use crate::config::{RuleKind, RuleSpec};
use crate::domain::findings::{Finding, LintError, LintResult, Severity, Span};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

pub use class_attr::{extract_attrs, ClassAttr, ClassCheck, ClassToken};
pub use imports::{client_import_spans, has_client_directive};

type CustomDetect = Box<dyn Fn(&str) -> Vec<Span> + Send + Sync>;

/// The detector behind a rule
pub enum Check {
    /// Compiled regex applied to the whole document
    Regex(Regex),
    /// Token-level check over extracted class attributes
    ClassAttr(ClassCheck),
    /// Forbidden-module check over imports in client-marked files
    ClientImport(Regex),
    /// Caller-supplied detector
    Custom(CustomDetect),
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::ClassAttr(check) => f.debug_tuple("ClassAttr").field(&check.name()).finish(),
            Self::ClientImport(re) => f.debug_tuple("ClientImport").field(&re.as_str()).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A named, declarative check mapping text to zero or more spans
#[derive(Debug)]
pub struct Rule {
    id: String,
    description: String,
    message: String,
    severity: Severity,
    check: Check,
}

impl Rule {
    fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        check: Check,
    ) -> Self {
        let description = description.into();
        Self { id: id.into(), message: description.clone(), description, severity, check }
    }

    /// Create a regex-backed rule (case-sensitive)
    pub fn regex(
        id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        pattern: &str,
    ) -> LintResult<Self> {
        let id = id.into();
        let regex = Regex::new(pattern).map_err(|e| {
            LintError::invalid_rule(format!("invalid regex in rule '{id}': {e}"))
        })?;
        Ok(Self::new(id, description, severity, Check::Regex(regex)))
    }

    /// Create a rule backed by a built-in class-attribute check
    pub fn class_attr(
        id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        check: ClassCheck,
    ) -> Self {
        Self::new(id, description, severity, Check::ClassAttr(check))
    }

    /// Create a client-boundary rule flagging imports matching `module_pattern`
    pub fn client_import(
        id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        module_pattern: &str,
    ) -> LintResult<Self> {
        let id = id.into();
        let regex = Regex::new(module_pattern).map_err(|e| {
            LintError::invalid_rule(format!("invalid module pattern in rule '{id}': {e}"))
        })?;
        Ok(Self::new(id, description, severity, Check::ClientImport(regex)))
    }

    /// Create a rule from a caller-supplied detector
    pub fn custom<F>(
        id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        detect: F,
    ) -> Self
    where
        F: Fn(&str) -> Vec<Span> + Send + Sync + 'static,
    {
        Self::new(id, description, severity, Check::Custom(Box::new(detect)))
    }

    /// Build a rule from its catalog entry with the category-resolved severity
    pub fn from_spec(spec: &RuleSpec, severity: Severity) -> LintResult<Self> {
        let check = match spec.kind {
            RuleKind::Regex => {
                let regex = if spec.case_sensitive {
                    Regex::new(&spec.pattern)
                } else {
                    RegexBuilder::new(&spec.pattern).case_insensitive(true).build()
                }
                .map_err(|e| {
                    LintError::invalid_rule(format!("invalid regex in rule '{}': {e}", spec.id))
                })?;
                Check::Regex(regex)
            }
            RuleKind::ClassAttr => {
                let check = ClassCheck::parse(&spec.pattern).ok_or_else(|| {
                    LintError::invalid_rule(format!(
                        "unknown class check '{}' in rule '{}'",
                        spec.pattern, spec.id
                    ))
                })?;
                Check::ClassAttr(check)
            }
            RuleKind::Import => {
                let regex = Regex::new(&spec.pattern).map_err(|e| {
                    LintError::invalid_rule(format!(
                        "invalid module pattern in rule '{}': {e}",
                        spec.id
                    ))
                })?;
                Check::ClientImport(regex)
            }
        };

        Ok(Self {
            id: spec.id.clone(),
            description: spec.description.clone(),
            message: spec.message.clone(),
            severity,
            check,
        })
    }

    /// Override the finding message template; `{match}` expands to matched text
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = template.into();
        self
    }

    /// Rule identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What the rule enforces
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Severity assigned to findings of this rule
    pub fn severity(&self) -> Severity {
        self.severity
    }

    fn detect(&self, text: &str) -> Vec<Span> {
        match &self.check {
            Check::Regex(re) => {
                re.find_iter(text).map(|m| Span::new(m.start(), m.end())).collect()
            }
            Check::ClassAttr(check) => check.spans(text),
            Check::ClientImport(re) => client_import_spans(text, re),
            Check::Custom(f) => f(text),
        }
    }

    fn validate(&self) -> LintResult<()> {
        if self.id.trim().is_empty() {
            return Err(LintError::invalid_rule("rule id must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(LintError::invalid_rule(format!(
                "rule '{}' has an empty description",
                self.id
            )));
        }
        Ok(())
    }
}

/// Engine holding the immutable, append-only rule catalog
///
/// Registration happens at startup; `scan` only reads the catalog, so a shared
/// engine is safe to scan from concurrent callers.
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    ids: HashSet<String>,
}

impl RuleEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, failing fast on malformed or duplicate rules
    ///
    /// On failure the existing catalog is unchanged.
    pub fn register(&mut self, rule: Rule) -> LintResult<()> {
        rule.validate()?;

        if !self.ids.insert(rule.id.clone()) {
            return Err(LintError::duplicate_rule(&rule.id));
        }

        tracing::debug!("registered rule '{}' ({})", rule.id, rule.severity.as_str());
        self.rules.push(rule);
        Ok(())
    }

    /// Register a rule from its catalog entry
    pub fn add_spec(&mut self, spec: &RuleSpec, severity: Severity) -> LintResult<()> {
        self.register(Rule::from_spec(spec, severity)?)
    }

    /// Apply every registered rule to `text` and return ordered findings
    ///
    /// Pure function of the catalog and the input: repeated calls over the same
    /// text reproduce the identical sequence. A rule whose detector panics is
    /// isolated into a single synthetic error finding; the scan never fails.
    pub fn scan(&self, text: &str) -> Findings {
        let mut findings = Vec::new();

        for rule in &self.rules {
            match panic::catch_unwind(AssertUnwindSafe(|| rule.detect(text))) {
                Ok(spans) => {
                    for span in spans {
                        let matched = span.slice(text);
                        let message = rule.message.replace("{match}", matched);
                        findings.push(Finding::new(&rule.id, rule.severity, span, message));
                    }
                }
                Err(_) => {
                    tracing::warn!("rule '{}' panicked during evaluation", rule.id);
                    findings.push(Finding::new(
                        &rule.id,
                        Severity::Error,
                        Span::new(0, 0),
                        format!("rule '{}' failed during evaluation and was skipped", rule.id),
                    ));
                }
            }
        }

        findings.sort_by(|a, b| {
            a.span.start.cmp(&b.span.start).then_with(|| a.rule_id.cmp(&b.rule_id))
        });

        Findings { inner: findings.into_iter() }
    }

    /// Iterate over the registered rules
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Ordered sequence of findings produced by one scan
///
/// Iteration may be abandoned early; re-invoking `scan` reproduces the
/// identical sequence.
#[derive(Debug)]
pub struct Findings {
    inner: std::vec::IntoIter<Finding>,
}

impl Iterator for Findings {
    type Item = Finding;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Findings {}

impl DoubleEndedIterator for Findings {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl std::iter::FusedIterator for Findings {}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(rules: Vec<Rule>) -> RuleEngine {
        let mut engine = RuleEngine::new();
        for rule in rules {
            engine.register(rule).unwrap();
        }
        engine
    }

    fn gradient_rule() -> Rule {
        Rule::regex(
            "no-v3-gradient-syntax",
            "Gradients must use the v4 bg-linear-to-* form",
            Severity::Error,
            r"bg-gradient-to-[a-z]*",
        )
        .unwrap()
        .with_message("v3 gradient syntax `{match}` found")
    }

    #[test]
    fn test_empty_engine_scans_clean() {
        let engine = RuleEngine::new();
        assert!(engine.is_empty());
        assert_eq!(engine.scan("anything at all").count(), 0);
    }

    #[test]
    fn test_no_matches_yields_empty_sequence() {
        let engine = engine_with(vec![gradient_rule()]);
        assert_eq!(engine.scan("<div className=\"flex gap-4\" />").count(), 0);
    }

    #[test]
    fn test_hardcoded_color_scenario() {
        let engine = engine_with(vec![Rule::class_attr(
            "no-hardcoded-color",
            "Class attributes must use semantic theme tokens",
            Severity::Error,
            ClassCheck::HardcodedColor,
        )]);

        let text = r#"<div className="bg-blue-500" />"#;
        let findings: Vec<_> = engine.scan(text).collect();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "no-hardcoded-color");
        assert_eq!(findings[0].span.slice(text), "bg-blue-500");
    }

    #[test]
    fn test_v4_gradient_is_compliant() {
        let engine = engine_with(vec![gradient_rule()]);
        let text = r#"<div className="bg-linear-to-r from-primary to-secondary" />"#;
        assert_eq!(engine.scan(text).count(), 0);
    }

    #[test]
    fn test_v3_gradient_is_flagged_at_offset() {
        let engine = engine_with(vec![gradient_rule()]);
        let text = r#"<div className="bg-gradient-to-r from-primary to-secondary" />"#;
        let findings: Vec<_> = engine.scan(text).collect();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span.start, text.find("bg-gradient-to-r").unwrap());
        assert_eq!(findings[0].message, "v3 gradient syntax `bg-gradient-to-r` found");
    }

    #[test]
    fn test_breakpoint_order_scenario() {
        let engine = engine_with(vec![Rule::class_attr(
            "breakpoint-order",
            "Responsive prefixes must appear in ascending order",
            Severity::Warning,
            ClassCheck::BreakpointOrder,
        )]);

        let text = r#"<h1 className="lg:text-5xl text-2xl md:text-4xl sm:text-3xl" />"#;
        let findings: Vec<_> = engine.scan(text).collect();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_keeps_first_rule() {
        let mut engine = RuleEngine::new();
        engine.register(gradient_rule()).unwrap();

        let second = Rule::regex(
            "no-v3-gradient-syntax",
            "a different detector under the same id",
            Severity::Warning,
            r"never-matches-anything",
        )
        .unwrap();

        let err = engine.register(second).unwrap_err();
        assert!(matches!(err, LintError::DuplicateRule { ref id } if id == "no-v3-gradient-syntax"));
        assert_eq!(engine.len(), 1);

        // first registration stays active
        let findings: Vec<_> = engine.scan("bg-gradient-to-r").collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_malformed_rules_rejected() {
        let mut engine = RuleEngine::new();

        let err = engine
            .register(Rule::custom("", "description", Severity::Warning, |_| Vec::new()))
            .unwrap_err();
        assert!(matches!(err, LintError::InvalidRule { .. }));

        let err = engine
            .register(Rule::custom("my-rule", "  ", Severity::Warning, |_| Vec::new()))
            .unwrap_err();
        assert!(matches!(err, LintError::InvalidRule { .. }));

        assert!(Rule::regex("bad-regex", "desc", Severity::Warning, r"(unclosed").is_err());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_findings_ordered_by_start_then_rule_id() {
        let engine = engine_with(vec![
            Rule::custom("zeta", "z", Severity::Warning, |_| vec![Span::new(4, 6)]),
            Rule::custom("alpha", "a", Severity::Warning, |_| {
                vec![Span::new(4, 8), Span::new(10, 12)]
            }),
            Rule::custom("beta", "b", Severity::Warning, |_| vec![Span::new(0, 2)]),
        ]);

        let order: Vec<_> = engine
            .scan("abcdefghijklmn")
            .map(|f| (f.span.start, f.rule_id))
            .collect();

        assert_eq!(
            order,
            vec![
                (0, "beta".to_string()),
                (4, "alpha".to_string()),
                (4, "zeta".to_string()),
                (10, "alpha".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_is_deterministic_and_restartable() {
        let engine = engine_with(vec![gradient_rule()]);
        let text = "bg-gradient-to-r and again bg-gradient-to-b";

        let first: Vec<_> = engine.scan(text).collect();
        let second: Vec<_> = engine.scan(text).collect();
        assert_eq!(first, second);

        // abandoning iteration early leaves no state behind
        let mut partial = engine.scan(text);
        let _ = partial.next();
        drop(partial);
        let third: Vec<_> = engine.scan(text).collect();
        assert_eq!(first, third);
    }

    #[test]
    fn test_panicking_rule_is_isolated() {
        let engine = engine_with(vec![
            Rule::custom("explodes", "always panics", Severity::Warning, |_| {
                panic!("detector bug")
            }),
            gradient_rule(),
        ]);

        let findings: Vec<_> = engine.scan("x bg-gradient-to-r y").collect();

        assert_eq!(findings.len(), 2);
        let synthetic = findings.iter().find(|f| f.rule_id == "explodes").unwrap();
        assert_eq!(synthetic.severity, Severity::Error);
        assert!(synthetic.message.contains("explodes"));
        assert!(findings.iter().any(|f| f.rule_id == "no-v3-gradient-syntax"));
    }

    #[test]
    fn test_overlapping_matches_are_all_reported() {
        let engine = engine_with(vec![
            Rule::regex("broad", "whole token", Severity::Warning, r"bg-gradient-to-r").unwrap(),
            Rule::regex("narrow", "prefix only", Severity::Warning, r"bg-gradient").unwrap(),
        ]);

        let findings: Vec<_> = engine.scan("bg-gradient-to-r").collect();
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_scan_does_not_mutate_inputs() {
        let engine = engine_with(vec![gradient_rule()]);
        let text = String::from("bg-gradient-to-r");

        let before = engine.len();
        let _ = engine.scan(&text).count();
        assert_eq!(engine.len(), before);
        assert_eq!(text, "bg-gradient-to-r");
    }
}
