//! Class attribute extraction and token-level convention checks
//!
//! Architecture: Service Layer - class checks work on extracted attribute values
//! - Extraction is conservative and text-based: quoted `class`/`className`
//!   values plus the simple braced string/template forms used in JSX
//! - Tokens carry absolute spans so findings point into the original document

use crate::domain::findings::Span;
use regex::Regex;
use std::sync::OnceLock;

/// A `class`/`className` attribute value located in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassAttr {
    /// Span of the attribute value, quotes excluded
    pub span: Span,
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // No lookbehind in the regex crate: a leading character class keeps
        // `data-class=` and friends from matching; spans come from the
        // capture groups, so the extra consumed byte does not matter
        Regex::new(
            r#"(?:^|[^\w-])class(?:Name)?\s*=\s*(?:"([^"]*)"|'([^']*)'|\{\s*(?:"([^"]*)"|'([^']*)'|`([^`]*)`)\s*\})"#,
        )
        .expect("class attribute regex compiles")
    })
}

/// Locate every class attribute value in `text`
pub fn extract_attrs(text: &str) -> Vec<ClassAttr> {
    attr_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            (1..=5)
                .find_map(|i| caps.get(i))
                .map(|m| ClassAttr { span: Span::new(m.start(), m.end()) })
        })
        .collect()
}

/// A single utility token within a class attribute
#[derive(Debug, Clone, Copy)]
pub struct ClassToken<'a> {
    /// Raw token text including variant prefixes
    pub raw: &'a str,
    /// Absolute span of the token in the scanned document
    pub span: Span,
}

impl<'a> ClassToken<'a> {
    /// Variant prefixes (`sm`, `hover`, ...), split on `:` outside brackets
    pub fn variants(&self) -> Vec<&'a str> {
        self.segments().0
    }

    /// The utility itself, after the last top-level `:`
    pub fn utility(&self) -> &'a str {
        self.segments().1
    }

    // `:` inside arbitrary values (`bg-[url(https://...)]`) must not split
    fn segments(&self) -> (Vec<&'a str>, &'a str) {
        let mut variants = Vec::new();
        let mut depth = 0usize;
        let mut seg_start = 0;

        for (i, b) in self.raw.bytes().enumerate() {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b':' if depth == 0 => {
                    variants.push(&self.raw[seg_start..i]);
                    seg_start = i + 1;
                }
                _ => {}
            }
        }

        (variants, &self.raw[seg_start..])
    }
}

/// Split a class attribute value into tokens with absolute spans
pub fn tokens<'a>(text: &'a str, attr: &ClassAttr) -> Vec<ClassToken<'a>> {
    let value = attr.span.slice(text);
    let bytes = value.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        out.push(ClassToken {
            raw: &value[start..i],
            span: Span::new(attr.span.start + start, attr.span.start + i),
        });
    }

    out
}

/// Built-in checks that run per class attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassCheck {
    /// Palette-color utilities and literal color values
    HardcodedColor,
    /// Bracketed pixel values where a native scale step serves
    ArbitrarySpacing,
    /// Responsive prefixes out of ascending order
    BreakpointOrder,
    /// `!`-modified utilities
    ImportantModifier,
}

impl ClassCheck {
    /// Parse a check name from the rule catalog
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "hardcoded_color" => Some(Self::HardcodedColor),
            "arbitrary_spacing" => Some(Self::ArbitrarySpacing),
            "breakpoint_order" => Some(Self::BreakpointOrder),
            "important_modifier" => Some(Self::ImportantModifier),
            _ => None,
        }
    }

    /// Catalog name of this check
    pub fn name(self) -> &'static str {
        match self {
            Self::HardcodedColor => "hardcoded_color",
            Self::ArbitrarySpacing => "arbitrary_spacing",
            Self::BreakpointOrder => "breakpoint_order",
            Self::ImportantModifier => "important_modifier",
        }
    }

    /// Run this check over every class attribute in `text`
    pub fn spans(self, text: &str) -> Vec<Span> {
        let mut out = Vec::new();
        for attr in extract_attrs(text) {
            match self {
                Self::HardcodedColor => hardcoded_color(text, &attr, &mut out),
                Self::ArbitrarySpacing => arbitrary_spacing(text, &attr, &mut out),
                Self::BreakpointOrder => breakpoint_order(text, &attr, &mut out),
                Self::ImportantModifier => important_modifier(text, &attr, &mut out),
            }
        }
        out
    }
}

fn palette_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:bg|text|border|ring|ring-offset|divide|outline|fill|stroke|from|via|to|accent|caret|decoration|shadow|placeholder)-(?:slate|gray|zinc|neutral|stone|red|orange|amber|yellow|lime|green|emerald|teal|cyan|sky|blue|indigo|violet|purple|fuchsia|pink|rose)-(?:50|950|[1-9]00)(?:/\d{1,3})?$",
        )
        .expect("palette color regex compiles")
    })
}

// Literal color values inside arbitrary brackets: bg-[#fff], text-[rgb(0,0,0)]
fn has_literal_color(utility: &str) -> bool {
    ["[#", "[rgb(", "[rgba(", "[hsl(", "[hsla(", "[oklch("]
        .iter()
        .any(|needle| utility.contains(needle))
}

// Strip the important modifier and a leading negative sign before matching
fn bare_utility(utility: &str) -> &str {
    let utility = utility.trim_start_matches('!').trim_end_matches('!');
    utility.strip_prefix('-').unwrap_or(utility)
}

fn hardcoded_color(text: &str, attr: &ClassAttr, out: &mut Vec<Span>) {
    for token in tokens(text, attr) {
        let utility = bare_utility(token.utility());
        if palette_regex().is_match(utility) || has_literal_color(utility) {
            out.push(token.span);
        }
    }
}

fn spacing_px_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:w|h|size|min-w|max-w|min-h|max-h|p[xysetrbl]?|m[xysetrbl]?|gap(?:-[xy])?|inset(?:-[xy])?|top|right|bottom|left)-\[\d+(?:\.\d+)?px\]$",
        )
        .expect("spacing pixel regex compiles")
    })
}

fn z_index_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^z-\[\d+\]$").expect("z-index regex compiles"))
}

fn arbitrary_spacing(text: &str, attr: &ClassAttr, out: &mut Vec<Span>) {
    for token in tokens(text, attr) {
        let utility = bare_utility(token.utility());
        if spacing_px_regex().is_match(utility) || z_index_regex().is_match(utility) {
            out.push(token.span);
        }
    }
}

fn breakpoint_rank(variant: &str) -> Option<u8> {
    match variant {
        "sm" => Some(1),
        "md" => Some(2),
        "lg" => Some(3),
        "xl" => Some(4),
        "2xl" => Some(5),
        _ => None,
    }
}

// One finding per attribute, anchored at the first out-of-order token
fn breakpoint_order(text: &str, attr: &ClassAttr, out: &mut Vec<Span>) {
    let mut max_rank = 0u8;
    for token in tokens(text, attr) {
        let Some(rank) = token.variants().into_iter().find_map(breakpoint_rank) else {
            continue;
        };
        if rank < max_rank {
            out.push(token.span);
            return;
        }
        max_rank = rank;
    }
}

fn important_modifier(text: &str, attr: &ClassAttr, out: &mut Vec<Span>) {
    for token in tokens(text, attr) {
        let utility = token.utility();
        if utility.len() > 1 && (utility.starts_with('!') || utility.ends_with('!')) {
            out.push(token.span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_extracts_double_quoted_classname() {
        let text = r#"<div className="flex gap-4" />"#;
        let attrs = extract_attrs(text);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].span.slice(text), "flex gap-4");
    }

    #[test]
    fn test_extracts_html_class_and_braced_forms() {
        let text = r#"<div class='p-2'><span className={"mt-1"} /><i className={`px-3`} />"#;
        let attrs = extract_attrs(text);
        let values: Vec<_> = attrs.iter().map(|a| a.span.slice(text)).collect();
        assert_eq!(values, vec!["p-2", "mt-1", "px-3"]);
    }

    #[test]
    fn test_ignores_unrelated_attributes() {
        let text = r#"<div data-class="x" id="bg-red-500" />"#;
        assert!(extract_attrs(text).is_empty());
    }

    #[test]
    fn test_token_spans_are_absolute() {
        let text = r#"<div className="flex  gap-4" />"#;
        let attrs = extract_attrs(text);
        let toks = tokens(text, &attrs[0]);
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].span.slice(text), "flex");
        assert_eq!(toks[1].span.slice(text), "gap-4");
    }

    #[test]
    fn test_variant_splitting_is_bracket_aware() {
        let token = ClassToken { raw: "lg:hover:bg-[url(https://x)]", span: Span::new(0, 28) };
        assert_eq!(token.variants(), vec!["lg", "hover"]);
        assert_eq!(token.utility(), "bg-[url(https://x)]");
    }

    #[rstest]
    #[case("bg-blue-500", true)]
    #[case("text-gray-950", true)]
    #[case("md:border-red-300", true)]
    #[case("bg-emerald-500/50", true)]
    #[case("bg-[#1a2b3c]", true)]
    #[case("text-[rgb(10,20,30)]", true)]
    #[case("fill-[hsl(200,50%,40%)]", true)]
    #[case("bg-primary", false)]
    #[case("text-muted-foreground", false)]
    #[case("bg-white", false)]
    #[case("bg-[url(#gradient)]", false)]
    #[case("border-destructive", false)]
    fn test_hardcoded_color(#[case] token: &str, #[case] flagged: bool) {
        let text = format!(r#"<div className="{token}" />"#);
        let spans = ClassCheck::HardcodedColor.spans(&text);
        assert_eq!(!spans.is_empty(), flagged, "token: {token}");
        if flagged {
            assert_eq!(spans[0].slice(&text), token);
        }
    }

    #[rstest]
    #[case("w-[37px]", true)]
    #[case("h-[200px]", true)]
    #[case("mt-[13px]", true)]
    #[case("p-[1.5px]", true)]
    #[case("gap-x-[8px]", true)]
    #[case("z-[999]", true)]
    #[case("-mt-[4px]", true)]
    #[case("w-4", false)]
    #[case("grid-cols-[1fr_2fr]", false)]
    #[case("w-[calc(100%-2rem)]", false)]
    #[case("w-[var(--sidebar)]", false)]
    #[case("w-[50%]", false)]
    #[case("h-[100vh]", false)]
    #[case("text-[13px]", false)]
    fn test_arbitrary_spacing(#[case] token: &str, #[case] flagged: bool) {
        let text = format!(r#"<div className="{token}" />"#);
        let spans = ClassCheck::ArbitrarySpacing.spans(&text);
        assert_eq!(!spans.is_empty(), flagged, "token: {token}");
    }

    #[test]
    fn test_breakpoint_order_flags_first_offender_once() {
        let text = r#"<h1 className="lg:text-5xl text-2xl md:text-4xl sm:text-3xl" />"#;
        let spans = ClassCheck::BreakpointOrder.spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slice(text), "md:text-4xl");
    }

    #[test]
    fn test_breakpoint_order_accepts_ascending() {
        let text = r#"<h1 className="text-2xl sm:text-3xl md:text-4xl lg:text-5xl" />"#;
        assert!(ClassCheck::BreakpointOrder.spans(text).is_empty());
    }

    #[test]
    fn test_breakpoint_order_ignores_non_responsive_variants() {
        let text = r#"<a className="hover:underline sm:p-2 focus:ring md:p-4" />"#;
        assert!(ClassCheck::BreakpointOrder.spans(text).is_empty());
    }

    #[rstest]
    #[case("!mt-4", true)]
    #[case("mt-4!", true)]
    #[case("md:!p-0", true)]
    #[case("mt-4", false)]
    #[case("!", false)]
    fn test_important_modifier(#[case] token: &str, #[case] flagged: bool) {
        let text = format!(r#"<div className="{token}" />"#);
        let spans = ClassCheck::ImportantModifier.spans(&text);
        assert_eq!(!spans.is_empty(), flagged, "token: {token}");
    }

    #[test]
    fn test_check_parse_roundtrip() {
        for check in [
            ClassCheck::HardcodedColor,
            ClassCheck::ArbitrarySpacing,
            ClassCheck::BreakpointOrder,
            ClassCheck::ImportantModifier,
        ] {
            assert_eq!(ClassCheck::parse(check.name()), Some(check));
        }
        assert_eq!(ClassCheck::parse("unknown_check"), None);
    }
}
