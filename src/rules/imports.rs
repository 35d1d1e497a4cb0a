//! Client-boundary import scanning
//!
//! Detects files marked browser-executable by the `"use client"` directive
//! and locates import specifiers that must stay on the server.

use crate::domain::findings::Span;
use regex::Regex;
use std::sync::OnceLock;

/// Whether the file's first meaningful statement is a `"use client"` directive
pub fn has_client_directive(text: &str) -> bool {
    let mut rest = text;

    // Skip leading line and block comments; the directive must be the first
    // statement for the framework to honor it
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(i) => rest = &after[i + 2..],
                None => return false,
            }
        } else {
            break;
        }
    }

    let line = rest.lines().next().unwrap_or("").trim();
    let line = line.trim_end_matches(';').trim_end();
    matches!(line, "\"use client\"" | "'use client'")
}

fn static_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // The specifier clause may span lines (`import {\n  x,\n} from 'pg'`);
        // quotes and semicolons bound the statement
        Regex::new(r#"(?m)^\s*import\s+(?:[^'";]*?\bfrom\s+)?['"]([^'"\n]+)['"]"#)
            .expect("static import regex compiles")
    })
}

fn dynamic_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:\bimport|\brequire)\s*\(\s*['"]([^'"\n]+)['"]"#)
            .expect("dynamic import regex compiles")
    })
}

/// Spans of import specifiers matching `module_pattern` in a client-marked file
///
/// Returns nothing for files without the `"use client"` directive: server
/// modules may import whatever they like.
pub fn client_import_spans(text: &str, module_pattern: &Regex) -> Vec<Span> {
    if !has_client_directive(text) {
        return Vec::new();
    }

    let mut spans = Vec::new();
    for re in [static_import_regex(), dynamic_import_regex()] {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                if module_pattern.is_match(m.as_str()) {
                    spans.push(Span::new(m.start(), m.end()));
                }
            }
        }
    }

    // The static and dynamic forms can both match one statement
    spans.sort();
    spans.dedup();
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_pattern() -> Regex {
        Regex::new(r"^(?:@prisma/client|pg|@/lib/db(?:/.*)?)$").unwrap()
    }

    #[test]
    fn test_directive_detection() {
        assert!(has_client_directive("\"use client\"\nexport default function X() {}"));
        assert!(has_client_directive("'use client';\nimport React from 'react';"));
        assert!(has_client_directive("// header comment\n'use client'\n"));
        assert!(has_client_directive("/* multi\n line */\n\"use client\";\n"));
        assert!(!has_client_directive("import { db } from '@/lib/db';"));
        assert!(!has_client_directive("const x = '\"use client\"';"));
        assert!(!has_client_directive("\"use server\"\n"));
    }

    #[test]
    fn test_flags_db_import_in_client_file() {
        let text = "'use client'\nimport { db } from '@/lib/db'\nimport { useState } from 'react'\n";
        let spans = client_import_spans(text, &db_pattern());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slice(text), "@/lib/db");
    }

    #[test]
    fn test_server_file_is_clean() {
        let text = "import { db } from '@/lib/db'\nexport async function getUsers() {}\n";
        assert!(client_import_spans(text, &db_pattern()).is_empty());
    }

    #[test]
    fn test_dynamic_import_and_require() {
        let text = "'use client'\nconst pg = require('pg')\nconst p = await import('@prisma/client')\n";
        let spans = client_import_spans(text, &db_pattern());
        let modules: Vec<_> = spans.iter().map(|s| s.slice(text)).collect();
        assert_eq!(modules, vec!["pg", "@prisma/client"]);
    }

    #[test]
    fn test_side_effect_import() {
        let text = "'use client'\nimport '@/lib/db/init'\n";
        let spans = client_import_spans(text, &db_pattern());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slice(text), "@/lib/db/init");
    }

    #[test]
    fn test_multiline_import() {
        let text = "'use client'\nimport {\n  users,\n  posts,\n} from '@/lib/db'\n";
        let spans = client_import_spans(text, &db_pattern());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slice(text), "@/lib/db");
    }

    #[test]
    fn test_unrelated_imports_pass() {
        let text = "'use client'\nimport clsx from 'clsx'\nimport { Button } from '@/components/ui/button'\n";
        assert!(client_import_spans(text, &db_pattern()).is_empty());
    }
}
