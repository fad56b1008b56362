// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

//! `%placeholder%` scanning
//!
//! `%name%` references parameter `name`; `%%` is an escaped literal `%`.
//! A `%` that starts neither form is kept as text.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%%|%([A-Za-z0-9_][A-Za-z0-9_.\-]*)%").expect("placeholder regex is valid")
});

/// A piece of a parameterized string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied verbatim
    Literal(&'a str),
    /// `%%`
    Percent,
    /// `%name%`
    Reference(&'a str),
}

/// Split `text` into literal text, escapes and references
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in TOKEN_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            out.push(Segment::Literal(&text[last..whole.start()]));
        }
        match caps.get(1) {
            Some(name) => out.push(Segment::Reference(name.as_str())),
            None => out.push(Segment::Percent),
        }
        last = whole.end();
    }

    if last < text.len() {
        out.push(Segment::Literal(&text[last..]));
    }

    out
}

/// Parameter names referenced by `text`, in order of appearance
pub fn references(text: &str) -> Vec<&str> {
    segments(text)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Reference(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Whether `text` contains at least one reference
pub fn has_references(text: &str) -> bool {
    segments(text)
        .iter()
        .any(|s| matches!(s, Segment::Reference(_)))
}

/// Render a reference back to its placeholder form
pub fn placeholder(name: &str) -> String {
    format!("%{}%", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(segments("no params"), vec![Segment::Literal("no params")]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_references_in_order() {
        let text = "https://github.com/%git.organization%/%business.unit%-java.git";
        assert_eq!(references(text), vec!["git.organization", "business.unit"]);
    }

    #[test]
    fn test_adjacent_references() {
        assert_eq!(
            segments("%a%%b%"),
            vec![Segment::Reference("a"), Segment::Reference("b")]
        );
    }

    #[test]
    fn test_escaped_percent() {
        assert_eq!(
            segments("100%% of %suite%"),
            vec![
                Segment::Literal("100"),
                Segment::Percent,
                Segment::Literal(" of "),
                Segment::Reference("suite"),
            ]
        );
    }

    #[test]
    fn test_lone_percent_is_literal() {
        assert!(!has_references("50% done"));
        assert!(!has_references("% leading"));
        assert!(has_references("-Dbusiness.version=%business.version.major%.%build.number%"));
    }

    #[test]
    fn test_placeholder_round_trip() {
        assert_eq!(references(&placeholder("build.number")), vec!["build.number"]);
    }
}
