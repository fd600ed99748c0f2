//! ATX heading outline and relative heading depth.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{fences::FenceTracker, scanning::process_quote_line};

static ATX_HEADING_RE: LazyLock<Regex> = lazy_regex!(
    r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?[ \t]*$",
    "ATX heading pattern should compile",
);

/// One ATX heading of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// Raw Markdown level, the number of `#` markers.
    pub level: usize,
    /// Zero-based line index.
    pub line: usize,
    pub text: String,
}

impl Heading {
    #[must_use]
    pub fn new(level: usize, line: usize, text: impl Into<String>) -> Self {
        Self {
            level,
            line,
            text: text.into(),
        }
    }
}

/// Collect the ATX headings outside fenced code and blockquotes.
///
/// A closing run of `#` markers is kept as part of the text.
///
/// # Examples
///
/// ```
/// use eqcite::parsers::headings::parse_headings;
/// let headings = parse_headings("# One\n```\n# code\n```\n## Two");
/// assert_eq!(headings.len(), 2);
/// assert_eq!((headings[1].level, headings[1].line), (2, 4));
/// ```
#[must_use]
pub fn parse_headings(text: &str) -> Vec<Heading> {
    let mut fences = FenceTracker::new();
    let mut headings = Vec::new();
    for (idx, line) in text.split('\n').enumerate() {
        if fences.observe(line) || fences.in_fence() {
            continue;
        }
        if process_quote_line(line).is_quote() {
            continue;
        }
        if let Some(caps) = ATX_HEADING_RE.captures(line) {
            let level = caps[1].len();
            let text = caps.get(2).map_or("", |m| m.as_str());
            headings.push(Heading::new(level, idx, text));
        }
    }
    headings
}

/// Compute the relative depth of every heading.
///
/// The parent of a heading is the nearest preceding heading with a strictly
/// smaller raw level; depth is one more than the parent's, or 1 without a
/// parent. Gaps between raw levels never skip a depth.
#[must_use]
pub fn relative_heading_levels(headings: &[Heading]) -> Vec<usize> {
    let mut stack: Vec<(usize, usize)> = Vec::new();
    headings
        .iter()
        .map(|heading| {
            while stack.last().is_some_and(|&(level, _)| level >= heading.level) {
                stack.pop();
            }
            let depth = stack.last().map_or(1, |&(_, depth)| depth + 1);
            stack.push((heading.level, depth));
            depth
        })
        .collect()
}

/// Relative depth of `headings[index]`, or 0 when `index` is out of range.
#[must_use]
pub fn relative_heading_level(headings: &[Heading], index: usize) -> usize {
    if index >= headings.len() {
        return 0;
    }
    relative_heading_levels(&headings[..=index])[index]
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn outline(levels: &[usize]) -> Vec<Heading> {
        levels
            .iter()
            .enumerate()
            .map(|(idx, &level)| Heading::new(level, idx * 2, format!("H{idx}")))
            .collect()
    }

    #[rstest]
    #[case::starts_at_two(&[2, 3, 2], &[1, 2, 1])]
    #[case::skipped_level(&[1, 2, 4, 3, 1], &[1, 2, 3, 3, 1])]
    #[case::complex_jumps(&[2, 4, 3, 5], &[1, 2, 2, 3])]
    #[case::flat(&[3, 3, 3], &[1, 1, 1])]
    #[case::shallower_than_first(&[3, 1, 2], &[1, 1, 2])]
    fn resolves_relative_depths(#[case] levels: &[usize], #[case] expected: &[usize]) {
        let headings = outline(levels);
        assert_eq!(relative_heading_levels(&headings), expected);
        for (idx, depth) in expected.iter().enumerate() {
            assert_eq!(relative_heading_level(&headings, idx), *depth);
        }
    }

    #[test]
    fn out_of_range_is_zero() {
        assert_eq!(relative_heading_level(&[], 0), 0);
        assert_eq!(relative_heading_level(&outline(&[2]), 1), 0);
    }

    #[rstest]
    #[case::plain("# Title", Some((1, "Title")))]
    #[case::six("###### Deep", Some((6, "Deep")))]
    #[case::seven("####### Too deep", None)]
    #[case::no_space("#hashtag", None)]
    #[case::empty("##", Some((2, "")))]
    #[case::indented("   ## Indented", Some((2, "Indented")))]
    #[case::code_indent("    # Code", None)]
    #[case::numbered("### 1 Test", Some((3, "1 Test")))]
    fn recognises_atx_lines(#[case] line: &str, #[case] expected: Option<(usize, &str)>) {
        let found = parse_headings(line);
        let found = found.first().map(|h| (h.level, h.text.as_str()));
        assert_eq!(found, expected);
    }

    #[test]
    fn skips_quotes_and_fences() {
        let text = "> # Quoted\n```\n# Code\n```\n# Real";
        let headings = parse_headings(text);
        assert_eq!(headings, vec![Heading::new(1, 4, "Real")]);
    }
}
