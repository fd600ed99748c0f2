//! Inline `$\ref{...}$` citation occurrences.

use serde::Serialize;

use crate::{
    fences::FenceTracker,
    matchers::match_citations_in_line,
    parsers::equations::{BlockStep, DisplayLine, classify_display_line, step_open_block},
    scanning::process_quote_line,
};

/// Byte range of a citation within its line, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

/// A citation found by [`parse_citations_in_markdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationOccurrence {
    pub label: String,
    pub line: usize,
    pub full_match: String,
    pub position: Position,
}

/// Find every qualifying inline citation.
///
/// Fenced code, inline code spans, and multi-line `$$` blocks are skipped.
///
/// ```
/// use eqcite::parsers::citations::parse_citations_in_markdown;
/// let found = parse_citations_in_markdown("See $\\ref{eq:1.1}$.");
/// assert_eq!(found[0].label, "eq:1.1");
/// assert_eq!((found[0].position.start, found[0].position.end), (4, 18));
/// ```
#[must_use]
pub fn parse_citations_in_markdown(text: &str) -> Vec<CitationOccurrence> {
    let mut fences = FenceTracker::new();
    let mut open_depth: Option<usize> = None;
    let mut found = Vec::new();
    for (idx, line) in text.split('\n').enumerate() {
        let quote = process_quote_line(line);
        if let Some(depth) = open_depth {
            match step_open_block(depth, &quote) {
                BlockStep::Left => open_depth = None,
                BlockStep::Closed => {
                    open_depth = None;
                    continue;
                }
                BlockStep::Continues => continue,
            }
        }
        if fences.observe(line) || fences.in_fence() {
            continue;
        }
        if let Some(DisplayLine::Open(_)) = classify_display_line(quote.content) {
            open_depth = Some(quote.depth);
            continue;
        }
        found.extend(
            match_citations_in_line(line)
                .into_iter()
                .map(|c| CitationOccurrence {
                    label: c.label.to_string(),
                    line: idx,
                    full_match: c.full_match.to_string(),
                    position: Position {
                        start: c.start,
                        end: c.end,
                    },
                }),
        );
    }
    found
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn labels(text: &str) -> Vec<String> {
        parse_citations_in_markdown(text)
            .into_iter()
            .map(|c| c.label)
            .collect()
    }

    #[test]
    fn records_lines_and_offsets() {
        let text = "\nLine one with $\\ref{eqA}$\nAnother with $\\ref{eqB}$ and text";
        let found = parse_citations_in_markdown(text);
        assert_eq!(
            found,
            vec![
                CitationOccurrence {
                    label: "eqA".into(),
                    line: 1,
                    full_match: "$\\ref{eqA}$".into(),
                    position: Position { start: 14, end: 25 },
                },
                CitationOccurrence {
                    label: "eqB".into(),
                    line: 2,
                    full_match: "$\\ref{eqB}$".into(),
                    position: Position { start: 13, end: 24 },
                },
            ]
        );
    }

    #[rstest]
    #[case::missing_dollar("Missing dollar: \\ref{eq1}")]
    #[case::missing_backslash("Wrong format: $ref{eq2}$")]
    #[case::unclosed("Unclosed: $\\ref{eq3")]
    #[case::display("Display math: $$\\ref{eq4}$$")]
    #[case::two_refs("Invalid $\\ref{eq1} \\ref{eq2}$")]
    #[case::space_after_open("$ \\ref{eq1}$")]
    #[case::space_before_close("$\\ref{eq1} $")]
    #[case::blank("   ")]
    fn rejects_malformed(#[case] text: &str) {
        assert!(parse_citations_in_markdown(text).is_empty());
    }

    #[test]
    fn skips_code_and_display_blocks() {
        let text = "a $\\ref{eq1}$\n```\n$\\ref{eq2}$\n```\n$$\nF = \\ref{eq:3.4}\n$$\n$\\ref{eq4}$";
        assert_eq!(labels(text), ["eq1", "eq4"]);
    }

    #[rstest]
    #[case::quote_ends_block("> $$\n> x = 1\n\nSee $\\ref{eq:1.1}$ here.", &["eq:1.1"])]
    #[case::quote_line_after_block("> $$\n> \\ref{eq:0}\nSee $\\ref{eq:2}$", &["eq:2"])]
    #[case::nested_quote_continues("> $$\n> > $\\ref{eq:0}$\n> $$\n$\\ref{eq:3}$", &["eq:3"])]
    #[case::unquoted_block_runs_on("$$\nx\n\n$\\ref{eq:0}$", &[])]
    fn quoted_blocks_end_with_their_quote(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(labels(text), expected);
    }

    #[test]
    fn agrees_with_equation_block_bounds() {
        let text = "> $$\n> x = 1\n\nSee $\\ref{eq:1.1}$ here.";
        let equations = crate::parsers::equations::parse_equations_in_markdown(text);
        assert_eq!((equations[0].line_start, equations[0].line_end), (0, 1));
        assert_eq!(parse_citations_in_markdown(text)[0].line, 3);
    }

    #[test]
    fn skips_inline_code_spans() {
        let text = "Use `$\\ref{eq1}$` to get $\\ref{eq2}$ and `code $\\ref{eq3}$` here.";
        let found = parse_citations_in_markdown(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "eq2");
        assert_eq!(found[0].position, Position { start: 25, end: 36 });
    }

    #[test]
    fn keeps_surrounding_math_and_empty_labels() {
        let text = "$\\ref{eq:1.1.1}$, $\\gamma$ and $txt1\\ref{eq:1.1}txt2$ and $\\ref{}$";
        assert_eq!(labels(text), ["eq:1.1.1", "eq:1.1", ""]);
    }

    #[test]
    fn complex_labels_are_verbatim() {
        assert_eq!(
            labels("Complex label $\\ref{eq:1.3.1~3^1, 2.1.1~2^1}$"),
            ["eq:1.3.1~3^1, 2.1.1~2^1"]
        );
    }

    #[test]
    fn large_documents() {
        let doc = vec!["Content $\\ref{eq1}$"; 1000].join("\n");
        assert_eq!(parse_citations_in_markdown(&doc).len(), 1000);
    }
}
