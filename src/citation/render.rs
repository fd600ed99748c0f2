//! Rendering citations as clickable HTML spans.

use std::collections::BTreeMap;

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{CitationRenderOptions, combine_continuous_citation_tags, split_file_citation};
use crate::parsers::citations::{CitationOccurrence, parse_citations_in_markdown};

const CITATION_CLASS: &str = "em-math-citation";
const CONTAINER_CLASS: &str = "em-math-citation-container";
const CITATION_STYLE: &str = "cursor: pointer; color: var(--text-accent);";

/// Render each tag as a `<span>`, joined by `join` (default `", "`).
///
/// Cross-file tags show their local part followed by a `<sup>` footnote
/// reference to the cited file.
///
/// ```
/// use eqcite::citation::generate_citation_spans;
/// let html = generate_citation_spans(&["1.1", "2^{1.2}"], "^", None);
/// assert!(html.contains(r#"data-citation="1.1""#));
/// assert!(html.contains("1.2<sup>[^2]</sup>"));
/// ```
#[must_use]
pub fn generate_citation_spans<T: AsRef<str>>(tags: &[T], file_delimiter: &str, join: Option<&str>) -> String {
    tags.iter()
        .map(|tag| {
            let tag = tag.as_ref();
            let citation = split_file_citation(tag, file_delimiter);
            let footnote = citation
                .cross_file
                .as_deref()
                .map(|id| format!("<sup>[^{}]</sup>", encode_text(id)))
                .unwrap_or_default();
            format!(
                r#"<span class="{CITATION_CLASS}" data-citation="{}" style="{CITATION_STYLE}">{}{footnote}</span>"#,
                encode_double_quoted_attribute(tag),
                encode_text(&citation.local),
            )
        })
        .collect::<Vec<_>>()
        .join(join.unwrap_or(", "))
}

fn render_occurrence(occurrence: &CitationOccurrence, options: &CitationRenderOptions) -> Option<String> {
    let label = options.strip_prefix(&occurrence.label)?;
    let tags = options.split_label(label);
    if tags.is_empty() {
        return None;
    }
    let tags = match options.range_symbol() {
        Some(range) => combine_continuous_citation_tags(
            &tags,
            range,
            &options.valid_delimiters,
            &options.file_delimiter,
        ),
        None => tags.into_iter().map(String::from).collect(),
    };
    let spans = generate_citation_spans(&tags, &options.file_delimiter, None);
    Some(format!(r#"<span class="{CONTAINER_CLASS}">({spans})</span>"#))
}

/// Replace every `$\ref{<prefix>...}$` span with rendered HTML.
///
/// Each whole inline math span is replaced by a container `<span>` holding
/// one span per tag. Citations whose label lacks the prefix, and anything
/// inside code, are left alone.
#[must_use]
pub fn replace_citations_in_markdown_with_span(text: &str, options: &CitationRenderOptions) -> String {
    let mut by_line: BTreeMap<usize, Vec<CitationOccurrence>> = BTreeMap::new();
    for occurrence in parse_citations_in_markdown(text) {
        by_line.entry(occurrence.line).or_default().push(occurrence);
    }
    if by_line.is_empty() {
        return text.to_string();
    }

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    for (idx, occurrences) in by_line {
        let Some(line) = lines.get_mut(idx) else {
            continue;
        };
        for occurrence in occurrences.iter().rev() {
            if let Some(html) = render_occurrence(occurrence, options) {
                line.replace_range(occurrence.position.start..occurrence.position.end, &html);
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn options() -> CitationRenderOptions {
        CitationRenderOptions::default()
    }

    fn count_spans(html: &str) -> usize {
        html.matches("<span").count()
    }

    #[rstest]
    fn renders_single_citation(options: CitationRenderOptions) {
        let out = replace_citations_in_markdown_with_span(r"See $\ref{eq:1.1}$ here.", &options);
        assert!(out.starts_with(r#"See <span class="em-math-citation-container">"#));
        assert!(out.ends_with("</span> here."));
        assert!(out.contains(r#"data-citation="1.1""#));
        assert!(!out.contains(r"\ref"));
        assert_eq!(count_spans(&out), 2);
    }

    #[rstest]
    fn renders_every_citation_on_a_line(options: CitationRenderOptions) {
        let out = replace_citations_in_markdown_with_span(r"$\ref{eq:1.1}$ and $\ref{eq:2.1}$", &options);
        assert_eq!(count_spans(&out), 4);
        assert!(out.contains(r#"data-citation="2.1""#));
    }

    #[rstest]
    fn compresses_ranges(options: CitationRenderOptions) {
        let out = replace_citations_in_markdown_with_span(r"$\ref{eq:1.1, 1.2, 1.3}$", &options);
        assert!(out.contains(">1.1~3</span>"));
        assert_eq!(count_spans(&out), 2);
    }

    #[rstest]
    fn keeps_tags_apart_without_range_symbol(mut options: CitationRenderOptions) {
        options.range_symbol = None;
        let out = replace_citations_in_markdown_with_span(r"$\ref{eq:1.1, 1.2, 1.3}$", &options);
        assert_eq!(count_spans(&out), 4);
        assert!(out.contains(">1.2</span>"));
    }

    #[rstest]
    fn renders_cross_file_footnotes(options: CitationRenderOptions) {
        let out = replace_citations_in_markdown_with_span(r"$\ref{eq:2^1.1}$", &options);
        assert!(out.contains(">1.1<sup>[^2]</sup></span>"));
    }

    #[rstest]
    #[case::other_prefix(r"$\ref{fig:1}$")]
    #[case::code_span(r"`$\ref{eq:1}$`")]
    #[case::no_citation("plain text")]
    #[case::fenced("```\n$\\ref{eq:1}$\n```")]
    fn leaves_text_alone(options: CitationRenderOptions, #[case] text: &str) {
        assert_eq!(replace_citations_in_markdown_with_span(text, &options), text);
    }

    #[test]
    fn escapes_html() {
        let html = generate_citation_spans(&["a<b&c"], "^", None);
        assert_eq!(
            html,
            format!(
                r#"<span class="{CITATION_CLASS}" data-citation="a&lt;b&amp;c" style="{CITATION_STYLE}">a&lt;b&amp;c</span>"#
            )
        );
    }

    #[test]
    fn joins_with_custom_separator() {
        let html = generate_citation_spans(&["1", "2"], "^", Some(" | "));
        assert_eq!(html.matches("</span> | <span").count(), 1);
    }
}
