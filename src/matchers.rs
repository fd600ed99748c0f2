//! Token matchers for citations, equation tags, and footnote links.
//!
//! Brace nesting is handled by depth-counting scanners rather than regular
//! expressions, so every matcher here runs in linear time.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scanning::{find_balanced_close, inline_math_spans};

/// Deepest brace nesting accepted inside `\ref{...}` and tag commands.
pub const MAX_CITATION_DEPTH: usize = 10;

const REF_OPEN: &str = "\\ref{";

/// Footnote whose body is a bare wiki link: `[^id]: [[path|alias]]`.
///
/// Captures the caret id, the path, and the optional alias.
pub static FOOTNOTE_LINK_RE: LazyLock<Regex> = lazy_regex!(
    r"^\[(\^[^\]]+)\]:\s*\[\[([^\]|]+)(?:\|([^\]]*))?\]\]\s*$",
    "footnote link pattern should compile",
);

/// Syntax used for equation tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSyntax {
    /// `\tag{1.1}`
    #[default]
    Latex,
    /// `#tag[1.1]`
    Typst,
}

impl TagSyntax {
    #[must_use]
    pub fn from_typst_mode(typst: bool) -> Self {
        if typst { Self::Typst } else { Self::Latex }
    }

    fn opener(self) -> &'static str {
        match self {
            Self::Latex => "\\tag{",
            Self::Typst => "#tag[",
        }
    }

    fn delimiters(self) -> (u8, u8) {
        match self {
            Self::Latex => (b'{', b'}'),
            Self::Typst => (b'[', b']'),
        }
    }
}

/// A `\ref{...}` located by [`match_nested_citation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedCitation<'a> {
    /// The whole `\ref{...}` text.
    pub content: &'a str,
    pub label: &'a str,
}

/// Locate the single `\ref{...}` in `text`.
///
/// Returns `None` when there is no reference, more than one, an unclosed
/// or too deeply nested one, or when `prefix` is given and the trimmed
/// label does not start with it. With a prefix the label comes back
/// trimmed and without the prefix; otherwise it is the verbatim inner text.
///
/// # Examples
///
/// ```
/// use eqcite::matchers::match_nested_citation;
/// let found = match_nested_citation(r"\ref{eq:1^{1.2}}", None).unwrap();
/// assert_eq!(found.label, "eq:1^{1.2}");
/// assert!(match_nested_citation(r"\ref{eq:1} \ref{eq:2}", None).is_none());
/// ```
#[must_use]
pub fn match_nested_citation<'a>(text: &'a str, prefix: Option<&str>) -> Option<NestedCitation<'a>> {
    let start = text.find(REF_OPEN)?;
    let body = start + REF_OPEN.len();
    if text[body..].contains(REF_OPEN) {
        return None;
    }
    let close = find_balanced_close(text.as_bytes(), body, b'{', b'}', MAX_CITATION_DEPTH)?;
    let inner = &text[body..close];
    let label = match prefix {
        Some(prefix) => inner.trim().strip_prefix(prefix)?,
        None => inner,
    };
    Some(NestedCitation {
        content: &text[start..=close],
        label,
    })
}

/// Report whether `text` holds exactly one well-formed reference.
#[must_use]
pub fn is_valid_citation_form(text: &str, prefix: Option<&str>) -> bool {
    match_nested_citation(text, prefix).is_some()
}

/// A citation found in one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCitation<'a> {
    /// The inline math span, `$` delimiters included.
    pub full_match: &'a str,
    pub label: &'a str,
    /// Byte offset of the opening `$`.
    pub start: usize,
    /// Byte offset just past the closing `$`.
    pub end: usize,
}

/// Find every tight inline math span holding exactly one reference.
#[must_use]
pub fn match_citations_in_line(line: &str) -> Vec<LineCitation<'_>> {
    inline_math_spans(line)
        .into_iter()
        .filter_map(|span| {
            let citation = match_nested_citation(&line[span.inner()], None)?;
            let outer = span.outer();
            Some(LineCitation {
                full_match: &line[outer.clone()],
                label: citation.label,
                start: outer.start,
                end: outer.end,
            })
        })
        .collect()
}

/// Format an inline citation: `$\ref{<tag><extra>}$`.
#[must_use]
pub fn create_citation_string(tag: &str, extra: Option<&str>) -> String {
    format!("$\\ref{{{tag}{}}}$", extra.unwrap_or_default())
}

/// Format an equation tag command.
///
/// ```
/// use eqcite::matchers::{TagSyntax, create_equation_tag_string};
/// assert_eq!(create_equation_tag_string("1.1", TagSyntax::Latex), r"\tag{1.1}");
/// assert_eq!(create_equation_tag_string("1.1", TagSyntax::Typst), "#tag[1.1]");
/// ```
#[must_use]
pub fn create_equation_tag_string(tag: &str, syntax: TagSyntax) -> String {
    match syntax {
        TagSyntax::Latex => format!("\\tag{{{tag}}}"),
        TagSyntax::Typst => format!("#tag[{tag}]"),
    }
}

/// Location of a tag command inside a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan<'a> {
    pub start: usize,
    /// Byte offset just past the closing delimiter.
    pub end: usize,
    /// Text between the delimiters, untrimmed.
    pub inner: &'a str,
}

/// Find the last complete tag command in `text`.
#[must_use]
pub fn find_equation_tag(text: &str, syntax: TagSyntax) -> Option<TagSpan<'_>> {
    let opener = syntax.opener();
    let (open, close) = syntax.delimiters();
    let bytes = text.as_bytes();
    let mut found = None;
    let mut search = 0;
    while let Some(rel) = text[search..].find(opener) {
        let start = search + rel;
        let body = start + opener.len();
        match find_balanced_close(bytes, body, open, close, MAX_CITATION_DEPTH) {
            Some(end) => {
                found = Some(TagSpan {
                    start,
                    end: end + 1,
                    inner: &text[body..end],
                });
                search = end + 1;
            }
            None => search = body,
        }
    }
    found
}
