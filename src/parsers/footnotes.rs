//! Footnote definitions pointing at notes or URLs.

use std::{path::Path, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::{fences::lines_outside_fences, matchers::FOOTNOTE_LINK_RE};

static FOOTNOTE_LINE_RE: LazyLock<Regex> = lazy_regex!(
    r"^\[\^([^\]]+)\]:\s*(.*)$",
    "footnote definition pattern should compile",
);

static URL_BODY_RE: LazyLock<Regex> = lazy_regex!(
    r"^(?:\[([^\]]*)\]\((https?://[^)\s]+)\)|(https?://\S+))$",
    "footnote url body pattern should compile",
);

/// A footnote definition found by [`parse_footnotes_in_markdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FootnoteEntry {
    /// Identifier after the caret, e.g. `1` for `[^1]`.
    pub num: String,
    pub path: Option<String>,
    /// Alias text; `None` when absent or blank.
    pub label: Option<String>,
    /// Definition body after the colon.
    pub text: String,
    pub url: Option<String>,
    pub line: usize,
}

impl FootnoteEntry {
    /// Alias if set, otherwise the file stem of the linked path.
    ///
    /// ```
    /// use eqcite::parsers::footnotes::parse_footnotes_in_markdown;
    /// let entry = &parse_footnotes_in_markdown("[^1]: [[notes/ch1.md]]")[0];
    /// assert_eq!(entry.display_label().as_deref(), Some("ch1"));
    /// ```
    #[must_use]
    pub fn display_label(&self) -> Option<String> {
        if let Some(label) = &self.label {
            return Some(label.clone());
        }
        let path = self.path.as_deref()?;
        let stem = Path::new(path).file_stem().and_then(|s| s.to_str());
        Some(stem.unwrap_or(path).to_string())
    }
}

fn non_blank(alias: Option<&str>) -> Option<String> {
    alias
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

fn parse_definition(definition: &str, num: &str, body: &str, line: usize) -> FootnoteEntry {
    let mut entry = FootnoteEntry {
        num: num.to_string(),
        path: None,
        label: None,
        text: body.to_string(),
        url: None,
        line,
    };
    if let Some(caps) = FOOTNOTE_LINK_RE.captures(definition) {
        entry.path = Some(caps[2].to_string());
        entry.label = non_blank(caps.get(3).map(|m| m.as_str()));
    } else if let Some(caps) = URL_BODY_RE.captures(body) {
        entry.url = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string());
        entry.label = non_blank(caps.get(1).map(|m| m.as_str()));
    }
    entry
}

/// Parse footnote definitions that start at column 0, outside fences.
#[must_use]
pub fn parse_footnotes_in_markdown(text: &str) -> Vec<FootnoteEntry> {
    lines_outside_fences(text)
        .filter_map(|(idx, line)| {
            let caps = FOOTNOTE_LINE_RE.captures(line)?;
            Some(parse_definition(line, &caps[1], caps[2].trim_end(), idx))
        })
        .collect()
}
