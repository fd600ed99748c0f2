//! Citable callouts such as `> [!thm:2.1] Title`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{fences::FenceTracker, scanning::process_quote_line};

static CALLOUT_HEADER_RE: LazyLock<Regex> = lazy_regex!(
    r"^\[!([^\]]+)\](.*)$",
    "callout header pattern should compile",
);

/// A configured callout citation prefix and its display format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutPrefix {
    /// Prefix including its delimiter, e.g. `thm:`.
    pub prefix: String,
    /// Display format; `#` stands for the tag, e.g. `Theorem #`.
    pub format: String,
}

impl CalloutPrefix {
    #[must_use]
    pub fn new(prefix: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            format: format.into(),
        }
    }

    /// Substitute `tag` for every `#` in the format.
    ///
    /// ```
    /// use eqcite::parsers::callouts::CalloutPrefix;
    /// let table = CalloutPrefix::new("table:", "Table. #");
    /// assert_eq!(table.render_title("1.1"), "Table. 1.1");
    /// ```
    #[must_use]
    pub fn render_title(&self, tag: &str) -> String {
        self.format.replace('#', tag)
    }

    /// Prefix without trailing punctuation, e.g. `thm` for `thm:`.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.prefix.trim_end_matches(|c: char| !c.is_alphanumeric())
    }
}

/// The prefixes used when no configuration is given.
#[must_use]
pub fn default_callout_prefixes() -> Vec<CalloutPrefix> {
    vec![
        CalloutPrefix::new("table:", "Table. #"),
        CalloutPrefix::new("thm:", "Theorem #"),
        CalloutPrefix::new("def:", "Definition #"),
    ]
}

/// A callout found by [`parse_all_callouts_from_markdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalloutMatch {
    #[serde(rename = "type")]
    pub kind: String,
    pub tag: String,
    /// Prefix and tag, e.g. `thm:2.1`.
    pub label: String,
    pub prefix: String,
    /// Header text after the closing bracket, trimmed.
    pub title: String,
    /// Quote content of the following lines, trimmed.
    pub content: String,
    pub raw: String,
    pub line_start: usize,
    pub line_end: usize,
    pub quote_depth: usize,
}

struct Header<'a> {
    prefix: &'a CalloutPrefix,
    tag: &'a str,
    title: &'a str,
}

fn match_header<'a>(content: &'a str, prefixes: &'a [CalloutPrefix]) -> Option<Header<'a>> {
    let caps = CALLOUT_HEADER_RE.captures(content)?;
    let name = caps.get(1)?.as_str();
    let prefix = prefixes
        .iter()
        .filter(|p| !p.prefix.is_empty() && name.starts_with(p.prefix.as_str()))
        .max_by_key(|p| p.prefix.len())?;
    Some(Header {
        prefix,
        tag: name[prefix.prefix.len()..].trim(),
        title: caps.get(2)?.as_str().trim(),
    })
}

struct OpenCallout {
    header: CalloutMatch,
    lines: Vec<String>,
    raw: Vec<String>,
}

impl OpenCallout {
    fn finish(mut self) -> CalloutMatch {
        self.header.content = self.lines.join("\n").trim().to_string();
        self.header.raw = self.raw.join("\n");
        self.header
    }
}

/// Parse every callout whose header uses one of `prefixes`.
///
/// Following quote lines at the header's depth or deeper form the content;
/// a non-quote line, a shallower quote, or another header ends it.
#[must_use]
pub fn parse_all_callouts_from_markdown(
    text: &str,
    prefixes: &[CalloutPrefix],
) -> Vec<CalloutMatch> {
    let mut callouts = Vec::new();
    let mut fences = FenceTracker::new();
    let mut open: Option<OpenCallout> = None;

    for (idx, line) in text.split('\n').enumerate() {
        let fence_line = fences.observe(line);
        let quote = process_quote_line(line);
        let in_code = fence_line || fences.in_fence();
        let header = if in_code {
            None
        } else {
            quote
                .is_quote()
                .then(|| match_header(quote.content, prefixes))
                .flatten()
        };

        if let Some(mut current) = open.take() {
            if header.is_none() && quote.depth >= current.header.quote_depth {
                current.lines.push(quote.content.to_string());
                current.raw.push(line.to_string());
                current.header.line_end = idx;
                open = Some(current);
                continue;
            }
            callouts.push(current.finish());
        }

        if let Some(header) = header {
            open = Some(OpenCallout {
                header: CalloutMatch {
                    kind: header.prefix.kind().to_string(),
                    tag: header.tag.to_string(),
                    label: format!("{}{}", header.prefix.prefix, header.tag),
                    prefix: header.prefix.prefix.clone(),
                    title: header.title.to_string(),
                    content: String::new(),
                    raw: String::new(),
                    line_start: idx,
                    line_end: idx,
                    quote_depth: quote.depth,
                },
                lines: Vec::new(),
                raw: vec![line.to_string()],
            });
        }
    }

    if let Some(current) = open {
        callouts.push(current.finish());
    }
    callouts
}

/// Find the first callout with the given tag, ignoring surrounding spaces.
#[must_use]
pub fn parse_first_callout_in_markdown(
    text: &str,
    tag: &str,
    prefixes: &[CalloutPrefix],
) -> Option<CalloutMatch> {
    let tag = tag.trim();
    if tag.is_empty() {
        return None;
    }
    parse_all_callouts_from_markdown(text, prefixes)
        .into_iter()
        .find(|c| c.tag == tag)
}
