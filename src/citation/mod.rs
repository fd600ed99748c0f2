//! Citation tag handling: range compression, HTML rendering, and
//! renumbering of existing references.

mod remap;
mod render;
pub mod tags;

use serde::{Deserialize, Serialize};

pub use remap::update_citations_with_mapping;
pub use render::{generate_citation_spans, replace_citations_in_markdown_with_span};
pub use tags::{
    FileCitation, MAX_RANGE_EXPANSION, combine_continuous_citation_tags, extract_auto_complete_input_tag,
    extract_common_prefix, extract_last_number, split_continuous_citation_tags, split_file_citation,
};

/// How citation labels are recognised and rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationRenderOptions {
    /// Label prefix a citation must carry, such as `eq:`.
    pub prefix: String,
    /// Symbol joining the ends of a range. `None` disables range compression.
    pub range_symbol: Option<String>,
    pub valid_delimiters: Vec<String>,
    pub file_delimiter: String,
    /// Separator between tags inside one `\ref{...}`.
    pub multi_citation_delimiter: String,
}

impl Default for CitationRenderOptions {
    fn default() -> Self {
        Self {
            prefix: "eq:".into(),
            range_symbol: Some("~".into()),
            valid_delimiters: [".", "-", ":", "_"].map(String::from).to_vec(),
            file_delimiter: "^".into(),
            multi_citation_delimiter: ", ".into(),
        }
    }
}

impl CitationRenderOptions {
    /// Split a prefix-stripped label into its trimmed, non-empty tags.
    fn split_label<'a>(&self, label: &'a str) -> Vec<&'a str> {
        let parts: Vec<&str> = if self.multi_citation_delimiter.is_empty() {
            vec![label]
        } else {
            label.split(self.multi_citation_delimiter.as_str()).collect()
        };
        parts.into_iter().map(str::trim).filter(|t| !t.is_empty()).collect()
    }

    /// Strip the configured prefix from a trimmed label.
    fn strip_prefix<'a>(&self, label: &'a str) -> Option<&'a str> {
        label.trim().strip_prefix(self.prefix.as_str())
    }

    /// Separator used when writing several tags back out.
    fn joiner(&self) -> String {
        if self.multi_citation_delimiter.ends_with(char::is_whitespace) {
            self.multi_citation_delimiter.clone()
        } else {
            format!("{} ", self.multi_citation_delimiter)
        }
    }

    fn range_symbol(&self) -> Option<&str> {
        self.range_symbol.as_deref().filter(|s| !s.is_empty())
    }
}
