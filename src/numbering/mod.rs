//! Hierarchical auto-numbering of equations and figures.
//!
//! Tags follow the heading outline: an entity under the second section of
//! the first chapter gets `1.2.<n>`. Entities before the first heading use a
//! flat `<no_heading_prefix><n>` sequence instead.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::{
    matchers::TagSyntax,
    parsers::{
        equations::EquationMatch,
        headings::{parse_headings, relative_heading_levels},
    },
    scanning::remove_paired_braces,
};

mod equations;
mod figures;

pub use equations::auto_number_equations;
pub use figures::auto_number_figures;

/// How heading depth is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberingMode {
    /// Depth relative to the document's own outline; the first heading is
    /// depth 1 and level gaps never skip a component.
    #[default]
    Relative,
    /// Depth is the raw Markdown level; skipped levels count as 1.
    Absolute,
}

impl FromStr for NumberingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relative" => Ok(Self::Relative),
            "absolute" => Ok(Self::Absolute),
            other => Err(format!("unknown numbering mode `{other}`")),
        }
    }
}

impl fmt::Display for NumberingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Relative => "relative",
            Self::Absolute => "absolute",
        })
    }
}

/// Options shared by equation and figure numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingOptions {
    pub mode: NumberingMode,
    /// Number of tag components, the entity counter included. `0` acts as `1`.
    pub max_depth: usize,
    pub delimiter: String,
    pub no_heading_prefix: String,
    pub global_prefix: String,
    /// Number entities inside blockquotes too.
    pub parse_quotes: bool,
    pub tag_syntax: TagSyntax,
}

impl Default for NumberingOptions {
    fn default() -> Self {
        Self {
            mode: NumberingMode::Relative,
            max_depth: 3,
            delimiter: ".".into(),
            no_heading_prefix: "P".into(),
            global_prefix: String::new(),
            parse_quotes: false,
            tag_syntax: TagSyntax::Latex,
        }
    }
}

/// Options for [`auto_number_figures`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureNumberingOptions {
    pub numbering: NumberingOptions,
    /// Metadata prefix marking the citation part, e.g. `fig:`.
    pub citation_prefix: String,
    /// Only renumber figures that already carry a citation part.
    pub tagged_only: bool,
}

impl Default for FigureNumberingOptions {
    fn default() -> Self {
        Self {
            numbering: NumberingOptions::default(),
            citation_prefix: "fig:".into(),
            tagged_only: false,
        }
    }
}

/// Insertion-ordered map from previous tags to new tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMapping {
    entries: Vec<(String, String)>,
}

impl TagMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; an overwritten key keeps its position.
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let old = old.into();
        let new = new.into();
        match self.entries.iter_mut().find(|(key, _)| *key == old) {
            Some(entry) => entry.1 = new,
            None => self.entries.push((old, new)),
        }
    }

    #[must_use]
    pub fn get(&self, old: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == old)
            .map(|(_, new)| new.as_str())
    }

    #[must_use]
    pub fn contains_key(&self, old: &str) -> bool {
        self.get(old).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (old, new) in iter {
            mapping.insert(old, new);
        }
        mapping
    }
}

impl Serialize for TagMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Rewritten document and the tags that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberingResult {
    pub markdown: String,
    pub tag_mapping: TagMapping,
}

/// Numbering state for one pass over a document.
#[derive(Debug)]
pub(crate) struct TagCounter<'a> {
    options: &'a NumberingOptions,
    path: Vec<usize>,
    seen_heading: bool,
    display: Vec<usize>,
    counter: usize,
    no_heading: usize,
}

impl<'a> TagCounter<'a> {
    pub(crate) fn new(options: &'a NumberingOptions) -> Self {
        Self {
            options,
            path: Vec::new(),
            seen_heading: false,
            display: Vec::new(),
            counter: 0,
            no_heading: 0,
        }
    }

    /// Advance the heading path for a heading at `depth` (1-based).
    pub(crate) fn enter_heading(&mut self, depth: usize) {
        let depth = depth.max(1);
        self.path.resize(depth, 0);
        for slot in &mut self.path[..depth - 1] {
            if *slot == 0 {
                *slot = 1;
            }
        }
        self.path[depth - 1] += 1;
        self.seen_heading = true;
    }

    /// Produce the tag for the next entity.
    pub(crate) fn next_tag(&mut self) -> String {
        if !self.seen_heading {
            self.no_heading += 1;
            return format!("{}{}", self.options.no_heading_prefix, self.no_heading);
        }
        let shown = self.options.max_depth.max(1) - 1;
        let display = &self.path[..self.path.len().min(shown)];
        if display != self.display.as_slice() {
            self.display = display.to_vec();
            self.counter = 0;
        }
        self.counter += 1;
        let parts: Vec<String> = self
            .display
            .iter()
            .chain(std::iter::once(&self.counter))
            .map(ToString::to_string)
            .collect();
        format!(
            "{}{}",
            self.options.global_prefix,
            parts.join(&self.options.delimiter)
        )
    }
}

/// Heading lines paired with the depth the counter should use.
///
/// Heading-like lines inside an equation block are not headings.
pub(crate) fn outline_depths(
    text: &str,
    equations: &[EquationMatch],
    mode: NumberingMode,
) -> Vec<(usize, usize)> {
    let headings: Vec<_> = parse_headings(text)
        .into_iter()
        .filter(|h| {
            !equations
                .iter()
                .any(|eq| (eq.line_start..=eq.line_end).contains(&h.line))
        })
        .collect();
    match mode {
        NumberingMode::Relative => headings
            .iter()
            .zip(relative_heading_levels(&headings))
            .map(|(h, depth)| (h.line, depth))
            .collect(),
        NumberingMode::Absolute => headings.iter().map(|h| (h.line, h.level)).collect(),
    }
}

/// Mapping key for a previous tag: paired braces removed and a legacy
/// `.N` form stripped of its leading delimiter.
pub(crate) fn normalize_old_tag(tag: &str, delimiter: &str) -> String {
    let flat = remove_paired_braces(tag.trim());
    match flat.strip_prefix(delimiter) {
        Some(rest)
            if !delimiter.is_empty()
                && !rest.is_empty()
                && rest.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest.to_string()
        }
        _ => flat,
    }
}
