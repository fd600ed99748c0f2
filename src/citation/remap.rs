//! Rewriting citation tags after renumbering.

use super::{CitationRenderOptions, combine_continuous_citation_tags, split_continuous_citation_tags, split_file_citation};
use crate::{
    matchers::match_nested_citation,
    numbering::TagMapping,
    parsers::citations::{CitationOccurrence, parse_citations_in_markdown},
};

/// Compute the new `\ref{...}` for one occurrence, if any tag changed.
fn remap_occurrence(
    occurrence: &CitationOccurrence,
    mapping: &TagMapping,
    options: &CitationRenderOptions,
) -> Option<String> {
    let label = options.strip_prefix(&occurrence.label)?;
    let tags = options.split_label(label);
    let tags = match options.range_symbol() {
        Some(range) => split_continuous_citation_tags(
            &tags,
            range,
            &options.valid_delimiters,
            &options.file_delimiter,
        ),
        None => tags.into_iter().map(String::from).collect(),
    };

    let mut changed = false;
    let remapped: Vec<String> = tags
        .into_iter()
        .map(|tag| {
            let citation = split_file_citation(&tag, &options.file_delimiter);
            if citation.cross_file.is_some() {
                return tag;
            }
            match mapping.get(&citation.local) {
                Some(new) if new != citation.local => {
                    changed = true;
                    new.to_string()
                }
                _ => tag,
            }
        })
        .collect();
    if !changed {
        return None;
    }

    let remapped = match options.range_symbol() {
        Some(range) => combine_continuous_citation_tags(
            &remapped,
            range,
            &options.valid_delimiters,
            &options.file_delimiter,
        ),
        None => remapped,
    };
    Some(format!(
        "\\ref{{{}{}}}",
        options.prefix,
        remapped.join(&options.joiner())
    ))
}

/// Rewrite local citation tags through `mapping`.
///
/// Ranges are expanded before lookup and recompressed afterwards.
/// Cross-file tags and citations without a changed tag keep their text.
///
/// ```
/// use eqcite::citation::{CitationRenderOptions, update_citations_with_mapping};
/// use eqcite::numbering::TagMapping;
///
/// let mapping: TagMapping = [("1.2", "1.1"), ("1.3", "1.2")].into_iter().collect();
/// let out = update_citations_with_mapping(
///     r"See $\ref{eq:1.2~3}$.",
///     &mapping,
///     &CitationRenderOptions::default(),
/// );
/// assert_eq!(out, r"See $\ref{eq:1.1~2}$.");
/// ```
#[must_use]
pub fn update_citations_with_mapping(text: &str, mapping: &TagMapping, options: &CitationRenderOptions) -> String {
    if mapping.is_empty() {
        return text.to_string();
    }
    let occurrences = parse_citations_in_markdown(text);
    if occurrences.is_empty() {
        return text.to_string();
    }

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    for occurrence in occurrences.iter().rev() {
        let Some(replacement) = remap_occurrence(occurrence, mapping, options) else {
            continue;
        };
        let Some(citation) = match_nested_citation(&occurrence.full_match, None) else {
            continue;
        };
        let Some(offset) = occurrence.full_match.find(citation.content) else {
            continue;
        };
        let Some(line) = lines.get_mut(occurrence.line) else {
            continue;
        };
        let start = occurrence.position.start + offset;
        line.replace_range(start..start + citation.content.len(), &replacement);
    }
    lines.join("\n")
}
