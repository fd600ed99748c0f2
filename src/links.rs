//! Queries over a precomputed link graph.
//!
//! The graph maps each source file to the files it links to and how often,
//! the shape a note vault reports as its resolved links. A recorded count of
//! zero still counts as a link.

use std::collections::BTreeMap;

/// Source file → target file → number of links.
pub type LinkGraph = BTreeMap<String, BTreeMap<String, u32>>;

/// Files that link to `target`, sorted.
///
/// ```
/// use eqcite::links::{LinkGraph, resolve_back_links};
/// let graph: LinkGraph = serde_json::from_str(r#"{"a.md": {"c.md": 1}, "b.md": {"c.md": 0}}"#).unwrap();
/// assert_eq!(resolve_back_links(&graph, "c.md"), ["a.md", "b.md"]);
/// ```
#[must_use]
pub fn resolve_back_links(graph: &LinkGraph, target: &str) -> Vec<String> {
    graph
        .iter()
        .filter(|(_, targets)| targets.contains_key(target))
        .map(|(source, _)| source.clone())
        .collect()
}

/// Files `source` links to, sorted. Unknown sources have none.
#[must_use]
pub fn resolve_forward_links(graph: &LinkGraph, source: &str) -> Vec<String> {
    graph
        .get(source)
        .map(|targets| targets.keys().cloned().collect())
        .unwrap_or_default()
}
