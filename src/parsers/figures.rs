//! Image embeds and their pipe-separated metadata.
//!
//! Two syntaxes are recognised: wiki embeds (`![[path|meta|...]]`) and
//! Markdown images whose alt text carries the metadata (`![meta|...](path)`).

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{
    fences::FenceTracker,
    scanning::{inline_code_spans, process_quote_line},
};

static WIKI_EMBED_RE: LazyLock<Regex> = lazy_regex!(
    r"!\[\[([^\]|]+)((?:\|[^\]]*)?)\]\]",
    "wiki embed pattern should compile",
);

static MARKDOWN_IMAGE_RE: LazyLock<Regex> = lazy_regex!(
    r"!\[([^\]]*)\]\(([^)]+)\)",
    "markdown image pattern should compile",
);

static SIZE_RE: LazyLock<Regex> =
    lazy_regex!(r"^\d+(?:x\d+)?$", "size pattern should compile");

const TITLE_KEY: &str = "title:";
const DESC_KEY: &str = "desc:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureSyntax {
    Wiki,
    Markdown,
}

/// An image embed found by [`parse_figures_in_markdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigureMatch {
    pub raw: String,
    pub syntax: FigureSyntax,
    pub path: String,
    pub title: Option<String>,
    pub desc: Option<String>,
    /// Citation tag without the prefix.
    pub tag: Option<String>,
    pub size: Option<String>,
    /// Unrecognised metadata, verbatim and in source order.
    pub extras: Vec<String>,
    pub line_start: usize,
    pub line_end: usize,
    /// Byte offsets of `raw` within its line.
    pub start: usize,
    pub end: usize,
    pub in_quote: bool,
    pub quote_depth: usize,
    #[serde(skip)]
    citation_prefix: String,
}

impl FigureMatch {
    /// Rebuild the embed with `tag` as its citation metadata.
    ///
    /// Metadata is written as title, description, other parts, citation,
    /// then size. Passing `None` drops the citation part.
    ///
    /// ```
    /// use eqcite::parsers::figures::parse_figures_in_markdown;
    /// let figure = &parse_figures_in_markdown("![[a.png|400|title:T]]", "fig:")[0];
    /// assert_eq!(figure.render(Some("1.1")), "![[a.png|title:T|fig:1.1|400]]");
    /// ```
    #[must_use]
    pub fn render(&self, tag: Option<&str>) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(title) = &self.title {
            parts.push(format!("{TITLE_KEY}{title}"));
        }
        if let Some(desc) = &self.desc {
            parts.push(format!("{DESC_KEY}{desc}"));
        }
        parts.extend(self.extras.iter().cloned());
        if let Some(tag) = tag {
            parts.push(format!("{}{tag}", self.citation_prefix));
        }
        if let Some(size) = &self.size {
            parts.push(size.clone());
        }
        let meta = parts.join("|");
        match self.syntax {
            FigureSyntax::Wiki if meta.is_empty() => format!("![[{}]]", self.path),
            FigureSyntax::Wiki => format!("![[{}|{meta}]]", self.path),
            FigureSyntax::Markdown => format!("![{meta}]({})", self.path),
        }
    }
}

#[derive(Default)]
struct Metadata {
    title: Option<String>,
    desc: Option<String>,
    tag: Option<String>,
    size: Option<String>,
    extras: Vec<String>,
}

fn parse_metadata(meta: &str, citation_prefix: &str) -> Metadata {
    let mut out = Metadata::default();
    for part in meta.split('|').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(title) = part.strip_prefix(TITLE_KEY) {
            out.title = Some(title.to_string());
        } else if let Some(desc) = part.strip_prefix(DESC_KEY) {
            out.desc = Some(desc.to_string());
        } else if let Some(tag) = part
            .strip_prefix(citation_prefix)
            .filter(|_| !citation_prefix.is_empty())
        {
            out.tag.get_or_insert_with(|| tag.trim().to_string());
        } else if SIZE_RE.is_match(part) {
            out.size = Some(part.to_string());
        } else {
            out.extras.push(part.to_string());
        }
    }
    out
}

/// Parse every image embed outside fenced code and inline code spans.
///
/// Several embeds on one line are returned left to right.
#[must_use]
pub fn parse_figures_in_markdown(text: &str, citation_prefix: &str) -> Vec<FigureMatch> {
    let mut figures = Vec::new();
    let mut fences = FenceTracker::new();
    for (idx, line) in text.split('\n').enumerate() {
        if fences.observe(line) || fences.in_fence() {
            continue;
        }
        let depth = process_quote_line(line).depth;
        let code = inline_code_spans(line);
        let mut found: Vec<FigureMatch> = Vec::new();
        let wiki = WIKI_EMBED_RE.captures_iter(line).map(|caps| {
            let path = caps[1].trim().to_string();
            let meta = caps[2].strip_prefix('|').unwrap_or_default();
            (caps.get(0), FigureSyntax::Wiki, path, meta.to_string())
        });
        let markdown = MARKDOWN_IMAGE_RE.captures_iter(line).map(|caps| {
            let path = caps[2].trim().to_string();
            (caps.get(0), FigureSyntax::Markdown, path, caps[1].to_string())
        });
        for (whole, syntax, path, meta) in wiki.chain(markdown) {
            let Some(whole) = whole else { continue };
            if code.iter().any(|span| span.contains(&whole.start())) {
                continue;
            }
            if found.iter().any(|f| f.start < whole.end() && whole.start() < f.end) {
                continue;
            }
            let meta = parse_metadata(&meta, citation_prefix);
            found.push(FigureMatch {
                raw: whole.as_str().to_string(),
                syntax,
                path,
                title: meta.title,
                desc: meta.desc,
                tag: meta.tag,
                size: meta.size,
                extras: meta.extras,
                line_start: idx,
                line_end: idx,
                start: whole.start(),
                end: whole.end(),
                in_quote: depth > 0,
                quote_depth: depth,
                citation_prefix: citation_prefix.to_string(),
            });
        }
        found.sort_by_key(|f| f.start);
        figures.append(&mut found);
    }
    tracing::trace!(count = figures.len(), "parsed figures");
    figures
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn single(text: &str) -> FigureMatch {
        let mut found = parse_figures_in_markdown(text, "fig:");
        assert_eq!(found.len(), 1, "expected one figure in {text:?}");
        found.remove(0)
    }

    #[test]
    fn parses_wiki_metadata() {
        let figure = single("![[image.png|title:Title|desc:Description|fig:old|500]]");
        assert_eq!(figure.syntax, FigureSyntax::Wiki);
        assert_eq!(figure.path, "image.png");
        assert_eq!(figure.title.as_deref(), Some("Title"));
        assert_eq!(figure.desc.as_deref(), Some("Description"));
        assert_eq!(figure.tag.as_deref(), Some("old"));
        assert_eq!(figure.size.as_deref(), Some("500"));
        assert!(figure.extras.is_empty());
    }

    #[test]
    fn parses_markdown_alt_metadata() {
        let figure = single("see ![title:Test|500](image2.png) here");
        assert_eq!(figure.syntax, FigureSyntax::Markdown);
        assert_eq!(figure.path, "image2.png");
        assert_eq!(figure.title.as_deref(), Some("Test"));
        assert_eq!(figure.size.as_deref(), Some("500"));
        assert_eq!((figure.start, figure.end), (4, 33));
    }

    #[rstest]
    #[case::bare_wiki("![[a.png]]", Some("1.1"), "![[a.png|fig:1.1]]")]
    #[case::size("![[a.png|400]]", Some("1.1"), "![[a.png|fig:1.1|400]]")]
    #[case::extras("![[a.png|custom:value|another:data]]", Some("1"), "![[a.png|custom:value|another:data|fig:1]]")]
    #[case::dimensions("![[a.png|fig:x|100x200]]", Some("2"), "![[a.png|fig:2|100x200]]")]
    #[case::untagged_wiki("![[a.png|fig:old]]", None, "![[a.png]]")]
    #[case::bare_markdown("![](a.png)", Some("1.1"), "![fig:1.1](a.png)")]
    #[case::untagged_markdown("![fig:old](a.png)", None, "![](a.png)")]
    fn renders_metadata_in_order(
        #[case] text: &str,
        #[case] tag: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(single(text).render(tag), expected);
    }

    #[test]
    fn several_figures_per_line() {
        let found = parse_figures_in_markdown("![](b.png) and ![[a.png]]", "fig:");
        let paths: Vec<_> = found.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["b.png", "a.png"]);
    }

    #[test]
    fn skips_fenced_code_and_records_quotes() {
        let text = "```\n![[ignored.png]]\n```\n> ![[quoted.png]]";
        let found = parse_figures_in_markdown(text, "fig:");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "quoted.png");
        assert!(found[0].in_quote);
        assert_eq!(found[0].line_start, 3);
    }

    #[rstest]
    #[case::wiki("Use `![[a.png]]` syntax.", &[])]
    #[case::markdown("Write `![alt](a.png)` here.", &[])]
    #[case::beside_code("`![[a.png]]` then ![[b.png]]", &["b.png"])]
    #[case::double_backticks("``![[a.png]]`` and `x`", &[])]
    fn skips_inline_code(#[case] text: &str, #[case] expected: &[&str]) {
        let found = parse_figures_in_markdown(text, "fig:");
        let paths: Vec<_> = found.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn custom_prefix() {
        let found = parse_figures_in_markdown("![[img.png|image:old|fig:kept]]", "image:");
        assert_eq!(found[0].tag.as_deref(), Some("old"));
        assert_eq!(found[0].extras, ["fig:kept"]);
    }
}
