use tracing::{debug, trace};

use super::{
    FigureNumberingOptions, NumberingResult, TagCounter, TagMapping, normalize_old_tag,
    outline_depths,
};
use crate::parsers::{
    equations::parse_equations_with_syntax, figures::parse_figures_in_markdown,
};

/// Assign hierarchical citation tags to image embeds.
///
/// The citation part of each embed's metadata is replaced, or inserted
/// before the size part. With `tagged_only`, figures without a citation part
/// are left untouched and do not advance the counter. Mapping keys are the
/// previous tags without the citation prefix.
///
/// # Examples
///
/// ```
/// use eqcite::numbering::{FigureNumberingOptions, auto_number_figures};
/// let text = "# A\n![[plot.png|400]]";
/// let result = auto_number_figures(text, &FigureNumberingOptions::default());
/// assert_eq!(result.markdown, "# A\n![[plot.png|fig:1.1|400]]");
/// ```
#[must_use]
pub fn auto_number_figures(text: &str, options: &FigureNumberingOptions) -> NumberingResult {
    let numbering = &options.numbering;
    let figures = parse_figures_in_markdown(text, &options.citation_prefix);
    let equations = parse_equations_with_syntax(text, numbering.tag_syntax);
    let depths = outline_depths(text, &equations, numbering.mode);

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let mut counter = TagCounter::new(numbering);
    let mut mapping = TagMapping::new();
    let mut next_heading = depths.iter().peekable();
    let mut edits: Vec<(usize, std::ops::Range<usize>, String)> = Vec::new();

    for figure in &figures {
        while let Some(&(_, depth)) = next_heading.next_if(|(line, _)| *line < figure.line_start) {
            counter.enter_heading(depth);
        }
        if figure.in_quote && !numbering.parse_quotes {
            continue;
        }
        if options.tagged_only && figure.tag.is_none() {
            continue;
        }
        let tag = counter.next_tag();
        trace!(line = figure.line_start, path = %figure.path, %tag, "numbering figure");
        if let Some(old) = &figure.tag {
            mapping.insert(normalize_old_tag(old, &numbering.delimiter), tag.clone());
        }
        edits.push((figure.line_start, figure.start..figure.end, figure.render(Some(&tag))));
    }

    debug!(numbered = edits.len(), mapped = mapping.len(), "numbered figures");
    for (line, range, replacement) in edits.into_iter().rev() {
        lines[line].replace_range(range, &replacement);
    }
    NumberingResult {
        markdown: lines.join("\n"),
        tag_mapping: mapping,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::numbering::{NumberingMode, NumberingOptions};

    fn options(mode: NumberingMode, max_depth: usize, tagged_only: bool) -> FigureNumberingOptions {
        FigureNumberingOptions {
            numbering: NumberingOptions {
                mode,
                max_depth,
                ..NumberingOptions::default()
            },
            citation_prefix: "fig:".into(),
            tagged_only,
        }
    }

    fn number(text: &str, opts: &FigureNumberingOptions) -> String {
        auto_number_figures(text, opts).markdown
    }

    #[test]
    fn numbers_wiki_embeds_by_outline() {
        let text = "![[p.png]]\n# C1\n![[a.png]]\n## S\n![[b.png]]\n### Sub\n![[c.png]]\n# C2\n![[d.png]]";
        let out = number(text, &options(NumberingMode::Relative, 7, false));
        for expected in [
            "![[p.png|fig:P1]]",
            "![[a.png|fig:1.1]]",
            "![[b.png|fig:1.1.1]]",
            "![[c.png|fig:1.1.1.1]]",
            "![[d.png|fig:2.1]]",
        ] {
            assert!(out.contains(expected), "missing {expected} in {out}");
        }
    }

    #[rstest]
    #[case::size("![[i.png|400]]", "![[i.png|fig:1.1|400]]")]
    #[case::title_size("![[i.png|title:Test|500]]", "![[i.png|title:Test|fig:1.1|500]]")]
    #[case::existing("![[i.png|fig:old1]]", "![[i.png|fig:1.1]]")]
    #[case::all("![[i.png|title:T|desc:D|fig:old|500]]", "![[i.png|title:T|desc:D|fig:1.1|500]]")]
    #[case::markdown("![](i.png)", "![fig:1.1](i.png)")]
    #[case::markdown_size("![fig:old2|400](i.png)", "![fig:1.1|400](i.png)")]
    fn rewrites_metadata(#[case] figure: &str, #[case] expected: &str) {
        let text = format!("# Chapter 1\n\n{figure}");
        let out = number(&text, &options(NumberingMode::Relative, 7, false));
        assert_eq!(out, format!("# Chapter 1\n\n{expected}"));
    }

    #[test]
    fn heading_lines_inside_equations_do_not_advance() {
        let text = "# A\n![[a.png]]\n$$\n# x = 1\n$$\n![[b.png]]";
        let out = number(text, &options(NumberingMode::Relative, 3, false));
        assert!(out.contains("![[a.png|fig:1.1]]"), "{out}");
        assert!(out.contains("![[b.png|fig:1.2]]"), "{out}");
    }

    #[test]
    fn absolute_outline() {
        let text = "# M\n![[1.png]]\n## A\n![[2.png]]\n### A1\n![[3.png]]\n## B\n![[4.png]]\n# N\n![[5.png]]";
        let out = number(text, &options(NumberingMode::Absolute, 6, false));
        for expected in ["fig:1.1]]", "fig:1.1.1]]", "fig:1.1.1.1]]", "fig:1.2.1]]", "fig:2.1]]"] {
            assert!(out.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn tagged_only_skips_untagged() {
        let text = "![[a.png]]\n![[b.png|fig:old]]\n# C\n![[c.png|fig:x]]\n![[d.png]]\n![](e.png)";
        let result = auto_number_figures(text, &options(NumberingMode::Relative, 7, true));
        assert_eq!(
            result.markdown,
            "![[a.png]]\n![[b.png|fig:P1]]\n# C\n![[c.png|fig:1.1]]\n![[d.png]]\n![](e.png)"
        );
        let entries: Vec<_> = result.tag_mapping.iter().collect();
        assert_eq!(entries, [("old", "P1"), ("x", "1.1")]);
    }

    #[test]
    fn several_figures_on_one_line() {
        let out = number("![[a.png]] ![](b.png)", &options(NumberingMode::Relative, 3, false));
        assert_eq!(out, "![[a.png|fig:P1]] ![fig:P2](b.png)");
    }

    #[test]
    fn custom_prefix_and_code_blocks() {
        let mut opts = options(NumberingMode::Relative, 7, false);
        opts.citation_prefix = "image:".into();
        let text = "```\n![[ignored.png]]\n```\n# C\n![[a.png|image:old]]";
        let out = number(text, &opts);
        assert_eq!(out, "```\n![[ignored.png]]\n```\n# C\n![[a.png|image:1.1]]");
    }

    #[test]
    fn mapping_omits_untagged() {
        let text = "# C\n![[a.png]]\n![[b.png|fig:oldTag]]";
        let result = auto_number_figures(text, &options(NumberingMode::Relative, 7, false));
        assert!(!result.tag_mapping.contains_key("1.1"));
        assert_eq!(result.tag_mapping.get("oldTag"), Some("1.2"));
    }

    #[test]
    fn text_without_figures_is_unchanged() {
        let text = "# Chapter 1\n\nSome text.";
        assert_eq!(number(text, &FigureNumberingOptions::default()), text);
        assert_eq!(number("", &FigureNumberingOptions::default()), "");
    }
}
