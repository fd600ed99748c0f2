//! Display equation blocks delimited by `$$`.
//!
//! A block opens on a line whose body (after blockquote markers) starts
//! with `$$`. Prose, table cells, or inline code before the delimiter keep
//! the line out of consideration, as does a `$$$` run.

use serde::Serialize;

use crate::{
    fences::FenceTracker,
    matchers::{TagSyntax, find_equation_tag},
    scanning::{QuoteLine, process_quote_line},
};

const DISPLAY: &str = "$$";

/// A display equation found by [`parse_equations_in_markdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquationMatch {
    /// Trimmed, quote-stripped source lines joined with `\n`.
    pub raw: String,
    /// Equation body without its tag command.
    pub content: String,
    pub content_with_tag: String,
    pub line_start: usize,
    /// Inclusive; the last document line for an unclosed block.
    pub line_end: usize,
    pub tag: Option<String>,
    pub in_quote: bool,
    pub quote_depth: usize,
}

/// Shape of one candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DisplayLine<'a> {
    /// `$$ body $$` on one line.
    Single(&'a str),
    /// `$$` optionally followed by a first content line.
    Open(&'a str),
}

/// Classify a quote-stripped, trimmed line body.
pub(crate) fn classify_display_line(body: &str) -> Option<DisplayLine<'_>> {
    let rest = body.strip_prefix(DISPLAY)?;
    if rest.starts_with('$') {
        return None;
    }
    match rest.strip_suffix(DISPLAY) {
        Some(inner) => Some(DisplayLine::Single(inner)),
        None => Some(DisplayLine::Open(rest)),
    }
}

/// Effect of one line on an open display block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockStep {
    /// The quote the block lives in ended before this line.
    Left,
    /// The line ends with `$$` and closes the block.
    Closed,
    Continues,
}

/// Decide what `quote` does to a block opened at quote depth `depth`.
pub(crate) fn step_open_block(depth: usize, quote: &QuoteLine<'_>) -> BlockStep {
    if depth > 0 && quote.depth < depth {
        BlockStep::Left
    } else if quote.content.ends_with(DISPLAY) {
        BlockStep::Closed
    } else {
        BlockStep::Continues
    }
}

struct OpenBlock {
    line_start: usize,
    depth: usize,
    bodies: Vec<String>,
    interior: Vec<String>,
}

impl OpenBlock {
    fn finish(self, line_end: usize, syntax: TagSyntax) -> EquationMatch {
        build_match(
            self.bodies.join("\n"),
            &self.interior.join("\n"),
            self.line_start,
            line_end,
            self.depth,
            syntax,
        )
    }
}

fn build_match(
    raw: String,
    interior: &str,
    line_start: usize,
    line_end: usize,
    depth: usize,
    syntax: TagSyntax,
) -> EquationMatch {
    let content_with_tag = interior.trim().to_string();
    let (content, tag) = match find_equation_tag(&content_with_tag, syntax) {
        Some(span) => {
            let mut content = String::with_capacity(content_with_tag.len());
            content.push_str(&content_with_tag[..span.start]);
            content.push_str(&content_with_tag[span.end..]);
            let tag = Some(span.inner.trim().to_string()).filter(|t| !t.is_empty());
            (content.trim().to_string(), tag)
        }
        None => (content_with_tag.clone(), None),
    };
    EquationMatch {
        raw,
        content,
        content_with_tag,
        line_start,
        line_end,
        tag,
        in_quote: depth > 0,
        quote_depth: depth,
    }
}

/// Parse every display equation using LaTeX `\tag{}` commands.
///
/// # Examples
///
/// ```
/// use eqcite::parsers::equations::parse_equations_in_markdown;
/// let found = parse_equations_in_markdown("$$ F = ma \\tag{1.1} $$");
/// assert_eq!(found[0].tag.as_deref(), Some("1.1"));
/// assert_eq!(found[0].content, "F = ma");
/// ```
#[must_use]
pub fn parse_equations_in_markdown(text: &str) -> Vec<EquationMatch> {
    parse_equations_with_syntax(text, TagSyntax::Latex)
}

/// Parse every display equation, reading tags in the given syntax.
#[must_use]
pub fn parse_equations_with_syntax(text: &str, syntax: TagSyntax) -> Vec<EquationMatch> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut equations = Vec::new();
    let mut fences = FenceTracker::new();
    let mut open: Option<OpenBlock> = None;

    for (idx, line) in lines.iter().enumerate() {
        let quote = process_quote_line(line);
        if let Some(mut block) = open.take() {
            let step = step_open_block(block.depth, &quote);
            if step == BlockStep::Left {
                equations.push(block.finish(idx - 1, syntax));
            } else {
                block.bodies.push(quote.content.to_string());
                if step == BlockStep::Closed {
                    let before = quote.content.strip_suffix(DISPLAY).unwrap_or_default();
                    block.interior.push(before.to_string());
                    equations.push(block.finish(idx, syntax));
                } else {
                    block.interior.push(quote.content.to_string());
                    open = Some(block);
                }
                continue;
            }
        }

        if fences.observe(line) || fences.in_fence() {
            continue;
        }
        match classify_display_line(quote.content) {
            Some(DisplayLine::Single(inner)) => equations.push(build_match(
                quote.content.to_string(),
                inner,
                idx,
                idx,
                quote.depth,
                syntax,
            )),
            Some(DisplayLine::Open(first)) => {
                let interior = if first.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![first.to_string()]
                };
                open = Some(OpenBlock {
                    line_start: idx,
                    depth: quote.depth,
                    bodies: vec![quote.content.to_string()],
                    interior,
                });
            }
            None => {}
        }
    }

    if let Some(block) = open {
        equations.push(block.finish(lines.len() - 1, syntax));
    }
    tracing::trace!(count = equations.len(), "parsed equations");
    equations
}

/// Find the first equation whose tag equals the trimmed `tag`.
#[must_use]
pub fn parse_first_equation_in_markdown(text: &str, tag: &str) -> Option<EquationMatch> {
    let tag = tag.trim();
    if tag.is_empty() {
        return None;
    }
    parse_equations_in_markdown(text)
        .into_iter()
        .find(|eq| eq.tag.as_deref() == Some(tag))
}

/// Report whether `part` is digit runs separated by one of `delimiters`.
///
/// ```
/// use eqcite::parsers::equations::is_valid_equation_part;
/// let delimiters = [".", "-"];
/// assert!(is_valid_equation_part("1.2-3", &delimiters));
/// assert!(!is_valid_equation_part("1.2.a", &delimiters));
/// ```
#[must_use]
pub fn is_valid_equation_part<S: AsRef<str>>(part: &str, delimiters: &[S]) -> bool {
    let mut rest = part;
    loop {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return false;
        }
        rest = &rest[digits..];
        if rest.is_empty() {
            return true;
        }
        let Some(delimiter) = delimiters
            .iter()
            .map(AsRef::as_ref)
            .find(|d| !d.is_empty() && rest.starts_with(*d))
        else {
            return false;
        };
        rest = &rest[delimiter.len()..];
    }
}
