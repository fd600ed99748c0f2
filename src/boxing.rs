//! Wrapping the display equation under a cursor in a box.
//!
//! The result is a [`Replacement`] for an editor to apply rather than a
//! rewritten document, so the cursor and undo history survive.

use serde::{Deserialize, Serialize};

use crate::{parsers::equations::parse_equations_in_markdown, scanning::process_quote_line};

const DISPLAY: &str = "$$";

/// A cursor or range endpoint. `ch` is a byte offset within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    #[must_use]
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// Replace the text between `from` and `to` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub text: String,
    pub from: Position,
    pub to: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxOptions {
    /// Keep the first non-blank line of a multi-line block outside the box.
    pub skip_first_line: bool,
    pub typst: bool,
    /// Typst function used for the box, such as `rect`.
    pub typst_box_symbol: String,
}

impl Default for BoxOptions {
    fn default() -> Self {
        Self {
            skip_first_line: false,
            typst: false,
            typst_box_symbol: "rect".into(),
        }
    }
}

impl BoxOptions {
    fn wrap(&self, body: &str) -> String {
        if self.typst {
            format!("{}({body})", self.typst_box_symbol)
        } else {
            format!("\\boxed{{{body}}}")
        }
    }
}

/// One line of a multi-line block: where its text starts and the text.
struct BodyLine<'a> {
    at: Position,
    prefix: &'a str,
    text: &'a str,
}

/// Build the replacement that boxes the equation containing `cursor`.
///
/// Returns `None` when the cursor is outside every display equation, the
/// block is unclosed, or it has no content.
///
/// ```
/// use eqcite::boxing::{BoxOptions, Position, box_equation_at};
/// let edit = box_equation_at("$$ E = mc^2 $$", Position::new(0, 5), &BoxOptions::default()).unwrap();
/// assert_eq!(edit.text, r"\boxed{E = mc^2}");
/// assert_eq!((edit.from, edit.to), (Position::new(0, 2), Position::new(0, 12)));
/// ```
#[must_use]
pub fn box_equation_at(text: &str, cursor: Position, options: &BoxOptions) -> Option<Replacement> {
    let equation = parse_equations_in_markdown(text)
        .into_iter()
        .find(|eq| (eq.line_start..=eq.line_end).contains(&cursor.line))?;
    let lines: Vec<&str> = text.split('\n').collect();
    if equation.line_start == equation.line_end {
        box_single_line(lines.get(equation.line_start)?, equation.line_start, options)
    } else {
        box_block(&lines[equation.line_start..=equation.line_end], equation.line_start, options)
    }
}

fn box_single_line(line: &str, idx: usize, options: &BoxOptions) -> Option<Replacement> {
    let prefix = process_quote_line(line).prefix;
    let open = prefix.len() + line[prefix.len()..].find(DISPLAY)? + DISPLAY.len();
    let close = line.rfind(DISPLAY).filter(|&close| close >= open)?;
    Some(Replacement {
        text: options.wrap(line[open..close].trim()),
        from: Position::new(idx, open),
        to: Position::new(idx, close),
    })
}

fn box_block(block: &[&str], first: usize, options: &BoxOptions) -> Option<Replacement> {
    let (opener, rest) = block.split_first()?;
    let (closer, interior) = rest.split_last()?;
    let last = first + block.len() - 1;

    let mut body = Vec::new();
    let opener_quote = process_quote_line(opener);
    let label = opener_quote.content.strip_prefix(DISPLAY)?.trim();
    if !label.is_empty() {
        body.push(BodyLine {
            at: Position::new(first, opener_quote.prefix.len() + DISPLAY.len()),
            prefix: opener_quote.prefix,
            text: label,
        });
    }
    for (offset, line) in interior.iter().enumerate() {
        let prefix = process_quote_line(line).prefix;
        body.push(BodyLine {
            at: Position::new(first + 1 + offset, prefix.len()),
            prefix,
            text: &line[prefix.len()..],
        });
    }

    let closer_quote = process_quote_line(closer);
    let (to, tail) = if closer_quote.content == DISPLAY {
        let prefix = closer_quote.prefix;
        (Position::new(last, prefix.len()), format!("\n{prefix}"))
    } else if closer_quote.content.ends_with(DISPLAY) {
        let close = closer.rfind(DISPLAY)?;
        body.push(BodyLine {
            at: Position::new(last, closer_quote.prefix.len()),
            prefix: closer_quote.prefix,
            text: closer[closer_quote.prefix.len()..close].trim_end(),
        });
        (Position::new(last, close), " ".to_string())
    } else {
        return None;
    };

    let skip = options.skip_first_line && body.first().is_some_and(|line| !line.text.trim().is_empty());
    let start = body.iter().position(|line| !line.text.trim().is_empty())?;
    let body = &body[start..];
    let from = body[0].at;

    let (kept, boxed) = if skip && body.len() > 1 {
        (Some(&body[0]), &body[1..])
    } else {
        (None, body)
    };
    let (head, tail_lines) = boxed.split_first()?;
    let mut inner = head.text.to_string();
    for line in tail_lines {
        inner.push('\n');
        inner.push_str(line.prefix);
        inner.push_str(line.text);
    }

    let mut text = String::new();
    if let Some(line) = kept {
        text.push_str(line.text);
        text.push('\n');
        text.push_str(head.prefix);
    }
    text.push_str(&options.wrap(&inner));
    text.push_str(&tail);
    Some(Replacement { text, from, to })
}
