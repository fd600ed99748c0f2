//! Character-level scanners shared by the document parsers.
//!
//! Every routine here looks at a single line or tag string and keeps no
//! state between calls. Offsets are byte offsets into the input; all of the
//! delimiters involved are ASCII so they always land on `char` boundaries.

use std::fmt::Write as _;

const BACKSLASH: u8 = b'\\';

/// Check if a byte at the given index is preceded by an odd number of
/// backslashes.
///
/// An odd number of preceding backslashes means the byte is escaped.
#[must_use]
pub fn has_odd_backslash_escape(bytes: &[u8], mut idx: usize) -> bool {
    let mut count = 0;
    while idx > 0 {
        idx -= 1;
        if bytes[idx] == BACKSLASH {
            count += 1;
        } else {
            break;
        }
    }
    count % 2 == 1
}

/// Find the delimiter closing a group whose opening delimiter sits just
/// before `start`.
///
/// Escaped delimiters (`\{`, `\}`) are literal. Returns `None` when the group
/// never closes or when nesting exceeds `max_depth`.
pub(crate) fn find_balanced_close(
    bytes: &[u8],
    start: usize,
    open: u8,
    close: u8,
    max_depth: usize,
) -> Option<usize> {
    let mut depth = 1usize;
    let mut idx = start;
    while idx < bytes.len() {
        let b = bytes[idx];
        if b == BACKSLASH && bytes.get(idx + 1).is_some_and(|n| *n == open || *n == close) {
            idx += 2;
            continue;
        }
        if b == open {
            depth += 1;
            if depth > max_depth {
                return None;
            }
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
        idx += 1;
    }
    None
}

/// Remove every brace that belongs to a matching pair.
///
/// Content between braces is kept. A `}` with no open partner stays in
/// place; a `{` that never closes is dropped.
///
/// # Examples
///
/// ```
/// use eqcite::remove_paired_braces;
/// assert_eq!(remove_paired_braces("1.{2}.1"), "1.2.1");
/// assert_eq!(remove_paired_braces("}{x}{"), "}x");
/// ```
#[must_use]
pub fn remove_paired_braces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for ch in s.chars() {
        match ch {
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            _ => out.push(ch),
        }
    }
    out
}

/// Quote character escaped by [`escape_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Double,
    Single,
}

impl QuoteStyle {
    const fn as_char(self) -> char {
        match self {
            Self::Double => '"',
            Self::Single => '\'',
        }
    }
}

/// Escape a string for embedding in a quoted literal.
///
/// Backslashes and common control characters use their short escapes, the
/// remaining C0/C1 controls become `\u00xx`. The quote character is only
/// escaped when `quote` asks for it.
#[must_use]
pub fn escape_string(s: &str, quote: Option<QuoteStyle>) -> String {
    let quote = quote.map(QuoteStyle::as_char);
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{0B}' => out.push_str("\\v"),
            c if Some(c) == quote => {
                out.push('\\');
                out.push(c);
            }
            c if matches!(u32::from(c), 0x00..=0x1F | 0x7F..=0x9F) => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

/// A line split into its blockquote prefix and content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteLine<'a> {
    /// Leading whitespace and `>` markers, verbatim.
    pub prefix: &'a str,
    /// Trimmed remainder of the line.
    pub content: &'a str,
    /// Number of `>` markers.
    pub depth: usize,
}

impl QuoteLine<'_> {
    #[must_use]
    pub fn is_quote(&self) -> bool {
        self.depth > 0
    }
}

/// Split a line into blockquote markers and content.
///
/// Each `>` may be surrounded by whitespace, so `" > > text "` has depth 2
/// and content `"text"`.
#[must_use]
pub fn process_quote_line(line: &str) -> QuoteLine<'_> {
    let mut rest = line.trim_start();
    let mut depth = 0;
    while let Some(after) = rest.strip_prefix('>') {
        depth += 1;
        rest = after.trim_start();
    }
    let prefix_len = line.len() - rest.len();
    QuoteLine {
        prefix: &line[..prefix_len],
        content: rest.trim(),
        depth,
    }
}

/// Byte positions of the `$` delimiters of an inline math span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathSpan {
    pub open: usize,
    pub close: usize,
}

impl MathSpan {
    /// Byte range of the whole span, delimiters included.
    #[must_use]
    pub fn outer(&self) -> std::ops::Range<usize> {
        self.open..self.close + 1
    }

    /// Byte range between the delimiters.
    #[must_use]
    pub fn inner(&self) -> std::ops::Range<usize> {
        self.open + 1..self.close
    }
}

#[derive(Clone, Copy)]
enum MathState {
    Text,
    Code,
    Inline(usize),
    Display,
}

/// Collect the tight single-`$` math spans of a line.
///
/// Backtick code spans and `$$` display math are opaque; escaped `$` and
/// backticks are ordinary characters. An opening `$` must be followed by a
/// non-space character and a closing `$` must follow one. A candidate
/// closer that follows whitespace abandons the open span and is tried again
/// as an opener.
#[must_use]
pub fn inline_math_spans(line: &str) -> Vec<MathSpan> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut state = MathState::Text;
    let mut idx = 0;
    while idx < bytes.len() {
        let b = bytes[idx];
        let escaped = has_odd_backslash_escape(bytes, idx);
        let next = bytes.get(idx + 1).copied();
        match state {
            MathState::Code => {
                if b == b'`' && !escaped {
                    state = MathState::Text;
                }
            }
            MathState::Display => {
                if b == b'$' && !escaped && next == Some(b'$') {
                    state = MathState::Text;
                    idx += 2;
                    continue;
                }
            }
            MathState::Inline(open) if b == b'$' && !escaped => {
                if bytes[idx - 1].is_ascii_whitespace() {
                    state = open_state(next, idx);
                } else {
                    spans.push(MathSpan { open, close: idx });
                    state = MathState::Text;
                }
            }
            MathState::Inline(_) => {}
            MathState::Text if escaped => {}
            MathState::Text => match b {
                b'`' => state = MathState::Code,
                b'$' if next == Some(b'$') => {
                    state = MathState::Display;
                    idx += 2;
                    continue;
                }
                b'$' => state = open_state(next, idx),
                _ => {}
            },
        }
        idx += 1;
    }
    spans
}

fn open_state(next: Option<u8>, idx: usize) -> MathState {
    match next {
        Some(n) if !n.is_ascii_whitespace() => MathState::Inline(idx),
        _ => MathState::Text,
    }
}

/// Report whether `pos` lies inside an inline math span of `line`.
///
/// The opening `$` itself is outside the span, the closing `$` inside.
#[must_use]
pub fn is_in_inline_math_environment(line: &str, pos: usize) -> bool {
    if pos >= line.len() {
        return false;
    }
    inline_math_spans(line)
        .iter()
        .any(|span| span.open < pos && pos <= span.close)
}

/// Byte ranges of the backtick code spans of a line, backticks included.
///
/// A run of backticks closes at the next run of the same length. An
/// unmatched run is literal text.
#[must_use]
pub fn inline_code_spans(line: &str) -> Vec<std::ops::Range<usize>> {
    let bytes = line.as_bytes();
    let run_at = |idx: usize| bytes[idx..].iter().take_while(|&&b| b == b'`').count();
    let mut spans = Vec::new();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] != b'`' || has_odd_backslash_escape(bytes, idx) {
            idx += 1;
            continue;
        }
        let open = run_at(idx);
        let mut cursor = idx + open;
        let mut close = None;
        while cursor < bytes.len() {
            if bytes[cursor] == b'`' {
                let run = run_at(cursor);
                if run == open {
                    close = Some(cursor + run);
                    break;
                }
                cursor += run;
            } else {
                cursor += 1;
            }
        }
        match close {
            Some(end) => {
                spans.push(idx..end);
                idx = end;
            }
            None => idx += open,
        }
    }
    spans
}

/// Find the nearest unescaped `$` strictly before `pos`.
#[must_use]
pub fn find_last_unescaped_dollar(line: &str, pos: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    let end = pos.min(bytes.len());
    (0..end)
        .rev()
        .find(|&idx| bytes[idx] == b'$' && !has_odd_backslash_escape(bytes, idx))
}
