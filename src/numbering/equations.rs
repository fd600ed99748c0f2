use tracing::{debug, trace};

use super::{
    NumberingOptions, NumberingResult, TagCounter, TagMapping, normalize_old_tag, outline_depths,
};
use crate::{
    matchers::{TagSyntax, create_equation_tag_string, find_equation_tag},
    parsers::equations::{EquationMatch, parse_equations_with_syntax},
    scanning::process_quote_line,
};

const DISPLAY: &str = "$$";

/// Assign hierarchical tags to every display equation.
///
/// Existing tag commands are replaced in place; untagged equations receive
/// one before the closing `$$` or after their last content line. Quoted
/// equations are left alone unless `parse_quotes` is set.
///
/// # Examples
///
/// ```
/// use eqcite::numbering::{NumberingOptions, auto_number_equations};
/// let text = "# Intro\n$$ E = mc^2 \\tag{old} $$";
/// let result = auto_number_equations(text, &NumberingOptions::default());
/// assert_eq!(result.markdown, "# Intro\n$$ E = mc^2 \\tag{1.1} $$");
/// assert_eq!(result.tag_mapping.get("old"), Some("1.1"));
/// ```
#[must_use]
pub fn auto_number_equations(text: &str, options: &NumberingOptions) -> NumberingResult {
    let equations = parse_equations_with_syntax(text, options.tag_syntax);
    let depths = outline_depths(text, &equations, options.mode);

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let mut counter = TagCounter::new(options);
    let mut mapping = TagMapping::new();
    let mut next_heading = depths.iter().peekable();
    let mut numbered = 0usize;

    for eq in &equations {
        while let Some(&(_, depth)) = next_heading.next_if(|(line, _)| *line < eq.line_start) {
            counter.enter_heading(depth);
        }
        if eq.in_quote && !options.parse_quotes {
            continue;
        }
        let tag = counter.next_tag();
        trace!(line = eq.line_start, %tag, "numbering equation");
        if let Some(old) = &eq.tag {
            mapping.insert(normalize_old_tag(old, &options.delimiter), tag.clone());
        }
        let command = create_equation_tag_string(&tag, options.tag_syntax);
        write_tag(&mut lines, eq, &command, options.tag_syntax);
        numbered += 1;
    }

    debug!(numbered, mapped = mapping.len(), "numbered equations");
    NumberingResult {
        markdown: lines.join("\n"),
        tag_mapping: mapping,
    }
}

fn write_tag(lines: &mut [String], eq: &EquationMatch, tag: &str, syntax: TagSyntax) {
    if replace_existing(lines, eq, tag, syntax) {
        return;
    }
    let last = &lines[eq.line_end];
    let body = process_quote_line(last).content;
    let single = eq.line_start == eq.line_end;
    let closed = body.ends_with(DISPLAY) && (!single || body.len() >= 2 * DISPLAY.len());
    if closed {
        let before = body.strip_suffix(DISPLAY).unwrap_or_default();
        let before = if single {
            before.strip_prefix(DISPLAY).unwrap_or(before)
        } else {
            before
        };
        if !before.trim().is_empty()
            && let Some(pos) = last.rfind(DISPLAY)
        {
            let updated = format!("{} {tag} {}", last[..pos].trim_end(), &last[pos..]);
            lines[eq.line_end] = updated;
            return;
        }
    }

    let interior_end = if closed { eq.line_end } else { eq.line_end + 1 };
    let target = (eq.line_start + 1..interior_end)
        .rev()
        .find(|&idx| !process_quote_line(&lines[idx]).content.is_empty())
        .unwrap_or(eq.line_start);
    let updated = format!("{} {tag}", lines[target].trim_end());
    lines[target] = updated;
}

/// Swap the last tag command inside the block for `tag`.
fn replace_existing(lines: &mut [String], eq: &EquationMatch, tag: &str, syntax: TagSyntax) -> bool {
    for idx in (eq.line_start..=eq.line_end).rev() {
        let found = find_equation_tag(&lines[idx], syntax).map(|span| span.start..span.end);
        if let Some(range) = found {
            lines[idx].replace_range(range, tag);
            return true;
        }
    }
    false
}
