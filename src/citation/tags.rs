//! Parsing, compressing, and expanding citation tag strings.
//!
//! A tag is an optional cross-file id followed by the file delimiter and a
//! local part: `2^{1.3.1}` names tag `1.3.1` of the file cited as `[^2]`.
//! Consecutive local tags compress into ranges such as `1.3.1~3`.

use serde::Serialize;

use crate::scanning::remove_paired_braces;

/// Largest number of tags a single range may expand to.
pub const MAX_RANGE_EXPANSION: u64 = 10_000;

/// A tag split into its cross-file id and local part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCitation {
    pub cross_file: Option<String>,
    pub local: String,
}

/// Split a tag at the first file delimiter outside braces.
///
/// Both parts are trimmed. A brace-wrapped local part is unwrapped and its
/// inner paired braces removed.
///
/// ```
/// use eqcite::citation::split_file_citation;
/// let tag = split_file_citation(" 4 ^ { 1.{2}.3 } ", "^");
/// assert_eq!(tag.cross_file.as_deref(), Some("4"));
/// assert_eq!(tag.local, "1.2.3");
/// ```
#[must_use]
pub fn split_file_citation(tag: &str, file_delimiter: &str) -> FileCitation {
    let Some(split) = find_outside_braces(tag, file_delimiter) else {
        return FileCitation {
            cross_file: None,
            local: tag.trim().to_string(),
        };
    };
    let cross = tag[..split].trim();
    let local = tag[split + file_delimiter.len()..].trim();
    let local = match local.strip_prefix('{').and_then(|l| l.strip_suffix('}')) {
        Some(inner) => remove_paired_braces(inner).trim().to_string(),
        None => local.to_string(),
    };
    FileCitation {
        cross_file: Some(cross.to_string()).filter(|c| !c.is_empty()),
        local,
    }
}

fn find_outside_braces(text: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && text[idx..].starts_with(needle) => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Longest prefix of `a` that ends with a delimiter and also starts `b`.
///
/// ```
/// use eqcite::citation::extract_common_prefix;
/// assert_eq!(extract_common_prefix("1.3.1", "1.3.3", &["."]), "1.3.");
/// assert_eq!(extract_common_prefix("1.2.3", "4.5.6", &["."]), "");
/// ```
#[must_use]
pub fn extract_common_prefix<'a, S: AsRef<str>>(a: &'a str, b: &str, delimiters: &[S]) -> &'a str {
    let shared = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((idx, ch), _)| idx + ch.len_utf8());
    (1..=shared)
        .rev()
        .filter(|&end| a.is_char_boundary(end))
        .find(|&end| {
            delimiters
                .iter()
                .map(AsRef::as_ref)
                .any(|d| !d.is_empty() && a[..end].ends_with(d))
        })
        .map_or("", |end| &a[..end])
}

/// Parse the part of `tag` after `prefix` as a decimal number.
#[must_use]
pub fn extract_last_number(tag: &str, prefix: &str) -> Option<u64> {
    let rest = tag.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Split a local tag into the text before its numeric tail and the tail.
///
/// With delimiters present the tail is the segment after the last one and
/// must be all digits; otherwise it is the trailing digit run (`EQ3`). A
/// prefix made only of delimiters (`.1`) has no numeric tail.
fn numeric_tail<'a, S: AsRef<str>>(tag: &'a str, delimiters: &[S]) -> Option<(&'a str, u64)> {
    let boundary = delimiters
        .iter()
        .map(AsRef::as_ref)
        .filter(|d| !d.is_empty())
        .filter_map(|d| tag.rfind(d).map(|idx| idx + d.len()))
        .max();
    let start = match boundary {
        Some(start) => start,
        None => {
            let digits = tag.bytes().rev().take_while(u8::is_ascii_digit).count();
            tag.len() - digits
        }
    };
    let prefix = &tag[..start];
    if !prefix.is_empty() && only_delimiters(prefix, delimiters) {
        return None;
    }
    extract_last_number(tag, prefix).map(|n| (prefix, n))
}

fn only_delimiters<S: AsRef<str>>(mut text: &str, delimiters: &[S]) -> bool {
    while !text.is_empty() {
        let Some(rest) = delimiters
            .iter()
            .map(AsRef::as_ref)
            .filter(|d| !d.is_empty())
            .find_map(|d| text.strip_prefix(d))
        else {
            return false;
        };
        text = rest;
    }
    true
}

fn wrap_cross_file(cross_file: Option<&str>, file_delimiter: &str, local: &str) -> String {
    match cross_file {
        Some(id) => format!("{id}{file_delimiter}{{{local}}}"),
        None => local.to_string(),
    }
}

enum Slot {
    Verbatim(String),
    Group(usize),
}

struct Group {
    cross_file: Option<String>,
    prefix: String,
    /// Number, local text, original tag.
    members: Vec<(u64, String, String)>,
}

impl Group {
    fn render(mut self, range_symbol: &str, file_delimiter: &str, out: &mut Vec<String>) {
        self.members.sort_by_key(|(n, _, _)| *n);
        self.members.dedup_by_key(|(n, _, _)| *n);
        let mut idx = 0;
        while idx < self.members.len() {
            let mut end = idx;
            while end + 1 < self.members.len() && self.members[end + 1].0 == self.members[end].0 + 1 {
                end += 1;
            }
            if end == idx {
                out.push(self.members[idx].2.clone());
            } else {
                let local = format!("{}{range_symbol}{}", self.members[idx].1, self.members[end].0);
                out.push(wrap_cross_file(self.cross_file.as_deref(), file_delimiter, &local));
            }
            idx = end + 1;
        }
    }
}

/// Compress runs of consecutive tags into ranges.
///
/// Tags are grouped by cross-file id and by the text before their numeric
/// tail; groups keep the order of their first member. Within a group numbers
/// are sorted and deduplicated, and runs of two or more become
/// `<first><range_symbol><last number>`. Tags without a numeric tail pass
/// through and empty tags are dropped.
///
/// ```
/// use eqcite::citation::combine_continuous_citation_tags;
/// let tags = ["P1", "2^1.1.1", "2^1.1.2", "1.3", "1.1.3", "1.1.1", "1.1.2"];
/// let out = combine_continuous_citation_tags(&tags, "~", &[".", "-"], "^");
/// assert_eq!(out, ["P1", "2^{1.1.1~2}", "1.3", "1.1.1~3"]);
/// ```
#[must_use]
pub fn combine_continuous_citation_tags<T, S>(
    tags: &[T],
    range_symbol: &str,
    delimiters: &[S],
    file_delimiter: &str,
) -> Vec<String>
where
    T: AsRef<str>,
    S: AsRef<str>,
{
    let mut slots = Vec::new();
    let mut groups: Vec<Group> = Vec::new();
    for tag in tags.iter().map(|t| t.as_ref().trim()).filter(|t| !t.is_empty()) {
        let FileCitation { cross_file, local } = split_file_citation(tag, file_delimiter);
        let Some((prefix, number)) = numeric_tail(&local, delimiters) else {
            slots.push(Slot::Verbatim(tag.to_string()));
            continue;
        };
        let member = (number, local.clone(), tag.to_string());
        match groups
            .iter()
            .position(|g| g.cross_file == cross_file && g.prefix == prefix)
        {
            Some(idx) => groups[idx].members.push(member),
            None => {
                slots.push(Slot::Group(groups.len()));
                groups.push(Group {
                    cross_file,
                    prefix: prefix.to_string(),
                    members: vec![member],
                });
            }
        }
    }

    let mut groups: Vec<Option<Group>> = groups.into_iter().map(Some).collect();
    let mut out = Vec::new();
    for slot in slots {
        match slot {
            Slot::Verbatim(tag) => out.push(tag),
            Slot::Group(idx) => {
                if let Some(group) = groups[idx].take() {
                    group.render(range_symbol, file_delimiter, &mut out);
                }
            }
        }
    }
    out
}

fn expand_range<S: AsRef<str>>(
    local: &str,
    range_symbol: &str,
    delimiters: &[S],
) -> Option<Vec<String>> {
    if range_symbol.is_empty() {
        return None;
    }
    let split = local.rfind(range_symbol)?;
    let start = &local[..split];
    let last = extract_last_number(&local[split + range_symbol.len()..], "")?;
    let (prefix, first) = numeric_tail(start, delimiters)?;
    if last < first || last - first >= MAX_RANGE_EXPANSION {
        return None;
    }
    Some((first..=last).map(|n| format!("{prefix}{n}")).collect())
}

/// Expand ranges back into individual tags.
///
/// Each tag is split at its last range symbol. Invalid ranges (no numeric
/// start, non-numeric end, end below start, or an oversized span) come back
/// verbatim. Numbers are written unpadded and cross-file tags come out as
/// `<id><file delimiter>{<local>}`.
///
/// ```
/// use eqcite::citation::split_continuous_citation_tags;
/// let out = split_continuous_citation_tags(&["P01~03", "2^1.1~2", "P5~3"], "~", &["."], "^");
/// assert_eq!(out, ["P1", "P2", "P3", "2^{1.1}", "2^{1.2}", "P5~3"]);
/// ```
#[must_use]
pub fn split_continuous_citation_tags<T, S>(
    tags: &[T],
    range_symbol: &str,
    delimiters: &[S],
    file_delimiter: &str,
) -> Vec<String>
where
    T: AsRef<str>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for tag in tags.iter().map(|t| t.as_ref().trim()).filter(|t| !t.is_empty()) {
        let FileCitation { cross_file, local } = split_file_citation(tag, file_delimiter);
        let expanded = expand_range(&local, range_symbol, delimiters);
        match (cross_file.as_deref(), expanded) {
            (None, Some(expanded)) => out.extend(expanded),
            (None, None) => out.push(tag.to_string()),
            (Some(id), Some(expanded)) => out.extend(
                expanded
                    .iter()
                    .map(|l| wrap_cross_file(Some(id), file_delimiter, l)),
            ),
            (Some(id), None) => out.push(wrap_cross_file(Some(id), file_delimiter, &local)),
        }
    }
    out
}

/// The partial tag being typed at the end of `content`.
///
/// Empty when `content` is empty or ends in whitespace or the delimiter.
///
/// ```
/// use eqcite::citation::extract_auto_complete_input_tag;
/// assert_eq!(extract_auto_complete_input_tag("eq1, eq2 ,eq3", ","), "eq3");
/// assert_eq!(extract_auto_complete_input_tag("tag1, ", ","), "");
/// ```
#[must_use]
pub fn extract_auto_complete_input_tag<'a>(content: &'a str, delimiter: &str) -> &'a str {
    if content.is_empty()
        || content.ends_with(char::is_whitespace)
        || (!delimiter.is_empty() && content.ends_with(delimiter))
    {
        return "";
    }
    if delimiter.is_empty() {
        return content.trim();
    }
    content.rsplit(delimiter).next().unwrap_or(content).trim()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const DELIMITERS: [&str; 4] = [".", "-", ":", "_"];

    fn combine(tags: &[&str]) -> Vec<String> {
        combine_continuous_citation_tags(tags, "~", &DELIMITERS, "^")
    }

    fn split(tags: &[&str]) -> Vec<String> {
        split_continuous_citation_tags(tags, "~", &[".", "-"], "^")
    }

    #[rstest]
    #[case::simplest(&["1.1.1", "1.1.2"], &["1.1.1~2"])]
    #[case::letters(&["EQ1", "EQ2", "EQ3"], &["EQ1~3"])]
    #[case::cross_file(&["P1", "2^1.1.1", "2^1.1.2", "2^1.1.3"], &["P1", "2^{1.1.1~3}"])]
    #[case::two_files(&["1^1.1.1", "1^1.1.2", "2^1.1.1", "2^1.1.2"], &["1^{1.1.1~2}", "2^{1.1.1~2}"])]
    #[case::gaps(&["1.1.1", "1.1.3", "1.1.5"], &["1.1.1", "1.1.3", "1.1.5"])]
    #[case::dashes(&["1-1-1", "1-1-2", "1-1-3"], &["1-1-1~3"])]
    #[case::singles(&["P1", "2.1.1", "3:1:1"], &["P1", "2.1.1", "3:1:1"])]
    #[case::empty(&[], &[])]
    #[case::unordered(&["1.1.3", "1.1.1", "1.1.2"], &["1.1.1~3"])]
    #[case::mixed_delimiters(&["1.1-1", "1.1-2", "1.1-3"], &["1.1-1~3"])]
    #[case::different_prefixes(&["1.1.1", "2.1.1", "1.1.2"], &["1.1.1~2", "2.1.1"])]
    #[case::duplicates(&["1.1", "1.1", "1.2"], &["1.1~2"])]
    #[case::complex(
        &["P1", "1^{1.1.1}", "1^{1.1.2}", "2.1.1", "2.1.2", "2^{1.1.1}", "3-1-1", "3-1-2"],
        &["P1", "1^{1.1.1~2}", "2.1.1~2", "2^{1.1.1}", "3-1-1~2"]
    )]
    #[case::existing_ranges(&["", "P1~2", "", "P3~4", "P5~6"], &["P1~2", "P3~4", "P5~6"])]
    #[case::leading_delimiter(&[".1", ".2", ".3"], &[".1", ".2", ".3"])]
    #[case::delimiter_runs(&["-.1", "-.2"], &["-.1", "-.2"])]
    fn combines_runs(#[case] input: &[&str], #[case] expected: &[&str]) {
        assert_eq!(combine(input), expected);
    }

    #[rstest]
    #[case::numeric(&["1~3"], &["1", "2", "3"])]
    #[case::letters(&["P1~3"], &["P1", "P2", "P3"])]
    #[case::dotted(&["1.2.1~4"], &["1.2.1", "1.2.2", "1.2.3", "1.2.4"])]
    #[case::cross_file(&["2^1.1.1~3"], &["2^{1.1.1}", "2^{1.1.2}", "2^{1.1.3}"])]
    #[case::mixed(
        &["P1~2", "2^{1.1.1~2}", "1.3.2~3", "1^{1.3.4}"],
        &["P1", "P2", "2^{1.1.1}", "2^{1.1.2}", "1.3.2", "1.3.3", "1^{1.3.4}"]
    )]
    #[case::dash(&["A-1~3"], &["A-1", "A-2", "A-3"])]
    #[case::plain(&["P1", "EQ2", "1.3.4"], &["P1", "EQ2", "1.3.4"])]
    #[case::same_bounds(&["P1~1"], &["P1"])]
    #[case::reversed(&["P5~3"], &["P5~3"])]
    #[case::non_numeric_end(&["P1~abc"], &["P1~abc"])]
    #[case::non_numeric_start(&["Pabc~3"], &["Pabc~3"])]
    #[case::no_prefix(&["~3"], &["~3"])]
    #[case::two_symbols(&["P1~2~3"], &["P1~2", "P1~3"])]
    #[case::cross_file_single(&["2^1.3.4"], &["2^{1.3.4}"])]
    #[case::padded(&["P01~03"], &["P1", "P2", "P3"])]
    #[case::symbol_in_file_part(&["2~3^1.1"], &["2~3^{1.1}"])]
    #[case::blank_entries(&["", " P1~2 ", ""], &["P1", "P2"])]
    #[case::only_delimiters(&["..~3"], &["..~3"])]
    #[case::leading_delimiter(&[".1~3"], &[".1~3"])]
    #[case::long_prefix(&["VERY.LONG.PREFIX.1~3"], &["VERY.LONG.PREFIX.1", "VERY.LONG.PREFIX.2", "VERY.LONG.PREFIX.3"])]
    #[case::unicode(&["公式1~2"], &["公式1", "公式2"])]
    #[case::special(&["2^$EQ1~2"], &["2^{$EQ1}", "2^{$EQ2}"])]
    fn expands_ranges(#[case] input: &[&str], #[case] expected: &[&str]) {
        assert_eq!(split(input), expected);
    }

    #[test]
    fn large_ranges() {
        let out = split(&["P1~100"]);
        assert_eq!(out.len(), 100);
        assert_eq!(out[99], "P100");
        assert_eq!(split(&["P1~99999999"]), ["P1~99999999"]);
    }

    #[test]
    fn split_then_combine_restores_runs() {
        let tags = ["1.1.1~3", "2^{1.2.1~2}"];
        let expanded = split_continuous_citation_tags(&tags, "~", &DELIMITERS, "^");
        assert_eq!(combine_continuous_citation_tags(&expanded, "~", &DELIMITERS, "^"), tags);
    }

    #[rstest]
    #[case::prefixed("1^1.3.1", "^", Some("1"), "1.3.1")]
    #[case::absent("1.3.1", "^", None, "1.3.1")]
    #[case::custom("1@1.3.1", "@", Some("1"), "1.3.1")]
    #[case::range("1^1.3.1~3", "^", Some("1"), "1.3.1~3")]
    #[case::first_wins("1^2^1.1.1", "^", Some("1"), "2^1.1.1")]
    #[case::braces("2^{1.1.1}", "^", Some("2"), "1.1.1")]
    #[case::braces_range("2^{1.1.1~3}", "^", Some("2"), "1.1.1~3")]
    #[case::nested("3^{1.{2}.1}", "^", Some("3"), "1.2.1")]
    #[case::spaced(" 4 ^ { 1.2.3 } ", "^", Some("4"), "1.2.3")]
    #[case::empty_cross("^1.1", "^", None, "1.1")]
    #[case::inside_braces("{a^b}", "^", None, "{a^b}")]
    fn splits_file_citations(
        #[case] tag: &str,
        #[case] delimiter: &str,
        #[case] cross: Option<&str>,
        #[case] local: &str,
    ) {
        let found = split_file_citation(tag, delimiter);
        assert_eq!(found.cross_file.as_deref(), cross);
        assert_eq!(found.local, local);
    }

    #[rstest]
    #[case::dots("1.3.1", "1.3.3", "1.3.")]
    #[case::hyphens("1-3-1", "1-3-3", "1-3-")]
    #[case::none("1.2.3", "4.5.6", "")]
    #[case::partial("1.2.3", "1.2.4.5", "1.2.")]
    #[case::mixed("1.2-3", "1.2-4", "1.2-")]
    fn extracts_common_prefixes(#[case] a: &str, #[case] b: &str, #[case] expected: &str) {
        assert_eq!(extract_common_prefix(a, b, &DELIMITERS), expected);
    }

    #[rstest]
    #[case::single("1.3.1", "1.3.", Some(1))]
    #[case::multi_digit("1.3.123", "1.3.", Some(123))]
    #[case::letter("1.3.a", "1.3.", None)]
    #[case::empty_prefix("123", "", Some(123))]
    #[case::hyphen("1-3-1", "1-3-", Some(1))]
    #[case::wrong_prefix("2.1", "1.", None)]
    fn extracts_last_numbers(#[case] tag: &str, #[case] prefix: &str, #[case] expected: Option<u64>) {
        assert_eq!(extract_last_number(tag, prefix), expected);
    }

    #[rstest]
    #[case::single("abc", ",", "abc")]
    #[case::last("tag1,tag2,tag3", ",", "tag3")]
    #[case::spaced(" tag1 , tag2", ",", "tag2")]
    #[case::trailing_delimiter("tag1,tag2,", ",", "")]
    #[case::trailing_space("tag1, ", ",", "")]
    #[case::trailing_tab("tag1,tag2\t", ",", "")]
    #[case::trailing_newline("tag1,tag2\n", ",", "")]
    #[case::double_delimiter("tag1,,partial", ",", "partial")]
    #[case::only_delimiters(", ,", ",", "")]
    #[case::blank("   ", ",", "")]
    #[case::empty("", ",", "")]
    #[case::multi_char("tag1::partial", "::", "partial")]
    #[case::multi_char_trailing("tag1::tag2::", "::", "")]
    #[case::absent_delimiter("no_delimiter_here", ";", "no_delimiter_here")]
    #[case::unicode("Ω,α,β", ",", "β")]
    fn extracts_auto_complete_tags(#[case] content: &str, #[case] delimiter: &str, #[case] expected: &str) {
        assert_eq!(extract_auto_complete_input_tag(content, delimiter), expected);
    }
}
