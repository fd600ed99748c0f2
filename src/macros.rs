//! Helper macros used across the crate.

/// Lazily compile a [`Regex`] with a custom panic message.
///
/// Every pattern in this crate is a literal, so a compile failure is a
/// programming error rather than a property of the scanned document.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use regex::Regex;
/// static TAG_RE: LazyLock<Regex> = eqcite::lazy_regex!(r"\\tag\{[^}]*\}", "tag pattern");
/// assert!(TAG_RE.is_match(r"E = mc^2 \tag{1.1}"));
/// ```
#[macro_export]
macro_rules! lazy_regex {
    ($pattern:expr, $msg:expr $(,)?) => {
        LazyLock::new(|| Regex::new($pattern).expect($msg))
    };
}
