//! Contiguous subsequence search over token slices.
//!
//! [`find_array`] runs Knuth–Morris–Pratt so locating a token window inside
//! a long stream stays linear.

/// Return the index of the first occurrence of `pattern` in `target`.
///
/// Elements compare with [`PartialEq`], so `f64::NAN` never matches and raw
/// pointers compare by address. An empty pattern matches at `0`.
///
/// # Examples
///
/// ```
/// use eqcite::find_array;
/// assert_eq!(find_array(&[2, 3], &[1, 2, 3, 4]), Some(1));
/// assert_eq!(find_array::<i32>(&[], &[]), Some(0));
/// assert_eq!(find_array(&[5], &[1, 2]), None);
/// ```
#[must_use]
pub fn find_array<T: PartialEq>(pattern: &[T], target: &[T]) -> Option<usize> {
    find_array_by(pattern, target, <T as PartialEq>::eq)
}

/// Like [`find_array`], with a caller-supplied element equality.
///
/// Pass `|a, b| std::ptr::eq(*a, *b)` to match references by identity.
pub fn find_array_by<T, F>(pattern: &[T], target: &[T], mut eq: F) -> Option<usize>
where
    F: FnMut(&T, &T) -> bool,
{
    if pattern.is_empty() {
        return Some(0);
    }
    if pattern.len() > target.len() {
        return None;
    }
    let failure = failure_table(pattern, &mut eq);
    let mut matched = 0;
    for (idx, item) in target.iter().enumerate() {
        while matched > 0 && !eq(item, &pattern[matched]) {
            matched = failure[matched - 1];
        }
        if eq(item, &pattern[matched]) {
            matched += 1;
        }
        if matched == pattern.len() {
            return Some(idx + 1 - matched);
        }
    }
    None
}

/// `failure[i]` is the length of the longest proper prefix of
/// `pattern[..=i]` that is also its suffix.
fn failure_table<T, F>(pattern: &[T], eq: &mut F) -> Vec<usize>
where
    F: FnMut(&T, &T) -> bool,
{
    let mut failure = vec![0; pattern.len()];
    let mut len = 0;
    for idx in 1..pattern.len() {
        while len > 0 && !eq(&pattern[idx], &pattern[len]) {
            len = failure[len - 1];
        }
        if eq(&pattern[idx], &pattern[len]) {
            len += 1;
        }
        failure[idx] = len;
    }
    failure
}
