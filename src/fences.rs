//! Fenced code block tracking.
//!
//! Document scanners thread a [`FenceTracker`] through their line loop so
//! that everything between two backtick fences is ignored. Fences inside
//! blockquotes (`> ````) count as well.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a line that starts a backtick fence, quote markers allowed.
pub static CODE_BLOCK_START_RE: LazyLock<Regex> = lazy_regex!(
    r"^\s*(?:>\s*)*`{3,}",
    "code block start pattern should compile",
);

static CODE_BLOCK_TOGGLE_RE: LazyLock<Regex> = lazy_regex!(
    r"^\s*(?:>\s*)*`{3,}[^`]*$",
    "code block toggle pattern should compile",
);

/// Return `true` when `line` is a pure fence line.
///
/// The fence may carry an info string but no further backticks, so a line
/// holding an opening fence, code, and a closing fence is not a toggle.
/// A run of backticks only, however long, toggles once.
///
/// # Examples
///
/// ```
/// use eqcite::fences::is_code_block_toggle;
/// assert!(is_code_block_toggle("```python"));
/// assert!(is_code_block_toggle(" > ```"));
/// assert!(!is_code_block_toggle("``` code ```"));
/// ```
#[must_use]
pub fn is_code_block_toggle(line: &str) -> bool {
    CODE_BLOCK_TOGGLE_RE.is_match(line)
}

/// Tracks fenced code block state across lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct FenceTracker {
    open: bool,
}

impl FenceTracker {
    /// Create a new tracker with no active fence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the tracker with a potential fence line.
    ///
    /// Returns `true` when the line toggled the fence state.
    #[must_use]
    pub fn observe(&mut self, line: &str) -> bool {
        if !is_code_block_toggle(line) {
            return false;
        }
        self.open = !self.open;
        true
    }

    /// Check whether the tracker is currently inside a fenced block.
    #[must_use]
    pub fn in_fence(&self) -> bool {
        self.open
    }
}

/// Iterate over `(line index, line)` pairs that lie outside fenced code.
///
/// Fence lines themselves are skipped.
pub fn lines_outside_fences(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut tracker = FenceTracker::new();
    text.split('\n').enumerate().filter(move |(_, line)| {
        let toggled = tracker.observe(line);
        !toggled && !tracker.in_fence()
    })
}
