//! Utility helpers shared across integration tests.

use std::{fs, path::PathBuf};

use tempfile::TempDir;

/// Join string literals into one document with `\n` line endings.
///
/// Keeps multi-line Markdown fixtures readable without escaped newlines.
macro_rules! doc {
    ($($line:expr),* $(,)?) => {
        [$($line),*].join("\n")
    };
}

/// Write `content` to `name` inside `dir` and return the path.
#[expect(dead_code, reason = "only file-based tests write documents")]
pub fn write_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("failed to write test document");
    path
}
