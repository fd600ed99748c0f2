//! File helpers for reading and rewriting Markdown documents.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

/// Read a document from `path`, or from standard input when `None`.
///
/// # Errors
/// Returns an error if the file or standard input cannot be read.
pub fn read_document(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Rewrite a file in place with `transform`.
///
/// The file is only written when its content changes. Returns whether it
/// did.
///
/// # Errors
/// Returns an error if reading or writing the file fails.
pub fn rewrite_with<F>(path: &Path, transform: F) -> io::Result<bool>
where
    F: FnOnce(&str) -> String,
{
    let text = fs::read_to_string(path)?;
    let fixed = transform(&text);
    if fixed == text {
        return Ok(false);
    }
    fs::write(path, fixed)?;
    Ok(true)
}
