//! Equation and figure numbering for Markdown notes.
//!
//! The crate locates display equations, figures, footnotes, and citable
//! callouts in Markdown text, numbers them by heading structure, and
//! renders `$\ref{...}$` citations as cross-linkable spans. Every function
//! takes the document as a `&str` and returns new text or records; nothing
//! here touches the filesystem except [`io`] and [`config`].

#[macro_use]
mod macros;

pub mod array;
pub mod boxing;
pub mod citation;
pub mod config;
pub mod fences;
pub mod io;
pub mod links;
pub mod matchers;
pub mod numbering;
pub mod parsers;
pub mod scanning;

pub use array::{find_array, find_array_by};
pub use scanning::remove_paired_braces;
