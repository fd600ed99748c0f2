//! Single-pass document scanners producing structured records.
//!
//! Every parser walks `text.split('\n')` once, threads a
//! [`FenceTracker`](crate::fences::FenceTracker), and reports zero-based line
//! numbers. Records own their strings so they can outlive the input and be
//! serialised as JSON.

pub mod callouts;
pub mod citations;
pub mod equations;
pub mod figures;
pub mod footnotes;
pub mod headings;

pub use callouts::{
    CalloutMatch, CalloutPrefix, parse_all_callouts_from_markdown, parse_first_callout_in_markdown,
};
pub use citations::{CitationOccurrence, parse_citations_in_markdown};
pub use equations::{EquationMatch, parse_equations_in_markdown, parse_first_equation_in_markdown};
pub use figures::{FigureMatch, parse_figures_in_markdown};
pub use footnotes::{FootnoteEntry, parse_footnotes_in_markdown};
pub use headings::{Heading, parse_headings, relative_heading_level};
