//! User settings loaded from TOML.
//!
//! Every field has a default, so a settings file only names what it
//! changes. The library takes explicit option structs; [`Settings`] is the
//! one place those are assembled from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    boxing::BoxOptions,
    citation::CitationRenderOptions,
    matchers::TagSyntax,
    numbering::{FigureNumberingOptions, NumberingMode, NumberingOptions},
    parsers::callouts::{CalloutPrefix, default_callout_prefixes},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "settings mirror independent user toggles"
)]
pub struct Settings {
    pub numbering_mode: NumberingMode,
    pub max_depth: usize,
    pub delimiter: String,
    pub no_heading_prefix: String,
    pub global_prefix: String,
    pub parse_quotes: bool,
    pub typst_mode: bool,
    pub equation_prefix: String,
    pub figure_prefix: String,
    pub tagged_only: bool,
    pub range_symbol: String,
    /// Compress consecutive citations into ranges.
    pub continuous_citation: bool,
    pub valid_delimiters: Vec<String>,
    pub file_delimiter: String,
    pub multi_citation_delimiter: String,
    pub callout_prefixes: Vec<CalloutPrefix>,
    pub skip_first_line_in_box: bool,
    pub typst_box_symbol: String,
}

impl Default for Settings {
    fn default() -> Self {
        let numbering = NumberingOptions::default();
        let citation = CitationRenderOptions::default();
        Self {
            numbering_mode: numbering.mode,
            max_depth: numbering.max_depth,
            delimiter: numbering.delimiter,
            no_heading_prefix: numbering.no_heading_prefix,
            global_prefix: numbering.global_prefix,
            parse_quotes: numbering.parse_quotes,
            typst_mode: false,
            equation_prefix: citation.prefix,
            figure_prefix: FigureNumberingOptions::default().citation_prefix,
            tagged_only: false,
            range_symbol: citation.range_symbol.unwrap_or_default(),
            continuous_citation: true,
            valid_delimiters: citation.valid_delimiters,
            file_delimiter: citation.file_delimiter,
            multi_citation_delimiter: citation.multi_citation_delimiter,
            callout_prefixes: default_callout_prefixes(),
            skip_first_line_in_box: false,
            typst_box_symbol: BoxOptions::default().typst_box_symbol,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid settings TOML.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn numbering_options(&self) -> NumberingOptions {
        NumberingOptions {
            mode: self.numbering_mode,
            max_depth: self.max_depth,
            delimiter: self.delimiter.clone(),
            no_heading_prefix: self.no_heading_prefix.clone(),
            global_prefix: self.global_prefix.clone(),
            parse_quotes: self.parse_quotes,
            tag_syntax: TagSyntax::from_typst_mode(self.typst_mode),
        }
    }

    #[must_use]
    pub fn figure_numbering_options(&self) -> FigureNumberingOptions {
        FigureNumberingOptions {
            numbering: self.numbering_options(),
            citation_prefix: self.figure_prefix.clone(),
            tagged_only: self.tagged_only,
        }
    }

    /// Citation options; ranges are off unless `continuous_citation` is set.
    #[must_use]
    pub fn citation_options(&self) -> CitationRenderOptions {
        CitationRenderOptions {
            prefix: self.equation_prefix.clone(),
            range_symbol: Some(self.range_symbol.clone())
                .filter(|symbol| self.continuous_citation && !symbol.is_empty()),
            valid_delimiters: self.valid_delimiters.clone(),
            file_delimiter: self.file_delimiter.clone(),
            multi_citation_delimiter: self.multi_citation_delimiter.clone(),
        }
    }

    #[must_use]
    pub fn box_options(&self) -> BoxOptions {
        BoxOptions {
            skip_first_line: self.skip_first_line_in_box,
            typst: self.typst_mode,
            typst_box_symbol: self.typst_box_symbol.clone(),
        }
    }
}
