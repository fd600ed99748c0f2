use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use eqcite::{
    citation::{replace_citations_in_markdown_with_span, update_citations_with_mapping},
    config::Settings,
    io::{read_document, rewrite_with},
    links::{LinkGraph, resolve_back_links, resolve_forward_links},
    numbering::{NumberingMode, auto_number_equations, auto_number_figures},
    parsers::{
        parse_all_callouts_from_markdown, parse_citations_in_markdown, parse_equations_in_markdown,
        parse_figures_in_markdown, parse_footnotes_in_markdown, parse_headings,
    },
};
use rayon::prelude::*;
use tracing::{Level, debug, warn};

#[derive(Parser)]
#[command(name = "eqcite", version, about = "Number equations and render citations in Markdown notes")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Auto-number display equations, or figures with --figures
    Number {
        /// Number figures instead of equations
        #[arg(long)]
        figures: bool,
        /// Heading depth model
        #[arg(long)]
        mode: Option<NumberingMode>,
        /// Number of tag components
        #[arg(long = "max-depth")]
        max_depth: Option<usize>,
        /// Rewrite files in place
        #[arg(long = "in-place", requires = "files")]
        in_place: bool,
        /// Markdown files; standard input when omitted
        files: Vec<PathBuf>,
    },
    /// Replace citations with HTML spans
    Render {
        /// Markdown files; standard input when omitted
        files: Vec<PathBuf>,
    },
    /// Print parsed records as JSON
    List {
        kind: ListKind,
        /// Markdown files; standard input when omitted
        files: Vec<PathBuf>,
    },
    /// Query a link graph
    #[command(group(ArgGroup::new("direction").required(true).args(["back", "forward"])))]
    Links {
        /// JSON object of source file to linked files and counts
        #[arg(long)]
        graph: PathBuf,
        /// List files linking to this file
        #[arg(long)]
        back: Option<String>,
        /// List files this file links to
        #[arg(long)]
        forward: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListKind {
    Equations,
    Figures,
    Footnotes,
    Callouts,
    Headings,
    Citations,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Ok(Settings::load_from_path(path)?),
        None => Ok(Settings::default()),
    }
}

fn number_document(text: &str, settings: &Settings, figures: bool) -> String {
    if figures {
        return auto_number_figures(text, &settings.figure_numbering_options()).markdown;
    }
    let result = auto_number_equations(text, &settings.numbering_options());
    debug!(changed = result.tag_mapping.len(), "updating citations");
    update_citations_with_mapping(&result.markdown, &result.tag_mapping, &settings.citation_options())
}

fn list_document(text: &str, kind: ListKind, settings: &Settings) -> Result<String> {
    let json = match kind {
        ListKind::Equations => serde_json::to_string_pretty(&parse_equations_in_markdown(text)),
        ListKind::Figures => {
            serde_json::to_string_pretty(&parse_figures_in_markdown(text, &settings.figure_prefix))
        }
        ListKind::Footnotes => serde_json::to_string_pretty(&parse_footnotes_in_markdown(text)),
        ListKind::Callouts => serde_json::to_string_pretty(&parse_all_callouts_from_markdown(
            text,
            &settings.callout_prefixes,
        )),
        ListKind::Headings => serde_json::to_string_pretty(&parse_headings(text)),
        ListKind::Citations => serde_json::to_string_pretty(&parse_citations_in_markdown(text)),
    };
    Ok(json?)
}

/// Run `transform` over every input and print the results in argument order.
///
/// Files are processed in parallel. A failing file is reported on stderr
/// and the remaining output is still printed. Returns whether all succeeded.
fn for_each_document<F>(files: &[PathBuf], transform: F) -> bool
where
    F: Fn(&str) -> Result<String> + Sync,
{
    if files.is_empty() {
        return report(read_document(None).context("reading standard input").and_then(|t| transform(&t)));
    }
    let results: Vec<Result<String>> = files
        .par_iter()
        .map(|path| {
            let text = read_document(Some(path)).with_context(|| format!("reading {}", path.display()))?;
            transform(&text).with_context(|| format!("processing {}", path.display()))
        })
        .collect();
    results.into_iter().fold(true, |ok, result| report(result) && ok)
}

fn report(result: Result<String>) -> bool {
    match result {
        Ok(output) => {
            println!("{}", output.strip_suffix('\n').unwrap_or(&output));
            true
        }
        Err(err) => {
            eprintln!("eqcite: {err:#}");
            false
        }
    }
}

fn rewrite_files<F>(files: &[PathBuf], transform: F) -> bool
where
    F: Fn(&str) -> String + Sync,
{
    let results: Vec<Result<()>> = files
        .par_iter()
        .map(|path| {
            let changed = rewrite_with(path, &transform).with_context(|| format!("rewriting {}", path.display()))?;
            if !changed {
                warn!(file = %path.display(), "nothing to renumber");
            }
            Ok(())
        })
        .collect();
    results.into_iter().fold(true, |ok, result| match result {
        Ok(()) => ok,
        Err(err) => {
            eprintln!("eqcite: {err:#}");
            false
        }
    })
}

fn run_links(graph: &Path, back: Option<&str>, forward: Option<&str>) -> Result<()> {
    let content = fs::read_to_string(graph).with_context(|| format!("reading {}", graph.display()))?;
    let graph: LinkGraph =
        serde_json::from_str(&content).with_context(|| format!("parsing link graph {}", graph.display()))?;
    let files = match (back, forward) {
        (Some(target), _) => resolve_back_links(&graph, target),
        (None, Some(source)) => resolve_forward_links(&graph, source),
        (None, None) => Vec::new(),
    };
    for file in files {
        println!("{file}");
    }
    Ok(())
}

/// Entry point for the `eqcite` command-line tool.
///
/// # Examples
///
/// ```sh
/// # Number equations and print the result
/// eqcite number notes.md
///
/// # Number figures in place
/// eqcite number --figures --in-place notes.md
///
/// # Render citations from standard input
/// cat notes.md | eqcite render
/// ```
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut settings = load_settings(cli.config.as_deref())?;

    let ok = match cli.command {
        Command::Number {
            figures,
            mode,
            max_depth,
            in_place,
            files,
        } => {
            if let Some(mode) = mode {
                settings.numbering_mode = mode;
            }
            if let Some(max_depth) = max_depth {
                settings.max_depth = max_depth;
            }
            let transform = |text: &str| number_document(text, &settings, figures);
            if in_place {
                rewrite_files(&files, transform)
            } else {
                for_each_document(&files, |text| Ok(transform(text)))
            }
        }
        Command::Render { files } => for_each_document(&files, |text| {
            Ok(replace_citations_in_markdown_with_span(text, &settings.citation_options()))
        }),
        Command::List { kind, files } => for_each_document(&files, |text| list_document(text, kind, &settings)),
        Command::Links { graph, back, forward } => {
            run_links(&graph, back.as_deref(), forward.as_deref())?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
