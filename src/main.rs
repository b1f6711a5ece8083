//! # Quill - A Text Editing Engine
//!
//! Command-line front end for the quill engine. It runs the engine's
//! wrap, search and replace machinery over files, which is handy for
//! checking how a document will lay out or what a replace-all will do.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show how a file wraps at 80 columns
//! cargo run -- wrap notes.txt --width 80
//!
//! # List matches as JSON
//! cargo run -- find src/main.rs config --whole-words --json
//!
//! # Replace every match in place
//! cargo run -- replace notes.txt colour color --write
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quill_buffer::TextBuffer;
use quill_core::search::{self, SearchOptions};
use quill_core::{Config, Editor, MonospaceMeasure, WordWrapEngine};

/// Quill - a text editing engine built in Rust
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a file the way word wrap breaks it into rows
    Wrap {
        /// File to wrap
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Row width in columns
        #[arg(short, long, default_value_t = 80)]
        width: usize,
    },

    /// List every match of a pattern
    Find {
        /// File to search
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Text to search for
        pattern: String,

        #[command(flatten)]
        matching: MatchArgs,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace every match of a pattern
    Replace {
        /// File to edit
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Text to search for
        pattern: String,

        /// Text to put in its place
        replacement: String,

        #[command(flatten)]
        matching: MatchArgs,

        /// Write the result back instead of printing it
        #[arg(long)]
        write: bool,
    },
}

/// Matching flags shared by `find` and `replace`.
#[derive(ClapArgs, Debug, Clone, Copy)]
struct MatchArgs {
    /// Match case-insensitively (matching is case-sensitive otherwise)
    #[arg(short, long)]
    ignore_case: bool,

    /// Only match whole words
    #[arg(short = 'W', long)]
    whole_words: bool,
}

impl MatchArgs {
    fn options(self, config: &Config) -> SearchOptions {
        SearchOptions {
            case_sensitive: !self.ignore_case,
            whole_words: self.whole_words || config.search.whole_words,
            selection_only: false,
        }
    }
}

/// One match in `find --json` output, 1-based like the status bar.
#[derive(Debug, Serialize, PartialEq)]
struct MatchRecord {
    line: usize,
    column: usize,
    length: usize,
    text: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    tracing::info!("Starting Quill v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };

    match args.command {
        Commands::Wrap { file, width } => {
            let text = read_file(&file)?;
            for row in wrap_rows(&text, width, &config) {
                println!("{row}");
            }
        }
        Commands::Find {
            file,
            pattern,
            matching,
            json,
        } => {
            let text = read_file(&file)?;
            let matches = find_matches(&text, &pattern, &matching.options(&config));
            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                for m in &matches {
                    println!("{}:{}:{}: {}", file.display(), m.line, m.column, m.text);
                }
            }
        }
        Commands::Replace {
            file,
            pattern,
            replacement,
            matching,
            write,
        } => {
            let text = read_file(&file)?;
            let (result, count) = replace_all(&text, &pattern, &replacement, matching.options(&config), &config)?;
            if write {
                fs::write(&file, &result).with_context(|| format!("writing {}", file.display()))?;
                eprintln!("{count} replacement(s) in {}", file.display());
            } else {
                print!("{result}");
            }
        }
    }

    Ok(())
}

/// Sets up the tracing subscriber. `RUST_LOG` wins over `-v` flags.
fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Breaks every line into the rows word wrap would show, one cell per
/// column.
fn wrap_rows(text: &str, width: usize, config: &Config) -> Vec<String> {
    let buffer = TextBuffer::from(text);
    let measure = MonospaceMeasure::cells();
    let mut engine = WordWrapEngine::new(config.wrap.split_chars.clone(), config.editor.tab_size);
    engine.set_max_width(width.max(1) as f32);

    let mut rows = Vec::new();
    for line in 0..buffer.len_lines() {
        rows.extend(engine.span(&buffer, &measure, line).substrings.iter().cloned());
    }
    rows
}

fn find_matches(text: &str, pattern: &str, options: &SearchOptions) -> Vec<MatchRecord> {
    let buffer = TextBuffer::from(text);
    search::find_all(&buffer, pattern, options, None)
        .into_iter()
        .map(|range| MatchRecord {
            line: range.start.line + 1,
            column: range.start.pos + 1,
            length: range.end.pos - range.start.pos,
            text: buffer.line(range.start.line).trim_end().to_string(),
        })
        .collect()
}

/// Runs replace-all through an editor, exactly as the find panel would.
fn replace_all(
    text: &str,
    pattern: &str,
    replacement: &str,
    options: SearchOptions,
    config: &Config,
) -> anyhow::Result<(String, usize)> {
    let mut editor = Editor::new(config);
    editor.set_read_only(false);
    editor.set_text(text)?;
    editor.set_search_options(options);
    editor.set_find_pattern(pattern);
    editor.set_replacement(replacement);
    let count = editor.replace_all()?;
    tracing::info!(count, "replace finished");
    Ok((editor.text(), count))
}
