//! CLI entry point for floatrag.
//!
//! Provides commands for extracting Argo float files, building the semantic
//! index, and asking questions against it.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, builder::styling::{AnsiColor, Effects, Styles}};
use floatrag::display::{THEME, create_extraction_table, create_results_table, create_stats_table};
use floatrag::profile::{ProfileExtractor, is_supported_file_name};
use floatrag::{AppState, ChatReply, Settings, logging};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Argo float retrieval
#[derive(Parser)]
#[command(
    name = "floatrag",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ask questions about Argo float profiles",
    long_about = "Extract Argo float NetCDF files, index their profiles, and answer questions from them.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ floatrag init\n  $ floatrag extract R2902746_001.nc --index\n  $ floatrag ask \"salinity in the Indian Ocean\""
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .floatrag directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Extract profiles from a float file
    #[command(
        about = "Extract metadata, profiles and trajectory from a NetCDF file",
        after_help = "Examples:\n  floatrag extract D2902746_012.nc\n  floatrag extract D2902746_012.nc --index\n  floatrag extract D2902746_012.nc --json | jq '.profiles | length'"
    )]
    Extract {
        /// NetCDF file (.nc or .netcdf)
        file: PathBuf,

        /// Add the extracted profiles to the index
        #[arg(long)]
        index: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Semantic search over indexed profiles
    #[command(
        about = "Find indexed profiles similar to a query",
        after_help = "Examples:\n  floatrag search \"dissolved oxygen\"\n  floatrag search \"equatorial temperature\" --limit 3 --json"
    )]
    Search {
        query: String,

        /// Maximum number of results (defaults to retrieval.search_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Ask a question
    #[command(
        about = "Answer a question from the indexed profiles",
        after_help = "Examples:\n  floatrag ask \"salinity near the equator\"\n  floatrag ask \"oxygen levels\" --json | jq '.sql_query'"
    )]
    Ask {
        message: String,

        /// Documents used as context (defaults to retrieval.context_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Conversation to record the exchange under
        #[arg(long)]
        conversation: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics
    #[command(about = "Show index statistics")]
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path).map_err(|e| {
            anyhow!("Configuration error loading from {}: {e}", path.display())
        })?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            eprintln!("Using default configuration.");
            Settings::default()
        }),
    };

    if let Err(e) = logging::init(&settings.logging, settings.debug) {
        eprintln!("Warning: {e}");
    }

    match cli.command {
        Commands::Init { force } => {
            let cwd = std::env::current_dir().context("cannot read current directory")?;
            let path = Settings::init_config_file(&cwd, force).map_err(|e| anyhow!("{e}"))?;
            println!(
                "{}",
                THEME.success_with_icon(&format!("Created configuration at {}", path.display()))
            );
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", settings.to_toml()?);
        }

        Commands::Extract { file, index, json } => {
            run_extract(settings, &file, index, json)?;
        }

        Commands::Search { query, limit, json } => {
            let limit = limit.unwrap_or(settings.retrieval.search_limit);
            let state = AppState::initialize(settings)?;
            let results = state.index.try_search(&query, limit)?;

            if json {
                print_json(&results)?;
            } else if results.is_empty() {
                println!("{}", THEME.warning_with_icon("No matching profiles"));
            } else {
                println!("{}", create_results_table(&results));
            }
        }

        Commands::Ask {
            message,
            limit,
            conversation,
            json,
        } => {
            let mut settings = settings;
            if let Some(limit) = limit {
                settings.retrieval.context_limit = limit;
            }
            let state = AppState::initialize(settings)?;
            let reply = state
                .chat
                .process_message(&message, conversation.as_deref())
                .await;

            if json {
                print_json(&reply)?;
            } else {
                print_reply(&reply);
            }
        }

        Commands::Stats { json } => {
            let state = AppState::initialize(settings)?;
            let stats = state.index.stats();
            if json {
                print_json(&stats)?;
            } else {
                println!("{}", create_stats_table(&stats));
                println!(
                    "Index: {}",
                    THEME.apply(&THEME.path, state.index.path().display())
                );
            }
        }
    }

    Ok(())
}

fn run_extract(settings: Settings, file: &Path, index: bool, json: bool) -> Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !is_supported_file_name(&name) {
        bail!("Unsupported file '{}': expected a .nc or .netcdf file", file.display());
    }

    let bytes = std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let extraction = ProfileExtractor::new().extract(&bytes)?;

    if json {
        print_json(&extraction)?;
    } else {
        println!("{}", THEME.success_with_icon(&extraction.message));
        if let Some(id) = extraction.float_id() {
            println!("Float: {}", THEME.apply(&THEME.number, id));
        }
        if !extraction.profiles.is_empty() {
            println!("{}", create_extraction_table(&extraction));
        }
        println!(
            "Trajectory: {} positions",
            extraction.trajectory.coordinates.len()
        );
    }

    if index {
        let state = AppState::initialize(settings)?;
        let documents = extraction.documents();
        let count = documents.len();
        state.index.add(documents)?;
        // Keep stdout clean for --json
        eprintln!(
            "{}",
            THEME.success_with_icon(&format!(
                "Indexed {count} profiles ({} total)",
                state.index.len()
            ))
        );
    }

    Ok(())
}

fn print_reply(reply: &ChatReply) {
    println!("{}\n", reply.message.content);

    if let Some(documents) = reply.context_data.as_deref().filter(|d| !d.is_empty()) {
        println!("{}", THEME.apply(&THEME.header, "Sources:"));
        for scored in documents {
            let id = scored.document.float_id().unwrap_or_else(|| "?".to_string());
            let score = THEME.apply(
                THEME.score_style(scored.similarity_score),
                format!("{:.2}", scored.similarity_score),
            );
            println!("  float {id}  {score}");
        }
        println!();
    }

    if let Some(query) = &reply.sql_query {
        println!(
            "{} {}",
            THEME.apply(&THEME.header, "Query:"),
            THEME.apply(&THEME.dim, query)
        );
    }

    if let Some(suggestions) = reply.suggestions.as_deref().filter(|s| !s.is_empty()) {
        println!("{}", THEME.apply(&THEME.header, "Try next:"));
        for suggestion in suggestions {
            println!("  - {suggestion}");
        }
    }

    if let Some(error) = &reply.error {
        eprintln!("{}", THEME.error_with_icon(error));
    }

    println!(
        "\n{}",
        THEME.apply(&THEME.dim, format!("conversation: {}", reply.conversation_id))
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
