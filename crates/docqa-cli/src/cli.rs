//! CLI definition and command dispatch for docqa.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the engine.
//!
//! ## Configuration Precedence
//!
//! 1. `--config PATH`
//! 2. `DOCQA_CONFIG`
//! 3. `~/.docqa/config.yaml`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::ui::{format, table, ColorMode, MessageType, Progress, ProgressMode, Style};

use docqa_core::{
    AnswerOutcome, AppConfig, AskOptions, ChatResponse, DocQaEngine, DocQaError,
    DEFAULT_CASES_PATH,
};

// ============================================================================
// CLI Definition
// ============================================================================

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Grounded question answering over your documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "DOCQA_VERBOSE")]
    pub verbose: bool,

    /// Path to configuration file (default: ~/.docqa/config.yaml)
    #[arg(long, global = true, env = "DOCQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode: always, never, or auto (default: auto)
    #[arg(long, global = true, env = "DOCQA_COLOR", default_value = "auto")]
    pub color: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and index documents
    #[command(after_help = r#"EXAMPLES:
    # Index a few contracts
    docqa ingest contracts/lease.txt contracts/nda.md

    # Re-ingesting a file replaces its chunks
    docqa ingest contracts/lease.txt --json
"#)]
    Ingest {
        /// UTF-8 text files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Ask a question against the indexed documents
    #[command(after_help = r#"EXAMPLES:
    # Ask in the default session
    docqa ask "Who are the parties to the agreement?"

    # Keep a separate conversation
    docqa ask "When does the lease end?" --session lease-review

    # Retrieve more passages and print JSON
    docqa ask "What are the payment terms?" --top-k 8 --json
"#)]
    Ask {
        /// The question to ask
        question: String,

        /// Session the exchange is recorded under
        #[arg(long, default_value = "default")]
        session: String,

        /// Number of passages to retrieve (default: retrieval.topK)
        #[arg(long)]
        top_k: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the turns recorded for a session
    #[command(after_help = r#"EXAMPLES:
    docqa history default
    docqa history lease-review --json
"#)]
    History {
        /// Session identifier
        session: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Summarize one indexed source, or the first chunks of the index
    #[command(after_help = r#"EXAMPLES:
    # Summarize a single document
    docqa summarize --source lease.txt

    # Summarize whatever is indexed
    docqa summarize
"#)]
    Summarize {
        /// Source name (a path suffix is enough when it is unambiguous)
        #[arg(long)]
        source: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Score the answer pipeline against a labelled case file
    #[command(after_help = r#"EXAMPLES:
    docqa eval
    docqa eval --cases data/eval_cases.json --json
"#)]
    Eval {
        /// Path to the JSON case list
        #[arg(long, default_value = DEFAULT_CASES_PATH)]
        cases: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report warnings
    #[command(name = "check")]
    Check {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration (API keys are masked)
    #[command(after_help = r#"EXAMPLES:
    docqa config show
    docqa --config ./docqa.yaml config show --json
"#)]
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Entry point
// ============================================================================

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Warnings always; debug with --verbose; RUST_LOG overrides both.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "docqa_core={0},docqa_db={0},docqa_model={0},docqa={0}",
            log_level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let color_mode = ColorMode::from_str(&cli.color).unwrap_or(ColorMode::Auto);
    let style = Style::new(color_mode);

    // Config inspection must work even when the index cannot be opened.
    let command = match cli.command {
        Command::Config { action } => {
            return finish(&style, handle_config(&style, cli.config.as_deref(), action))
        }
        command => command,
    };

    tracing::debug!(
        "Building engine (config: {})",
        cli.config
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    );

    let engine = match DocQaEngine::with_config_path(cli.config.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your config at ~/.docqa/config.yaml or $DOCQA_CONFIG".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to initialize docqa engine",
                    Some(&e.to_string()),
                    Some(&hint),
                )
            );
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Command::Ingest { files, json } => handle_ingest(&style, &engine, &files, json),
        Command::Ask {
            question,
            session,
            top_k,
            json,
        } => handle_ask(&style, &engine, &question, &session, top_k, json),
        Command::History { session, json } => handle_history(&style, &engine, &session, json),
        Command::Summarize { source, json } => {
            handle_summarize(&style, &engine, source.as_deref(), json)
        }
        Command::Eval { cases, json } => handle_eval(&style, &engine, &cases, json),
        // Handled before the engine is built.
        Command::Config { .. } => Ok(()),
    };

    finish(&style, result)
}

fn finish(style: &Style, result: Result<(), DocQaError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style.message(MessageType::Err, &e.to_string()));
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_ingest(
    style: &Style,
    engine: &DocQaEngine,
    files: &[PathBuf],
    json: bool,
) -> Result<(), DocQaError> {
    let progress = Progress::spinner(
        &format!("Indexing {} file(s)", files.len()),
        ProgressMode::detect(json),
    );
    let report = engine.ingest_paths(files);
    progress.finish_clear();
    let report = report?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Indexed {} chunk(s) from {} source(s)",
                report.indexed_chunks,
                report.indexed_sources.len()
            )
        )
    );
    for source in &report.indexed_sources {
        println!("  {}", style.source(source));
    }
    for skipped in &report.skipped {
        println!(
            "{}",
            style.message(MessageType::Skip, &format!("{} (no text)", skipped))
        );
    }
    if let Ok(total) = engine.indexed_chunks() {
        println!("{}", style.message_detail("Index size", &format!("{} chunk(s)", total)));
    }
    Ok(())
}

fn handle_ask(
    style: &Style,
    engine: &DocQaEngine,
    question: &str,
    session: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<(), DocQaError> {
    let options = match top_k {
        Some(0) => {
            return Err(DocQaError::InvalidArgument(
                "--top-k must be greater than 0".to_string(),
            ))
        }
        Some(k) => AskOptions::default().with_top_k(k),
        None => AskOptions::default(),
    };

    let progress = Progress::spinner("Thinking", ProgressMode::detect(json));
    let response = engine.ask(question, session, &options);
    progress.finish_clear();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_default()
        );
        return Ok(());
    }

    print_response(style, &response);
    Ok(())
}

fn print_response(style: &Style, response: &ChatResponse) {
    match response.outcome {
        AnswerOutcome::Blocked => {
            let reason = response.reason.as_deref().unwrap_or_default();
            println!("{}", style.message(MessageType::Blocked, reason));
            println!("{}", response.answer);
            return;
        }
        AnswerOutcome::NoEvidence | AnswerOutcome::LowRelevance => {
            if let Some(reason) = &response.reason {
                println!("{}", style.message(MessageType::Info, reason));
            }
            println!("{}", response.answer);
            return;
        }
        AnswerOutcome::Answered => {}
    }

    println!("{}", style.section("ANSWER"));
    println!();
    println!("{}", response.answer);

    if response.generation_fallback {
        println!();
        let reason = response
            .reason
            .as_deref()
            .unwrap_or("Generation failed; showing retrieved context.");
        println!("{}", style.message(MessageType::Warn, reason));
    }

    if !response.citations.is_empty() {
        println!();
        println!("{}", style.section("SOURCES"));
        println!();
        print!("{}", table::render_citations_table(&response.citations));
        println!();
    }

    if let Some(grounding) = response.grounding {
        println!(
            "{}",
            style.message_detail("Grounding", &style.relevance(grounding))
        );
    }
}

fn handle_history(
    style: &Style,
    engine: &DocQaEngine,
    session: &str,
    json: bool,
) -> Result<(), DocQaError> {
    let turns = engine.history(session)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&turns).unwrap_or_default()
        );
        return Ok(());
    }

    if turns.is_empty() {
        println!(
            "{}",
            style.message(MessageType::Info, &format!("No history for session `{}`", session))
        );
        return Ok(());
    }

    println!(
        "{}",
        style.section(&format!("SESSION {} ({} turns)", session, turns.len()))
    );
    println!();
    print!("{}", table::render_history_table(&turns));
    println!();
    Ok(())
}

fn handle_summarize(
    style: &Style,
    engine: &DocQaEngine,
    source: Option<&str>,
    json: bool,
) -> Result<(), DocQaError> {
    let progress = Progress::spinner("Summarizing", ProgressMode::detect(json));
    let summary = engine.summarize(source);
    progress.finish_clear();
    let summary = summary?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
        return Ok(());
    }

    println!("{}", style.section("SUMMARY"));
    println!();
    println!("  {}", style.key_value("Source", &style.source(&summary.source)));
    println!();
    println!("{}", summary.summary);
    Ok(())
}

fn handle_eval(
    style: &Style,
    engine: &DocQaEngine,
    cases: &Path,
    json: bool,
) -> Result<(), DocQaError> {
    let progress = Progress::spinner(
        &format!("Evaluating {}", cases.display()),
        ProgressMode::detect(json),
    );
    let report = engine.evaluate(cases);
    progress.finish_clear();
    let report = report?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Evaluated {} case(s) from {}",
                report.cases_count,
                report.cases_path.display()
            )
        )
    );
    println!();
    print!("{}", table::render_metrics_table(&report.metrics));
    println!();
    Ok(())
}

fn handle_config(
    style: &Style,
    path: Option<&Path>,
    action: ConfigAction,
) -> Result<(), DocQaError> {
    let config = match path {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::load_default()?,
    };

    match action {
        ConfigAction::Check { json } => handle_config_check(style, &config, json),
        ConfigAction::Show { json } => handle_config_show(style, config, json),
    }
}

fn handle_config_check(style: &Style, config: &AppConfig, json: bool) -> Result<(), DocQaError> {
    let warnings = config.validate()?;

    if json {
        let value = serde_json::json!({ "valid": true, "warnings": warnings });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        return Ok(());
    }

    if warnings.is_empty() {
        println!("{}", style.message(MessageType::Ok, "Configuration is valid"));
    } else {
        println!(
            "{}",
            style.message(
                MessageType::Warn,
                &format!("Configuration is valid with {} warning(s):", warnings.len())
            )
        );
        for warning in &warnings {
            println!("  • {}", warning);
        }
    }
    Ok(())
}

/// Show the resolved configuration. Secrets never reach the terminal.
fn handle_config_show(style: &Style, mut config: AppConfig, json: bool) -> Result<(), DocQaError> {
    mask_secret(&mut config.generation.api_key);
    mask_secret(&mut config.embedding.api_key);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{}", style.section("CONFIGURATION"));
    println!();
    println!(
        "  {}",
        style.key_value("Index", &config.index_dir().display().to_string())
    );
    println!(
        "  {}",
        style.key_value("Sessions", &config.session_dir().display().to_string())
    );
    println!();
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn mask_secret(secret: &mut Option<String>) {
    if let Some(value) = secret.as_mut() {
        *value = format::mask(value);
    }
}
