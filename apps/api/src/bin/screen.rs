//! Interactive single-process screener: stdin/stdout loop over an in-memory session.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use screener::build_engine;
use screener::screening::archive::InMemoryTranscriptArchive;
use screener::screening::engine::{Session, DEFAULT_HISTORY_LIMIT, DEFAULT_QUESTION_COUNT};

/// Candidate screening chat in the terminal
#[derive(Parser, Debug)]
#[command(
    name = "screen",
    about = "Candidate screening chat in the terminal",
    version,
    long_about = "Runs one screening conversation on stdin/stdout. Collects the candidate's \
                  details field by field, then asks technical questions generated from the \
                  declared tech stack. Type 'bye' to finish.\n\n\
                  Examples:\n  \
                  screen\n  \
                  screen --no-llm --questions 3\n  \
                  screen --export candidate.json"
)]
struct Args {
    #[arg(long, help = "Use the deterministic rules only, never call the LLM")]
    no_llm: bool,

    #[arg(
        long,
        value_name = "N",
        env = "QUESTION_COUNT",
        default_value_t = DEFAULT_QUESTION_COUNT,
        help = "Number of technical questions to generate"
    )]
    questions: usize,

    #[arg(
        long,
        value_name = "PATH",
        help = "Write the profile and transcript as JSON when the session ends"
    )]
    export: Option<PathBuf>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true, help = "Anthropic API key")]
    api_key: Option<String>,

    #[arg(short = 'v', long, help = "Log engine activity to stderr")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    let api_key = if args.no_llm {
        None
    } else {
        args.api_key.as_deref().filter(|k| !k.trim().is_empty())
    };
    let archive = Arc::new(InMemoryTranscriptArchive::new());
    let engine = build_engine(
        api_key,
        archive.clone(),
        args.questions,
        DEFAULT_HISTORY_LIMIT,
    )?;
    info!("Using {} assistant", engine.backend_name());

    let mut session = Session::new(Uuid::new_v4());
    say(&engine.greeting().await)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.profile.is_terminal() {
        prompt()?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        let reply = engine.take_turn(&mut session, utterance).await;
        say(&reply)?;
    }

    if engine.abandon(&mut session.profile) {
        info!("Input closed before the screening finished");
    }
    if archive.is_empty() {
        warn!("No transcript snapshots were archived");
    } else {
        info!("Archived {} transcript snapshots", archive.len());
    }

    if let Some(path) = &args.export {
        export(path, &session)?;
        println!("\nProfile exported to {}", path.display());
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let mut filter = EnvFilter::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(directive) = format!("screener={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn say(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "\nAssistant: {text}")?;
    out.flush()?;
    Ok(())
}

fn prompt() -> Result<()> {
    let mut out = std::io::stdout().lock();
    write!(out, "\nYou: ")?;
    out.flush()?;
    Ok(())
}

fn export_document(session: &Session) -> Value {
    json!({
        "profile": session.profile,
        "conversation": session.transcript,
        "timestamp": Utc::now(),
    })
}

fn export(path: &Path, session: &Session) -> Result<()> {
    let document = serde_json::to_string_pretty(&export_document(session))?;
    std::fs::write(path, document)
        .with_context(|| format!("failed to write export to {}", path.display()))
}
