//! # PDF Chat CLI (`pdfchat`)
//!
//! The `pdfchat` binary runs the HTTP service or exercises the full pipeline
//! once from the command line.
//!
//! ## Usage
//!
//! ```bash
//! pdfchat --config ./config/pdfchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdfchat serve` | Start the HTTP server |
//! | `pdfchat ask --pdf <FILE>... "<question>"` | Ingest PDFs and answer one question locally |
//!
//! ## Examples
//!
//! ```bash
//! # Start the server
//! pdfchat serve --config ./config/pdfchat.toml
//!
//! # Ask a single question against two PDFs without starting the server
//! pdfchat ask --pdf report.pdf --pdf appendix.pdf "What were the Q3 results?"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pdf_chat::chat;
use pdf_chat::config::load_config;
use pdf_chat::embedding;
use pdf_chat::ingest;
use pdf_chat::llm::OpenAiChatClient;
use pdf_chat::server;
use pdf_chat::session::SessionStore;

/// PDF Chat — conversational question answering over uploaded PDFs.
#[derive(Parser)]
#[command(
    name = "pdfchat",
    about = "PDF Chat — conversational question answering over uploaded PDFs",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pdfchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Serves `/health`, `/sessions/upload`, and `/sessions/{id}/chat` on
    /// the configured bind address.
    Serve,

    /// Ingest PDFs and answer a single question from the command line.
    ///
    /// Runs the same extract → chunk → embed → retrieve → answer pipeline
    /// the server uses, without HTTP.
    Ask {
        /// PDF file to ingest; repeat for multiple files.
        #[arg(long = "pdf", required = true)]
        pdf: Vec<PathBuf>,

        /// The question to ask.
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => server::run_server(&config).await,
        Commands::Ask { pdf, question } => run_ask(&config, &pdf, &question).await,
    }
}

async fn run_ask(
    config: &pdf_chat::config::Config,
    paths: &[PathBuf],
    question: &str,
) -> Result<()> {
    let embedder = embedding::create_embedder(&config.embedding)?;
    let llm = OpenAiChatClient::new(&config.llm)?;
    let sessions = SessionStore::new();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push((name, bytes));
    }

    let outcome = ingest::create_session(config, embedder.as_ref(), &sessions, &files).await?;
    println!(
        "indexed {} document(s) into {} chunk(s)",
        outcome.documents, outcome.chunks
    );

    let result = chat::answer_question(
        config,
        embedder.as_ref(),
        &llm,
        &sessions,
        &outcome.session_id,
        question,
    )
    .await?;

    println!();
    println!("{}", result.answer);
    Ok(())
}
