//! # Campus Assist CLI (`campus`)
//!
//! Operator entry point: builds the knowledge store, answers questions from
//! the terminal, runs the grade calculator, and starts the web UI.
//!
//! ## Usage
//!
//! ```bash
//! campus --config ./config/campus.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `campus ingest` | Chunk and embed the corpus into the vector store |
//! | `campus ask "<question>"` | Answer one question (optionally saved as PDF) |
//! | `campus grade <marks>...` | Grade summary for a list of marks |
//! | `campus faq` | Print the built-in FAQ |
//! | `campus serve` | Start the web UI |
//!
//! ## Examples
//!
//! ```bash
//! # Build the vector store for indexed retrieval
//! campus ingest --config ./config/campus.toml
//!
//! # Ask from the terminal and keep a PDF copy
//! campus ask "Which programs are offered?" --pdf answer.pdf
//!
//! # Grade summary
//! campus grade 90 85 78
//! ```

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use campus_assist::answer::Assistant;
use campus_assist::config;
use campus_assist::embedding::create_embedder;
use campus_assist::{export, grade, ingest, knowledge, server};

/// Campus Assist: a college information assistant with a grade calculator.
///
/// Commands that talk to a model or the vector store read a TOML file given
/// by `--config`; built-in defaults apply when the file does not exist.
#[derive(Parser)]
#[command(
    name = "campus",
    about = "Campus Assist: college Q&A, grade calculator, and study dashboard",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/campus.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector store from the corpus.
    ///
    /// Chunks the corpus (`[knowledge] corpus_path`, or the built-in text),
    /// embeds every chunk, and replaces the store at
    /// `<store.dir>/<store.name>/`. Requires an embedding provider.
    Ingest,

    /// Answer a question using the configured retrieval mode.
    Ask {
        /// The question.
        question: String,

        /// Also write the answer to this PDF file.
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Compute total, percentage, CGPA and letter grade.
    Grade {
        /// Marks out of 100, one per subject (1 to 20 values).
        #[arg(required = true, allow_negative_numbers = true)]
        marks: Vec<i64>,

        /// Also write the summary to this PDF file.
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Print the built-in FAQ.
    Faq,

    /// Start the web UI on `[server] bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Faq => {
            knowledge::print_faq();
        }
        Commands::Grade { marks, pdf } => {
            let summary = grade::calculate(&marks)?;
            print!("{}", summary.to_text());
            if let Some(path) = pdf {
                write_pdf(&path, "Grade Report", &summary.to_text())?;
            }
        }
        Commands::Ingest => {
            let cfg = config::load_or_default(&cli.config)?;
            if !cfg.embedding.is_enabled() {
                bail!("Embeddings are disabled. Set [embedding] provider in the config before ingesting.");
            }
            let embedder = create_embedder(&cfg.embedding)?;
            let stats = ingest::run_ingest(&cfg, embedder.as_ref()).await?;
            ingest::print_stats(&cfg, &stats);
        }
        Commands::Ask { question, pdf } => {
            let cfg = config::load_or_default(&cli.config)?;
            let assistant = Assistant::from_config(&cfg)?;
            let answer = assistant.ask(&question).await?;
            println!("{}", answer.text());
            if let Some(path) = pdf {
                let body = format!("Q: {}\n\n{}", question.trim(), answer.text());
                write_pdf(&path, "College Assistant Answer", &body)?;
            }
        }
        Commands::Serve => {
            let cfg = config::load_or_default(&cli.config)?;
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

fn write_pdf(path: &std::path::Path, title: &str, body: &str) -> anyhow::Result<()> {
    let bytes = export::render_pdf(title, body)?;
    std::fs::write(path, bytes)?;
    println!("saved {}", path.display());
    Ok(())
}
