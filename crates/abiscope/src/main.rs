//! abiscope - extract a JSON ABI corpus from ELF binaries
//!
//! Usage:
//!   abiscope parse <binary> [--pretty]   Extract the corpus and print JSON
//!   abiscope run <binary>                Extract without printing (profiling)
//!   abiscope disasm <binary>             Print the text-section listing
//!   abiscope load <corpus.json>          Round-trip a corpus JSON file
//!   abiscope version                     Print the version

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use abiscope_corpus::Corpus;
use abiscope_formats::disasm::Disasm;
use abiscope_formats::File;

#[derive(Parser)]
#[command(name = "abiscope")]
#[command(about = "Extract a JSON ABI corpus from ELF binaries", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a binary and print its ABI corpus as JSON.
    Parse {
        /// Path to the binary file.
        binary: PathBuf,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Parse a binary without printing the corpus.
    Run {
        /// Path to the binary file.
        binary: PathBuf,
    },
    /// Disassemble a binary's text section.
    Disasm {
        /// Path to the binary file.
        binary: PathBuf,
    },
    /// Load a corpus JSON file and re-emit it.
    Load {
        /// Path to the corpus JSON file.
        json_file: PathBuf,
    },
    /// Print the version.
    Version,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse { binary, pretty } => {
            let corpus = Corpus::from_path(&binary)
                .with_context(|| format!("failed to parse {}", binary.display()))?;
            println!("{}", corpus.to_json(pretty)?);
        }
        Commands::Run { binary } => {
            Corpus::from_path(&binary)
                .with_context(|| format!("failed to parse {}", binary.display()))?;
        }
        Commands::Disasm { binary } => {
            let file = File::open(&binary)
                .with_context(|| format!("failed to open {}", binary.display()))?;
            let entry = file
                .entry()
                .with_context(|| format!("failed to parse {}", binary.display()))?;
            let disasm = Disasm::new(&entry).context("failed to build disassembly")?;
            let stdout = std::io::stdout();
            disasm.print(&mut stdout.lock())?;
        }
        Commands::Load { json_file } => {
            let loaded = abiscope_corpus::load(&json_file)
                .with_context(|| format!("failed to load {}", json_file.display()))?;
            println!("{}", loaded.to_corpus().to_json(true)?);
        }
        Commands::Version => {
            println!("abiscope {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
