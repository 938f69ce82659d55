mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{list, render, run, ListArgs, RenderArgs, RunArgs};

/// Folio CLI - rich-text documents from the command line
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read markup and write it back normalized
    Render(RenderArgs),

    /// Apply a JSON script of editor commands to a document
    Run(RunArgs),

    /// List the available editor commands
    Commands(ListArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Render(args) => render(args, &cwd),
        Command::Run(args) => run(args, &cwd).await,
        Command::Commands(args) => list(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
