//! TRIBUN CLI - Command-line interface

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tribun_cli::inspect::{self, DecodeArgs, LegalArgs, PerftArgs};
use tribun_cli::playout::{self, PlayoutArgs};

#[derive(Parser)]
#[command(name = "tribun")]
#[command(about = "TRIBUN rules engine tools")]
struct Cli {
    /// Base random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List legal actions
    Legal(LegalArgs),
    /// Decode an action word
    Decode(DecodeArgs),
    /// Count action-tree leaves
    Perft(PerftArgs),
    /// Run random playouts from the opening
    Playout(PlayoutArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Legal(args) => inspect::run_legal(args),
        Commands::Decode(args) => inspect::run_decode(args),
        Commands::Perft(args) => inspect::run_perft(args),
        Commands::Playout(args) => playout::run(args, cli.seed),
    }
}
