use crate::processes::*;
use clap::{Parser, Subcommand};
use log::Level;
use zoe::data::err::OrFail;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    /// Only log warnings and errors
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        long_about = "Trims known adapters from assembled transcripts using precomputed alignments against an adapter database. \
         Transcripts may be checked against predicted coding regions (--peptides), or have their coordinates \
         tracked across rounds in a ledger (--ledger-out, --ledger-in), but not both."
    )]
    /// Trim adapters from assembled transcripts using alignment hits.
    Trim(TrimAdaptersArgs),
}

fn main() {
    let args = Cli::parse();

    let level = if args.quiet { Level::Warn } else { Level::Info };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("ADAPTER-TRIMMER: failed to initialize logging: {e}");
        std::process::exit(1)
    }

    match args.command {
        Commands::Trim(cmd_args) => trim_adapters_process(cmd_args).unwrap_or_die("subcommand 'trim'"),
    }
}

mod processes;

pub(crate) mod args;
pub(crate) mod io;
pub(crate) mod trim;
pub(crate) mod utils;
