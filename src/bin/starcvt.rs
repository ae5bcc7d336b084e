use std::path::PathBuf;
use std::process::ExitCode;

use automata_star::prelude::*;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Converts DFA/NFA records into star automata accepting the Kleene closure of the
/// original language.
#[derive(Debug, Clone, clap::Parser)]
struct Cli {
    /// Directory that is scanned for `*.json` automaton records.
    #[clap(short = 'i', long, default_value = "input")]
    input: PathBuf,
    /// Directory the converted records are written to.
    #[clap(short = 'o', long, default_value = "output")]
    output: PathBuf,
    /// Verbosity of the log output on stderr.
    #[clap(short = 'v', long, default_value = "info", value_parser = ["info", "debug", "trace"])]
    verbosity: String,
}

fn setup_logging(verbosity: &str) {
    let level = match verbosity {
        "trace" => filter::LevelFilter::TRACE,
        "debug" => filter::LevelFilter::DEBUG,
        _ => filter::LevelFilter::INFO,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.verbosity);

    debug!(
        "converting records from {} into {}",
        cli.input.display(),
        cli.output.display()
    );
    match run_batch(&cli.input, &cli.output) {
        Ok(summary) => {
            println!("{}", summary.table());
            println!("{}", summary.tally());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            if matches!(err, BatchError::MissingSource { .. }) {
                eprintln!("Please place a valid DFA or NFA in JSON format into the input folder.");
            }
            ExitCode::FAILURE
        }
    }
}
