//! Job Ledger CLI
//!
//! Runs a command script of transaction creates and resolves against a set
//! of participants and prints each participant's list sizes.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --participants participants.csv commands.csv > report.csv
//! cargo run -- --strategy sync --participants participants.csv commands.csv
//! cargo run -- --strategy async --batch-size 500 --max-concurrent 8 commands.csv
//! cargo run -- --store-dir ./ledger --step-timeout-ms 250 commands.csv
//! ```
//!
//! The report goes to stdout; logs go to stderr (`--log-level` or `RUST_LOG`).
//!
//! # Processing Strategies
//!
//! - **sync**: Commands run one after another on the calling thread
//! - **async**: Batches run concurrently, one task per transaction reference (default)
//!
//! # Exit Codes
//!
//! - 0: Success (individual command failures are logged, not fatal)
//! - 1: Error (missing file, unreadable store, output failure)

use job_ledger::cli;
use job_ledger::strategy;
use job_ledger::telemetry;
use std::process;

fn main() {
    let args = cli::parse_args();
    telemetry::init(&args.log_level);

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config, args.to_engine_config())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(
        args.participants_file.as_deref(),
        &args.commands_file,
        &mut output,
    ) {
        tracing::error!(error = %e, "processing failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
