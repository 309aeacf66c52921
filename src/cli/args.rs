use crate::core::RetryPolicy;
use crate::strategy::{BatchConfig, EngineConfig, StoreConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the ledger
#[derive(Parser, Debug)]
#[command(name = "job-ledger")]
#[command(
    about = "Run a transaction script against participant records and report their lists",
    long_about = None
)]
pub struct CliArgs {
    #[arg(value_name = "COMMANDS", help = "Path to the command script CSV")]
    pub commands_file: PathBuf,

    #[arg(
        long = "participants",
        value_name = "FILE",
        help = "Participant seed CSV (id,first_name,last_name,role)"
    )]
    pub participants_file: Option<PathBuf>,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for batched concurrent"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for async processing (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[arg(
        long = "max-attempts",
        value_name = "COUNT",
        help = "Attempts per participant write on version conflict (default: 16)"
    )]
    pub max_attempts: Option<u32>,

    #[arg(
        long = "step-timeout-ms",
        value_name = "MILLIS",
        help = "Time limit for a single storage step (async only)"
    )]
    pub step_timeout_ms: Option<u64>,

    #[arg(
        long = "store-dir",
        value_name = "DIR",
        help = "Keep participant documents in this directory instead of memory"
    )]
    pub store_dir: Option<PathBuf>,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log filter for stderr output (overridden by RUST_LOG)"
    )]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            store: self
                .store_dir
                .clone()
                .map(StoreConfig::Directory)
                .unwrap_or_default(),
            retry: self
                .max_attempts
                .map(RetryPolicy::new)
                .unwrap_or_default(),
            step_timeout: self
                .step_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    }
}
