//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. It processes commands in batches, partitioned by
//! transaction reference.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── EngineConfig (store, retry policy, step timeout)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (reference partitioning + task spawning)
//!     └── AsyncTransactionEngine (blocking store steps on the blocking pool)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another, so a reference whose commands
//!   span several batches still sees them in script order
//! - Within a batch, each reference runs in its own task
//! - References never depend on each other, so the final report matches the
//!   synchronous strategy's

use crate::core::r#async::{AsyncTransactionEngine, BatchProcessor};
use crate::io::async_reader::{read_participants_async, AsyncReader};
use crate::io::csv_format::write_participants_csv;
use crate::io::open_error;
use crate::strategy::{log_command, seed_store, EngineConfig, ProcessingStrategy};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Commands read per batch
    pub batch_size: usize,

    /// Runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a configuration, falling back to defaults for zero values
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                "invalid batch_size, using default ({})", default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                "invalid max_concurrent_batches, using default ({})",
                default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    engine: EngineConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, engine: EngineConfig) -> Self {
        Self { config, engine }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(
        &self,
        participants: Option<&Path>,
        commands: &Path,
        output: &mut dyn Write,
    ) -> Result<(), LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .enable_all()
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let store = self.engine.store.open()?;

            if let Some(path) = participants {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| open_error(path, e))?;
                let seeds = read_participants_async(file.compat()).await;
                let seed_target = Arc::clone(&store);
                tokio::task::spawn_blocking(move || seed_store(seed_target.as_ref(), seeds))
                    .await
                    .map_err(|e| LedgerError::IoError {
                        message: format!("participant seeding failed: {}", e),
                    })??;
            }

            let mut engine = AsyncTransactionEngine::new(Arc::clone(&store))
                .with_retry_policy(self.engine.retry);
            if let Some(limit) = self.engine.step_timeout {
                engine = engine.with_step_timeout(limit);
            }
            let processor = BatchProcessor::new(Arc::new(engine));

            let file = tokio::fs::File::open(commands)
                .await
                .map_err(|e| open_error(commands, e))?;
            let mut reader = AsyncReader::new(file.compat());

            let mut failed = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for result in processor.process_batch(batch).await {
                    failed += usize::from(result.result.is_err());
                    log_command(&result.command, &result.result);
                }
            }
            info!(failed, "script processed");

            let listing = Arc::clone(&store);
            let participants = tokio::task::spawn_blocking(move || listing.list())
                .await
                .map_err(|e| LedgerError::IoError {
                    message: format!("participant listing failed: {}", e),
                })??;

            write_participants_csv(&participants, output)
        })
    }
}
