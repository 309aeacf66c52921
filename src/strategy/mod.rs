//! Processing strategy module for command script execution
//!
//! This module defines the Strategy pattern for complete processing pipelines:
//! loading participant seeds, reading a command script, running every command
//! through an engine and writing the participant report. This allows
//! different implementations (synchronous, asynchronous batch) to be selected
//! at runtime.

use crate::cli::StrategyType;
use crate::core::{
    CommandOutcome, FileParticipantStore, MemoryParticipantStore, ParticipantStore, RetryPolicy,
};
use crate::types::{Command, LedgerError, Participant};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Where participant records live while a script runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local, discarded on exit
    #[default]
    Memory,

    /// One JSON document per participant under this directory
    Directory(PathBuf),
}

impl StoreConfig {
    /// Open the configured store
    ///
    /// # Errors
    ///
    /// `IoError` if the store directory cannot be created.
    pub fn open(&self) -> Result<Arc<dyn ParticipantStore>, LedgerError> {
        match self {
            StoreConfig::Memory => Ok(Arc::new(MemoryParticipantStore::new())),
            StoreConfig::Directory(root) => Ok(Arc::new(FileParticipantStore::open(root)?)),
        }
    }
}

/// Settings shared by both strategies' engines
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub retry: RetryPolicy,

    /// Per-step limit; only the async engine enforces it
    pub step_timeout: Option<Duration>,
}

/// Processing strategy trait for complete script pipelines
///
/// Each strategy must be able to seed participants, read commands from a CSV
/// file, process them through the appropriate engine, and write the final
/// participant report to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process a command script and write the participant report
    ///
    /// # Arguments
    ///
    /// * `participants` - Optional participant seed CSV, loaded before any command
    /// * `commands` - Path to the command script CSV
    /// * `output` - Writer receiving the report
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened
    /// - The store cannot be opened or listed
    /// - Output cannot be written
    ///
    /// Individual command failures are logged and do not cause this method
    /// to return an error. Processing continues with the next command.
    fn process(
        &self,
        participants: Option<&Path>,
        commands: &Path,
        output: &mut dyn Write,
    ) -> Result<(), LedgerError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
/// * `engine` - Store, retry and timeout settings
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    engine: EngineConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, engine))
        }
    }
}

/// Insert seed participants, keeping records that already exist
pub(crate) fn seed_store(
    store: &dyn ParticipantStore,
    participants: Vec<Participant>,
) -> Result<usize, LedgerError> {
    let mut inserted = 0;
    for participant in participants {
        let id = participant.id.clone();
        match store.insert(participant) {
            Ok(()) => inserted += 1,
            Err(LedgerError::DuplicateParticipant { .. }) => {
                warn!(participant = %id, "participant already present, keeping stored record")
            }
            Err(e) => return Err(e),
        }
    }
    info!(inserted, "participants seeded");
    Ok(inserted)
}

/// Log the result of one command
pub(crate) fn log_command(command: &Command, result: &Result<CommandOutcome, LedgerError>) {
    match result {
        Ok(CommandOutcome::Created(copy)) => debug!(
            reference = command.reference(),
            correlation_id = %copy.correlation_id,
            "create succeeded"
        ),
        Ok(CommandOutcome::Resolved(report)) if !report.is_fully_propagated() => warn!(
            reference = command.reference(),
            correlation_id = %report.transaction.correlation_id,
            failed = report.failed_count(),
            "resolve succeeded with lagging participants"
        ),
        Ok(CommandOutcome::Resolved(_)) => {
            debug!(reference = command.reference(), "resolve succeeded")
        }
        Err(e) => warn!(
            reference = command.reference(),
            op = command.op(),
            kind = ?e.kind(),
            error = %e,
            "command failed"
        ),
    }
}
