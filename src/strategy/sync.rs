//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait. It orchestrates script execution by coordinating
//! between the SyncReader (for CSV input) and TransactionEngine (for business
//! logic).
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Command execution to `core::script::execute` over a `TransactionEngine`
//! - Report output to `csv_format::write_participants_csv`
//!
//! Commands run strictly in script order. The per-step timeout in
//! `EngineConfig` is not applied here.

use crate::core::script::{execute, ReferenceRegistry};
use crate::core::TransactionEngine;
use crate::io::csv_format::write_participants_csv;
use crate::io::sync_reader::{read_participants, SyncReader};
use crate::strategy::{log_command, seed_store, EngineConfig, ProcessingStrategy};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    config: EngineConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        participants: Option<&Path>,
        commands: &Path,
        output: &mut dyn Write,
    ) -> Result<(), LedgerError> {
        let store = self.config.store.open()?;
        if let Some(path) = participants {
            seed_store(store.as_ref(), read_participants(path)?)?;
        }

        let engine = TransactionEngine::new(store.clone()).with_retry_policy(self.config.retry);
        let references = ReferenceRegistry::new();

        let reader = SyncReader::new(commands)?;
        let mut failed = 0usize;
        for result in reader {
            match result {
                Ok(command) => {
                    let result = execute(&engine, &references, &command);
                    failed += usize::from(result.is_err());
                    log_command(&command, &result);
                }
                Err(e) => warn!(error = %e, "skipping command row"),
            }
        }
        info!(failed, "script processed");

        write_participants_csv(&store.list()?, output)
    }
}
