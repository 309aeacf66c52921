//! Batch processing with reference-based partitioning for async script execution
//!
//! This module provides the `BatchProcessor` struct, which runs batches of
//! script commands concurrently while keeping each transaction's own
//! commands in order.
//!
//! # Design
//!
//! The `BatchProcessor` partitions a batch by script reference. Commands for
//! one reference (a create followed by its resolves) run sequentially inside
//! one task; different references run in parallel. Two references touching
//! the same participant race on that participant's record, which the
//! engine's optimistic retry absorbs.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Arc<AsyncTransactionEngine>  (shared transaction orchestrator)
//!     └── Arc<ReferenceRegistry>       (script reference → correlation id)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;

use super::AsyncTransactionEngine;
use crate::core::script::{CommandOutcome, ProcessingResult, ReferenceRegistry};
use crate::core::traits::{IdGenerator, ParticipantStore, RandomIdGenerator};
use crate::types::{Command, LedgerError, ResolveTransaction};

/// Concurrent batch processor with reference-based partitioning
pub struct BatchProcessor<S: ParticipantStore + ?Sized, G: IdGenerator = RandomIdGenerator> {
    /// Shared transaction orchestrator
    engine: Arc<AsyncTransactionEngine<S, G>>,

    /// References registered so far, shared across batches
    references: Arc<ReferenceRegistry>,
}

impl<S: ParticipantStore + ?Sized, G: IdGenerator> Clone for BatchProcessor<S, G> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            references: Arc::clone(&self.references),
        }
    }
}

impl<S, G> BatchProcessor<S, G>
where
    S: ParticipantStore + ?Sized + 'static,
    G: IdGenerator + 'static,
{
    /// Create a new BatchProcessor with an empty reference registry
    ///
    /// # Arguments
    ///
    /// * `engine` - Arc-wrapped engine shared by every spawned task
    pub fn new(engine: Arc<AsyncTransactionEngine<S, G>>) -> Self {
        Self {
            engine,
            references: Arc::new(ReferenceRegistry::new()),
        }
    }

    pub fn references(&self) -> &Arc<ReferenceRegistry> {
        &self.references
    }

    /// Group commands by reference, keeping their relative order
    ///
    /// # Returns
    ///
    /// Groups in order of first appearance; each group holds one reference's
    /// commands in script order.
    pub fn partition_by_reference(&self, batch: Vec<Command>) -> Vec<Vec<Command>> {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<Command>> = Vec::new();

        for command in batch {
            let slot = *slots
                .entry(command.reference().to_string())
                .or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
            groups[slot].push(command);
        }

        groups
    }

    /// Execute one command against the engine
    pub async fn execute(&self, command: &Command) -> Result<CommandOutcome, LedgerError> {
        match command {
            Command::Create { reference, request } => {
                self.references.ensure_unused(reference)?;
                let created = self.engine.create_transaction(request.clone()).await?;
                self.references.register(reference, created.correlation_id)?;
                Ok(CommandOutcome::Created(created))
            }
            Command::Resolve {
                reference,
                initiator,
                description,
            } => {
                let correlation_id = self.references.lookup(reference)?;
                let mut request = ResolveTransaction::new(initiator.clone(), correlation_id);
                request.description_override = description.clone();
                self.engine
                    .resolve_transaction(request)
                    .await
                    .map(CommandOutcome::Resolved)
            }
        }
    }

    /// Process one reference's commands sequentially
    pub async fn process_reference_commands(&self, commands: Vec<Command>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.execute(&command).await;
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Process a batch with one task per reference
    ///
    /// Results are grouped by reference; within a group they follow script
    /// order. A panicking task loses its group's results and is logged.
    pub async fn process_batch(&self, batch: Vec<Command>) -> Vec<ProcessingResult> {
        let groups = self.partition_by_reference(batch);

        let mut tasks = Vec::with_capacity(groups.len());
        for commands in groups {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_reference_commands(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!(error = %e, "command task panicked"),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::consistency::RetryPolicy;
    use crate::core::participant_store::MemoryParticipantStore;
    use crate::types::{CreateTransaction, Participant, Role};

    fn processor() -> BatchProcessor<MemoryParticipantStore> {
        let store = Arc::new(MemoryParticipantStore::with_participants(vec![
            Participant::new("c1", "Cam", "Cole", Role::Customer),
            Participant::new("d1", "Dana", "Doyle", Role::Designer),
            Participant::new("w1", "Wes", "Wood", Role::Worker),
        ]));
        let engine = AsyncTransactionEngine::new(store).with_retry_policy(RetryPolicy::new(64));
        BatchProcessor::new(Arc::new(engine))
    }

    fn create(reference: &str, creator: &str, target: &str) -> Command {
        Command::Create {
            reference: reference.to_string(),
            request: CreateTransaction::new(creator, target),
        }
    }

    fn resolve(reference: &str, initiator: &str) -> Command {
        Command::Resolve {
            reference: reference.to_string(),
            initiator: initiator.to_string(),
            description: None,
        }
    }

    fn references(group: &[Command]) -> Vec<&str> {
        group.iter().map(Command::reference).collect()
    }

    #[test]
    fn test_partition_empty_batch() {
        assert!(processor().partition_by_reference(Vec::new()).is_empty());
    }

    #[test]
    fn test_partition_keeps_order_within_reference() {
        let processor = processor();
        let batch = vec![
            create("a", "d1", "w1"),
            create("b", "c1", "d1"),
            resolve("a", "w1"),
            resolve("b", "d1"),
            resolve("a", "d1"),
        ];

        let groups = processor.partition_by_reference(batch);

        assert_eq!(groups.len(), 2);
        assert_eq!(references(&groups[0]), vec!["a", "a", "a"]);
        assert_eq!(groups[0][0].op(), "create");
        assert_eq!(groups[0][2], resolve("a", "d1"));
        assert_eq!(references(&groups[1]), vec!["b", "b"]);
    }

    #[tokio::test]
    async fn test_process_batch_creates_and_resolves() {
        let processor = processor();
        let batch = vec![
            create("a", "d1", "w1"),
            create("b", "c1", "d1"),
            resolve("a", "w1"),
        ];

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.result.is_ok()));
        let worker = processor.engine.store().find("w1").unwrap().unwrap();
        assert!(worker.current_transactions.is_empty());
        assert_eq!(worker.past_transactions.len(), 1);
        let designer = processor.engine.store().find("d1").unwrap().unwrap();
        assert_eq!(designer.current_transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_references_persist_across_batches() {
        let processor = processor();
        processor.process_batch(vec![create("a", "d1", "w1")]).await;

        let results = processor.process_batch(vec![resolve("a", "d1")]).await;

        assert!(matches!(
            results[0].result,
            Ok(CommandOutcome::Resolved(_))
        ));
    }

    #[tokio::test]
    async fn test_errors_are_per_command() {
        let processor = processor();
        let batch = vec![
            resolve("missing", "w1"),
            create("a", "d1", "w9"),
            create("b", "d1", "w1"),
            create("b", "d1", "w1"),
        ];

        let results = processor.process_batch(batch).await;

        let errors: Vec<_> = results
            .iter()
            .map(|r| r.result.as_ref().err().cloned())
            .collect();
        assert_eq!(
            errors,
            vec![
                Some(LedgerError::unknown_reference("missing")),
                Some(LedgerError::invalid_reference("target", "w9")),
                None,
                Some(LedgerError::duplicate_reference("b")),
            ]
        );
    }
}
