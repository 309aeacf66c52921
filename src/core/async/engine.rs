//! Transaction orchestration for async batch processing
//!
//! This module provides the `AsyncTransactionEngine` struct, which drives the
//! same fan-out and resolution steps as the synchronous engine from async
//! tasks.
//!
//! # Design
//!
//! Participant stores are blocking (the file store does real I/O), so every
//! storage step runs on tokio's blocking pool via `spawn_blocking`. A step
//! can optionally be bounded by a timeout; a step that overruns is reported
//! as `StepTimeout` and its write is not undone.
//!
//! Fan-out deliveries are awaited one after another, which keeps the
//! target → creator → customer order and the partial-failure report exact.
//! Resolution secondaries are independent of each other and run
//! concurrently once the initiator's step has succeeded.
//!
//! # Architecture
//!
//! ```text
//! AsyncTransactionEngine
//!     ├── Arc<S: ParticipantStore>  (shared, internally synchronized)
//!     ├── Arc<G: IdGenerator>       (correlation id source)
//!     ├── RetryPolicy               (version conflict retries per step)
//!     └── Option<Duration>          (per-step timeout)
//! ```
//!
//! # Thread Safety
//!
//! The engine is cheap to clone and can be shared across tasks. Concurrent
//! writes to the same participant are serialized by the store's version
//! check and retried.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::core::consistency::{
    partial_failure, ResolutionReport, RetryPolicy, SecondaryOutcome, SecondaryStep,
};
use crate::core::fanout::{deliver_one, plan_fan_out};
use crate::core::resolution::{
    archive_secondary, log_resolution, resolve_primary, secondary_participants,
};
use crate::core::traits::{IdGenerator, ParticipantStore, RandomIdGenerator};
use crate::types::{CreateTransaction, LedgerError, ResolveTransaction, TransactionCopy};

/// Transaction orchestrator for async batch processing
///
/// `AsyncTransactionEngine` can be cloned and shared across multiple async
/// tasks; clones share the store and id generator.
pub struct AsyncTransactionEngine<S: ParticipantStore + ?Sized, G: IdGenerator = RandomIdGenerator>
{
    store: Arc<S>,
    ids: Arc<G>,
    retry: RetryPolicy,

    /// Upper bound for a single storage step, if any
    step_timeout: Option<Duration>,
}

impl<S: ParticipantStore + ?Sized, G: IdGenerator> Clone for AsyncTransactionEngine<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ids: Arc::clone(&self.ids),
            retry: self.retry,
            step_timeout: self.step_timeout,
        }
    }
}

impl<S: ParticipantStore + ?Sized> AsyncTransactionEngine<S> {
    /// Create a new AsyncTransactionEngine
    ///
    /// # Arguments
    ///
    /// * `store` - Shared participant store
    ///
    /// # Returns
    ///
    /// An engine with random correlation ids, the default retry policy and
    /// no step timeout.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            ids: Arc::new(RandomIdGenerator),
            retry: RetryPolicy::default(),
            step_timeout: None,
        }
    }
}

impl<S, G> AsyncTransactionEngine<S, G>
where
    S: ParticipantStore + ?Sized + 'static,
    G: IdGenerator,
{
    pub fn with_id_generator<H: IdGenerator>(self, ids: H) -> AsyncTransactionEngine<S, H> {
        AsyncTransactionEngine {
            store: self.store,
            ids: Arc::new(ids),
            retry: self.retry,
            step_timeout: self.step_timeout,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bound every storage step by `limit`
    pub fn with_step_timeout(mut self, limit: Duration) -> Self {
        self.step_timeout = Some(limit);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one blocking storage step on the blocking pool
    ///
    /// # Errors
    ///
    /// - the step's own error
    /// - `StepTimeout` if the step overran the configured limit
    /// - `PersistenceFailure` if the blocking task panicked or was cancelled
    async fn run_step<T, F>(&self, participant: &str, step: F) -> Result<T, LedgerError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, LedgerError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let handle = tokio::task::spawn_blocking(move || step(store.as_ref()));

        let joined = match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(participant, ?limit, "storage step timed out");
                    return Err(LedgerError::step_timeout(participant));
                }
            },
            None => handle.await,
        };

        joined.map_err(|e| {
            LedgerError::persistence_failure(participant, format!("storage task failed: {}", e))
        })?
    }

    /// Create a transaction and write a copy into every participant involved
    ///
    /// Participants are resolved first; deliveries are then awaited in plan
    /// order.
    ///
    /// # Errors
    ///
    /// - `InvalidReference` if the creator, target or customer is unknown
    /// - `PartialFanOut` if a delivery failed after earlier copies landed
    /// - the failing step's own error (including `StepTimeout`) if nothing
    ///   was written
    pub async fn create_transaction(
        &self,
        request: CreateTransaction,
    ) -> Result<TransactionCopy, LedgerError> {
        let correlation_id = self.ids.next_id();
        let creator = request.creator.clone();
        let plan = self
            .run_step(&creator, move |store| {
                plan_fan_out(store, &request, correlation_id)
            })
            .await?;
        let plan = Arc::new(plan);

        let mut persisted = Vec::with_capacity(plan.deliveries.len());
        for delivery in plan.deliveries.iter().cloned() {
            let participant = delivery.participant.clone();
            let step_plan = Arc::clone(&plan);
            let retry = self.retry;
            let result = self
                .run_step(&participant, move |store| {
                    deliver_one(store, &step_plan, &delivery, &retry)
                })
                .await;
            if let Err(e) = result {
                return Err(partial_failure(correlation_id, persisted, e));
            }
            persisted.push(participant);
        }

        info!(
            %correlation_id,
            participants = persisted.len(),
            "transaction created"
        );
        Ok(plan.canonical.clone())
    }

    /// Resolve a transaction on behalf of one of its participants
    ///
    /// The initiator's step is awaited first; secondary participants are then
    /// archived concurrently and reported, never raised.
    ///
    /// # Errors
    ///
    /// - `ParticipantNotFound` if the initiator is unknown
    /// - `TransactionNotFound` if the initiator holds no current copy
    /// - a persistence failure or `StepTimeout` on the initiator's step
    pub async fn resolve_transaction(
        &self,
        request: ResolveTransaction,
    ) -> Result<ResolutionReport, LedgerError> {
        let request = Arc::new(request);
        let primary = Arc::clone(&request);
        let retry = self.retry;
        let transaction = self
            .run_step(&request.initiator, move |store| {
                resolve_primary(store, &primary, &retry)
            })
            .await?;

        let steps = secondary_participants(&transaction, &request.initiator)
            .into_iter()
            .map(|participant| {
                let request = Arc::clone(&request);
                async move {
                    let name = participant.clone();
                    let outcome = self
                        .run_step(&participant, move |store| {
                            Ok(archive_secondary(
                                store,
                                &name,
                                &request.correlation_id,
                                request.description_override.as_deref(),
                                &retry,
                            ))
                        })
                        .await
                        .unwrap_or_else(|e| SecondaryOutcome::from_result(&participant, Err(e)));
                    SecondaryStep {
                        participant,
                        outcome,
                    }
                }
            });
        let secondaries = join_all(steps).await;

        let report = ResolutionReport {
            transaction,
            secondaries,
        };
        log_resolution(&report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::participant_store::MemoryParticipantStore;
    use crate::core::testing::FlakyStore;
    use crate::types::{CopyRole, Participant, Role};

    /// Store whose saves sleep before delegating
    struct SlowStore {
        inner: MemoryParticipantStore,
        delay: Duration,
    }

    impl ParticipantStore for SlowStore {
        fn find(&self, id: &str) -> Result<Option<Participant>, LedgerError> {
            self.inner.find(id)
        }

        fn save(&self, participant: &Participant) -> Result<u64, LedgerError> {
            std::thread::sleep(self.delay);
            self.inner.save(participant)
        }

        fn insert(&self, participant: Participant) -> Result<(), LedgerError> {
            self.inner.insert(participant)
        }

        fn remove(&self, id: &str) -> Result<Option<Participant>, LedgerError> {
            self.inner.remove(id)
        }

        fn list(&self) -> Result<Vec<Participant>, LedgerError> {
            self.inner.list()
        }
    }

    fn participants() -> Vec<Participant> {
        vec![
            Participant::new("c1", "Cam", "Cole", Role::Customer),
            Participant::new("d1", "Dana", "Doyle", Role::Designer),
            Participant::new("w1", "Wes", "Wood", Role::Worker),
        ]
    }

    fn engine() -> AsyncTransactionEngine<MemoryParticipantStore> {
        AsyncTransactionEngine::new(Arc::new(MemoryParticipantStore::with_participants(
            participants(),
        )))
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let engine = engine();

        let created = engine
            .create_transaction(CreateTransaction::new("d1", "w1").with_customer("c1"))
            .await
            .unwrap();
        let id = created.correlation_id;

        let worker = engine.store().find("w1").unwrap().unwrap();
        assert_eq!(worker.find_current(&id).unwrap().role, CopyRole::CreatedFor);

        let report = engine
            .resolve_transaction(ResolveTransaction::new("c1", id).with_description("paid"))
            .await
            .unwrap();

        assert_eq!(report.archived_count(), 2);
        let order: Vec<_> = report
            .secondaries
            .iter()
            .map(|s| s.participant.as_str())
            .collect();
        assert_eq!(order, vec!["d1", "w1"]);
        for p in ["c1", "d1", "w1"] {
            let record = engine.store().find(p).unwrap().unwrap();
            assert!(record.find_current(&id).is_none());
            assert_eq!(
                record.find_past(&id).unwrap().description.as_deref(),
                Some("paid")
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_reference_writes_nothing() {
        let engine = engine();

        let result = engine
            .create_transaction(CreateTransaction::new("d1", "w1").with_customer("c9"))
            .await;

        assert_eq!(result, Err(LedgerError::invalid_reference("customer", "c9")));
        for participant in engine.store().list().unwrap() {
            assert!(participant.current_transactions.is_empty());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_on_shared_participant() {
        let engine = engine().with_retry_policy(RetryPolicy::new(64));

        let creates = (0..20).map(|i| {
            let engine = engine.clone();
            async move {
                engine
                    .create_transaction(
                        CreateTransaction::new("d1", "w1").with_description(format!("job {i}")),
                    )
                    .await
            }
        });
        let results = join_all(creates).await;

        assert!(results.iter().all(|r| r.is_ok()));
        let worker = engine.store().find("w1").unwrap().unwrap();
        let designer = engine.store().find("d1").unwrap().unwrap();
        assert_eq!(worker.current_transactions.len(), 20);
        assert_eq!(designer.current_transactions.len(), 20);
    }

    #[tokio::test]
    async fn test_partial_fan_out_reports_persisted() {
        let store = Arc::new(FlakyStore::with_participants(participants()));
        store.fail_saves_for("c1");
        let engine = AsyncTransactionEngine::new(Arc::clone(&store));

        let result = engine
            .create_transaction(CreateTransaction::new("d1", "w1").with_customer("c1"))
            .await;

        match result {
            Err(LedgerError::PartialFanOut { persisted, .. }) => {
                assert_eq!(persisted, vec!["w1".to_string(), "d1".to_string()]);
            }
            other => panic!("expected partial fan-out, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_secondary_is_reported_not_raised() {
        let store = Arc::new(FlakyStore::with_participants(participants()));
        let engine = AsyncTransactionEngine::new(Arc::clone(&store));
        let id = engine
            .create_transaction(CreateTransaction::new("d1", "w1").with_customer("c1"))
            .await
            .unwrap()
            .correlation_id;
        store.fail_saves_for("c1");

        let report = engine
            .resolve_transaction(ResolveTransaction::new("w1", id))
            .await
            .unwrap();

        assert_eq!(report.archived_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(store.find("c1").unwrap().unwrap().find_current(&id).is_some());
    }

    #[tokio::test]
    async fn test_resolving_twice_is_not_found() {
        let engine = engine();
        let id = engine
            .create_transaction(CreateTransaction::new("d1", "w1"))
            .await
            .unwrap()
            .correlation_id;
        engine
            .resolve_transaction(ResolveTransaction::new("d1", id))
            .await
            .unwrap();

        let result = engine
            .resolve_transaction(ResolveTransaction::new("d1", id))
            .await;

        assert_eq!(result, Err(LedgerError::transaction_not_found("d1", id)));
    }

    #[tokio::test]
    async fn test_step_timeout() {
        let store = Arc::new(SlowStore {
            inner: MemoryParticipantStore::with_participants(participants()),
            delay: Duration::from_millis(300),
        });
        let engine =
            AsyncTransactionEngine::new(store).with_step_timeout(Duration::from_millis(20));

        let result = engine
            .create_transaction(CreateTransaction::new("d1", "w1"))
            .await;

        assert_eq!(result, Err(LedgerError::step_timeout("w1")));
    }
}
