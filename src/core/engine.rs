//! Transaction engine
//!
//! This module provides the TransactionEngine that orchestrates the two
//! state transitions of a transaction by coordinating the fan-out and
//! resolution steps against a participant store.
//!
//! The engine enforces the consistency policy:
//! - every participant involved is resolved before a fan-out writes anything
//! - copies are written participant by participant; a failure after the
//!   first write is reported as a partial fan-out, never rolled back
//! - on resolution the initiator's move must succeed; propagation to the
//!   other participants is best-effort and reported, not raised

use crate::core::consistency::{ResolutionReport, RetryPolicy};
use crate::core::fanout::{deliver, plan_fan_out};
use crate::core::resolution::resolve;
use crate::core::traits::{IdGenerator, ParticipantStore, RandomIdGenerator};
use crate::types::{CreateTransaction, LedgerError, ResolveTransaction, TransactionCopy};
use std::sync::Arc;

/// Synchronous transaction engine
///
/// Runs every storage step on the calling thread, one participant after
/// another.
pub struct TransactionEngine<S: ParticipantStore + ?Sized, G: IdGenerator = RandomIdGenerator> {
    store: Arc<S>,
    ids: G,
    retry: RetryPolicy,
}

impl<S: ParticipantStore + ?Sized> TransactionEngine<S> {
    /// Create an engine over a shared store with random correlation ids
    pub fn new(store: Arc<S>) -> Self {
        TransactionEngine {
            store,
            ids: RandomIdGenerator,
            retry: RetryPolicy::default(),
        }
    }
}

impl<S: ParticipantStore + ?Sized, G: IdGenerator> TransactionEngine<S, G> {
    /// Replace the correlation id source
    pub fn with_id_generator<H: IdGenerator>(self, ids: H) -> TransactionEngine<S, H> {
        TransactionEngine {
            store: self.store,
            ids,
            retry: self.retry,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create a transaction and write a copy into every participant involved
    ///
    /// # Returns
    ///
    /// The canonical record; every stored copy matches it apart from its
    /// role tag.
    ///
    /// # Errors
    ///
    /// - `InvalidReference` if the creator, target or customer is unknown
    ///   (nothing written)
    /// - `PartialFanOut` if a write failed after earlier copies landed
    /// - the failing step's own error if nothing was written
    pub fn create_transaction(
        &self,
        request: CreateTransaction,
    ) -> Result<TransactionCopy, LedgerError> {
        let plan = plan_fan_out(self.store.as_ref(), &request, self.ids.next_id())?;
        deliver(self.store.as_ref(), plan, &self.retry)
    }

    /// Resolve a transaction on behalf of one of its participants
    ///
    /// # Errors
    ///
    /// - `ParticipantNotFound` if the initiator is unknown
    /// - `TransactionNotFound` if the initiator holds no current copy,
    ///   including when it was already resolved
    /// - a persistence failure on the initiator's save
    pub fn resolve_transaction(
        &self,
        request: ResolveTransaction,
    ) -> Result<ResolutionReport, LedgerError> {
        resolve(self.store.as_ref(), &request, &self.retry)
    }
}
