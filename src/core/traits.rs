//! Core traits for participant storage and identifier generation
//!
//! These are the seams the engines are written against. Both the synchronous
//! and the asynchronous engine drive any [`ParticipantStore`], so a store
//! only has to provide per-record durability and an optimistic version check.

use crate::types::{CorrelationId, LedgerError, Participant};
use uuid::Uuid;

/// Key-value store of participant records
///
/// Each record is read and written independently: there is no multi-record
/// commit. Implementations must be safe to share across threads.
pub trait ParticipantStore: Send + Sync {
    /// Look up a participant by id
    ///
    /// Returns `Ok(None)` when the participant does not exist.
    fn find(&self, id: &str) -> Result<Option<Participant>, LedgerError>;

    /// Persist a participant record
    ///
    /// The stored version must equal `participant.version`; on success the
    /// stored version is incremented and the new version returned.
    ///
    /// # Errors
    ///
    /// - `ParticipantNotFound` if the record was removed in the meantime
    /// - `VersionConflict` if another writer saved first
    /// - `PersistenceFailure` if the write itself failed
    fn save(&self, participant: &Participant) -> Result<u64, LedgerError>;

    /// Register a new participant
    ///
    /// # Errors
    ///
    /// Returns `DuplicateParticipant` if the id is taken.
    fn insert(&self, participant: Participant) -> Result<(), LedgerError>;

    /// Delete a participant, returning the removed record if it existed
    fn remove(&self, id: &str) -> Result<Option<Participant>, LedgerError>;

    /// Every stored participant, in no particular order
    fn list(&self) -> Result<Vec<Participant>, LedgerError>;
}

/// Source of collision-resistant correlation ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> CorrelationId;
}

/// Random 128-bit (UUID v4) correlation ids
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> CorrelationId {
        Uuid::new_v4()
    }
}
