//! Fault-injecting store used by unit tests

use crate::core::participant_store::MemoryParticipantStore;
use crate::core::traits::ParticipantStore;
use crate::types::{LedgerError, Participant};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// In-memory store whose saves can be made to fail or conflict on demand
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryParticipantStore,
    failing: Mutex<HashSet<String>>,
    conflicts: AtomicU32,
}

impl FlakyStore {
    pub fn with_participants<I>(participants: I) -> Self
    where
        I: IntoIterator<Item = Participant>,
    {
        Self {
            inner: MemoryParticipantStore::with_participants(participants),
            ..Self::default()
        }
    }

    /// Every save of this participant fails with `PersistenceFailure`
    pub fn fail_saves_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    /// The next `count` saves (of any participant) report a version conflict
    pub fn inject_conflicts(&self, count: u32) {
        self.conflicts.store(count, Ordering::SeqCst);
    }
}

impl ParticipantStore for FlakyStore {
    fn find(&self, id: &str) -> Result<Option<Participant>, LedgerError> {
        self.inner.find(id)
    }

    fn save(&self, participant: &Participant) -> Result<u64, LedgerError> {
        if self.failing.lock().unwrap().contains(&participant.id) {
            return Err(LedgerError::persistence_failure(
                &participant.id,
                "injected write failure",
            ));
        }
        let pending = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Err(LedgerError::version_conflict(
                &participant.id,
                participant.version,
                participant.version + 1,
            ));
        }
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
