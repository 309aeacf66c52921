//! In-memory participant store
//!
//! `MemoryParticipantStore` keeps participant records in a `DashMap`, which
//! shards its locking so operations on different participants proceed in
//! parallel. The version check in `save` runs while the record's entry is
//! locked, so a read-modify-write cycle that raced with another writer is
//! rejected instead of silently overwriting it.

use crate::core::traits::ParticipantStore;
use crate::types::{LedgerError, Participant};
use dashmap::DashMap;

/// Participant store backed by a concurrent hash map
#[derive(Debug, Default)]
pub struct MemoryParticipantStore {
    participants: DashMap<String, Participant>,
}

impl MemoryParticipantStore {
    pub fn new() -> Self {
        Self {
            participants: DashMap::new(),
        }
    }

    /// Build a store pre-populated with the given participants
    ///
    /// Later duplicates of an id are ignored.
    pub fn with_participants<I>(participants: I) -> Self
    where
        I: IntoIterator<Item = Participant>,
    {
        let store = Self::new();
        for participant in participants {
            store
                .participants
                .entry(participant.id.clone())
                .or_insert(participant);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl ParticipantStore for MemoryParticipantStore {
    fn find(&self, id: &str) -> Result<Option<Participant>, LedgerError> {
        Ok(self.participants.get(id).map(|entry| entry.value().clone()))
    }

    fn save(&self, participant: &Participant) -> Result<u64, LedgerError> {
        let mut entry = self
            .participants
            .get_mut(participant.id.as_str())
            .ok_or_else(|| LedgerError::participant_not_found(&participant.id))?;

        let stored = entry.value_mut();
        if stored.version != participant.version {
            return Err(LedgerError::version_conflict(
                &participant.id,
                participant.version,
                stored.version,
            ));
        }

        *stored = participant.clone();
        stored.version = participant.version + 1;
        Ok(stored.version)
    }

    fn insert(&self, participant: Participant) -> Result<(), LedgerError> {
        use dashmap::mapref::entry::Entry;

        match self.participants.entry(participant.id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::duplicate_participant(&participant.id)),
            Entry::Vacant(slot) => {
                slot.insert(participant);
                Ok(())
            }
        }
    }

    fn remove(&self, id: &str) -> Result<Option<Participant>, LedgerError> {
        Ok(self.participants.remove(id).map(|(_, participant)| participant))
    }

    fn list(&self) -> Result<Vec<Participant>, LedgerError> {
        Ok(self
            .participants
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
