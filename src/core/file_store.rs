//! Directory-backed participant store
//!
//! Each participant is one JSON document (`<hex(id)>.json`) in a directory,
//! the same shape a document database would hold. Ids are hex-encoded so any
//! id maps to a file name inside the directory. A save writes the document to
//! a temporary file and renames it over the old one, so a reader only ever
//! sees a complete document. Nothing ties two documents together: a crash
//! between two saves leaves one participant updated and the other not, which
//! is exactly the partial state the engines are written to tolerate.

use crate::core::traits::ParticipantStore;
use crate::types::{LedgerError, Participant};
use dashmap::DashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Participant store holding one JSON file per participant
#[derive(Debug)]
pub struct FileParticipantStore {
    root: PathBuf,
    /// Serializes the version check and write for a single participant
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileParticipantStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", hex::encode(id)))
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(id.to_string()).or_default().value())
    }

    fn read_document(&self, path: &Path, id: &str) -> Result<Option<Participant>, LedgerError> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| LedgerError::persistence_failure(id, e.to_string())),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::persistence_failure(id, e.to_string())),
        }
    }

    fn write_document(&self, path: &Path, participant: &Participant) -> Result<(), LedgerError> {
        let id = participant.id.as_str();
        let bytes = serde_json::to_vec_pretty(participant)
            .map_err(|e| LedgerError::persistence_failure(id, e.to_string()))?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, bytes)
            .and_then(|_| fs::rename(&staging, path))
            .map_err(|e| LedgerError::persistence_failure(id, e.to_string()))
    }
}

impl ParticipantStore for FileParticipantStore {
    fn find(&self, id: &str) -> Result<Option<Participant>, LedgerError> {
        let path = self.document_path(id);
        self.read_document(&path, id)
    }

    fn save(&self, participant: &Participant) -> Result<u64, LedgerError> {
        let id = participant.id.as_str();
        let path = self.document_path(id);
        let lock = self.lock_for(id);
        let _guard = lock
            .lock()
            .map_err(|_| LedgerError::persistence_failure(id, "document lock poisoned"))?;

        let stored = self
            .read_document(&path, id)?
            .ok_or_else(|| LedgerError::participant_not_found(id))?;
        if stored.version != participant.version {
            return Err(LedgerError::version_conflict(
                id,
                participant.version,
                stored.version,
            ));
        }

        let mut next = participant.clone();
        next.version += 1;
        self.write_document(&path, &next)?;
        debug!(participant = id, version = next.version, "saved participant document");
        Ok(next.version)
    }

    fn insert(&self, participant: Participant) -> Result<(), LedgerError> {
        let id = participant.id.clone();
        let path = self.document_path(&id);
        let lock = self.lock_for(&id);
        let _guard = lock
            .lock()
            .map_err(|_| LedgerError::persistence_failure(&id, "document lock poisoned"))?;

        if path.exists() {
            return Err(LedgerError::duplicate_participant(&id));
        }
        self.write_document(&path, &participant)
    }

    fn remove(&self, id: &str) -> Result<Option<Participant>, LedgerError> {
        let path = self.document_path(id);
        let lock = self.lock_for(id);
        let _guard = lock
            .lock()
            .map_err(|_| LedgerError::persistence_failure(id, "document lock poisoned"))?;

        let existing = self.read_document(&path, id)?;
        if existing.is_some() {
            fs::remove_file(&path).map_err(|e| LedgerError::persistence_failure(id, e.to_string()))?;
        }
        Ok(existing)
    }

    fn list(&self) -> Result<Vec<Participant>, LedgerError> {
        let mut participants = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| hex::decode(stem).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok())
            else {
                continue;
            };
            if let Some(participant) = self.read_document(&path, &id)? {
                participants.push(participant);
            }
        }
        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CopyRole, Role, TransactionCopy};
    use tempfile::tempdir;
    use uuid::Uuid;

    fn designer() -> Participant {
        Participant::new("d1", "Dana", "Doyle", Role::Designer)
    }

    #[test]
    fn test_documents_survive_reopen() {
        let dir = tempdir().unwrap();
        let id = Uuid::new_v4();
        {
            let store = FileParticipantStore::open(dir.path()).unwrap();
            store.insert(designer()).unwrap();
            let mut participant = store.find("d1").unwrap().unwrap();
            participant
                .push_current(TransactionCopy {
                    correlation_id: id,
                    role: CopyRole::CreatedBy,
                    created_by_id: "d1".to_string(),
                    created_by_name: "Dana Doyle".to_string(),
                    created_for_id: "w1".to_string(),
                    created_for_name: "Wes Wood".to_string(),
                    customer: None,
                    images: vec!["uploads/a.jpg".to_string()],
                    description: Some("fix shelf".to_string()),
                })
                .unwrap();
            store.save(&participant).unwrap();
        }

        let reopened = FileParticipantStore::open(dir.path()).unwrap();
        let participant = reopened.find("d1").unwrap().unwrap();

        assert_eq!(participant.version, 1);
        assert!(participant.find_current(&id).is_some());
    }

    #[test]
    fn test_save_rejects_stale_version() {
        let dir = tempdir().unwrap();
        let store = FileParticipantStore::open(dir.path()).unwrap();
        store.insert(designer()).unwrap();
        let snapshot = store.find("d1").unwrap().unwrap();

        store.save(&snapshot).unwrap();
        let result = store.save(&snapshot);

        assert_eq!(result, Err(LedgerError::version_conflict("d1", 0, 1)));
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let dir = tempdir().unwrap();
        let store = FileParticipantStore::open(dir.path()).unwrap();
        store.insert(designer()).unwrap();

        assert_eq!(
            store.insert(designer()),
            Err(LedgerError::duplicate_participant("d1"))
        );
    }

    #[test]
    fn test_ids_with_path_characters_stay_inside_the_directory() {
        let dir = tempdir().unwrap();
        let store = FileParticipantStore::open(dir.path()).unwrap();

        assert_eq!(store.find("../etc/passwd").unwrap(), None);
        assert_eq!(store.find("no.such").unwrap(), None);

        for id in ["d.1", "dana@example.com", "../d1"] {
            store
                .insert(Participant::new(id, "Dana", "Doyle", Role::Designer))
                .unwrap();
            assert_eq!(store.find(id).unwrap().map(|p| p.id), Some(id.to_string()));
        }

        let mut ids: Vec<_> = store.list().unwrap().into_iter().map(|p| p.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["../d1", "d.1", "dana@example.com"]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_list_skips_foreign_files() {
        let dir = tempdir().unwrap();
        let store = FileParticipantStore::open(dir.path()).unwrap();
        store.insert(designer()).unwrap();
        fs::write(dir.path().join("notes.json"), b"{}").unwrap();
        fs::write(dir.path().join("readme.txt"), b"hello").unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|p| p.id).collect();

        assert_eq!(ids, vec!["d1"]);
    }

    #[test]
    fn test_concurrent_saves_on_one_document_only_one_wins() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileParticipantStore::open(dir.path()).unwrap());
        store.insert(designer()).unwrap();
        let snapshot = store.find("d1").unwrap().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let snapshot = snapshot.clone();
                std::thread::spawn(move || store.save(&snapshot).is_ok())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(store.find("d1").unwrap().unwrap().version, 1);
    }

    #[test]
    fn test_list_and_remove() {
        let dir = tempdir().unwrap();
        let store = FileParticipantStore::open(dir.path()).unwrap();
        store.insert(designer()).unwrap();
        store
            .insert(Participant::new("w1", "Wes", "Wood", Role::Worker))
            .unwrap();

        assert_eq!(store.list().unwrap().len(), 2);

        let removed = store.remove("w1").unwrap();
        assert_eq!(removed.map(|p| p.id), Some("w1".to_string()));
        assert!(store.remove("w1").unwrap().is_none());
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
