//! Offline vault: the local note cache and the pending-sync ledger.
//!
//! Two JSON-array documents under the data directory, read and written
//! wholesale: `thankful_offline_notes.json` holds notes captured while
//! disconnected, `thankful_pending_syncs.json` holds the mutations awaiting
//! upload. Storage failures propagate to the caller; nothing is swallowed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Note, NoteDraft, NoteId, PendingSync};

const OFFLINE_NOTES_KEY: &str = "thankful_offline_notes";
const PENDING_SYNCS_KEY: &str = "thankful_pending_syncs";

/// Durable device-scoped store for offline notes and their ledger.
///
/// The vault is scoped to one device, not one account: reads return the whole
/// cache unfiltered. Mutations serialize behind an in-process mutex; there is
/// no cross-process arbitration.
pub struct OfflineVault {
    dir: PathBuf,
    // Guards read-modify-write cycles; holds the last issued local id (ms)
    // so back-to-back saves in the same millisecond still get distinct ids.
    write_state: Mutex<i64>,
}

impl OfflineVault {
    /// Open (creating if needed) a vault under `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_state: Mutex::new(0),
        })
    }

    /// Persist a note written while offline.
    ///
    /// Assigns a synthetic `offline_<ms>` id and both timestamps, appends the
    /// note to the cache, and enqueues a matching Create entry in the ledger.
    /// No uniqueness check: duplicate submissions produce duplicate entries.
    pub fn save_offline_note(&self, draft: NoteDraft) -> Result<Note> {
        let mut last_id = self.lock_writes();
        let now = Utc::now();
        let id_ms = now.timestamp_millis().max(*last_id + 1);
        *last_id = id_ms;

        let note = Note::from_draft_local(draft, id_ms, now);

        let mut notes = self.read_list::<Note>(OFFLINE_NOTES_KEY)?;
        notes.push(note.clone());
        self.write_list(OFFLINE_NOTES_KEY, &notes)?;

        let mut ledger = self.read_list::<PendingSync>(PENDING_SYNCS_KEY)?;
        ledger.push(PendingSync::create(note.clone(), now));
        self.write_list(PENDING_SYNCS_KEY, &ledger)?;

        Ok(note)
    }

    /// The full cached note list; empty if nothing was ever stored.
    pub fn offline_notes(&self) -> Result<Vec<Note>> {
        self.read_list(OFFLINE_NOTES_KEY)
    }

    /// Erase both the note cache and the pending-sync ledger.
    ///
    /// Intended to run only after every cached note is confirmed uploaded;
    /// the vault itself never calls this.
    pub fn clear_offline_notes(&self) -> Result<()> {
        let _guard = self.lock_writes();
        self.write_list::<Note>(OFFLINE_NOTES_KEY, &[])?;
        self.write_list::<PendingSync>(PENDING_SYNCS_KEY, &[])?;
        Ok(())
    }

    /// Append an entry to the pending-sync ledger.
    pub fn add_pending(&self, entry: PendingSync) -> Result<()> {
        let _guard = self.lock_writes();
        let mut ledger = self.read_list::<PendingSync>(PENDING_SYNCS_KEY)?;
        ledger.push(entry);
        self.write_list(PENDING_SYNCS_KEY, &ledger)
    }

    /// Remove the ledger entries targeting `note_id`.
    ///
    /// An unknown id leaves the ledger unchanged; this is not an error.
    pub fn remove_pending(&self, note_id: &NoteId) -> Result<()> {
        let _guard = self.lock_writes();
        let mut ledger = self.read_list::<PendingSync>(PENDING_SYNCS_KEY)?;
        ledger.retain(|entry| entry.note_id != *note_id);
        self.write_list(PENDING_SYNCS_KEY, &ledger)
    }

    /// The full ledger, oldest first.
    pub fn pending_syncs(&self) -> Result<Vec<PendingSync>> {
        self.read_list(PENDING_SYNCS_KEY)
    }

    /// Whether any mutation is still awaiting upload.
    pub fn has_pending(&self) -> Result<bool> {
        Ok(!self.pending_syncs()?.is_empty())
    }

    /// Number of mutations awaiting upload.
    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.pending_syncs()?.len())
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, i64> {
        self.write_state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read_list<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_list<T: serde::Serialize>(&self, key: &str, list: &[T]) -> Result<()> {
        let path = self.key_path(key);
        let serialized = serde_json::to_string_pretty(list)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

/// Default vault location under a platform data directory.
#[must_use]
pub fn vault_dir_under(data_dir: &Path) -> PathBuf {
    data_dir.join("thankful")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteKind, PendingOp};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn draft() -> NoteDraft {
        NoteDraft::new("u1", NoteKind::Gratitude, "T", "C")
    }

    #[test]
    fn save_appends_note_and_ledger_entry() {
        let dir = tempdir().unwrap();
        let vault = OfflineVault::open(dir.path()).unwrap();

        let note = vault.save_offline_note(draft()).unwrap();
        assert!(note.id.is_local());

        let cached = vault.offline_notes().unwrap();
        assert_eq!(cached, vec![note.clone()]);
        assert!(vault.has_pending().unwrap());

        let ledger = vault.pending_syncs().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].note_id, note.id);
        assert_eq!(ledger[0].op, PendingOp::Create);
    }

    #[test]
    fn back_to_back_saves_get_distinct_offline_ids() {
        let dir = tempdir().unwrap();
        let vault = OfflineVault::open(dir.path()).unwrap();

        let first = vault.save_offline_note(draft()).unwrap();
        let second = vault.save_offline_note(draft()).unwrap();

        assert_ne!(first.id, second.id);
        assert!(first.id.to_string().starts_with("offline_"));
        assert!(second.id.to_string().starts_with("offline_"));
        assert_eq!(vault.offline_notes().unwrap().len(), 2);
        assert_eq!(vault.pending_count().unwrap(), 2);
    }

    #[test]
    fn empty_vault_reads_as_empty_lists() {
        let dir = tempdir().unwrap();
        let vault = OfflineVault::open(dir.path()).unwrap();

        assert!(vault.offline_notes().unwrap().is_empty());
        assert!(vault.pending_syncs().unwrap().is_empty());
        assert!(!vault.has_pending().unwrap());
        assert_eq!(vault.pending_count().unwrap(), 0);
    }

    #[test]
    fn clear_empties_cache_and_ledger_unconditionally() {
        let dir = tempdir().unwrap();
        let vault = OfflineVault::open(dir.path()).unwrap();
        vault.save_offline_note(draft()).unwrap();
        vault.save_offline_note(draft()).unwrap();

        vault.clear_offline_notes().unwrap();

        assert!(vault.offline_notes().unwrap().is_empty());
        assert!(vault.pending_syncs().unwrap().is_empty());
    }

    #[test]
    fn remove_pending_unknown_id_is_a_noop() {
        let dir = tempdir().unwrap();
        let vault = OfflineVault::open(dir.path()).unwrap();
        vault.save_offline_note(draft()).unwrap();

        vault.remove_pending(&NoteId::Local(1)).unwrap();
        assert_eq!(vault.pending_count().unwrap(), 1);
    }

    #[test]
    fn remove_pending_filters_matching_entries() {
        let dir = tempdir().unwrap();
        let vault = OfflineVault::open(dir.path()).unwrap();
        let note = vault.save_offline_note(draft()).unwrap();
        let keep = vault.save_offline_note(draft()).unwrap();

        vault.remove_pending(&note.id).unwrap();

        let ledger = vault.pending_syncs().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].note_id, keep.id);
        // Removing a ledger entry does not touch the note cache.
        assert_eq!(vault.offline_notes().unwrap().len(), 2);
    }

    #[test]
    fn vault_survives_reopen() {
        let dir = tempdir().unwrap();
        let note = {
            let vault = OfflineVault::open(dir.path()).unwrap();
            vault.save_offline_note(draft()).unwrap()
        };

        let reopened = OfflineVault::open(dir.path()).unwrap();
        assert_eq!(reopened.offline_notes().unwrap(), vec![note]);
        assert!(reopened.has_pending().unwrap());
    }
}
