//! Note repository: the single source of truth for the signed-in user's
//! notes, reconciling the remote store with the offline vault.
//!
//! Reads route on connectivity; creates attempt remote first and fall back to
//! the vault; updates and deletes are remote-only and surface their errors.

use serde::Serialize;

use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::models::{
    sort_notes_newest_first, Note, NoteDraft, NoteId, NotePatch, PendingOp, PendingSync,
};
use crate::offline::OfflineVault;
use crate::remote::NoteStore;

/// Outcome of an explicit ledger replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Entries uploaded and removed from the ledger
    pub pushed: usize,
    /// Entries that failed and remain queued
    pub failed: usize,
}

/// In-memory view over remote and offline notes for one user.
pub struct NoteRepository<S: NoteStore> {
    store: S,
    vault: OfflineVault,
    connectivity: ConnectivityMonitor,
    user_id: String,
    notes: Vec<Note>,
    loading: bool,
    error: Option<String>,
}

impl<S: NoteStore> NoteRepository<S> {
    pub fn new(
        store: S,
        vault: OfflineVault,
        connectivity: ConnectivityMonitor,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            vault,
            connectivity,
            user_id: user_id.into(),
            notes: Vec::new(),
            loading: false,
            error: None,
        }
    }

    /// The current merged list, as of the last fetch or write.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// The signed-in user this repository is scoped to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the last failed remote call, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Refresh the merged list.
    ///
    /// Online: remote notes for the user plus the whole vault, re-sorted
    /// newest first. Offline, or when the remote call fails: vault contents
    /// only, with the failure recorded in `last_error`. Only vault failures
    /// return `Err`.
    pub async fn fetch_notes(&mut self) -> Result<&[Note]> {
        self.loading = true;
        self.error = None;

        let merged = if self.connectivity.is_online() {
            match self.store.fetch_notes(&self.user_id).await {
                Ok(mut remote) => {
                    remote.extend(self.vault.offline_notes()?);
                    sort_notes_newest_first(&mut remote);
                    remote
                }
                Err(error) => {
                    tracing::warn!("Remote fetch failed, serving offline notes: {error}");
                    self.error = Some(error.to_string());
                    self.vault.offline_notes()?
                }
            }
        } else {
            self.vault.offline_notes()?
        };

        self.notes = merged;
        self.loading = false;
        Ok(&self.notes)
    }

    /// Create a note, remote-first.
    ///
    /// The caller always gets a note back: a server row when the insert
    /// succeeds, an `offline_`-id note from the vault when the device is
    /// offline or the insert fails. Durability is only guaranteed on the
    /// remote path.
    pub async fn create_note(&mut self, draft: NoteDraft) -> Result<Note> {
        let note = if self.connectivity.is_online() {
            match self.store.insert_note(&draft).await {
                Ok(row) => row,
                Err(error) => {
                    tracing::warn!("Remote insert failed, capturing offline: {error}");
                    self.vault.save_offline_note(draft)?
                }
            }
        } else {
            self.vault.save_offline_note(draft)?
        };

        self.notes.insert(0, note.clone());
        Ok(note)
    }

    /// Patch a note in the remote store. No offline fallback: failures
    /// surface to the caller and nothing is queued.
    pub async fn update_note(&mut self, id: &NoteId, patch: &NotePatch) -> Result<Note> {
        let updated = self.store.update_note(id, &self.user_id, patch).await?;
        if let Some(slot) = self.notes.iter_mut().find(|note| note.id == *id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// Delete a note in the remote store. No offline fallback.
    pub async fn delete_note(&mut self, id: &NoteId) -> Result<()> {
        self.store.delete_note(id, &self.user_id).await?;
        self.notes.retain(|note| note.id != *id);
        Ok(())
    }

    /// Flip the favorite flag with a single remote update.
    pub async fn toggle_favorite(&mut self, id: &NoteId) -> Result<Note> {
        let current = self
            .notes
            .iter()
            .find(|note| note.id == *id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let patch = NotePatch::favorite(!current.is_favorite);
        self.update_note(id, &patch).await
    }

    /// Whether any offline mutation is still awaiting upload.
    pub fn has_pending(&self) -> Result<bool> {
        self.vault.has_pending()
    }

    /// Number of offline mutations awaiting upload.
    pub fn pending_count(&self) -> Result<usize> {
        self.vault.pending_count()
    }

    /// Explicitly replay the pending-sync ledger against the remote store.
    ///
    /// Each entry that uploads is removed from the ledger; once the ledger is
    /// empty the vault is cleared, every cached note now being confirmed
    /// remote. Never triggered by a connectivity change: the operator asks
    /// for it.
    pub async fn push_pending(&mut self) -> Result<DrainReport> {
        let mut report = DrainReport::default();

        for entry in self.vault.pending_syncs()? {
            match self.replay(&entry).await {
                Ok(()) => {
                    self.vault.remove_pending(&entry.note_id)?;
                    report.pushed += 1;
                }
                Err(error) => {
                    tracing::warn!("Replay failed for {}: {error}", entry.note_id);
                    self.error = Some(error.to_string());
                    report.failed += 1;
                }
            }
        }

        if report.pushed > 0 && !self.vault.has_pending()? {
            self.vault.clear_offline_notes()?;
            self.fetch_notes().await?;
        }

        Ok(report)
    }

    async fn replay(&self, entry: &PendingSync) -> Result<()> {
        match entry.op {
            PendingOp::Create => {
                let draft = NoteDraft {
                    user_id: entry.payload.user_id.clone(),
                    kind: entry.payload.kind,
                    title: entry.payload.title.clone(),
                    content: entry.payload.content.clone(),
                    tags: entry.payload.tags.clone(),
                    is_public: entry.payload.is_public,
                };
                self.store.insert_note(&draft).await.map(|_| ())
            }
            PendingOp::Update => {
                let patch = NotePatch {
                    title: Some(entry.payload.title.clone()),
                    content: Some(entry.payload.content.clone()),
                    tags: Some(entry.payload.tags.clone()),
                    is_favorite: Some(entry.payload.is_favorite),
                    is_public: Some(entry.payload.is_public),
                };
                self.store
                    .update_note(&entry.note_id, &self.user_id, &patch)
                    .await
                    .map(|_| ())
            }
            PendingOp::Delete => self.store.delete_note(&entry.note_id, &self.user_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::*;
    use crate::models::NoteKind;

    #[derive(Default)]
    struct FakeState {
        rows: Vec<Note>,
        insert_calls: usize,
        update_calls: Vec<(NoteId, NotePatch)>,
        delete_calls: Vec<NoteId>,
        fail_fetch: bool,
        fail_insert: bool,
        fail_update: bool,
        fail_delete: bool,
    }

    #[derive(Clone, Default)]
    struct FakeNoteStore {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeNoteStore {
        fn with_rows(rows: Vec<Note>) -> Self {
            let store = Self::default();
            store.state.lock().unwrap().rows = rows;
            store
        }

        fn failing(fail: impl Fn(&mut FakeState)) -> Self {
            let store = Self::default();
            fail(&mut store.state.lock().unwrap());
            store
        }
    }

    impl NoteStore for FakeNoteStore {
        async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>> {
            let state = self.state.lock().unwrap();
            if state.fail_fetch {
                return Err(Error::Remote("fetch refused".to_string()));
            }
            let mut rows: Vec<Note> = state
                .rows
                .iter()
                .filter(|note| note.user_id == user_id)
                .cloned()
                .collect();
            sort_notes_newest_first(&mut rows);
            Ok(rows)
        }

        async fn insert_note(&self, draft: &NoteDraft) -> Result<Note> {
            let mut state = self.state.lock().unwrap();
            if state.fail_insert {
                return Err(Error::Remote("insert refused".to_string()));
            }
            state.insert_calls += 1;
            let now = Utc::now();
            let note = Note {
                id: NoteId::Synced(Uuid::new_v4()),
                user_id: draft.user_id.clone(),
                kind: draft.kind,
                title: draft.title.clone(),
                content: draft.content.clone(),
                tags: draft.tags.clone(),
                is_favorite: false,
                is_public: draft.is_public,
                created_at: now,
                updated_at: now,
            };
            state.rows.push(note.clone());
            Ok(note)
        }

        async fn update_note(&self, id: &NoteId, user_id: &str, patch: &NotePatch) -> Result<Note> {
            let mut state = self.state.lock().unwrap();
            if state.fail_update {
                return Err(Error::Remote("update refused".to_string()));
            }
            state.update_calls.push((*id, patch.clone()));
            let row = state
                .rows
                .iter_mut()
                .find(|note| note.id == *id && note.user_id == user_id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            if let Some(title) = &patch.title {
                row.title.clone_from(title);
            }
            if let Some(content) = &patch.content {
                row.content.clone_from(content);
            }
            if let Some(tags) = &patch.tags {
                row.tags.clone_from(tags);
            }
            if let Some(favorite) = patch.is_favorite {
                row.is_favorite = favorite;
            }
            if let Some(public) = patch.is_public {
                row.is_public = public;
            }
            row.updated_at = Utc::now();
            Ok(row.clone())
        }

        async fn delete_note(&self, id: &NoteId, user_id: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_delete {
                return Err(Error::Remote("delete refused".to_string()));
            }
            state.delete_calls.push(*id);
            state
                .rows
                .retain(|note| !(note.id == *id && note.user_id == user_id));
            Ok(())
        }
    }

    fn vault() -> (TempDir, OfflineVault) {
        let dir = TempDir::new().unwrap();
        let vault = OfflineVault::open(dir.path()).unwrap();
        (dir, vault)
    }

    fn remote_note(user_id: &str, hours_ago: i64) -> Note {
        let created = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
            - Duration::hours(hours_ago);
        Note {
            id: NoteId::Synced(Uuid::new_v4()),
            user_id: user_id.to_string(),
            kind: NoteKind::Gratitude,
            title: format!("remote-{hours_ago}"),
            content: "C".to_string(),
            tags: std::collections::BTreeSet::new(),
            is_favorite: false,
            is_public: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn draft(user_id: &str) -> NoteDraft {
        NoteDraft::new(user_id, NoteKind::Gratitude, "T", "C")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn online_fetch_merges_remote_and_vault_newest_first() {
        let (_dir, vault) = vault();
        let offline = vault.save_offline_note(draft("u1")).unwrap();
        let old = remote_note("u1", 5);
        let new = remote_note("u1", 1);
        let store = FakeNoteStore::with_rows(vec![old.clone(), new.clone()]);

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(true), "u1");
        let notes = repo.fetch_notes().await.unwrap();

        // The offline note was just created, so it is newest.
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].id, offline.id);
        assert_eq!(notes[1].id, new.id);
        assert_eq!(notes[2].id, old.id);
        assert!(repo.last_error().is_none());
        assert!(!repo.is_loading());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_fetch_serves_vault_only() {
        let (_dir, vault) = vault();
        let offline = vault.save_offline_note(draft("u1")).unwrap();
        let store = FakeNoteStore::with_rows(vec![remote_note("u1", 1)]);

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(false), "u1");
        let notes = repo.fetch_notes().await.unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, offline.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_fetch_falls_back_to_vault_and_records_error() {
        let (_dir, vault) = vault();
        vault.save_offline_note(draft("u1")).unwrap();
        let store = FakeNoteStore::failing(|state| state.fail_fetch = true);

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(true), "u1");
        let notes = repo.fetch_notes().await.unwrap();

        assert_eq!(notes.len(), 1);
        assert!(repo.last_error().unwrap().contains("fetch refused"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn error_resets_at_the_start_of_every_fetch() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::failing(|state| state.fail_fetch = true);

        let mut repo = NoteRepository::new(
            store.clone(),
            vault,
            ConnectivityMonitor::new(true),
            "u1",
        );
        repo.fetch_notes().await.unwrap();
        assert!(repo.last_error().is_some());

        store.state.lock().unwrap().fail_fetch = false;
        repo.fetch_notes().await.unwrap();
        assert!(repo.last_error().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn online_create_inserts_remotely_and_leaves_ledger_alone() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::default();

        let mut repo = NoteRepository::new(
            store.clone(),
            vault,
            ConnectivityMonitor::new(true),
            "u1",
        );
        let note = repo.create_note(draft("u1")).await.unwrap();

        assert!(note.id.is_synced());
        assert_eq!(repo.notes()[0].id, note.id);
        assert!(!repo.has_pending().unwrap());
        assert_eq!(store.state.lock().unwrap().insert_calls, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_create_captures_to_vault_and_queues() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::default();

        let mut repo = NoteRepository::new(
            store.clone(),
            vault,
            ConnectivityMonitor::new(false),
            "u1",
        );
        let note = repo.create_note(draft("u1")).await.unwrap();

        assert!(note.id.is_local());
        assert_eq!(repo.notes()[0].id, note.id);
        assert!(repo.has_pending().unwrap());
        assert_eq!(store.state.lock().unwrap().insert_calls, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_insert_falls_back_to_vault() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::failing(|state| state.fail_insert = true);

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(true), "u1");
        let note = repo.create_note(draft("u1")).await.unwrap();

        assert!(note.id.is_local());
        assert_eq!(repo.pending_count().unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_has_no_offline_fallback() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::failing(|state| state.fail_update = true);

        let mut repo = NoteRepository::new(
            store.clone(),
            vault,
            ConnectivityMonitor::new(false),
            "u1",
        );
        let error = repo
            .update_note(&NoteId::Local(1), &NotePatch::favorite(true))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Remote(_)));
        assert!(!repo.has_pending().unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_has_no_offline_fallback() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::failing(|state| state.fail_delete = true);

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(false), "u1");
        let error = repo.delete_note(&NoteId::Local(1)).await.unwrap_err();

        assert!(matches!(error, Error::Remote(_)));
        assert!(!repo.has_pending().unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_removes_from_the_merged_list() {
        let (_dir, vault) = vault();
        let row = remote_note("u1", 1);
        let store = FakeNoteStore::with_rows(vec![row.clone()]);

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(true), "u1");
        repo.fetch_notes().await.unwrap();
        repo.delete_note(&row.id).await.unwrap();

        assert!(repo.notes().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn toggle_favorite_makes_exactly_one_update_call() {
        let (_dir, vault) = vault();
        let row = remote_note("u1", 1);
        let store = FakeNoteStore::with_rows(vec![row.clone()]);

        let mut repo = NoteRepository::new(
            store.clone(),
            vault,
            ConnectivityMonitor::new(true),
            "u1",
        );
        repo.fetch_notes().await.unwrap();
        assert!(!repo.notes()[0].is_favorite);

        let flipped = repo.toggle_favorite(&row.id).await.unwrap();

        assert!(flipped.is_favorite);
        assert!(repo.notes()[0].is_favorite);
        let calls = store.state.lock().unwrap().update_calls.clone();
        assert_eq!(calls, vec![(row.id, NotePatch::favorite(true))]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn toggle_favorite_unknown_note_is_not_found() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::default();

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(true), "u1");
        let error = repo.toggle_favorite(&NoteId::Local(9)).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_pending_replays_creates_and_clears_the_vault() {
        let (_dir, vault) = vault();
        vault.save_offline_note(draft("u1")).unwrap();
        vault.save_offline_note(draft("u1")).unwrap();
        let store = FakeNoteStore::default();

        let mut repo = NoteRepository::new(
            store.clone(),
            vault,
            ConnectivityMonitor::new(true),
            "u1",
        );
        let report = repo.push_pending().await.unwrap();

        assert_eq!(report, DrainReport { pushed: 2, failed: 0 });
        assert_eq!(store.state.lock().unwrap().insert_calls, 2);
        assert!(!repo.has_pending().unwrap());
        // The vault was cleared and the list refetched: every note is synced.
        assert_eq!(repo.notes().len(), 2);
        assert!(repo.notes().iter().all(|note| note.id.is_synced()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_pending_keeps_failed_entries_queued() {
        let (_dir, vault) = vault();
        vault.save_offline_note(draft("u1")).unwrap();
        let store = FakeNoteStore::failing(|state| state.fail_insert = true);

        let mut repo = NoteRepository::new(
            store.clone(),
            vault,
            ConnectivityMonitor::new(true),
            "u1",
        );
        let report = repo.push_pending().await.unwrap();

        assert_eq!(report, DrainReport { pushed: 0, failed: 1 });
        assert!(repo.has_pending().unwrap());
        // The cache keeps the note for a later retry.
        assert_eq!(repo.vault.offline_notes().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_pending_on_empty_ledger_is_a_noop() {
        let (_dir, vault) = vault();
        let store = FakeNoteStore::default();

        let mut repo =
            NoteRepository::new(store, vault, ConnectivityMonitor::new(true), "u1");
        let report = repo.push_pending().await.unwrap();
        assert_eq!(report, DrainReport::default());
    }
}
