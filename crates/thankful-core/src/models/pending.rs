//! Pending-sync ledger entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::note::{Note, NoteId};

/// The kind of mutation a ledger entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingOp {
    Create,
    Update,
    Delete,
}

/// An undelivered mutation intent.
///
/// One entry is appended per offline write; the ledger is never deduplicated
/// or compacted, so retrying the same note twice produces two entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSync {
    /// Target note id
    pub note_id: NoteId,
    /// Mutation kind
    pub op: PendingOp,
    /// Snapshot of the note at enqueue time
    pub payload: Note,
    /// Enqueue timestamp
    pub created_at: DateTime<Utc>,
}

impl PendingSync {
    /// Entry recording an offline create of `note`, stamped `now`.
    #[must_use]
    pub fn create(note: Note, now: DateTime<Utc>) -> Self {
        Self {
            note_id: note.id,
            op: PendingOp::Create,
            payload: note,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{NoteDraft, NoteKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn create_entry_snapshots_the_note() {
        let now = Utc::now();
        let draft = NoteDraft::new("u1", NoteKind::Prayer, "T", "C");
        let note = Note::from_draft_local(draft, 7, now);
        let entry = PendingSync::create(note.clone(), now);

        assert_eq!(entry.note_id, note.id);
        assert_eq!(entry.op, PendingOp::Create);
        assert_eq!(entry.payload, note);
    }

    #[test]
    fn entry_round_trips_through_json() {
        let now = Utc::now();
        let draft = NoteDraft::new("u1", NoteKind::Gratitude, "T", "C");
        let entry = PendingSync::create(Note::from_draft_local(draft, 9, now), now);

        let json = serde_json::to_string(&entry).unwrap();
        let back: PendingSync = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
