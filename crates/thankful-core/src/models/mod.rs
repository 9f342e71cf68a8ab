//! Data models for Thankful

mod community;
mod note;
mod pending;
mod profile;
mod streak;

pub use community::{CommunityTemplate, PrayerRequest};
pub use note::{
    extract_tags, sort_notes_newest_first, Note, NoteDraft, NoteId, NoteKind, NotePatch,
    ParseNoteIdError,
};
pub use pending::{PendingOp, PendingSync};
pub use profile::{Profile, UserSettings};
pub use streak::Streak;
