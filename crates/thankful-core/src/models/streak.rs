//! Streak model (maintained server-side, read-only here)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::note::NoteKind;

/// Consecutive-day journaling count for one note kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub current_count: u32,
    pub longest_count: u32,
    #[serde(default)]
    pub last_entry_date: Option<NaiveDate>,
}

impl Streak {
    /// Whether the streak is still running as of `today`.
    ///
    /// The server keeps counts; the client only decides display freshness.
    /// A streak is alive if the last entry was today or yesterday.
    #[must_use]
    pub fn is_alive(&self, today: NaiveDate) -> bool {
        self.last_entry_date
            .is_some_and(|last| (today - last).num_days() <= 1)
    }
}
