//! Note model

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// String prefix carried by the wire form of a locally-assigned id.
const LOCAL_ID_PREFIX: &str = "offline_";

/// A note identifier.
///
/// A note is either server-confirmed (`Synced`, UUID assigned by the remote
/// store) or locally pending (`Local`, millisecond timestamp assigned by the
/// offline vault). The variant is the single source of truth for sync status;
/// the `offline_<ms>` string form exists only at the serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteId {
    /// Server-assigned identity
    Synced(Uuid),
    /// Vault-assigned identity, Unix ms at creation
    Local(i64),
}

impl NoteId {
    /// Whether this id was assigned by the offline vault.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Whether this id was assigned by the remote store.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }
}

/// Error returned when a note id string cannot be parsed.
#[derive(Debug, Error)]
#[error("invalid note id: {0}")]
pub struct ParseNoteIdError(String);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synced(uuid) => write!(f, "{uuid}"),
            Self::Local(ms) => write!(f, "{LOCAL_ID_PREFIX}{ms}"),
        }
    }
}

impl FromStr for NoteId {
    type Err = ParseNoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(raw) = s.strip_prefix(LOCAL_ID_PREFIX) {
            return raw
                .parse::<i64>()
                .map(Self::Local)
                .map_err(|_| ParseNoteIdError(s.to_string()));
        }
        Uuid::parse_str(s)
            .map(Self::Synced)
            .map_err(|_| ParseNoteIdError(s.to_string()))
    }
}

impl Serialize for NoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The fixed set of journal entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Gratitude,
    Sermon,
    Prayer,
}

impl NoteKind {
    /// Lowercase wire name, as stored in the `type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gratitude => "gratitude",
            Self::Sermon => "sermon",
            Self::Prayer => "prayer",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gratitude" => Ok(Self::Gratitude),
            "sermon" => Ok(Self::Sermon),
            "prayer" => Ok(Self::Prayer),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown note kind: {other}"
            ))),
        }
    }
}

/// A user-authored journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier; the variant carries the sync status
    pub id: NoteId,
    /// Owner id (auth user id)
    pub user_id: String,
    /// Entry kind
    #[serde(rename = "type")]
    pub kind: NoteKind,
    /// Short title
    pub title: String,
    /// Free-text body
    pub content: String,
    /// Tag set, lowercase
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Favorite flag
    #[serde(default)]
    pub is_favorite: bool,
    /// Shared-with-community flag
    #[serde(default)]
    pub is_public: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Materialize a vault-assigned note from a draft.
    ///
    /// Both timestamps are set to `now`; the caller supplies the synthetic
    /// local id.
    #[must_use]
    pub fn from_draft_local(draft: NoteDraft, local_id_ms: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: NoteId::Local(local_id_ms),
            user_id: draft.user_id,
            kind: draft.kind,
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            is_favorite: false,
            is_public: draft.is_public,
            created_at: now,
            updated_at: now,
        }
    }

    /// First line of the content, truncated to `max_len` characters.
    #[must_use]
    pub fn content_preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// Input to a note create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl NoteDraft {
    /// Create a draft with tags extracted from the content.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        kind: NoteKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let tags = extract_tags(&content);
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            content,
            tags,
            is_public: false,
        }
    }

    /// Mark the draft as shared with the community.
    #[must_use]
    pub const fn public(mut self) -> Self {
        self.is_public = true;
        self
    }
}

/// Partial update applied to an existing note. `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl NotePatch {
    /// Patch that only flips the favorite flag.
    #[must_use]
    pub const fn favorite(value: bool) -> Self {
        Self {
            title: None,
            content: None,
            tags: None,
            is_favorite: Some(value),
            is_public: None,
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.is_favorite.is_none()
            && self.is_public.is_none()
    }
}

/// Extract #tags from text.
///
/// Valid tags match the pattern `#[a-zA-Z][a-zA-Z0-9_-]*` and are returned
/// lowercase and deduplicated.
#[must_use]
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    let re = Regex::new(r"#([a-zA-Z][a-zA-Z0-9_-]*)").expect("Invalid regex");
    re.captures_iter(text)
        .map(|cap| cap[1].to_lowercase())
        .collect()
}

/// Sort notes by creation time, newest first.
///
/// The sort is stable; equal timestamps keep their incoming order.
pub fn sort_notes_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
