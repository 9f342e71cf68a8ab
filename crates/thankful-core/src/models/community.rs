//! Community content models: prayer requests and shared templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::note::NoteKind;

/// A prayer request shared by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerRequest {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_answered: bool,
    pub created_at: DateTime<Utc>,
}

/// A community-curated note template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityTemplate {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
