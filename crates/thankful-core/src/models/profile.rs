//! Profile and per-user settings models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's public profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Display name, falling back to the email local part, then "anonymous".
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("anonymous")
            .to_string()
    }
}

/// Per-user settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub daily_reminder: bool,
    pub updated_at: DateTime<Utc>,
}

fn default_locale() -> String {
    "en".to_string()
}

impl UserSettings {
    /// Fresh settings for a user, stamped `now`.
    #[must_use]
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            locale: default_locale(),
            daily_reminder: false,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_display_name() {
        let profile = Profile {
            id: Uuid::new_v4(),
            email: Some("grace@example.com".to_string()),
            display_name: Some("Grace".to_string()),
            avatar_url: None,
            created_at: Utc::now(),
        };
        assert_eq!(profile.label(), "Grace");
    }

    #[test]
    fn label_falls_back_to_email_local_part() {
        let profile = Profile {
            id: Uuid::new_v4(),
            email: Some("grace@example.com".to_string()),
            display_name: None,
            avatar_url: None,
            created_at: Utc::now(),
        };
        assert_eq!(profile.label(), "grace");
    }

    #[test]
    fn settings_default_locale_applies_on_decode() {
        let raw = format!(
            "{{\"user_id\":\"u1\",\"updated_at\":\"{}\"}}",
            Utc::now().to_rfc3339()
        );
        let settings: UserSettings = serde_json::from_str(&raw).unwrap();
        assert_eq!(settings.locale, "en");
        assert!(!settings.daily_reminder);
    }
}
