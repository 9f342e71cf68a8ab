//! Remote store access: the `NoteStore` seam and the PostgREST client.
//!
//! The repository takes the remote store by dependency injection through the
//! `NoteStore` trait; `SupabaseClient` is the production implementation and
//! also carries typed accessors for the non-note tables.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{
    CommunityTemplate, Note, NoteDraft, NoteId, NoteKind, NotePatch, PrayerRequest, Profile,
    Streak, UserSettings,
};
use crate::util::{compact_text, is_http_url};

/// Note operations the repository needs from the remote store.
pub trait NoteStore {
    /// All notes owned by `user_id`, newest first.
    async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>>;

    /// Insert a note; returns the server-assigned row.
    async fn insert_note(&self, draft: &NoteDraft) -> Result<Note>;

    /// Patch a note, scoped by id and owner.
    async fn update_note(&self, id: &NoteId, user_id: &str, patch: &NotePatch) -> Result<Note>;

    /// Delete a note, scoped by id and owner.
    async fn delete_note(&self, id: &NoteId, user_id: &str) -> Result<()>;
}

/// Authenticated PostgREST client for the Thankful tables.
#[derive(Clone)]
pub struct SupabaseClient {
    rest_url: String,
    anon_key: String,
    access_token: String,
    client: reqwest::Client,
}

impl SupabaseClient {
    /// Build a client for the project at `url` with the signed-in user's
    /// access token.
    pub fn new(
        url: impl AsRef<str>,
        anon_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::InvalidInput("anon key must not be empty".into()));
        }

        Ok(Self {
            rest_url,
            anon_key,
            access_token: access_token.into(),
            client: reqwest::Client::builder().build()?,
        })
    }

    /// Profile row for `user_id`, if one exists.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let rows: Vec<Profile> = self
            .rows(
                self.request(Method::GET, "profiles")
                    .query(&[("id", format!("eq.{user_id}")), select_all()]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Server-maintained streaks for `user_id`, one row per note kind.
    pub async fn fetch_streaks(&self, user_id: &str) -> Result<Vec<Streak>> {
        self.rows(
            self.request(Method::GET, "streaks")
                .query(&[("user_id", format!("eq.{user_id}")), select_all()]),
        )
        .await
    }

    /// Settings row for `user_id`, if one exists.
    pub async fn fetch_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>> {
        let rows: Vec<UserSettings> = self
            .rows(
                self.request(Method::GET, "user_settings")
                    .query(&[("user_id", format!("eq.{user_id}")), select_all()]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Create or merge the settings row for its user.
    pub async fn upsert_user_settings(&self, settings: &UserSettings) -> Result<UserSettings> {
        let rows: Vec<UserSettings> = self
            .rows(
                self.request(Method::POST, "user_settings")
                    .query(&[("on_conflict", "user_id")])
                    .header(
                        "Prefer",
                        "resolution=merge-duplicates,return=representation",
                    )
                    .json(settings),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Remote("upsert returned no settings row".to_string()))
    }

    /// Prayer requests owned by `user_id`, newest first.
    pub async fn fetch_prayer_requests(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PrayerRequest>> {
        self.rows(self.request(Method::GET, "prayer_requests").query(&[
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
            select_all(),
        ]))
        .await
    }

    /// Community templates, optionally narrowed to one note kind.
    pub async fn fetch_community_templates(
        &self,
        kind: Option<NoteKind>,
    ) -> Result<Vec<CommunityTemplate>> {
        let mut request = self.request(Method::GET, "community_templates").query(&[
            ("order", "created_at.desc".to_string()),
            select_all(),
        ]);
        if let Some(kind) = kind {
            request = request.query(&[("type", format!("eq.{kind}"))]);
        }
        self.rows(request).await
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{table}", self.rest_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
    }

    async fn rows<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = self.checked(request).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn checked(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Remote(parse_api_error(status, &body)))
    }
}

impl NoteStore for SupabaseClient {
    async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        self.rows(self.request(Method::GET, "notes").query(&[
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.desc".to_string()),
            select_all(),
        ]))
        .await
    }

    async fn insert_note(&self, draft: &NoteDraft) -> Result<Note> {
        let rows: Vec<Note> = self
            .rows(
                self.request(Method::POST, "notes")
                    .header("Prefer", "return=representation")
                    .json(draft),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Remote("insert returned no note row".to_string()))
    }

    async fn update_note(&self, id: &NoteId, user_id: &str, patch: &NotePatch) -> Result<Note> {
        let rows: Vec<Note> = self
            .rows(
                self.request(Method::PATCH, "notes")
                    .query(&[
                        ("id", format!("eq.{id}")),
                        ("user_id", format!("eq.{user_id}")),
                    ])
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn delete_note(&self, id: &NoteId, user_id: &str) -> Result<()> {
        self.checked(self.request(Method::DELETE, "notes").query(&[
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{user_id}")),
        ]))
        .await?;
        Ok(())
    }
}

fn select_all() -> (&'static str, String) {
    ("select", "*".to_string())
}

/// Normalize a project URL into its PostgREST base.
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("project URL must not be empty".into()));
    }
    if !is_http_url(trimmed) {
        return Err(Error::InvalidInput(
            "project URL must include http:// or https://".into(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.details).or(payload.hint) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}
