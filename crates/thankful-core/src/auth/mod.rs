//! GoTrue auth client: email/password, Google OAuth, password recovery.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::normalize_text_option;

const EXPIRY_SKEW_SECONDS: i64 = 60;

/// The signed-in user, as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// An authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token is expired (with a fixed skew allowance).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Outcome of a sign-up attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Autoconfirm is on; the user is signed in immediately.
    SignedIn(Session),
    /// A confirmation email was sent; no session yet.
    ConfirmationRequired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth is not configured.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Invalid auth callback: {0}")]
    InvalidCallback(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where sessions are persisted between invocations (keychain in the CLI,
/// an in-memory map in tests).
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<Session>>;
    fn save_session(&self, session: &Session) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Auth client bound to one project and one session store.
#[derive(Clone)]
pub struct AuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> AuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url,
            anon_key,
            client: Client::builder().build()?,
            store,
        })
    }

    /// Load the persisted session, refreshing it if expired.
    ///
    /// A session that can no longer be refreshed is cleared, not surfaced as
    /// an error.
    pub async fn restore_session(&self) -> AuthResult<Option<Session>> {
        let Some(stored) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored.is_expired() {
            return Ok(Some(stored));
        }

        match self.refresh_session(&stored.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    /// Register a new account. The display name travels as user metadata and
    /// lands in the `profiles` row.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AuthResult<SignUpOutcome> {
        validate_credentials(email, password)?;

        let mut payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        if let Some(name) = normalize_text_option(display_name.map(str::to_string)) {
            payload["data"] = serde_json::json!({ "display_name": name });
        }

        let response = self
            .send(
                self.public_request(
                    self.client
                        .post(format!("{}/signup", self.auth_url))
                        .json(&payload),
                ),
            )
            .await?;

        match response.into_session()? {
            Some(session) => {
                self.store.save_session(&session)?;
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response = self
            .send(
                self.public_request(
                    self.client
                        .post(format!("{}/token", self.auth_url))
                        .query(&[("grant_type", "password")])
                        .json(&payload),
                ),
            )
            .await?;

        let session = response.into_session()?.ok_or_else(|| {
            AuthError::Api("Sign-in response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<Session> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "refresh token must not be empty",
            ));
        }

        let payload = serde_json::json!({ "refresh_token": refresh_token });
        let response = self
            .send(
                self.public_request(
                    self.client
                        .post(format!("{}/token", self.auth_url))
                        .query(&[("grant_type", "refresh_token")])
                        .json(&payload),
                ),
            )
            .await?;

        let session = response.into_session()?.ok_or_else(|| {
            AuthError::Api("Refresh response did not include an active session".to_string())
        })?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let request = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        let response = request.send().await?;
        if !(response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED) {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        self.store.clear_session()?;
        Ok(())
    }

    /// Request a password-reset email. Succeeds whether or not the address is
    /// registered; the service does not disclose which.
    pub async fn recover_password(&self, email: &str) -> AuthResult<()> {
        if email.trim().is_empty() {
            return Err(AuthError::Api("Email is required".to_string()));
        }

        let payload = serde_json::json!({ "email": email });
        let request = self.public_request(
            self.client
                .post(format!("{}/recover", self.auth_url))
                .json(&payload),
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(())
    }

    /// URL the user opens in a browser to start the Google OAuth flow.
    #[must_use]
    pub fn google_authorize_url(&self, redirect_to: Option<&str>) -> String {
        let mut url = format!("{}/authorize?provider=google", self.auth_url);
        if let Some(redirect) = normalize_text_option(redirect_to.map(str::to_string)) {
            url.push_str("&redirect_to=");
            url.push_str(&urlencoding::encode(&redirect));
        }
        url
    }

    /// The signed-in user behind `access_token`.
    pub async fn fetch_user(&self, access_token: &str) -> AuthResult<AuthUser> {
        let request = self
            .client
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<GoTrueUser>().await?.into())
    }

    /// Finish an OAuth redirect: parse the callback fragment, resolve the
    /// user, persist and return the session.
    pub async fn complete_oauth(&self, callback: &str) -> AuthResult<Session> {
        let tokens = parse_callback_fragment(callback)?;
        let user = self.fetch_user(&tokens.access_token).await?;

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
            user,
        };
        self.store.save_session(&session)?;
        Ok(session)
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send(&self, request: RequestBuilder) -> AuthResult<TokenResponse> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}

/// Tokens carried in an OAuth callback URL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Parse the fragment of an auth-callback redirect.
///
/// Accepts a full URL or a bare fragment with or without the leading `#`.
/// Both the locale-prefixed and the legacy callback shapes carry the same
/// token parameters.
pub fn parse_callback_fragment(callback: &str) -> AuthResult<CallbackTokens> {
    let fragment = callback
        .split_once('#')
        .map_or(callback, |(_, fragment)| fragment);

    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_at = None;
    let mut expires_in = None;

    for pair in fragment.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value)
            .map_err(|error| AuthError::InvalidCallback(error.to_string()))?
            .into_owned();
        match key {
            "access_token" => access_token = Some(value),
            "refresh_token" => refresh_token = Some(value),
            "expires_at" => expires_at = value.parse::<i64>().ok(),
            "expires_in" => expires_in = value.parse::<i64>().ok(),
            _ => {}
        }
    }

    let access_token = access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidCallback("missing access_token".to_string()))?;
    let refresh_token = refresh_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidCallback("missing refresh_token".to_string()))?;
    let expires_at = expires_at
        .or_else(|| expires_in.map(|seconds| unix_timestamp_now().saturating_add(seconds)))
        .ok_or_else(|| AuthError::InvalidCallback("missing expires_at/expires_in".to_string()))?;

    Ok(CallbackTokens {
        access_token,
        refresh_token,
        expires_at,
    })
}

/// Normalize a project URL into its GoTrue base.
pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "project URL must not be empty",
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AuthError::InvalidConfiguration(
            "project URL must include http:// or https://",
        ));
    }
    if trimmed.ends_with("/auth/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/auth/v1"))
    }
}

/// Resolve an optional URL/key pair: both present, both absent, or an error.
pub fn resolve_optional_auth_config(
    url: Option<String>,
    anon_key: Option<String>,
) -> AuthResult<Option<(String, String)>> {
    let url = normalize_text_option(url);
    let anon_key = normalize_text_option(anon_key);

    match (url, anon_key) {
        (None, None) => Ok(None),
        (Some(url), Some(anon_key)) => Ok(Some((url, anon_key))),
        _ => Err(AuthError::NotConfigured),
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
}

impl TokenResponse {
    fn into_session(self) -> AuthResult<Option<Session>> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|seconds| unix_timestamp_now().saturating_add(seconds))
        });

        match (self.access_token, self.refresh_token, expires_at, self.user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(Session {
                    access_token,
                    refresh_token,
                    expires_at,
                    user: user.into(),
                }))
            }
            (None, None, None, Some(_)) => Ok(None),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(value: GoTrueUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<GoTrueErrorBody>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn unix_timestamp_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| {
            i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_auth_url_appends_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn normalize_auth_url_keeps_existing_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co/auth/v1").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn callback_fragment_parses_from_full_url() {
        let callback = "https://app.example.com/auth/callback#access_token=at&refresh_token=rt&expires_at=1800000000&token_type=bearer";
        let tokens = parse_callback_fragment(callback).unwrap();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token, "rt");
        assert_eq!(tokens.expires_at, 1_800_000_000);
    }

    #[test]
    fn callback_fragment_derives_expiry_from_expires_in() {
        let tokens = parse_callback_fragment("access_token=at&refresh_token=rt&expires_in=3600")
            .unwrap();
        assert!(tokens.expires_at > unix_timestamp_now());
    }

    #[test]
    fn callback_fragment_rejects_missing_tokens() {
        let error = parse_callback_fragment("#refresh_token=rt&expires_in=3600").unwrap_err();
        assert!(matches!(error, AuthError::InvalidCallback(_)));
    }

    #[test]
    fn response_without_session_fields_means_confirmation_required() {
        let raw = r#"{"user": {"id": "user", "email": "user@example.com"}}"#;
        let response: TokenResponse = serde_json::from_str(raw).unwrap();
        assert!(response.into_session().unwrap().is_none());
    }

    #[test]
    fn partial_session_fields_are_an_error() {
        let raw = r#"{"access_token": "at", "user": {"id": "user", "email": null}}"#;
        let response: TokenResponse = serde_json::from_str(raw).unwrap();
        assert!(response.into_session().is_err());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = Session {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "user".to_string(),
                email: None,
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn google_authorize_url_encodes_redirect() {
        let store = NullStore;
        let client = AuthClient::new("https://demo.supabase.co", "anon", store).unwrap();
        let url = client.google_authorize_url(Some("https://app.example.com/auth/callback"));
        assert_eq!(
            url,
            "https://demo.supabase.co/auth/v1/authorize?provider=google&redirect_to=https%3A%2F%2Fapp.example.com%2Fauth%2Fcallback"
        );

        let bare = client.google_authorize_url(None);
        assert_eq!(
            bare,
            "https://demo.supabase.co/auth/v1/authorize?provider=google"
        );
    }

    #[derive(Clone)]
    struct NullStore;

    impl SessionPersistence for NullStore {
        fn load_session(&self) -> AuthResult<Option<Session>> {
            Ok(None)
        }
        fn save_session(&self, _session: &Session) -> AuthResult<()> {
            Ok(())
        }
        fn clear_session(&self) -> AuthResult<()> {
            Ok(())
        }
    }
}
