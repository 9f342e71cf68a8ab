//! CLI auth/session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use crate::config_profiles::CliProfile;

use thankful_core::auth::{
    resolve_optional_auth_config, AuthClient, AuthResult, SessionPersistence, SignUpOutcome,
};
pub use thankful_core::auth::{AuthError, Session};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "thankful-cli";

#[derive(Clone)]
struct SessionStore {
    username: String,
}

impl SessionStore {
    fn new(profile_name: &str) -> Self {
        Self {
            username: format!("session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<Session>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<Session>> {
        let store = Self::test_store();
        let guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        if let Some(raw) = guard.get(&self.username) {
            Ok(Some(serde_json::from_str(raw)?))
        } else {
            Ok(None)
        }
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &Session) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &Session) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuthService {
    inner: AuthClient<SessionStore>,
}

impl AuthService {
    pub fn new_for_profile(profile_name: &str, profile: &CliProfile) -> AuthResult<Option<Self>> {
        let Some((url, anon_key)) =
            resolve_optional_auth_config(profile.supabase_url(), profile.supabase_anon_key())?
        else {
            return Ok(None);
        };

        Ok(Some(Self::new(profile_name, &url, &anon_key)?))
    }

    pub fn new(
        profile_name: &str,
        url: impl AsRef<str>,
        anon_key: impl AsRef<str>,
    ) -> AuthResult<Self> {
        Ok(Self {
            inner: AuthClient::new(
                url,
                anon_key.as_ref().to_string(),
                SessionStore::new(profile_name),
            )?,
        })
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AuthResult<SignUpOutcome> {
        self.inner.sign_up(email, password, display_name).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        self.inner.sign_in(email, password).await
    }

    pub async fn restore_session(&self) -> AuthResult<Option<Session>> {
        self.inner.restore_session().await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<Session> {
        self.inner.refresh_session(refresh_token).await
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        self.inner.sign_out(access_token).await
    }

    pub async fn recover_password(&self, email: &str) -> AuthResult<()> {
        self.inner.recover_password(email).await
    }

    pub fn google_authorize_url(&self, redirect_to: Option<&str>) -> String {
        self.inner.google_authorize_url(redirect_to)
    }

    pub async fn complete_oauth(&self, callback: &str) -> AuthResult<Session> {
        self.inner.complete_oauth(callback).await
    }
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<Session>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}
