// Supabase GoTrue identity provider
use crate::application::identity_provider::{IdentityProvider, SessionStore, SessionSubscription};
use crate::domain::errors::AuthError;
use crate::domain::session::{Session, SessionUser};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Refresh the access token once it is this close to expiring.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Clone)]
pub struct SupabaseAuth {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
    store: SessionStore,
    /// Held for the duration of a refresh so concurrent readers share one.
    refreshing: Arc<Mutex<()>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// GoTrue has used several error body layouts over time.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| "An unknown error occurred".to_string())
    }
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let expires_at = match self.expires_at.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
            Some(at) => at,
            None => Duration::try_seconds(self.expires_in)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| AuthError::Protocol(format!("expires_in out of range: {}", self.expires_in)))?,
        };

        Ok(Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: SessionUser {
                id: self.user.id,
                email: self.user.email,
            },
        })
    }
}

impl SupabaseAuth {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            http: reqwest::Client::new(),
            store: SessionStore::new(),
            refreshing: Arc::new(Mutex::new(())),
        }
    }

    fn token_url(&self, grant_type: &str) -> String {
        format!("{}/auth/v1/token?grant_type={}", self.base_url, grant_type)
    }

    async fn request_token(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.token_url(grant_type))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let error = response.json::<ErrorResponse>().await.unwrap_or_default();
            return Err(AuthError::InvalidCredentials(error.into_message()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Protocol(format!("status {}: {}", status, body)));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Protocol(e.to_string()))?;

        token.into_session(Utc::now())
    }

    /// Exchange the refresh token. The result only lands if `session` is still
    /// current, so a sign-out or new sign-in during the request wins.
    async fn refresh(&self, session: &Session) -> Option<Session> {
        let body = serde_json::json!({ "refresh_token": session.refresh_token });
        match self.request_token("refresh_token", body).await {
            Ok(refreshed) => {
                if self
                    .store
                    .replace_if_current(&session.refresh_token, Some(refreshed.clone()))
                {
                    tracing::debug!("Refreshed session for {}", refreshed.user.id);
                    return Some(refreshed);
                }
                tracing::debug!("Session changed during refresh, result discarded");
            }
            Err(AuthError::InvalidCredentials(reason)) => {
                if self.store.replace_if_current(&session.refresh_token, None) {
                    tracing::warn!("Session refresh rejected, signing out: {}", reason);
                }
            }
            Err(e) => {
                // Keep the current session; the backend will reject it if it has expired.
                tracing::error!("Session refresh failed: {}", e);
            }
        }
        self.store.get()
    }

    fn needs_refresh(session: &Session) -> bool {
        session.expires_within(Duration::seconds(REFRESH_MARGIN_SECS), Utc::now())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let session = self.request_token("password", body).await?;

        tracing::info!("Signed in as {}", email);
        self.store.set(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.store.get() else {
            return Ok(());
        };
        // The local session ends regardless of what the server says.
        self.store.set(None);

        let result = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(AuthError::Protocol(format!("logout returned {}", response.status()))),
            Err(e) => Err(AuthError::Transport(e.to_string())),
        }
    }

    async fn get_session(&self) -> Option<Session> {
        let session = self.store.get()?;
        if !Self::needs_refresh(&session) {
            return Some(session);
        }

        let _refreshing = self.refreshing.lock().await;
        // Another caller may have refreshed, or the operator signed out, while we waited.
        let session = self.store.get()?;
        if !Self::needs_refresh(&session) {
            return Some(session);
        }
        self.refresh(&session).await
    }

    fn subscribe(&self) -> SessionSubscription {
        self.store.subscribe()
    }
}
