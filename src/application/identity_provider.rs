// Identity provider trait and session-change notifications
use crate::domain::errors::AuthError;
use crate::domain::session::Session;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Ends the session. The local session is cleared even if the remote call fails.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Current session, if any.
    async fn get_session(&self) -> Option<Session>;

    /// Session-change notifications. Dropping the subscription unsubscribes.
    fn subscribe(&self) -> SessionSubscription;
}

/// A live subscription to session changes.
pub struct SessionSubscription {
    inner: BroadcastStream<Option<Session>>,
}

impl SessionSubscription {
    /// Next session change, or `None` once the provider has gone away.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        loop {
            match self.inner.next().await? {
                Ok(session) => return Some(session),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("Session subscriber lagged, skipped {} notifications", skipped);
                }
            }
        }
    }
}

/// In-memory session holder that notifies subscribers on every change.
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    changes: broadcast::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            current: Arc::new(RwLock::new(None)),
            changes,
        }
    }

    pub fn get(&self) -> Option<Session> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, session: Option<Session>) {
        match self.current.write() {
            Ok(mut guard) => *guard = session.clone(),
            Err(poisoned) => *poisoned.into_inner() = session.clone(),
        }
        // No subscribers is fine.
        let _ = self.changes.send(session);
    }

    /// Replace the session only while it still holds `refresh_token`. Returns whether it did.
    pub fn replace_if_current(&self, refresh_token: &str, session: Option<Session>) -> bool {
        {
            let mut guard = match self.current.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match guard.as_ref() {
                Some(current) if current.refresh_token == refresh_token => *guard = session.clone(),
                _ => return false,
            }
        }
        let _ = self.changes.send(session);
        true
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            inner: BroadcastStream::new(self.changes.subscribe()),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
