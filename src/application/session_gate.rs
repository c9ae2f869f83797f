// Session gate - Tracks whether the operator may see the dashboard
use crate::application::identity_provider::IdentityProvider;
use crate::domain::session::{GateState, Session};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// `Unknown` until the initial session check completes, then follows every
/// session-change notification. Dropping the gate releases its subscription.
pub struct SessionGate {
    state: watch::Receiver<GateState>,
    listener: JoinHandle<()>,
}

impl SessionGate {
    pub fn start(identity: Arc<dyn IdentityProvider>) -> Self {
        let (tx, state) = watch::channel(GateState::Unknown);
        // Subscribe before the initial check so no change slips in between.
        let mut subscription = identity.subscribe();

        let listener = tokio::spawn(async move {
            let initial = identity.get_session().await;
            apply(&tx, initial.as_ref());

            while let Some(session) = subscription.next().await {
                apply(&tx, session.as_ref());
            }
            tracing::debug!("Session notifications ended");
        });

        Self { state, listener }
    }

    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    /// Wait for the initial session check.
    pub async fn resolved(&self) -> GateState {
        let mut state = self.state.clone();
        match state.wait_for(|s| *s != GateState::Unknown).await {
            Ok(resolved) => resolved.clone(),
            Err(_) => self.state(),
        }
    }

    pub fn watch(&self) -> watch::Receiver<GateState> {
        self.state.clone()
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Move the gate for `session`; returns whether the state actually changed.
fn apply(tx: &watch::Sender<GateState>, session: Option<&Session>) -> bool {
    let next = GateState::from_session(session);
    let changed = tx.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next.clone();
        true
    });

    if changed {
        tracing::info!("Session gate is now {:?}", next);
    }
    changed
}
