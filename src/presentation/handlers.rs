// HTTP request handlers
use crate::domain::dashboard::Tab;
use crate::domain::session::{GateState, SessionUser};
use crate::infrastructure::chunked_json::ndjson_stream;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Upper bound on waiting for the gate to follow a sign-in or sign-out.
const GATE_FOLLOW_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Deserialize)]
pub struct TabQuery {
    pub tab: Option<Tab>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: SessionUser,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current gate state
pub async fn session_state(State(state): State<Arc<AppState>>) -> Json<GateState> {
    Json(state.gate.state())
}

/// Password sign-in. Rejections come back as an inline message; the operator can retry.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    match state.gate.state() {
        GateState::Unknown => return Err(ApiError::SessionPending),
        GateState::Authenticated { .. } => return Ok(Redirect::to("/dashboard").into_response()),
        GateState::Unauthenticated => {}
    }

    let session = state
        .identity
        .sign_in_with_password(&request.email, &request.password)
        .await?;

    // The gate learns about the new session asynchronously; answer once it has.
    follow_gate(state.gate.watch(), GateState::is_authenticated).await;

    Ok(Json(LoginResponse { user: session.user }).into_response())
}

/// Sign out; the gate follows the resulting session change.
pub async fn logout(State(state): State<Arc<AppState>>) -> StatusCode {
    state.shell.sign_out().await;

    follow_gate(state.gate.watch(), |s| !s.is_authenticated()).await;
    StatusCode::NO_CONTENT
}

/// Wait briefly for the gate to reach `reached`. The watch only keeps the latest
/// state, so a transition that is immediately undone may never be observed.
async fn follow_gate(mut gate: watch::Receiver<GateState>, reached: impl FnMut(&GateState) -> bool) {
    match tokio::time::timeout(GATE_FOLLOW_TIMEOUT, gate.wait_for(reached)).await {
        Ok(Ok(_)) => {}
        Ok(Err(_)) => tracing::warn!("Session gate stopped"),
        Err(_) => tracing::warn!("Session gate did not follow within {:?}", GATE_FOLLOW_TIMEOUT),
    }
}

/// Whole page once every panel has settled
pub async fn dashboard(
    Query(query): Query<TabQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    ApiError::require_session(&state.gate.state())?;

    let tab = query.tab.unwrap_or_default();
    let view = state.shell.mount(tab).settled().await;

    Ok(match json_response(&view, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    })
}

/// Stream the page progressively as panels settle
pub async fn stream_dashboard(
    Query(query): Query<TabQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    ApiError::require_session(&state.gate.state())?;

    let tab = query.tab.unwrap_or_default();
    Ok(ndjson_stream(state.shell.mount(tab).into_events()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregation_client::fake::{FakeAggregationClient, Reply};
    use crate::application::chart_adapter::DateLabeler;
    use crate::application::dashboard_shell::DashboardShell;
    use crate::application::identity_provider::fake::{FakeIdentity, PASSWORD};
    use crate::application::identity_provider::{IdentityProvider, SessionSubscription};
    use crate::application::session_gate::SessionGate;
    use crate::domain::errors::AuthError;
    use crate::domain::session::Session;
    use crate::infrastructure::config::PanelsConfig;
    use async_trait::async_trait;
    use axum::http::header;
    use serde_json::{json, Value};

    async fn app(identity: FakeIdentity) -> Arc<AppState> {
        app_with(Arc::new(identity)).await
    }

    async fn app_with(identity: Arc<dyn IdentityProvider>) -> Arc<AppState> {
        let client = FakeAggregationClient::default()
            .with(
                "get_appointments_by_status",
                Reply::Rows(vec![
                    json!({"status": "Completed", "count": 12}),
                    json!({"status": "Cancelled", "count": 3}),
                ]),
            )
            .with("get_screening_distribution", Reply::Fail)
            .with("get_daily_screening_volume", Reply::Rows(vec![]));

        let shell = DashboardShell::new(
            &PanelsConfig::standard(),
            Arc::new(client),
            DateLabeler::default(),
            identity.clone(),
        );
        let gate = SessionGate::start(identity.clone());
        gate.resolved().await;

        Arc::new(AppState { gate, shell, identity })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn rejected(result: Result<Response, ApiError>) -> Response {
        match result {
            Err(e) => e.into_response(),
            Ok(_) => panic!("expected the request to be rejected"),
        }
    }

    fn login_request(password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            email: "ops@campus.edu".to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let state = app(FakeIdentity::default()).await;
        let result = dashboard(Query(TabQuery { tab: None }), HeaderMap::new(), State(state)).await;

        let response = rejected(result);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_failed_login_is_inline_and_retryable() {
        let state = app(FakeIdentity::default()).await;

        let response = rejected(login(State(state.clone()), login_request("wrong")).await);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Invalid login credentials");

        let response = login(State(state.clone()), login_request(PASSWORD)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user"]["email"], "ops@campus.edu");
        assert!(state.gate.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_when_signed_in_redirects() {
        let state = app(FakeIdentity::signed_in("ops@campus.edu")).await;
        let response = login(State(state), login_request(PASSWORD)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard");
    }

    #[tokio::test]
    async fn test_dashboard_snapshot() {
        let state = app(FakeIdentity::signed_in("ops@campus.edu")).await;
        let response = dashboard(Query(TabQuery { tab: None }), HeaderMap::new(), State(state))
            .await
            .unwrap();
        let page = body_json(response).await;

        assert_eq!(page["ready"], true);
        assert_eq!(page["tab"], "overview");

        let screening = &page["panels"][0];
        assert_eq!(screening["state"], "ready");
        assert_eq!(screening["charts"][0]["status"], "no_data");
        assert_eq!(screening["charts"][1]["status"], "chart");
        assert_eq!(screening["charts"][1]["message"], "No data available");

        let appointments = &page["panels"][1];
        assert_eq!(appointments["charts"][0]["data"]["labels"], json!(["Completed", "Cancelled"]));
        assert_eq!(appointments["charts"][0]["data"]["datasets"][0]["data"], json!([12.0, 3.0]));
    }

    #[tokio::test]
    async fn test_stream_dashboard_lines() {
        let state = app(FakeIdentity::signed_in("ops@campus.edu")).await;
        let response = stream_dashboard(Query(TabQuery { tab: Some(Tab::Appointments) }), State(state))
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let events: Vec<Value> = bytes
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_slice(line).unwrap())
            .collect();

        let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["skeleton", "panel", "complete"]);
        assert_eq!(events[1]["panel"]["id"], "appointments");
    }

    #[tokio::test]
    async fn test_logout_moves_gate() {
        let state = app(FakeIdentity::signed_in("ops@campus.edu")).await;
        let changes = state.gate.watch();

        assert_eq!(logout(State(state.clone())).await, StatusCode::NO_CONTENT);
        assert_eq!(state.gate.state(), GateState::Unauthenticated);
        assert!(changes.has_changed().unwrap());
    }

    /// Signs in, then loses the session before the caller can look at the gate.
    struct RevokedIdentity(FakeIdentity);

    #[async_trait]
    impl IdentityProvider for RevokedIdentity {
        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            let session = self.0.sign_in_with_password(email, password).await?;
            self.0.store.set(None);
            Ok(session)
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.0.sign_out().await
        }

        async fn get_session(&self) -> Option<Session> {
            self.0.get_session().await
        }

        fn subscribe(&self) -> SessionSubscription {
            self.0.subscribe()
        }
    }

    #[tokio::test]
    async fn test_login_returns_when_session_is_lost_immediately() {
        let state = app_with(Arc::new(RevokedIdentity(FakeIdentity::default()))).await;

        let response = tokio::time::timeout(
            GATE_FOLLOW_TIMEOUT + Duration::from_secs(1),
            login(State(state.clone()), login_request(PASSWORD)),
        )
        .await
        .expect("login must not wait on the gate forever")
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.gate.state().is_authenticated());
    }
}
