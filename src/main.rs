// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::chart_adapter::DateLabeler;
use crate::application::dashboard_shell::DashboardShell;
use crate::application::session_gate::SessionGate;
use crate::infrastructure::config::{load_app_config, load_panels_config};
use crate::infrastructure::supabase_auth::SupabaseAuth;
use crate::infrastructure::supabase_rpc::SupabaseRpcClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{dashboard, health_check, login, logout, session_state, stream_dashboard};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;
    let panels_config = load_panels_config()?;
    let labeler = DateLabeler::new(&app_config.labels.date_format, app_config.labels.offset()?)?;

    // Identity provider and remote procedure client (infrastructure layer)
    let identity = Arc::new(SupabaseAuth::new(
        app_config.supabase.url.clone(),
        app_config.supabase.anon_key.clone(),
    ));
    let client = Arc::new(SupabaseRpcClient::new(
        app_config.supabase.url,
        app_config.supabase.anon_key,
        identity.clone(),
    ));

    // Shell and gate (application layer)
    let shell = DashboardShell::new(&panels_config, client, labeler, identity.clone());
    let gate = SessionGate::start(identity.clone());

    let state = Arc::new(AppState {
        gate,
        shell,
        identity,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/session", get(session_state))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/stream", get(stream_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = app_config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", app_config.server.bind))?;
    tracing::info!("Starting campusmind-dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
