// Application state for HTTP handlers
use crate::application::dashboard_shell::DashboardShell;
use crate::application::identity_provider::IdentityProvider;
use crate::application::session_gate::SessionGate;
use std::sync::Arc;

pub struct AppState {
    pub gate: SessionGate,
    pub shell: DashboardShell,
    pub identity: Arc<dyn IdentityProvider>,
}
