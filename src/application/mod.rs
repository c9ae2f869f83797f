// Application layer - Use cases and the ports they depend on
pub mod aggregation_client;
pub mod analytics_panel;
pub mod chart_adapter;
pub mod dashboard_shell;
pub mod identity_provider;
pub mod session_gate;
