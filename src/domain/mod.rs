// Domain layer - Pure view models and error taxonomy
pub mod aggregation;
pub mod chart;
pub mod dashboard;
pub mod errors;
pub mod panel;
pub mod session;
