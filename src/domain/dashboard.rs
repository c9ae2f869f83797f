// Dashboard page domain model
use super::panel::PanelView;
use serde::{Deserialize, Serialize};

/// Single-selection navigation. `Overview` shows every panel at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Overview,
    Screening,
    Appointments,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Dashboard",
            Tab::Screening => "Screening Analytics",
            Tab::Appointments => "Appointment Analytics",
        }
    }

    /// Whether a panel assigned to `panel_tab` is shown on this tab.
    pub fn shows(&self, panel_tab: Tab) -> bool {
        *self == Tab::Overview || *self == panel_tab
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub tab: Tab,
    pub ready: bool,
    /// Empty until the page is ready; one page-level indicator stands in for them.
    pub panels: Vec<PanelView>,
}

impl DashboardView {
    pub fn new(tab: Tab, ready: bool, panels: Vec<PanelView>) -> Self {
        let panels = if ready { panels } else { Vec::new() };
        Self {
            title: tab.title().to_string(),
            tab,
            ready,
            panels,
        }
    }
}
