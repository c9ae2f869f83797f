// Dashboard shell - Mounts panels per tab, tracks page readiness, owns sign-out
use crate::application::aggregation_client::AggregationClient;
use crate::application::analytics_panel::{AnalyticsPanel, PanelHandle, PanelSpec};
use crate::application::chart_adapter::DateLabeler;
use crate::application::identity_provider::IdentityProvider;
use crate::domain::dashboard::{DashboardView, Tab};
use crate::domain::panel::PanelView;
use crate::infrastructure::config::PanelsConfig;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct DashboardShell {
    panels: Vec<Arc<PanelSpec>>,
    client: Arc<dyn AggregationClient>,
    labeler: Arc<DateLabeler>,
    identity: Arc<dyn IdentityProvider>,
}

impl DashboardShell {
    pub fn new(
        panels: &PanelsConfig,
        client: Arc<dyn AggregationClient>,
        labeler: DateLabeler,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            panels: panels
                .panels
                .iter()
                .map(|p| Arc::new(PanelSpec::from_config(p)))
                .collect(),
            client,
            labeler: Arc::new(labeler),
            identity,
        }
    }

    /// Mount the panels shown on `tab`. Each starts fetching immediately.
    pub fn mount(&self, tab: Tab) -> MountedDashboard {
        let panels: Vec<PanelHandle> = self
            .panels
            .iter()
            .filter(|spec| tab.shows(spec.tab))
            .map(|spec| AnalyticsPanel::new(spec.clone(), self.client.clone(), self.labeler.clone()).mount())
            .collect();

        tracing::debug!("Mounted {} panels for tab {:?}", panels.len(), tab);

        MountedDashboard {
            tab,
            panels,
            started: Instant::now(),
        }
    }

    /// Sign out. Errors are logged; the identity provider clears the session either way.
    pub async fn sign_out(&self) {
        if let Err(e) = self.identity.sign_out().await {
            tracing::warn!("Sign-out request failed: {}", e);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelSkeleton {
    pub id: String,
    pub title: String,
}

/// Progressive page events, in delivery order: one skeleton, one event per panel, completion.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    Skeleton {
        tab: Tab,
        title: String,
        panels: Vec<PanelSkeleton>,
    },
    Panel {
        panel: PanelView,
    },
    Complete {
        panels: usize,
        duration_ms: u64,
    },
}

pub struct MountedDashboard {
    tab: Tab,
    panels: Vec<PanelHandle>,
    started: Instant,
}

impl MountedDashboard {
    /// True only when no mounted panel is still loading.
    pub fn is_ready(&self) -> bool {
        self.panels.iter().all(|p| !p.state().is_loading())
    }

    /// Wait for every panel to settle, then return the full page.
    pub async fn settled(mut self) -> DashboardView {
        let mut settled = Vec::with_capacity(self.panels.len());
        for panel in self.panels.iter_mut() {
            settled.push(panel.settled().await);
        }
        tracing::debug!(
            "Dashboard {:?} ready in {}ms",
            self.tab,
            self.started.elapsed().as_millis()
        );
        DashboardView::new(self.tab, self.is_ready(), settled)
    }

    /// Stream the page as panels settle, in whatever order they finish.
    pub fn into_events(self) -> impl Stream<Item = DashboardEvent> + Send + 'static {
        let MountedDashboard { tab, panels, started } = self;

        async_stream::stream! {
            let skeleton = panels
                .iter()
                .map(|p| PanelSkeleton {
                    id: p.id().to_string(),
                    title: p.title().to_string(),
                })
                .collect();
            yield DashboardEvent::Skeleton {
                tab,
                title: tab.title().to_string(),
                panels: skeleton,
            };

            let total = panels.len();
            let mut pending: FuturesUnordered<_> = panels
                .into_iter()
                .map(|mut panel| async move { panel.settled().await })
                .collect();

            while let Some(panel) = pending.next().await {
                yield DashboardEvent::Panel { panel };
            }

            yield DashboardEvent::Complete {
                panels: total,
                duration_ms: started.elapsed().as_millis() as u64,
            };
        }
    }
}
