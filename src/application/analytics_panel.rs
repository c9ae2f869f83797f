// Analytics panel - Concurrent fetch, reshape, and view-state publication
use crate::application::aggregation_client::AggregationClient;
use crate::application::chart_adapter::{to_category_chart, to_time_series_chart, DateLabeler};
use crate::domain::chart::{ChartKind, ChartShape};
use crate::domain::dashboard::Tab;
use crate::domain::panel::{PanelView, PanelViewState, SubChartView};
use crate::infrastructure::config::{PanelConfig, SubChartConfig};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct SubChartSpec {
    pub id: String,
    pub title: String,
    pub procedure: String,
    pub kind: ChartKind,
    pub shape: ChartShape,
    pub label_field: String,
    pub value_field: String,
    pub series_label: String,
}

impl SubChartSpec {
    pub fn from_config(config: &SubChartConfig) -> Self {
        Self {
            id: config.id.clone(),
            title: config.title.clone(),
            procedure: config.procedure.clone(),
            kind: config.kind,
            shape: config.shape,
            label_field: config.label_field.clone(),
            value_field: config.value_field.clone(),
            series_label: config.series_label.clone().unwrap_or_else(|| config.title.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelSpec {
    pub id: String,
    pub title: String,
    pub tab: Tab,
    pub charts: Vec<SubChartSpec>,
}

impl PanelSpec {
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            id: config.id.clone(),
            title: config.title.clone(),
            tab: config.tab,
            charts: config.charts.iter().map(SubChartSpec::from_config).collect(),
        }
    }
}

#[derive(Clone)]
pub struct AnalyticsPanel {
    spec: Arc<PanelSpec>,
    client: Arc<dyn AggregationClient>,
    labeler: Arc<DateLabeler>,
}

impl AnalyticsPanel {
    pub fn new(spec: Arc<PanelSpec>, client: Arc<dyn AggregationClient>, labeler: Arc<DateLabeler>) -> Self {
        Self {
            spec,
            client,
            labeler,
        }
    }

    /// Fetch every sub-chart concurrently and settle once all of them have resolved.
    pub async fn load(&self) -> PanelViewState {
        let charts = join_all(self.spec.charts.iter().map(|chart| self.load_chart(chart))).await;
        PanelViewState::settled(charts)
    }

    async fn load_chart(&self, chart: &SubChartSpec) -> SubChartView {
        let rows = match self.client.call(&chart.procedure).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Sub-chart {}/{} has no data: {}", self.spec.id, chart.id, e);
                return SubChartView::no_data(chart.id.clone(), chart.title.clone(), chart.kind);
            }
        };

        tracing::debug!("{} returned {} rows", chart.procedure, rows.len());

        let dataset = match chart.shape {
            ChartShape::Category => to_category_chart(
                &rows,
                &chart.label_field,
                &chart.value_field,
                &chart.series_label,
                chart.kind,
            ),
            ChartShape::TimeSeries => to_time_series_chart(
                &rows,
                &chart.label_field,
                &chart.value_field,
                &chart.series_label,
                chart.kind,
                &self.labeler,
            ),
        };

        match dataset {
            Ok(data) => SubChartView::chart(chart.id.clone(), chart.title.clone(), chart.kind, data),
            Err(e) => {
                tracing::warn!("Sub-chart {}/{} has no data: {}", self.spec.id, chart.id, e);
                SubChartView::no_data(chart.id.clone(), chart.title.clone(), chart.kind)
            }
        }
    }

    /// Start loading in the background. The panel is `Loading` until the load settles.
    pub fn mount(self) -> PanelHandle {
        let (tx, rx) = watch::channel(PanelViewState::Loading);
        let id = self.spec.id.clone();
        let title = self.spec.title.clone();

        tokio::spawn(async move {
            let state = self.load().await;
            if tx.send(state).is_err() {
                tracing::debug!("Panel {} unmounted before settling, result discarded", self.spec.id);
            }
        });

        PanelHandle { id, title, rx }
    }
}

/// Read-only view of a mounted panel's state.
#[derive(Clone)]
pub struct PanelHandle {
    id: String,
    title: String,
    rx: watch::Receiver<PanelViewState>,
}

impl PanelHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> PanelViewState {
        self.rx.borrow().clone()
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            id: self.id.clone(),
            title: self.title.clone(),
            state: self.state(),
        }
    }

    /// Wait until the panel leaves `Loading`.
    pub async fn settled(&mut self) -> PanelView {
        if self.rx.wait_for(|state| !state.is_loading()).await.is_err() {
            tracing::warn!("Panel {} stopped before settling", self.id);
        }
        self.view()
    }
}
