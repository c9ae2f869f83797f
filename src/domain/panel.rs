// Analytics panel view state
use super::chart::{ChartDataset, ChartKind};
use serde::Serialize;

pub const NO_DATA_MESSAGE: &str = "No data available";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubChartContent {
    /// Fetched and reshaped. The dataset may have zero categories.
    Chart { data: ChartDataset },
    /// Fetch failed, returned nothing, or every row was malformed.
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubChartView {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    #[serde(flatten)]
    pub content: SubChartContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl SubChartView {
    pub fn chart(id: String, title: String, kind: ChartKind, data: ChartDataset) -> Self {
        // An empty dataset still renders a message rather than a blank canvas.
        let message = data.is_empty().then_some(NO_DATA_MESSAGE);
        Self {
            id,
            title,
            kind,
            content: SubChartContent::Chart { data },
            message,
        }
    }

    pub fn no_data(id: String, title: String, kind: ChartKind) -> Self {
        Self {
            id,
            title,
            kind,
            content: SubChartContent::NoData,
            message: Some(NO_DATA_MESSAGE),
        }
    }

    pub fn dataset(&self) -> Option<&ChartDataset> {
        match &self.content {
            SubChartContent::Chart { data } => Some(data),
            SubChartContent::NoData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelViewState {
    Loading,
    Empty,
    Ready { charts: Vec<SubChartView> },
}

impl PanelViewState {
    /// Settled state for a panel whose sub-charts have all resolved.
    pub fn settled(charts: Vec<SubChartView>) -> Self {
        if charts.iter().all(|c| c.dataset().is_none()) {
            PanelViewState::Empty
        } else {
            PanelViewState::Ready { charts }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelViewState::Loading)
    }
}

/// A panel as presented to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub state: PanelViewState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_dataset() -> ChartDataset {
        ChartDataset::new(Vec::new(), Vec::new())
    }

    #[test]
    fn test_all_no_data_settles_empty() {
        let charts = vec![
            SubChartView::no_data("a".into(), "A".into(), ChartKind::Bar),
            SubChartView::no_data("b".into(), "B".into(), ChartKind::Line),
        ];
        assert_eq!(PanelViewState::settled(charts), PanelViewState::Empty);
    }

    #[test]
    fn test_empty_dataset_is_ready_with_message() {
        let chart = SubChartView::chart("v".into(), "Volume".into(), ChartKind::Line, empty_dataset());
        assert_eq!(chart.message, Some(NO_DATA_MESSAGE));

        let state = PanelViewState::settled(vec![chart]);
        assert!(matches!(state, PanelViewState::Ready { .. }));
    }

    #[test]
    fn test_serialized_shape() {
        let view = PanelView {
            id: "screening".into(),
            title: "Screening Analytics".into(),
            state: PanelViewState::Ready {
                charts: vec![SubChartView::no_data("d".into(), "Daily".into(), ChartKind::Line)],
            },
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["charts"][0]["status"], "no_data");
        assert_eq!(json["charts"][0]["message"], NO_DATA_MESSAGE);
    }
}
