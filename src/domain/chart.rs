// Chart input domain models (serialized in the shape Chart.js expects)
use serde::{Deserialize, Serialize};

/// Fixed palette, indexed by series (or by point for per-slice charts).
pub const PALETTE: [&str; 6] = [
    "rgba(54, 162, 235, 0.6)",
    "rgba(75, 192, 192, 0.6)",
    "rgba(255, 99, 132, 0.6)",
    "rgba(255, 206, 86, 0.6)",
    "rgba(153, 102, 255, 0.6)",
    "rgba(255, 159, 64, 0.6)",
];

/// Opaque variants of the palette, used for line borders.
pub const BORDER_PALETTE: [&str; 6] = [
    "rgb(54, 162, 235)",
    "rgb(75, 192, 192)",
    "rgb(255, 99, 132)",
    "rgb(255, 206, 86)",
    "rgb(153, 102, 255)",
    "rgb(255, 159, 64)",
];

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

pub fn border_color(index: usize) -> &'static str {
    BORDER_PALETTE[index % BORDER_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
}

/// How aggregation rows are read: categorical labels, or calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartShape {
    Category,
    TimeSeries,
}

/// Either one color for the whole series or one color per data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorFill {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorFill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    pub fill: bool,
}

impl SeriesStyle {
    /// Style for the series at `series_index`, given the chart kind and point count.
    pub fn for_series(kind: ChartKind, series_index: usize, points: usize) -> Self {
        match kind {
            ChartKind::Pie => Self {
                background_color: Some(ColorFill::PerPoint(
                    (0..points).map(|i| palette_color(i).to_string()).collect(),
                )),
                border_color: None,
                fill: true,
            },
            ChartKind::Bar => Self {
                background_color: Some(ColorFill::Single(palette_color(series_index).to_string())),
                border_color: None,
                fill: true,
            },
            ChartKind::Line => Self {
                background_color: None,
                border_color: Some(border_color(series_index).to_string()),
                fill: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    #[serde(rename = "data")]
    pub values: Vec<f64>,
    #[serde(flatten)]
    pub style: SeriesStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub labels: Vec<String>,
    #[serde(rename = "datasets")]
    pub series: Vec<ChartSeries>,
}

impl ChartDataset {
    pub fn new(labels: Vec<String>, series: Vec<ChartSeries>) -> Self {
        debug_assert!(series.iter().all(|s| s.values.len() == labels.len()));
        Self { labels, series }
    }

    /// Computed, but zero categories.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
