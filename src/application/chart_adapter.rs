// Chart adapter - Reshapes raw aggregation rows into chart input
use crate::domain::aggregation::AggregationRow;
use crate::domain::chart::{ChartDataset, ChartKind, ChartSeries, SeriesStyle};
use crate::domain::errors::MalformedDataError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde_json::Value;

/// Turns date values into calendar-day labels using a fixed format and UTC offset.
///
/// `YYYY-MM-DD` values are labelled as that calendar day. RFC 3339 timestamps are
/// converted into the configured offset first, then labelled by their local day.
#[derive(Debug, Clone)]
pub struct DateLabeler {
    format: String,
    offset: FixedOffset,
}

impl DateLabeler {
    pub fn new(format: &str, offset: FixedOffset) -> anyhow::Result<Self> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("invalid date label format: {}", format);
        }
        Ok(Self {
            format: format.to_string(),
            offset,
        })
    }

    pub fn label(&self, raw: &str) -> Option<String> {
        let day = match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(day) => day,
            Err(_) => DateTime::parse_from_rfc3339(raw)
                .ok()?
                .with_timezone(&self.offset)
                .date_naive(),
        };
        Some(day.format(&self.format).to_string())
    }
}

impl Default for DateLabeler {
    fn default() -> Self {
        Self {
            format: "%-m/%-d/%Y".to_string(),
            offset: Utc.fix(),
        }
    }
}

fn category_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One series chart: labels from `key_field`, values from `value_field`, in row order.
pub fn to_category_chart(
    rows: &[AggregationRow],
    key_field: &str,
    value_field: &str,
    series_label: &str,
    kind: ChartKind,
) -> Result<ChartDataset, MalformedDataError> {
    reshape(rows, key_field, value_field, series_label, kind, category_label)
}

/// Like [`to_category_chart`], but each label is a formatted calendar date.
pub fn to_time_series_chart(
    rows: &[AggregationRow],
    date_field: &str,
    value_field: &str,
    series_label: &str,
    kind: ChartKind,
    labeler: &DateLabeler,
) -> Result<ChartDataset, MalformedDataError> {
    reshape(rows, date_field, value_field, series_label, kind, |value| {
        value.as_str().and_then(|raw| labeler.label(raw))
    })
}

fn reshape<F>(
    rows: &[AggregationRow],
    label_field: &str,
    value_field: &str,
    series_label: &str,
    kind: ChartKind,
    to_label: F,
) -> Result<ChartDataset, MalformedDataError>
where
    F: Fn(&Value) -> Option<String>,
{
    let mut labels = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let label = row.field(label_field).and_then(&to_label);
        let value = row.field(value_field).and_then(Value::as_f64);

        match (label, value) {
            (Some(label), Some(value)) => {
                labels.push(label);
                values.push(value);
            }
            _ => {
                tracing::warn!(
                    "Dropping malformed row {} (expected {} and {}): {:?}",
                    index,
                    label_field,
                    value_field,
                    row
                );
            }
        }
    }

    if labels.is_empty() && !rows.is_empty() {
        return Err(MalformedDataError {
            reason: format!(
                "all {} rows lacked a usable {} or {}",
                rows.len(),
                label_field,
                value_field
            ),
        });
    }

    let style = SeriesStyle::for_series(kind, 0, values.len());
    let series = ChartSeries {
        label: series_label.to_string(),
        values,
        style,
    };

    Ok(ChartDataset::new(labels, vec![series]))
}
