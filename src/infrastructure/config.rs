use crate::domain::chart::{ChartKind, ChartShape};
use crate::domain::dashboard::Tab;
use anyhow::{bail, Context};
use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub labels: LabelSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// How calendar dates become chart labels. Never taken from the host locale.
#[derive(Debug, Deserialize, Clone)]
pub struct LabelSettings {
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            utc_offset_minutes: 0,
        }
    }
}

fn default_date_format() -> String {
    "%-m/%-d/%Y".to_string()
}

impl LabelSettings {
    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes))
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct PanelsConfig {
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PanelConfig {
    pub id: String,
    pub title: String,
    /// Single-panel tab this panel belongs to; every panel also shows on the overview.
    pub tab: Tab,
    #[serde(default)]
    pub charts: Vec<SubChartConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SubChartConfig {
    pub id: String,
    pub title: String,
    pub procedure: String,
    pub kind: ChartKind,
    pub shape: ChartShape,
    pub label_field: String,
    pub value_field: String,
    pub series_label: Option<String>,
}

impl PanelsConfig {
    /// Appointment-status and screening panels backed by the standard procedures.
    pub fn standard() -> Self {
        let chart = |id: &str, title: &str, procedure: &str, kind: ChartKind, shape: ChartShape, label: &str, value: &str, series: Option<&str>| {
            SubChartConfig {
                id: id.to_string(),
                title: title.to_string(),
                procedure: procedure.to_string(),
                kind,
                shape,
                label_field: label.to_string(),
                value_field: value.to_string(),
                series_label: series.map(str::to_string),
            }
        };

        Self {
            panels: vec![
                PanelConfig {
                    id: "screening".to_string(),
                    title: "Screening Analytics".to_string(),
                    tab: Tab::Screening,
                    charts: vec![
                        chart(
                            "score_distribution",
                            "Score Distribution",
                            "get_screening_distribution",
                            ChartKind::Bar,
                            ChartShape::Category,
                            "severity_level",
                            "result_count",
                            Some("Score Distribution"),
                        ),
                        chart(
                            "daily_volume",
                            "Daily Volume",
                            "get_daily_screening_volume",
                            ChartKind::Line,
                            ChartShape::TimeSeries,
                            "date",
                            "count",
                            Some("Screenings per Day"),
                        ),
                    ],
                },
                PanelConfig {
                    id: "appointments".to_string(),
                    title: "Appointment Analytics".to_string(),
                    tab: Tab::Appointments,
                    charts: vec![chart(
                        "by_status",
                        "Appointments by Status",
                        "get_appointments_by_status",
                        ChartKind::Pie,
                        ChartShape::Category,
                        "status",
                        "count",
                        None,
                    )],
                },
            ],
        }
    }

    /// Reject layouts the dashboard cannot navigate.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut ids = HashSet::new();
        for panel in &self.panels {
            if !ids.insert(panel.id.as_str()) {
                bail!("duplicate panel id: {}", panel.id);
            }
            if panel.tab == Tab::Overview {
                bail!("panel {} must belong to a single-panel tab, not the overview", panel.id);
            }
            if panel.charts.is_empty() {
                bail!("panel {} has no charts", panel.id);
            }
        }
        Ok(())
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(config::Environment::with_prefix("CAMPUSMIND").separator("__"))
        .build()?;

    settings
        .try_deserialize()
        .context("invalid application configuration")
}

pub fn load_panels_config() -> anyhow::Result<PanelsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/panels").required(false))
        .build()?;

    let panels: PanelsConfig = settings
        .try_deserialize()
        .context("invalid panels configuration")?;

    if panels.panels.is_empty() {
        tracing::info!("No panels configured, using the standard panel set");
        return Ok(PanelsConfig::standard());
    }
    panels.validate().context("invalid panels configuration")?;
    Ok(panels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_panels() {
        let config = PanelsConfig::standard();
        let procedures: Vec<&str> = config
            .panels
            .iter()
            .flat_map(|p| p.charts.iter().map(|c| c.procedure.as_str()))
            .collect();

        assert_eq!(
            procedures,
            vec![
                "get_screening_distribution",
                "get_daily_screening_volume",
                "get_appointments_by_status"
            ]
        );
    }

    #[test]
    fn test_app_config_defaults() {
        let toml = r#"
            [supabase]
            url = "https://project.supabase.co"
            anon_key = "anon"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.labels.date_format, "%-m/%-d/%Y");
        assert_eq!(config.labels.offset().unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn test_panels_from_toml() {
        let toml = r#"
            [[panels]]
            id = "appointments"
            title = "Appointments"
            tab = "appointments"

            [[panels.charts]]
            id = "by_status"
            title = "By Status"
            procedure = "get_appointments_by_status"
            kind = "pie"
            shape = "category"
            label_field = "status"
            value_field = "count"
        "#;
        let config: PanelsConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.panels.len(), 1);
        assert_eq!(config.panels[0].tab, Tab::Appointments);
        assert_eq!(config.panels[0].charts[0].kind, ChartKind::Pie);
        assert_eq!(config.panels[0].charts[0].series_label, None);
    }

    fn parse_panels(toml: &str) -> Result<PanelsConfig, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    const DAILY_VOLUME: &str = r#"
        [[panels]]
        id = "screening"
        title = "Screening"
        tab = "screening"

        [[panels.charts]]
        id = "daily_volume"
        title = "Daily Volume"
        procedure = "get_daily_screening_volume"
        kind = "KIND"
        shape = "SHAPE"
        label_field = "date"
        value_field = "count"
    "#;

    #[test]
    fn test_unknown_chart_kind_or_shape_is_rejected() {
        let typo_kind = DAILY_VOLUME.replace("KIND", "lines").replace("SHAPE", "time_series");
        assert!(parse_panels(&typo_kind).is_err());

        let typo_shape = DAILY_VOLUME.replace("KIND", "line").replace("SHAPE", "timeseries");
        assert!(parse_panels(&typo_shape).is_err());

        let valid = DAILY_VOLUME.replace("KIND", "line").replace("SHAPE", "time_series");
        let config = parse_panels(&valid).unwrap();
        assert_eq!(config.panels[0].charts[0].shape, ChartShape::TimeSeries);
    }

    #[test]
    fn test_panel_tab_is_required_and_checked() {
        let missing_tab = DAILY_VOLUME
            .replace("tab = \"screening\"", "")
            .replace("KIND", "line")
            .replace("SHAPE", "time_series");
        assert!(parse_panels(&missing_tab).is_err());

        let unknown_tab = DAILY_VOLUME
            .replace("tab = \"screening\"", "tab = \"triage\"")
            .replace("KIND", "line")
            .replace("SHAPE", "time_series");
        assert!(parse_panels(&unknown_tab).is_err());

        let overview = DAILY_VOLUME
            .replace("tab = \"screening\"", "tab = \"overview\"")
            .replace("KIND", "line")
            .replace("SHAPE", "time_series");
        assert!(parse_panels(&overview).unwrap().validate().is_err());
    }

    #[test]
    fn test_duplicate_panel_ids_are_rejected() {
        let mut config = PanelsConfig::standard();
        config.panels[1].id = config.panels[0].id.clone();
        assert!(config.validate().is_err());
        assert!(PanelsConfig::standard().validate().is_ok());
    }

    #[test]
    fn test_shipped_panels_match_standard() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/panels.toml");
        let shipped: PanelsConfig = config::Config::builder()
            .add_source(config::File::with_name(path).required(true))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        shipped.validate().unwrap();
        assert_eq!(shipped, PanelsConfig::standard());
    }

    #[test]
    fn test_offset_out_of_range() {
        let labels = LabelSettings {
            date_format: default_date_format(),
            utc_offset_minutes: 24 * 60,
        };
        assert!(labels.offset().is_err());
    }
}
