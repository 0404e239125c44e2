use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the location dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub location_id: String,
    pub date: NaiveDate,
}

impl ForecastQuery {
    pub fn new(location_id: impl Into<String>, date: NaiveDate) -> Self {
        Self { location_id: location_id.into(), date }
    }

    /// Date as the API expects it, `YYYY-MM-DD`.
    pub fn date_param(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// A forecast time entry exactly as the API returned it. Nothing is guaranteed present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTime {
    #[serde(rename = "DateTime", default)]
    pub date_time: Option<String>,
    #[serde(rename = "Tide", default)]
    pub tide: Option<String>,
    #[serde(rename = "TideHeights", default)]
    pub tide_heights: Option<TideHeights>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TideHeights {
    #[serde(rename = "AboveChartDatum", default)]
    pub above_chart_datum: Option<Value>,
}

/// A validated high or low tide, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TideEvent {
    pub timestamp: String,
    pub phase: String,
    pub height_cm: i64,
}

impl TideEvent {
    /// Returns `None` unless `DateTime`, `Tide` and `TideHeights.AboveChartDatum` are all usable.
    pub fn from_raw(raw: &ForecastTime) -> Option<Self> {
        let timestamp = raw.date_time.as_deref()?;
        let phase = raw.tide.as_deref()?;
        let height = raw.tide_heights.as_ref()?.above_chart_datum.as_ref()?;

        Some(Self {
            timestamp: timestamp.to_string(),
            phase: phase.to_string(),
            height_cm: height_as_cm(height)?,
        })
    }

    /// `HH:MM` of the event, or the raw timestamp when it doesn't parse.
    pub fn clock_time(&self) -> String {
        parse_timestamp(&self.timestamp)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|| self.timestamp.clone())
    }
}

fn height_as_cm(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    FORMATS.iter().find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
