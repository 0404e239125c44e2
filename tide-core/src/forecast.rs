use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    config::TideApiConfig,
    error::ForecastError,
    forecast::cwa::CwaTideClient,
    model::{ForecastQuery, ForecastTime},
};

pub mod cwa;

/// Anything that can answer "what are the tides at this location on this day".
///
/// Implementations swallow their own failures: `None` means there is nothing to
/// show, whatever the reason.
#[async_trait]
pub trait TideForecastSource: Send + Sync + Debug {
    async fn get_forecast(&self, query: &ForecastQuery) -> Option<Vec<ForecastTime>>;
}

/// Construct the CWA-backed source from config and the API token.
pub fn source_from_config(
    api: &TideApiConfig,
    token: &str,
) -> anyhow::Result<Box<dyn TideForecastSource>> {
    Ok(Box::new(CwaTideClient::from_config(api, token)?))
}

/// Walk `records.TideForecasts[0].Location.TimePeriods.Daily[]` down to the
/// `Time` list of the entry dated `date`.
pub fn parse_forecast(body: &Value, date: &str) -> Result<Vec<ForecastTime>, ForecastError> {
    match body.get("success") {
        Some(Value::String(flag)) if flag == "true" => {}
        Some(other) => {
            let flag = other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string());
            return Err(ForecastError::NotSuccessful(Some(flag)));
        }
        None => return Err(ForecastError::NotSuccessful(None)),
    }

    let daily = body
        .get("records")
        .ok_or(ForecastError::Missing("records"))?
        .get("TideForecasts")
        .and_then(Value::as_array)
        .ok_or(ForecastError::Missing("records.TideForecasts"))?
        .first()
        .ok_or(ForecastError::Missing("records.TideForecasts[0]"))?
        .get("Location")
        .ok_or(ForecastError::Missing("Location"))?
        .get("TimePeriods")
        .ok_or(ForecastError::Missing("Location.TimePeriods"))?
        .get("Daily")
        .and_then(Value::as_array)
        .ok_or(ForecastError::Missing("Location.TimePeriods.Daily"))?;

    let day = daily
        .iter()
        .find(|d| d.get("Date").and_then(Value::as_str) == Some(date))
        .ok_or_else(|| ForecastError::NoDailyEntry(date.to_string()))?;

    let times = day
        .get("Time")
        .and_then(Value::as_array)
        .ok_or(ForecastError::Missing("Daily.Time"))?;

    if times.is_empty() {
        return Err(ForecastError::EmptyDay(date.to_string()));
    }

    // A malformed entry is kept as an empty one so rendering can skip it.
    Ok(times
        .iter()
        .map(|t| serde_json::from_value(t.clone()).unwrap_or_default())
        .collect())
}
