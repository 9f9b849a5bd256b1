//! Wire types and raw fetches against `api.weather.gov`. Kept narrow to the
//! two calls the Weather Provider contract (§4.1, §6) actually needs:
//! hourly forecast and latest station observation.

use chrono::{DateTime, Utc};
use domain::cities::ForecastGrid;
use domain::Error;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct NoaaClient {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct HourlyForecastResponse {
    pub properties: HourlyForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct HourlyForecastProperties {
    #[serde(default)]
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastPeriod {
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    pub temperature: serde_json::Value,
    #[serde(rename = "temperatureUnit", default)]
    pub temperature_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationResponse {
    pub properties: ObservationProperties,
}

#[derive(Debug, Deserialize)]
pub struct ObservationProperties {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub temperature: Option<QuantValue>,
}

#[derive(Debug, Deserialize)]
pub struct QuantValue {
    pub value: Option<f64>,
}

impl NoaaClient {
    pub fn new(timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("weather-trader/0.1 (trading engine; contact@example.com)")
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .expect("failed to build NOAA HTTP client");

        Self { client }
    }

    pub async fn fetch_hourly_forecast(
        &self,
        grid: &ForecastGrid,
    ) -> Result<HourlyForecastResponse, Error> {
        let url = format!(
            "https://api.weather.gov/gridpoints/{}/{},{}/forecast/hourly",
            grid.office, grid.grid_x, grid.grid_y
        );
        debug!("fetching NOAA hourly forecast: {url}");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/geo+json")
            .send()
            .await?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(Error::TransientNetworkError(format!(
                "NOAA returned {status} for {}/{},{}",
                grid.office, grid.grid_x, grid.grid_y
            )));
        }
        if !status.is_success() {
            return Err(Error::PermanentApiError {
                status: status.as_u16(),
                message: format!("NOAA hourly forecast failed for {}", grid.office),
            });
        }

        Ok(resp.json().await?)
    }

    pub async fn fetch_latest_observation(
        &self,
        station: &str,
    ) -> Result<ObservationResponse, Error> {
        let url = format!(
            "https://api.weather.gov/stations/{station}/observations/latest"
        );
        debug!("fetching NOAA latest observation: {url}");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/geo+json")
            .send()
            .await?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(Error::TransientNetworkError(format!(
                "NOAA returned {status} for station {station}"
            )));
        }
        if !status.is_success() {
            return Err(Error::PermanentApiError {
                status: status.as_u16(),
                message: format!("NOAA latest observation failed for {station}"),
            });
        }

        Ok(resp.json().await?)
    }
}
