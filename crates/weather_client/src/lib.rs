//! Weather Provider (C3): fetch forecast + latest observation per city,
//! cache with TTL, emit a staleness flag. See §4.1.

pub mod noaa;

use chrono::Utc;
use dashmap::DashMap;
use domain::cities::CityConfig;
use domain::{Error, WeatherSnapshot};
use noaa::NoaaClient;
use std::time::Duration;
use tracing::{debug, warn};

const RETRY_BASE_MS: u64 = 500;
const RETRY_CAP_MS: u64 = 4000;
const MAX_ATTEMPTS: u32 = 3;

/// Shared, concurrent-reader-safe cache of the latest snapshot per city.
/// `DashMap` gives per-shard locking rather than one global `RwLock`,
/// matching the reference bot's `ForecastCache` shape.
pub struct WeatherProvider {
    client: NoaaClient,
    cache: DashMap<String, WeatherSnapshot>,
    cache_ttl: chrono::Duration,
    stale_ceiling: chrono::Duration,
    /// Floor applied to the sample stddev (§4.1) when too few forecast
    /// samples exist to trust the computed figure.
    fallback_stddev_f: f64,
}

impl WeatherProvider {
    pub fn new(
        per_call_timeout: Duration,
        cache_ttl_sec: i64,
        stale_ceiling_sec: i64,
        fallback_stddev_f: f64,
    ) -> Self {
        Self {
            client: NoaaClient::new(per_call_timeout),
            cache: DashMap::new(),
            cache_ttl: chrono::Duration::seconds(cache_ttl_sec),
            stale_ceiling: chrono::Duration::seconds(stale_ceiling_sec),
            fallback_stddev_f,
        }
    }

    /// `get(city_code) -> WeatherSnapshot` (§4.1). Returns a cached
    /// snapshot when fresh; on cache miss, fetches and retries transient
    /// 5xx with exponential backoff; on permanent failure, returns a stale
    /// snapshot built from the last known good value if one exists.
    pub async fn get(&self, city: &CityConfig) -> WeatherSnapshot {
        if let Some(entry) = self.cache.get(&city.code) {
            if Utc::now() - entry.captured_at < self.cache_ttl {
                return entry.clone();
            }
        }

        match self.fetch_with_retry(city).await {
            Ok(mut snapshot) => {
                snapshot.stale = self.is_stale(&snapshot);
                self.cache.insert(city.code.clone(), snapshot.clone());
                snapshot
            }
            Err(e) => {
                warn!("weather fetch permanently failed for {}: {e}", city.code);
                self.stale_fallback(city)
            }
        }
    }

    fn is_stale(&self, snapshot: &WeatherSnapshot) -> bool {
        Utc::now() - snapshot.captured_at > self.stale_ceiling
    }

    /// On permanent failure, reuse the last known good forecast if present,
    /// always marked stale; otherwise synthesize an all-unknown stale row so
    /// the caller can skip trading for this city without panicking.
    fn stale_fallback(&self, city: &CityConfig) -> WeatherSnapshot {
        if let Some(last) = self.cache.get(&city.code) {
            let mut snapshot = last.clone();
            snapshot.stale = true;
            return snapshot;
        }
        WeatherSnapshot {
            city_code: city.code.clone(),
            captured_at: Utc::now(),
            forecast_high_f: f64::NAN,
            forecast_stddev_f: 0.0,
            observed_temp_f: None,
            source_timestamps: String::new(),
            stale: true,
        }
    }

    async fn fetch_with_retry(&self, city: &CityConfig) -> Result<WeatherSnapshot, Error> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.fetch_once(city).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(Error::TransientNetworkError(msg)) if attempt < MAX_ATTEMPTS => {
                    let backoff = (RETRY_BASE_MS * 2u64.pow(attempt - 1)).min(RETRY_CAP_MS);
                    warn!(
                        "transient weather fetch error for {} (attempt {attempt}/{MAX_ATTEMPTS}): {msg}; retrying in {backoff}ms",
                        city.code
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, city: &CityConfig) -> Result<WeatherSnapshot, Error> {
        let hourly = self.client.fetch_hourly_forecast(&city.forecast_grid).await?;
        let observation = self.client.fetch_latest_observation(&city.settlement_station).await;

        let now = Utc::now();
        let horizon = now + chrono::Duration::hours(36);
        let mut temps: Vec<f64> = Vec::new();

        for period in &hourly.properties.periods {
            if period.start_time < now || period.start_time > horizon {
                continue;
            }
            let raw = match &period.temperature {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::Object(obj) => obj.get("value").and_then(|v| v.as_f64()),
                _ => None,
            };
            if let Some(t) = raw {
                let temp_f = match period.temperature_unit.as_deref() {
                    Some("C") => t * 9.0 / 5.0 + 32.0,
                    _ => t,
                };
                temps.push(temp_f);
            }
        }

        if temps.is_empty() {
            return Err(Error::DataValidationError(format!(
                "no forecast temperatures for {}",
                city.code
            )));
        }

        let high = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = temps.iter().sum::<f64>() / temps.len() as f64;
        let variance = temps.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / temps.len() as f64;
        let stddev = variance.sqrt().max(self.fallback_stddev_f);

        let (observed_temp_f, obs_ts) = match observation {
            Ok(obs) => (
                obs.properties.temperature.and_then(|t| t.value).map(|c| c * 9.0 / 5.0 + 32.0),
                obs.properties.timestamp.to_rfc3339(),
            ),
            Err(e) => {
                debug!("latest observation unavailable for {}: {e}", city.code);
                (None, String::new())
            }
        };

        Ok(WeatherSnapshot {
            city_code: city.code.clone(),
            captured_at: now,
            forecast_high_f: high,
            forecast_stddev_f: stddev,
            observed_temp_f,
            source_timestamps: obs_ts,
            stale: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::cities::{Cluster, ForecastGrid};

    fn nyc() -> CityConfig {
        CityConfig {
            code: "NYC".into(),
            display_name: "New York City".into(),
            timezone: "America/New_York".into(),
            cluster: Cluster::Ne,
            forecast_grid: ForecastGrid {
                office: "OKX".into(),
                grid_x: 33,
                grid_y: 37,
            },
            settlement_station: "KNYC".into(),
        }
    }

    #[tokio::test]
    async fn cache_hit_avoids_refetch() {
        let provider = WeatherProvider::new(Duration::from_secs(1), 300, 1800, 2.0);
        let snapshot = WeatherSnapshot {
            city_code: "NYC".into(),
            captured_at: Utc::now(),
            forecast_high_f: 72.0,
            forecast_stddev_f: 3.0,
            observed_temp_f: Some(70.0),
            source_timestamps: String::new(),
            stale: false,
        };
        provider.cache.insert("NYC".into(), snapshot.clone());
        let got = provider.get(&nyc()).await;
        assert_eq!(got.forecast_high_f, 72.0);
        assert!(!got.stale);
    }

    #[tokio::test]
    async fn missing_city_with_no_cache_falls_back_stale() {
        let provider = WeatherProvider::new(Duration::from_millis(1), 300, 1800, 2.0);
        let snapshot = provider.stale_fallback(&nyc());
        assert!(snapshot.stale);
        assert!(snapshot.forecast_high_f.is_nan());
    }

    #[test]
    fn configured_fallback_stddev_floors_low_sample_variance() {
        let provider = WeatherProvider::new(Duration::from_secs(1), 300, 1800, 4.0);
        let temps = [70.0, 70.0, 70.0];
        let mean = temps.iter().sum::<f64>() / temps.len() as f64;
        let variance = temps.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / temps.len() as f64;
        let stddev = variance.sqrt().max(provider.fallback_stddev_f);
        assert_eq!(stddev, 4.0);
    }
}
