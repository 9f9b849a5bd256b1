//! Configuration Surface (C1): typed settings for bankroll, risk ratios,
//! execution-gate thresholds, cycle timings, and mode. See §6 for the
//! enumerated field list and SPEC_FULL.md §10.3 for the load pipeline
//! (implemented by the binary crate's `load_config`, which layers env vars
//! and `config.toml` on top of the defaults below).

use crate::cities::{default_cities, CityConfig};
use crate::types::Mode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_mode")]
    pub mode: Mode,

    /// Bankroll in decimal dollars.
    #[serde(default = "default_bankroll")]
    pub bankroll: f64,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub gates: GateConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub exchange: ExchangeConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    /// Minimum time between a fill and its appearance in the Public Read
    /// Model (§4.8). Design Note #3: ambiguous in the source, fixed here.
    #[serde(default = "default_public_delay_sec")]
    pub public_delay_sec: i64,

    #[serde(default = "default_cities")]
    pub cities: Vec<CityConfig>,

    /// Path to the SQLite database file backing the Repository Layer.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

/// Risk Engine ratios (§4.5). Every dollar cap is derived from
/// `bankroll * ratio` at call time — never hardcoded in the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_max_trade_risk_pct")]
    pub max_trade_risk_pct: f64,
    #[serde(default = "default_max_city_exposure_pct")]
    pub max_city_exposure_pct: f64,
    #[serde(default = "default_max_cluster_exposure_pct")]
    pub max_cluster_exposure_pct: f64,
    #[serde(default = "default_max_daily_loss_pct")]
    pub max_daily_loss_pct: f64,
    /// Per-trade contract cap independent of dollar sizing (§4.3 sizing hint).
    #[serde(default = "default_max_contracts_per_trade")]
    pub max_contracts_per_trade: i64,
    /// Rejection-burst sliding window, in seconds (§4.5).
    #[serde(default = "default_rejection_window_sec")]
    pub rejection_window_sec: i64,
    /// Reject count within the window that trips the breaker.
    #[serde(default = "default_rejection_burst_threshold")]
    pub rejection_burst_threshold: u32,
}

/// Gate thresholds (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_spread_max_cents")]
    pub spread_max_cents: i64,
    #[serde(default = "default_liquidity_min")]
    pub liquidity_min: i64,
    #[serde(default = "default_min_liquidity_multiple")]
    pub min_liquidity_multiple: f64,
    #[serde(default = "default_min_edge_after_costs")]
    pub min_edge_after_costs: f64,
    #[serde(default = "default_max_uncertainty")]
    pub max_uncertainty: f64,
}

/// Cycle and network timing (§4.1, §4.6, §4.7, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_cycle_interval_sec")]
    pub cycle_interval_sec: u64,
    #[serde(default = "default_error_sleep_sec")]
    pub error_sleep_sec: u64,
    #[serde(default = "default_weather_cache_ttl_sec")]
    pub weather_cache_ttl_sec: i64,
    #[serde(default = "default_weather_stale_ceiling_sec")]
    pub weather_stale_ceiling_sec: i64,
    #[serde(default = "default_reprice_interval_sec")]
    pub reprice_interval_sec: i64,
    #[serde(default = "default_max_chase_cents")]
    pub max_chase_cents: i64,
    #[serde(default = "default_per_call_timeout_sec")]
    pub per_call_timeout_sec: u64,
    #[serde(default = "default_per_cycle_budget_sec")]
    pub per_cycle_budget_sec: u64,
    #[serde(default = "default_city_concurrency")]
    pub city_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default)]
    pub api_key_id: String,
    /// RSA private key PEM (with literal `\n` for newlines).
    #[serde(default)]
    pub private_key_pem: String,
    #[serde(default = "default_true")]
    pub use_demo: bool,
    #[serde(default = "default_exchange_rate_limit_per_sec")]
    pub rate_limit_per_sec: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_rate_limit_per_sec")]
    pub rate_limit_per_sec: u32,
    /// Fallback per-city forecast std-dev when the source provides none.
    #[serde(default = "default_fallback_stddev_f")]
    pub fallback_stddev_f: f64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_mode() -> Mode {
    Mode::Shadow
}
fn default_bankroll() -> f64 {
    1000.0
}
fn default_max_trade_risk_pct() -> f64 {
    0.02
}
fn default_max_city_exposure_pct() -> f64 {
    0.03
}
fn default_max_cluster_exposure_pct() -> f64 {
    0.05
}
fn default_max_daily_loss_pct() -> f64 {
    0.05
}
fn default_max_contracts_per_trade() -> i64 {
    200
}
fn default_rejection_window_sec() -> i64 {
    900
}
fn default_rejection_burst_threshold() -> u32 {
    5
}
fn default_spread_max_cents() -> i64 {
    4
}
fn default_liquidity_min() -> i64 {
    100
}
fn default_min_liquidity_multiple() -> f64 {
    5.0
}
fn default_min_edge_after_costs() -> f64 {
    0.03
}
fn default_max_uncertainty() -> f64 {
    0.30
}
fn default_cycle_interval_sec() -> u64 {
    60
}
fn default_error_sleep_sec() -> u64 {
    5
}
fn default_weather_cache_ttl_sec() -> i64 {
    300
}
fn default_weather_stale_ceiling_sec() -> i64 {
    1800
}
fn default_reprice_interval_sec() -> i64 {
    120
}
fn default_max_chase_cents() -> i64 {
    6
}
fn default_per_call_timeout_sec() -> u64 {
    10
}
fn default_per_cycle_budget_sec() -> u64 {
    30
}
fn default_city_concurrency() -> usize {
    10
}
fn default_exchange_rate_limit_per_sec() -> u32 {
    10
}
fn default_weather_rate_limit_per_sec() -> u32 {
    1
}
fn default_fallback_stddev_f() -> f64 {
    2.0
}
fn default_public_delay_sec() -> i64 {
    3600
}
fn default_db_path() -> String {
    "weather_trader.db".to_string()
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_trade_risk_pct: default_max_trade_risk_pct(),
            max_city_exposure_pct: default_max_city_exposure_pct(),
            max_cluster_exposure_pct: default_max_cluster_exposure_pct(),
            max_daily_loss_pct: default_max_daily_loss_pct(),
            max_contracts_per_trade: default_max_contracts_per_trade(),
            rejection_window_sec: default_rejection_window_sec(),
            rejection_burst_threshold: default_rejection_burst_threshold(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            spread_max_cents: default_spread_max_cents(),
            liquidity_min: default_liquidity_min(),
            min_liquidity_multiple: default_min_liquidity_multiple(),
            min_edge_after_costs: default_min_edge_after_costs(),
            max_uncertainty: default_max_uncertainty(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cycle_interval_sec: default_cycle_interval_sec(),
            error_sleep_sec: default_error_sleep_sec(),
            weather_cache_ttl_sec: default_weather_cache_ttl_sec(),
            weather_stale_ceiling_sec: default_weather_stale_ceiling_sec(),
            reprice_interval_sec: default_reprice_interval_sec(),
            max_chase_cents: default_max_chase_cents(),
            per_call_timeout_sec: default_per_call_timeout_sec(),
            per_cycle_budget_sec: default_per_cycle_budget_sec(),
            city_concurrency: default_city_concurrency(),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_key_id: String::new(),
            private_key_pem: String::new(),
            use_demo: default_true(),
            rate_limit_per_sec: default_exchange_rate_limit_per_sec(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_sec: default_weather_rate_limit_per_sec(),
            fallback_stddev_f: default_fallback_stddev_f(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            bankroll: default_bankroll(),
            risk: RiskConfig::default(),
            gates: GateConfig::default(),
            timing: TimingConfig::default(),
            exchange: ExchangeConfig::default(),
            weather: WeatherConfig::default(),
            public_delay_sec: default_public_delay_sec(),
            cities: default_cities(),
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Validate ratios and non-negative durations. Called once after the
    /// load pipeline assembles the final config (§10.3); failure is a
    /// `ConfigError` and the process exits with code 1.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;

        let ratios = [
            ("max_trade_risk_pct", self.risk.max_trade_risk_pct),
            ("max_city_exposure_pct", self.risk.max_city_exposure_pct),
            ("max_cluster_exposure_pct", self.risk.max_cluster_exposure_pct),
            ("max_daily_loss_pct", self.risk.max_daily_loss_pct),
        ];
        for (name, v) in ratios {
            if !(0.0..=1.0).contains(&v) {
                return Err(Error::ConfigError(format!(
                    "{name} must be in [0,1], got {v}"
                )));
            }
        }
        if self.bankroll < 0.0 {
            return Err(Error::ConfigError("bankroll must be non-negative".into()));
        }
        if self.gates.spread_max_cents < 0 || self.gates.liquidity_min < 0 {
            return Err(Error::ConfigError(
                "gate thresholds must be non-negative".into(),
            ));
        }
        if self.public_delay_sec < 0 {
            return Err(Error::ConfigError(
                "public_delay_sec must be non-negative".into(),
            ));
        }
        if self.mode == Mode::Live && self.exchange.private_key_pem.is_empty() {
            return Err(Error::ConfigError(
                "LIVE mode requires exchange.private_key_pem".into(),
            ));
        }
        if self.cities.is_empty() {
            return Err(Error::ConfigError("city registry must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn out_of_range_ratio_fails() {
        let mut cfg = Config::default();
        cfg.risk.max_trade_risk_pct = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn live_mode_requires_private_key() {
        let mut cfg = Config::default();
        cfg.mode = Mode::Live;
        assert!(cfg.validate().is_err());
        cfg.exchange.private_key_pem = "pem".into();
        assert!(cfg.validate().is_ok());
    }
}
