//! Data model (§3): the entities every other crate in this workspace passes
//! around. Tagged variants and value records replace the dynamic
//! dictionaries the source implementation used (see §9 design notes).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Order/quote side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }
}

/// Strategy decision for a candidate market.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// Direction of the settlement threshold: does YES pay out above or below
/// `threshold_f`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Above,
    Below,
}

/// Trading Loop submission mode (§4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Shadow,
    Paper,
    Live,
}

/// Closed set of reason codes a `Signal` may carry (§4.3) plus the Gate
/// reasons added by §4.4. Kept in one enum so a `Signal`'s `reasons` field
/// and a gate `Refused` reason share one vocabulary end to end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    EdgePositive,
    EdgeNegative,
    HighUncertainty,
    BelowMinEdge,
    HoldDefault,
    StaleWeather,
    SpreadWide,
    LowLiquidity,
    InsufficientEdge,
    CityCapHit,
    ClusterCapHit,
    TradeCapHit,
    DailyLossHit,
    RejectBurst,
}

/// One row per (city, fetch). §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_code: String,
    pub captured_at: DateTime<Utc>,
    pub forecast_high_f: f64,
    pub forecast_stddev_f: f64,
    pub observed_temp_f: Option<f64>,
    /// Opaque: the source's own timestamp(s), kept only for staleness math
    /// and audit, never parsed by downstream components.
    pub source_timestamps: String,
    pub stale: bool,
}

/// One row per (contract, fetch). §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub city_code: String,
    pub threshold_f: f64,
    pub direction: Direction,
    pub event_date: NaiveDate,
    pub yes_bid: Option<i64>,
    pub yes_ask: Option<i64>,
    pub no_bid: Option<i64>,
    pub no_ask: Option<i64>,
    pub volume: i64,
    pub open_interest: i64,
    pub close_time: DateTime<Utc>,
    pub captured_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// A market with any missing side is ineligible for trading (§4.2).
    pub fn is_eligible(&self) -> bool {
        self.yes_bid.is_some()
            && self.yes_ask.is_some()
            && self.no_bid.is_some()
            && self.no_ask.is_some()
            && self.close_time > Utc::now()
    }

    pub fn mid_yes(&self) -> Option<f64> {
        Some((self.yes_bid? as f64 + self.yes_ask? as f64) / 2.0)
    }

    pub fn mid_no(&self) -> Option<f64> {
        Some((self.no_bid? as f64 + self.no_ask? as f64) / 2.0)
    }
}

/// Produced by Strategy (C5). §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub city_code: String,
    pub ticker: String,
    pub strategy_name: String,
    pub p_yes_model: f64,
    pub uncertainty: f64,
    pub p_yes_market: f64,
    pub edge: f64,
    pub action: Action,
    pub side: Side,
    pub max_price_cents: i64,
    pub reasons: Vec<ReasonCode>,
    pub created_at: DateTime<Utc>,
}

/// Order state machine states (§4.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Submitted,
    Resting,
    Partial,
    Filled,
    Canceled,
    Rejected,
    Closed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Closed
        )
    }
}

/// One concrete attempt to realize an intent. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub intent_key: String,
    pub intent_version: u32,
    pub exchange_order_id: Option<String>,
    pub city_code: String,
    pub ticker: String,
    pub side: Side,
    pub quantity: i64,
    pub limit_price_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn client_order_id(&self) -> String {
        format!("{}#{}", self.intent_key, self.intent_version)
    }
}

/// One row per exchange fill event. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_ref: String,
    pub filled_at: DateTime<Utc>,
    pub quantity: i64,
    pub price_cents: i64,
    pub fees_cents: i64,
    pub realized_pnl: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Aggregated per (market, side). §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub city_code: String,
    pub cluster: crate::cities::Cluster,
    pub side: Side,
    pub quantity_open: i64,
    pub avg_entry_cents: f64,
    pub avg_exit_cents: Option<f64>,
    pub realized_pnl: i64,
    pub status: PositionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Dollars currently at risk in this position, used by the Risk Engine
    /// to compute headroom against city/cluster caps.
    pub fn exposure_cents(&self) -> i64 {
        (self.quantity_open as f64 * self.avg_entry_cents).round() as i64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskEventType {
    DailyLossHit,
    CityCapHit,
    ClusterCapHit,
    TradeCapHit,
    RejectBurst,
    StaleWeather,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Audit of boundary-hitting decisions. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_type: RiskEventType,
    pub severity: Severity,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Ok,
    Degraded,
    Down,
}

/// Latest per-component health. §3. `component` is one of `trader`,
/// `exchange_api`, `weather_api`, `database`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub component: String,
    pub status: HealthState,
    pub last_ok: Option<DateTime<Utc>>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(yb: Option<i64>, ya: Option<i64>, nb: Option<i64>, na: Option<i64>) -> MarketSnapshot {
        MarketSnapshot {
            ticker: "T".into(),
            city_code: "NYC".into(),
            threshold_f: 70.0,
            direction: Direction::Above,
            event_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            yes_bid: yb,
            yes_ask: ya,
            no_bid: nb,
            no_ask: na,
            volume: 100,
            open_interest: 100,
            close_time: Utc::now() + chrono::Duration::hours(1),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn missing_side_is_ineligible() {
        let s = snapshot(Some(45), Some(48), None, Some(55));
        assert!(!s.is_eligible());
    }

    #[test]
    fn full_quote_is_eligible() {
        let s = snapshot(Some(45), Some(48), Some(52), Some(55));
        assert!(s.is_eligible());
        assert_eq!(s.mid_yes(), Some(46.5));
    }
}
