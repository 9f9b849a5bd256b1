//! Wire types for the exchange REST API. Kept separate from `domain`'s
//! entities since the wire shape (string statuses, optional cent fields,
//! pagination cursors) is an exchange concern, not a domain concern — this
//! module's job is mapping wire rows into `domain` types.

use chrono::{DateTime, NaiveDate, Utc};
use domain::{Direction, Error, MarketSnapshot, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct WireMarket {
    pub ticker: String,
    #[serde(default)]
    pub status: String,
    pub yes_bid: Option<i64>,
    pub yes_ask: Option<i64>,
    pub no_bid: Option<i64>,
    pub no_ask: Option<i64>,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub open_interest: i64,
    pub close_time: DateTime<Utc>,
    /// Strike threshold in degrees Fahrenheit, carried in the ticker's
    /// strike metadata by the exchange (e.g. `floor_strike`).
    pub floor_strike: Option<f64>,
    pub cap_strike: Option<f64>,
}

impl WireMarket {
    /// Map into a `MarketSnapshot` for a given city/direction; `direction`
    /// and `threshold_f` are derived by the Market Provider from the
    /// market's series metadata, not from this struct alone, so they are
    /// passed in explicitly.
    pub fn into_snapshot(
        self,
        city_code: &str,
        threshold_f: f64,
        direction: Direction,
        event_date: NaiveDate,
    ) -> MarketSnapshot {
        MarketSnapshot {
            ticker: self.ticker,
            city_code: city_code.to_string(),
            threshold_f,
            direction,
            event_date,
            yes_bid: self.yes_bid,
            yes_ask: self.yes_ask,
            no_bid: self.no_bid,
            no_ask: self.no_ask,
            volume: self.volume,
            open_interest: self.open_interest,
            close_time: self.close_time,
            captured_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketsResponse {
    #[serde(default)]
    pub markets: Vec<WireMarket>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Serialize)]
pub struct CreateOrderRequest {
    pub ticker: String,
    pub side: Side,
    pub action: &'static str,
    pub client_order_id: String,
    pub count: i64,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub yes_price: Option<i64>,
    pub no_price: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WireOrder {
    pub order_id: String,
    pub client_order_id: String,
    pub ticker: String,
    pub side: Side,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fill_count: i64,
    #[serde(default)]
    pub remaining_count: i64,
    pub yes_price: Option<i64>,
    pub no_price: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderResponse {
    pub order: WireOrder,
}

#[derive(Debug, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<WireOrder>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WirePosition {
    pub ticker: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub market_exposure: i64,
    #[serde(default)]
    pub realized_pnl: i64,
}

#[derive(Debug, Deserialize)]
pub struct PositionsResponse {
    #[serde(default)]
    pub market_positions: Vec<WirePosition>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireFill {
    pub order_id: String,
    pub ticker: String,
    pub side: Side,
    pub count: i64,
    pub price: i64,
    #[serde(default)]
    pub fees: i64,
    pub created_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FillsResponse {
    #[serde(default)]
    pub fills: Vec<WireFill>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

pub fn map_http_error(status: u16, body: String) -> Error {
    if (500..600).contains(&status) {
        Error::TransientNetworkError(format!("exchange returned {status}: {body}"))
    } else {
        Error::PermanentApiError {
            status,
            message: body,
        }
    }
}
