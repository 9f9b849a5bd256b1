//! Market Provider (C4): `list_active(series_prefix, city_code, event_date)
//! -> [ticker]`, `quote(ticker) -> MarketSnapshot` (§4.2).
//!
//! Ticker convention: `{series_prefix}-{YYMMMDD}-T{threshold_f}`, e.g.
//! `KXHIGHNYC-26FEB10-T70`. Direction is always `ABOVE` under this scheme —
//! the exchange lists a separate ticker per threshold rather than encoding
//! BELOW contracts, consistent with the cumulative daily-high-temperature
//! series this engine trades.

use chrono::NaiveDate;
use domain::{Direction, Error, MarketSnapshot};
use tracing::warn;

use crate::rest::ExchangeRestClient;

pub struct MarketProvider {
    rest: ExchangeRestClient,
}

impl MarketProvider {
    pub fn new(rest: ExchangeRestClient) -> Self {
        Self { rest }
    }

    /// Returns only contracts whose settlement date matches `event_date`
    /// and whose close time is in the future (§4.2). `series_prefix` plus
    /// `city_code` forms the per-city series ticker, e.g. `KXHIGH` + `NYC`
    /// -> `KXHIGHNYC` — each city trades its own series, never a shared one.
    pub async fn list_active(
        &self,
        series_prefix: &str,
        city_code: &str,
        event_date: NaiveDate,
    ) -> Result<Vec<String>, Error> {
        let series_ticker = format!("{series_prefix}{city_code}");
        let markets = self.rest.list_markets(&series_ticker).await?;
        let date_token = event_date.format("%y%b%d").to_string().to_uppercase();

        Ok(markets
            .into_iter()
            .filter(|m| m.ticker.contains(&date_token) && m.close_time > chrono::Utc::now())
            .map(|m| m.ticker)
            .collect())
    }

    /// Fetch a single market snapshot, parsing threshold/direction/event
    /// date from the ticker. Missing sides yield `None` in the snapshot,
    /// marking the market ineligible (§4.2) — parse failures are logged
    /// and the market is skipped by the caller.
    pub async fn quote(&self, ticker: &str, city_code: &str) -> Result<MarketSnapshot, Error> {
        let wire = self.rest.get_orderbook(ticker).await?;
        let (threshold_f, event_date) = parse_ticker(ticker).ok_or_else(|| {
            Error::DataValidationError(format!("could not parse ticker {ticker}"))
        })?;
        Ok(wire.into_snapshot(city_code, threshold_f, Direction::Above, event_date))
    }
}

fn parse_ticker(ticker: &str) -> Option<(f64, NaiveDate)> {
    let mut parts = ticker.rsplitn(3, '-');
    let threshold_token = parts.next()?;
    let date_token = parts.next()?;

    let threshold_f: f64 = threshold_token.strip_prefix('T')?.parse().ok()?;
    let event_date = parse_compact_date(date_token).or_else(|| {
        warn!("could not parse event date token {date_token} in ticker {ticker}");
        None
    })?;
    Some((threshold_f, event_date))
}

fn parse_compact_date(token: &str) -> Option<NaiveDate> {
    // e.g. "26FEB10" -> 2026-02-10
    if token.len() < 7 {
        return None;
    }
    let year: i32 = 2000 + token[0..2].parse::<i32>().ok()?;
    let month_str = &token[2..5];
    let day: u32 = token[5..7].parse().ok()?;
    let month = match month_str {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_ticker() {
        let (threshold, date) = parse_ticker("KXHIGHNYC-26FEB10-T70").unwrap();
        assert_eq!(threshold, 70.0);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
    }

    #[test]
    fn rejects_malformed_ticker() {
        assert!(parse_ticker("garbage").is_none());
    }
}
