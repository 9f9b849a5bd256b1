//! Gates (C6): three independent, short-circuiting admission checks run
//! against a `MarketSnapshot` + `Signal` before an order is placed (§4.4).
//! Each check is evaluated in order; the first failure short-circuits the
//! remaining checks.

use domain::{MarketSnapshot, ReasonCode, Signal};

/// Outcome of running a signal through the gate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum GateResult {
    Admitted { price_cents: i64 },
    Refused { reason: ReasonCode },
}

/// `run(signal, market, spread_max_cents, liquidity_min, min_liquidity_multiple,
/// min_edge_after_costs) -> Admitted(price) | Refused(reason)` (§4.4).
#[allow(clippy::too_many_arguments)]
pub fn run(
    signal: &Signal,
    market: &MarketSnapshot,
    spread_max_cents: i64,
    liquidity_min: i64,
    min_liquidity_multiple: f64,
    min_edge_after_costs: f64,
) -> GateResult {
    let Some(spread_gate) = spread(market, spread_max_cents) else {
        return GateResult::Refused {
            reason: ReasonCode::SpreadWide,
        };
    };
    if !spread_gate {
        return GateResult::Refused {
            reason: ReasonCode::SpreadWide,
        };
    }

    if !liquidity(market, liquidity_min, min_liquidity_multiple) {
        return GateResult::Refused {
            reason: ReasonCode::LowLiquidity,
        };
    }

    if !min_edge(signal, min_edge_after_costs) {
        return GateResult::Refused {
            reason: ReasonCode::InsufficientEdge,
        };
    }

    GateResult::Admitted {
        price_cents: signal.max_price_cents,
    }
}

/// `(yes_ask - yes_bid) <= spread_max_cents`. `None` if the market is
/// missing a quote side (treated as a refusal by the caller).
fn spread(market: &MarketSnapshot, spread_max_cents: i64) -> Option<bool> {
    let width = market.yes_ask? - market.yes_bid?;
    Some(width <= spread_max_cents)
}

/// `min(volume, open_interest) >= liquidity_min AND open_interest >=
/// liquidity_min * min_liquidity_multiple`.
fn liquidity(market: &MarketSnapshot, liquidity_min: i64, min_liquidity_multiple: f64) -> bool {
    let floor_ok = market.volume.min(market.open_interest) >= liquidity_min;
    let depth_ok = (market.open_interest as f64) >= (liquidity_min as f64) * min_liquidity_multiple;
    floor_ok && depth_ok
}

/// `|edge| >= min_edge_after_costs`.
fn min_edge(signal: &Signal, min_edge_after_costs: f64) -> bool {
    signal.edge.abs() >= min_edge_after_costs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use domain::{Action, Direction, Side};

    fn market(ya: i64, yb: i64, vol: i64, oi: i64) -> MarketSnapshot {
        MarketSnapshot {
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            city_code: "NYC".into(),
            threshold_f: 70.0,
            direction: Direction::Above,
            event_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            yes_bid: Some(yb),
            yes_ask: Some(ya),
            no_bid: Some(100 - ya),
            no_ask: Some(100 - yb),
            volume: vol,
            open_interest: oi,
            close_time: Utc::now() + chrono::Duration::hours(6),
            captured_at: Utc::now(),
        }
    }

    fn signal(edge: f64, max_price_cents: i64) -> Signal {
        Signal {
            city_code: "NYC".into(),
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            strategy_name: "daily_high_temp".into(),
            p_yes_model: 0.75,
            uncertainty: 0.2,
            p_yes_market: 0.465,
            edge,
            action: Action::Buy,
            side: Side::Yes,
            max_price_cents,
            reasons: vec![ReasonCode::EdgePositive],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admits_when_all_three_checks_pass() {
        let m = market(48, 45, 1200, 3000);
        let s = signal(0.28, 71);
        assert_eq!(run(&s, &m, 4, 100, 5.0, 0.03), GateResult::Admitted { price_cents: 71 });
    }

    #[test]
    fn wide_spread_refuses_before_liquidity_checked() {
        let m = market(60, 10, 1200, 3000); // width 50 > 4
        let s = signal(0.28, 71);
        assert_eq!(
            run(&s, &m, 4, 100, 5.0, 0.03),
            GateResult::Refused { reason: ReasonCode::SpreadWide }
        );
    }

    #[test]
    fn low_open_interest_relative_to_floor_refuses() {
        let m = market(48, 45, 1200, 400); // oi 400 < 100*5
        let s = signal(0.28, 71);
        assert_eq!(
            run(&s, &m, 4, 100, 5.0, 0.03),
            GateResult::Refused { reason: ReasonCode::LowLiquidity }
        );
    }

    #[test]
    fn thin_edge_refuses_after_spread_and_liquidity_pass() {
        let m = market(48, 45, 1200, 3000);
        let s = signal(0.01, 71);
        assert_eq!(
            run(&s, &m, 4, 100, 5.0, 0.03),
            GateResult::Refused { reason: ReasonCode::InsufficientEdge }
        );
    }

    #[test]
    fn missing_quote_side_refuses_on_spread() {
        let mut m = market(48, 45, 1200, 3000);
        m.yes_bid = None;
        let s = signal(0.28, 71);
        assert_eq!(
            run(&s, &m, 4, 100, 5.0, 0.03),
            GateResult::Refused { reason: ReasonCode::SpreadWide }
        );
    }
}
