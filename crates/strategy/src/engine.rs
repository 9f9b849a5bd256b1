//! Strategy (C5): maps (forecast, market quote) into a `Signal`. Pure:
//! identical inputs (including configured thresholds) produce identical
//! outputs (§4.3) — no I/O, no shared state, no RNG.

use crate::probability::p_model;
use chrono::{DateTime, Utc};
use domain::{Action, MarketSnapshot, ReasonCode, Side, Signal, WeatherSnapshot};

pub const STRATEGY_NAME: &str = "daily_high_temp";

/// `evaluate(weather, market, min_edge_after_costs, max_uncertainty) -> Signal`
/// (§9 design notes: the capability function replacing a subclass-based
/// strategy hierarchy).
pub fn evaluate(
    weather: &WeatherSnapshot,
    market: &MarketSnapshot,
    min_edge_after_costs: f64,
    max_uncertainty: f64,
) -> Signal {
    let now = Utc::now();

    if weather.stale {
        return hold(weather, market, vec![ReasonCode::StaleWeather], 0.0, 0.0, 0.0, now);
    }

    let Some(p_yes_model) = p_model(
        market.threshold_f,
        market.direction,
        weather.forecast_high_f,
        weather.forecast_stddev_f,
    ) else {
        return hold(weather, market, vec![ReasonCode::HighUncertainty], 0.0, 0.0, 0.0, now);
    };

    let (Some(mid_yes), Some(mid_no)) = (market.mid_yes(), market.mid_no()) else {
        return hold(weather, market, vec![ReasonCode::HoldDefault], p_yes_model, 0.0, 0.0, now);
    };

    let p_market_yes = mid_yes / 100.0;
    let p_market_no = mid_no / 100.0;
    let edge_yes = p_yes_model - p_market_yes;

    // Prefer YES when its edge is positive; otherwise consider NO, whose
    // edge is computed against the NO mid and complement probability.
    let (side, edge, side_p_model, side_ask) = if edge_yes > 0.0 {
        (Side::Yes, edge_yes, p_yes_model, market.yes_ask)
    } else {
        let p_no_model = 1.0 - p_yes_model;
        let edge_no = p_no_model - p_market_no;
        (Side::No, edge_no, p_no_model, market.no_ask)
    };

    let sigma = weather.forecast_stddev_f;
    let uncertainty = (sigma / 15.0).min(max_uncertainty);

    let mut reasons = vec![if edge > 0.0 {
        ReasonCode::EdgePositive
    } else {
        ReasonCode::EdgeNegative
    }];

    let uncertainty_ok = uncertainty <= max_uncertainty;
    if !uncertainty_ok {
        reasons.push(ReasonCode::HighUncertainty);
    }

    let edge_ok = edge.abs() >= min_edge_after_costs;
    if !edge_ok {
        reasons.push(ReasonCode::BelowMinEdge);
    }

    let ask_ok = matches!(side_ask, Some(ask) if (ask as f64) <= 100.0 * (side_p_model - min_edge_after_costs));

    let action = if edge_ok && uncertainty_ok && ask_ok {
        Action::Buy
    } else {
        if reasons.len() == 1 {
            // Edge sign alone didn't disqualify anything; the ask-price
            // check must have. Record a hold reason regardless.
            reasons.push(ReasonCode::HoldDefault);
        }
        Action::Hold
    };

    let max_price_cents = if action == Action::Buy {
        (100.0 * (side_p_model - min_edge_after_costs)).floor() as i64
    } else {
        0
    };

    Signal {
        city_code: weather.city_code.clone(),
        ticker: market.ticker.clone(),
        strategy_name: STRATEGY_NAME.to_string(),
        p_yes_model,
        uncertainty,
        p_yes_market: p_market_yes,
        edge,
        action,
        side,
        max_price_cents,
        reasons,
        created_at: now,
    }
}

#[allow(clippy::too_many_arguments)]
fn hold(
    weather: &WeatherSnapshot,
    market: &MarketSnapshot,
    reasons: Vec<ReasonCode>,
    p_yes_model: f64,
    uncertainty: f64,
    p_yes_market: f64,
    created_at: DateTime<Utc>,
) -> Signal {
    Signal {
        city_code: weather.city_code.clone(),
        ticker: market.ticker.clone(),
        strategy_name: STRATEGY_NAME.to_string(),
        p_yes_model,
        uncertainty,
        p_yes_market,
        edge: 0.0,
        action: Action::Hold,
        side: Side::Yes,
        max_price_cents: 0,
        reasons,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::Direction;

    fn weather(high: f64, sigma: f64, stale: bool) -> WeatherSnapshot {
        WeatherSnapshot {
            city_code: "NYC".into(),
            captured_at: Utc::now(),
            forecast_high_f: high,
            forecast_stddev_f: sigma,
            observed_temp_f: None,
            source_timestamps: String::new(),
            stale,
        }
    }

    fn market(threshold: f64, yb: i64, ya: i64, nb: i64, na: i64, vol: i64, oi: i64) -> MarketSnapshot {
        MarketSnapshot {
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            city_code: "NYC".into(),
            threshold_f: threshold,
            direction: Direction::Above,
            event_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            yes_bid: Some(yb),
            yes_ask: Some(ya),
            no_bid: Some(nb),
            no_ask: Some(na),
            volume: vol,
            open_interest: oi,
            close_time: Utc::now() + chrono::Duration::hours(6),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn s1_happy_path() {
        let w = weather(72.0, 3.0, false);
        let m = market(70.0, 45, 48, 52, 55, 1200, 3000);
        let sig = evaluate(&w, &m, 0.03, 0.30);
        assert_eq!(sig.action, Action::Buy);
        assert_eq!(sig.side, Side::Yes);
        assert_eq!(sig.max_price_cents, 71);
        assert!((sig.edge - 0.283).abs() < 0.01);
    }

    #[test]
    fn s2_stale_weather_holds_with_reason() {
        let w = weather(72.0, 3.0, true);
        let m = market(70.0, 45, 48, 52, 55, 1200, 3000);
        let sig = evaluate(&w, &m, 0.03, 0.30);
        assert_eq!(sig.action, Action::Hold);
        assert!(sig.reasons.contains(&ReasonCode::StaleWeather));
    }

    #[test]
    fn zero_stddev_holds_high_uncertainty() {
        let w = weather(72.0, 0.0, false);
        let m = market(70.0, 45, 48, 52, 55, 1200, 3000);
        let sig = evaluate(&w, &m, 0.03, 0.30);
        assert_eq!(sig.action, Action::Hold);
        assert!(sig.reasons.contains(&ReasonCode::HighUncertainty));
    }

    #[test]
    fn edge_at_min_passes() {
        let w = weather(70.0, 3.0, false); // p_model = 0.5 at threshold
        let m = market(70.0, 45, 47, 53, 55, 1200, 3000); // mid_yes = 0.46 -> edge=0.04
        let sig = evaluate(&w, &m, 0.04, 0.30);
        assert_eq!(sig.action, Action::Buy);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let w = weather(72.0, 3.0, false);
        let m = market(70.0, 45, 48, 52, 55, 1200, 3000);
        let a = evaluate(&w, &m, 0.03, 0.30);
        let b = evaluate(&w, &m, 0.03, 0.30);
        assert_eq!(a.p_yes_model, b.p_yes_model);
        assert_eq!(a.action, b.action);
        assert_eq!(a.max_price_cents, b.max_price_cents);
    }

    #[test]
    fn never_emits_gate_reasons() {
        let w = weather(72.0, 3.0, false);
        let m = market(70.0, 45, 48, 52, 55, 1200, 3000);
        let sig = evaluate(&w, &m, 0.03, 0.30);
        assert!(!sig.reasons.contains(&ReasonCode::SpreadWide));
        assert!(!sig.reasons.contains(&ReasonCode::LowLiquidity));
    }
}
