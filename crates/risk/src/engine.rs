//! Risk Engine (C7): converts a `Signal` into a bounded order size, and
//! tracks the two circuit breakers described in §4.5 — daily loss and
//! rejection bursts. Every dollar cap is derived from `bankroll * ratio`
//! at call time; nothing here is a hardcoded constant.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use domain::cities::Cluster;
use domain::config::RiskConfig;
use domain::{Position, ReasonCode, Signal};

/// Result of sizing a signal against the per-trade, city, and cluster caps.
#[derive(Debug, Clone, PartialEq)]
pub enum SizingResult {
    Approved { quantity: i64, limit_price_cents: i64 },
    Refused { reason: ReasonCode },
}

/// Tracks exposure already committed earlier in the current cycle, so caps
/// are enforced across the whole batch of cities rather than per-city in
/// isolation. The caller holds this behind a mutex shared across the
/// concurrent per-city pipeline (§4.7 C10).
#[derive(Debug, Default)]
pub struct ExposureAccumulator {
    city_cents: HashMap<String, i64>,
    cluster_cents: HashMap<Cluster, i64>,
}

impl ExposureAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&mut self, city_code: &str, cluster: Cluster, cost_cents: i64) {
        *self.city_cents.entry(city_code.to_string()).or_insert(0) += cost_cents;
        *self.cluster_cents.entry(cluster).or_insert(0) += cost_cents;
    }

    fn city(&self, city_code: &str) -> i64 {
        self.city_cents.get(city_code).copied().unwrap_or(0)
    }

    fn cluster(&self, cluster: Cluster) -> i64 {
        self.cluster_cents.get(&cluster).copied().unwrap_or(0)
    }
}

/// `size(signal, bankroll, risk, max_uncertainty, cluster, positions,
/// in_cycle) -> Approved(quantity, price) | Refused(reason)` (§4.5).
///
/// Applies the per-trade cap first, then reduces quantity (never raises
/// it) for city and cluster headroom, short-circuiting with a refusal
/// when headroom is exhausted before any quantity survives.
#[allow(clippy::too_many_arguments)]
pub fn size(
    signal: &Signal,
    bankroll: f64,
    risk: &RiskConfig,
    max_uncertainty: f64,
    cluster: Cluster,
    positions: &[Position],
    in_cycle: &ExposureAccumulator,
) -> SizingResult {
    if signal.max_price_cents <= 0 {
        return SizingResult::Refused {
            reason: ReasonCode::TradeCapHit,
        };
    }
    let price_dollars = signal.max_price_cents as f64 / 100.0;

    // Per-trade cap: dollars at risk scale down with the signal's own
    // uncertainty, so a noisier forecast trades smaller.
    let confidence = (1.0 - signal.uncertainty / max_uncertainty).clamp(0.0, 1.0);
    let dollars_at_risk = bankroll * risk.max_trade_risk_pct * confidence;
    let mut quantity = (dollars_at_risk / price_dollars).floor() as i64;
    quantity = quantity.min(risk.max_contracts_per_trade);
    if quantity <= 0 {
        return SizingResult::Refused {
            reason: ReasonCode::TradeCapHit,
        };
    }

    // City cap.
    let city_existing = positions
        .iter()
        .filter(|p| p.city_code == signal.city_code)
        .map(|p| p.exposure_cents())
        .sum::<i64>()
        + in_cycle.city(&signal.city_code);
    let city_cap_cents = (bankroll * risk.max_city_exposure_pct * 100.0).round() as i64;
    let city_headroom_cents = city_cap_cents - city_existing;
    if city_headroom_cents <= 0 {
        return SizingResult::Refused {
            reason: ReasonCode::CityCapHit,
        };
    }
    let city_headroom_qty = (city_headroom_cents as f64 / signal.max_price_cents as f64).floor() as i64;
    quantity = quantity.min(city_headroom_qty);
    if quantity <= 0 {
        return SizingResult::Refused {
            reason: ReasonCode::CityCapHit,
        };
    }

    // Cluster cap.
    let cluster_existing = positions
        .iter()
        .filter(|p| p.cluster == cluster)
        .map(|p| p.exposure_cents())
        .sum::<i64>()
        + in_cycle.cluster(cluster);
    let cluster_cap_cents = (bankroll * risk.max_cluster_exposure_pct * 100.0).round() as i64;
    let cluster_headroom_cents = cluster_cap_cents - cluster_existing;
    if cluster_headroom_cents <= 0 {
        return SizingResult::Refused {
            reason: ReasonCode::ClusterCapHit,
        };
    }
    let cluster_headroom_qty =
        (cluster_headroom_cents as f64 / signal.max_price_cents as f64).floor() as i64;
    quantity = quantity.min(cluster_headroom_qty);
    if quantity <= 0 {
        return SizingResult::Refused {
            reason: ReasonCode::ClusterCapHit,
        };
    }

    SizingResult::Approved {
        quantity,
        limit_price_cents: signal.max_price_cents,
    }
}

/// Daily-loss circuit breaker (§4.5): trips when today's realized plus
/// open unrealized P&L falls at or below `-bankroll * max_daily_loss_pct`.
pub fn daily_loss_tripped(
    bankroll: f64,
    max_daily_loss_pct: f64,
    realized_pnl_cents_today: i64,
    unrealized_pnl_cents: i64,
) -> bool {
    let floor_cents = -(bankroll * max_daily_loss_pct * 100.0);
    (realized_pnl_cents_today + unrealized_pnl_cents) as f64 <= floor_cents
}

/// Rejection-burst circuit breaker (§4.5): a sliding window of rejection
/// timestamps, tripped at `rejection_burst_threshold` within
/// `rejection_window_sec`.
#[derive(Debug)]
pub struct RejectionTracker {
    window: chrono::Duration,
    threshold: u32,
    timestamps: VecDeque<DateTime<Utc>>,
}

impl RejectionTracker {
    pub fn new(window_sec: i64, threshold: u32) -> Self {
        Self {
            window: chrono::Duration::seconds(window_sec),
            threshold,
            timestamps: VecDeque::new(),
        }
    }

    pub fn record(&mut self, at: DateTime<Utc>) {
        self.timestamps.push_back(at);
        self.evict(at);
    }

    pub fn is_tripped(&mut self, at: DateTime<Utc>) -> bool {
        self.evict(at);
        self.timestamps.len() as u32 >= self.threshold
    }

    fn evict(&mut self, at: DateTime<Utc>) {
        while let Some(&front) = self.timestamps.front() {
            if at - front > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Action, PositionStatus, Side};

    fn risk_config() -> RiskConfig {
        RiskConfig {
            max_trade_risk_pct: 0.02,
            max_city_exposure_pct: 0.03,
            max_cluster_exposure_pct: 0.05,
            max_daily_loss_pct: 0.05,
            max_contracts_per_trade: 200,
            rejection_window_sec: 900,
            rejection_burst_threshold: 5,
        }
    }

    fn signal(max_price_cents: i64, uncertainty: f64) -> Signal {
        Signal {
            city_code: "NYC".into(),
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            strategy_name: "daily_high_temp".into(),
            p_yes_model: 0.75,
            uncertainty,
            p_yes_market: 0.465,
            edge: 0.28,
            action: Action::Buy,
            side: Side::Yes,
            max_price_cents,
            reasons: vec![ReasonCode::EdgePositive],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sizes_within_per_trade_cap() {
        let s = signal(71, 0.1);
        let result = size(
            &s,
            1000.0,
            &risk_config(),
            0.30,
            Cluster::Ne,
            &[],
            &ExposureAccumulator::new(),
        );
        match result {
            SizingResult::Approved { quantity, limit_price_cents } => {
                assert_eq!(limit_price_cents, 71);
                assert!(quantity > 0);
                let dollars_at_risk = 1000.0 * 0.02 * (1.0 - 0.1 / 0.30);
                let expected = (dollars_at_risk / 0.71).floor() as i64;
                assert_eq!(quantity, expected);
            }
            other => panic!("expected approval, got {other:?}"),
        }
    }

    #[test]
    fn city_cap_refuses_when_existing_exposure_fills_headroom() {
        let s = signal(71, 0.1);
        let position = Position {
            ticker: "KXHIGHNYC-26FEB09-T70".into(),
            city_code: "NYC".into(),
            cluster: Cluster::Ne,
            side: Side::Yes,
            quantity_open: 1000,
            avg_entry_cents: 71.0,
            avg_exit_cents: None,
            realized_pnl: 0,
            status: PositionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        };
        let result = size(
            &s,
            1000.0,
            &risk_config(),
            0.30,
            Cluster::Ne,
            &[position],
            &ExposureAccumulator::new(),
        );
        assert_eq!(result, SizingResult::Refused { reason: ReasonCode::CityCapHit });
    }

    #[test]
    fn zero_price_refuses() {
        let s = signal(0, 0.1);
        let result = size(&s, 1000.0, &risk_config(), 0.30, Cluster::Ne, &[], &ExposureAccumulator::new());
        assert_eq!(result, SizingResult::Refused { reason: ReasonCode::TradeCapHit });
    }

    #[test]
    fn daily_loss_trips_at_floor() {
        assert!(daily_loss_tripped(1000.0, 0.05, -5000, 0));
        assert!(!daily_loss_tripped(1000.0, 0.05, -4000, 0));
    }

    #[test]
    fn rejection_burst_trips_at_threshold() {
        let mut tracker = RejectionTracker::new(900, 5);
        let base = Utc::now();
        for i in 0..4 {
            tracker.record(base + chrono::Duration::seconds(i));
            assert!(!tracker.is_tripped(base + chrono::Duration::seconds(i)));
        }
        tracker.record(base + chrono::Duration::seconds(4));
        assert!(tracker.is_tripped(base + chrono::Duration::seconds(4)));
    }

    #[test]
    fn rejection_burst_evicts_outside_window() {
        let mut tracker = RejectionTracker::new(10, 2);
        let base = Utc::now();
        tracker.record(base);
        tracker.record(base + chrono::Duration::seconds(20));
        assert!(!tracker.is_tripped(base + chrono::Duration::seconds(20)));
    }
}
