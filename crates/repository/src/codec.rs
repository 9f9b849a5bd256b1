//! Plain-string encodings for `domain` enums, stored as `TEXT` columns.
//! Kept as explicit match arms (not `serde`) so the on-disk representation
//! never silently drifts with a `Serialize` derive's defaults.

use domain::cities::Cluster;
use domain::{Action, Direction, HealthState, PositionStatus, ReasonCode, RiskEventType, Severity, Side};

pub fn side_to_str(s: Side) -> &'static str {
    match s {
        Side::Yes => "yes",
        Side::No => "no",
    }
}

pub fn side_from_str(s: &str) -> Option<Side> {
    match s {
        "yes" => Some(Side::Yes),
        "no" => Some(Side::No),
        _ => None,
    }
}

pub fn action_to_str(a: Action) -> &'static str {
    match a {
        Action::Buy => "buy",
        Action::Sell => "sell",
        Action::Hold => "hold",
    }
}

pub fn action_from_str(s: &str) -> Option<Action> {
    match s {
        "buy" => Some(Action::Buy),
        "sell" => Some(Action::Sell),
        "hold" => Some(Action::Hold),
        _ => None,
    }
}

pub fn direction_to_str(d: Direction) -> &'static str {
    match d {
        Direction::Above => "above",
        Direction::Below => "below",
    }
}

pub fn direction_from_str(s: &str) -> Option<Direction> {
    match s {
        "above" => Some(Direction::Above),
        "below" => Some(Direction::Below),
        _ => None,
    }
}

pub fn order_status_to_str(s: domain::OrderStatus) -> &'static str {
    use domain::OrderStatus::*;
    match s {
        New => "new",
        Submitted => "submitted",
        Resting => "resting",
        Partial => "partial",
        Filled => "filled",
        Canceled => "canceled",
        Rejected => "rejected",
        Closed => "closed",
    }
}

pub fn order_status_from_str(s: &str) -> Option<domain::OrderStatus> {
    use domain::OrderStatus::*;
    Some(match s {
        "new" => New,
        "submitted" => Submitted,
        "resting" => Resting,
        "partial" => Partial,
        "filled" => Filled,
        "canceled" => Canceled,
        "rejected" => Rejected,
        "closed" => Closed,
        _ => return None,
    })
}

pub fn position_status_to_str(s: PositionStatus) -> &'static str {
    match s {
        PositionStatus::Open => "open",
        PositionStatus::Closed => "closed",
    }
}

pub fn position_status_from_str(s: &str) -> Option<PositionStatus> {
    match s {
        "open" => Some(PositionStatus::Open),
        "closed" => Some(PositionStatus::Closed),
        _ => None,
    }
}

pub fn cluster_to_str(c: Cluster) -> &'static str {
    match c {
        Cluster::Ne => "ne",
        Cluster::Se => "se",
        Cluster::Midwest => "midwest",
        Cluster::Mountain => "mountain",
        Cluster::West => "west",
    }
}

pub fn cluster_from_str(s: &str) -> Option<Cluster> {
    Some(match s {
        "ne" => Cluster::Ne,
        "se" => Cluster::Se,
        "midwest" => Cluster::Midwest,
        "mountain" => Cluster::Mountain,
        "west" => Cluster::West,
        _ => return None,
    })
}

pub fn reason_code_to_str(r: ReasonCode) -> &'static str {
    use ReasonCode::*;
    match r {
        EdgePositive => "edge_positive",
        EdgeNegative => "edge_negative",
        HighUncertainty => "high_uncertainty",
        BelowMinEdge => "below_min_edge",
        HoldDefault => "hold_default",
        StaleWeather => "stale_weather",
        SpreadWide => "spread_wide",
        LowLiquidity => "low_liquidity",
        InsufficientEdge => "insufficient_edge",
        CityCapHit => "city_cap_hit",
        ClusterCapHit => "cluster_cap_hit",
        TradeCapHit => "trade_cap_hit",
        DailyLossHit => "daily_loss_hit",
        RejectBurst => "reject_burst",
    }
}

pub fn reason_code_from_str(s: &str) -> Option<ReasonCode> {
    use ReasonCode::*;
    Some(match s {
        "edge_positive" => EdgePositive,
        "edge_negative" => EdgeNegative,
        "high_uncertainty" => HighUncertainty,
        "below_min_edge" => BelowMinEdge,
        "hold_default" => HoldDefault,
        "stale_weather" => StaleWeather,
        "spread_wide" => SpreadWide,
        "low_liquidity" => LowLiquidity,
        "insufficient_edge" => InsufficientEdge,
        "city_cap_hit" => CityCapHit,
        "cluster_cap_hit" => ClusterCapHit,
        "trade_cap_hit" => TradeCapHit,
        "daily_loss_hit" => DailyLossHit,
        "reject_burst" => RejectBurst,
        _ => return None,
    })
}

pub fn reasons_to_str(reasons: &[ReasonCode]) -> String {
    reasons.iter().map(|r| reason_code_to_str(*r)).collect::<Vec<_>>().join(",")
}

pub fn reasons_from_str(s: &str) -> Vec<ReasonCode> {
    s.split(',').filter_map(reason_code_from_str).collect()
}

pub fn risk_event_type_to_str(t: RiskEventType) -> &'static str {
    use RiskEventType::*;
    match t {
        DailyLossHit => "daily_loss_hit",
        CityCapHit => "city_cap_hit",
        ClusterCapHit => "cluster_cap_hit",
        TradeCapHit => "trade_cap_hit",
        RejectBurst => "reject_burst",
        StaleWeather => "stale_weather",
    }
}

pub fn risk_event_type_from_str(s: &str) -> Option<RiskEventType> {
    use RiskEventType::*;
    Some(match s {
        "daily_loss_hit" => DailyLossHit,
        "city_cap_hit" => CityCapHit,
        "cluster_cap_hit" => ClusterCapHit,
        "trade_cap_hit" => TradeCapHit,
        "reject_burst" => RejectBurst,
        "stale_weather" => StaleWeather,
        _ => return None,
    })
}

pub fn severity_to_str(s: Severity) -> &'static str {
    match s {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Critical => "critical",
    }
}

pub fn severity_from_str(s: &str) -> Option<Severity> {
    Some(match s {
        "info" => Severity::Info,
        "warning" => Severity::Warning,
        "critical" => Severity::Critical,
        _ => return None,
    })
}

pub fn health_state_to_str(s: HealthState) -> &'static str {
    match s {
        HealthState::Ok => "ok",
        HealthState::Degraded => "degraded",
        HealthState::Down => "down",
    }
}

pub fn health_state_from_str(s: &str) -> Option<HealthState> {
    Some(match s {
        "ok" => HealthState::Ok,
        "degraded" => HealthState::Degraded,
        "down" => HealthState::Down,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_round_trip() {
        let r = vec![ReasonCode::EdgePositive, ReasonCode::HighUncertainty];
        let s = reasons_to_str(&r);
        assert_eq!(reasons_from_str(&s), r);
    }

    #[test]
    fn order_status_round_trips() {
        for s in [
            domain::OrderStatus::New,
            domain::OrderStatus::Submitted,
            domain::OrderStatus::Resting,
            domain::OrderStatus::Partial,
            domain::OrderStatus::Filled,
            domain::OrderStatus::Canceled,
            domain::OrderStatus::Rejected,
            domain::OrderStatus::Closed,
        ] {
            assert_eq!(order_status_from_str(order_status_to_str(s)), Some(s));
        }
    }
}
