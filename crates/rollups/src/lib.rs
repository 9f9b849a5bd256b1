//! Analytics Rollups (C12): idempotent per-day aggregates over orders/fills
//! (per-city pnl, win rate, trade count), signals (per-strategy signal
//! count, realized edge), and the equity curve (realized + unrealized pnl
//! against the bankroll baseline). Every aggregate is recomputed from
//! scratch and upserted, so running this twice for the same day is a
//! no-op (§4.8: "Rollups recomputed from scratch equal incremental
//! rollups for any day").

use chrono::NaiveDate;
use domain::Result;
use repository::Database;
use tracing::info;

/// Recompute and persist every analytics table for `day`.
pub fn run_for_day(db: &Database, day: NaiveDate, bankroll_dollars: f64) -> Result<()> {
    let city_rollups = db.compute_daily_city_rollups(day)?;
    for r in &city_rollups {
        db.upsert_daily_city_rollup(r)?;
    }
    info!(day = %day, cities = city_rollups.len(), "wrote daily city rollups");

    let strategy_rollups = db.compute_daily_strategy_rollups(day)?;
    for r in &strategy_rollups {
        db.upsert_daily_strategy_rollup(r)?;
    }
    info!(day = %day, strategies = strategy_rollups.len(), "wrote daily strategy rollups");

    let bankroll_baseline_cents = (bankroll_dollars * 100.0).round() as i64;
    let equity_point = db.compute_equity_point(day, bankroll_baseline_cents)?;
    db.upsert_equity_point(&equity_point)?;
    info!(
        day = %day,
        realized_pnl_cents = equity_point.realized_pnl_cents,
        unrealized_pnl_cents = equity_point.unrealized_pnl_cents,
        "wrote equity curve point"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use domain::{Fill, Order, OrderStatus, Side};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    fn filled_at_noon() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-10T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn run_for_day_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let o = Order {
            intent_key: "k1".into(),
            intent_version: 1,
            exchange_order_id: Some("ex-1".into()),
            city_code: "NYC".into(),
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            side: Side::Yes,
            quantity: 10,
            limit_price_cents: 71,
            status: OrderStatus::Filled,
            created_at: now,
            updated_at: now,
        };
        db.insert_order(&o).unwrap();
        db.insert_fill(&Fill {
            order_ref: o.client_order_id(),
            filled_at: filled_at_noon(),
            quantity: 10,
            price_cents: 71,
            fees_cents: 1,
            realized_pnl: Some(500),
        })
        .unwrap();

        run_for_day(&db, day(), 1000.0).unwrap();
        let first = db.compute_daily_city_rollups(day()).unwrap();
        run_for_day(&db, day(), 1000.0).unwrap();
        let second = db.compute_daily_city_rollups(day()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].realized_pnl_cents, 500);
    }
}
