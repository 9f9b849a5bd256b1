//! Public Read Model (C11, §4.8): a view over fills joined to their orders
//! that filters `filled_at <= now - public_delay_sec` and redacts order
//! identifiers, intent keys, and raw payloads. Timestamps are rounded down
//! to the minute.

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::{Result, Side};

use crate::codec::side_from_str;
use crate::db::Database;

/// A single redacted fill, safe to expose to external read-only clients.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicFill {
    pub ticker: String,
    pub city_code: String,
    pub side: Side,
    pub quantity: i64,
    pub price_cents: i64,
    pub filled_at: DateTime<Utc>,
}

fn round_down_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp() - t.timestamp() % 60, 0).unwrap()
}

impl Database {
    /// `public_fills(now, public_delay_sec) -> [PublicFill]` (§4.8).
    pub fn public_fills(&self, now: DateTime<Utc>, public_delay_sec: i64) -> Result<Vec<PublicFill>> {
        let cutoff = now - Duration::seconds(public_delay_sec);
        let mut stmt = self.conn().prepare(
            "SELECT o.ticker, o.city_code, o.side, f.quantity, f.price_cents, f.filled_at
             FROM fills f
             JOIN orders o ON f.order_ref = o.intent_key || '#' || o.intent_version
             WHERE f.filled_at <= ?1
             ORDER BY f.filled_at ASC",
        )?;
        let rows = stmt.query_map([cutoff.to_rfc3339()], |row| {
            let side_str: String = row.get(2)?;
            let filled_at_str: String = row.get(4)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                side_str,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(5)?,
                filled_at_str,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (ticker, city_code, side_str, quantity, price_cents, filled_at_str) = row?;
            let filled_at = DateTime::parse_from_rfc3339(&filled_at_str)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or(now);
            out.push(PublicFill {
                ticker,
                city_code,
                side: side_from_str(&side_str).unwrap_or(Side::Yes),
                quantity,
                price_cents,
                filled_at: round_down_to_minute(filled_at),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Fill, Order, OrderStatus};

    fn order(intent_key: &str, city: &str, ticker: &str) -> Order {
        let now = Utc::now();
        Order {
            intent_key: intent_key.to_string(),
            intent_version: 1,
            exchange_order_id: Some("ex-1".into()),
            city_code: city.to_string(),
            ticker: ticker.to_string(),
            side: Side::Yes,
            quantity: 10,
            limit_price_cents: 71,
            status: OrderStatus::Filled,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn hides_fills_inside_the_delay_window() {
        let db = Database::open_in_memory().unwrap();
        let o = order("deadbeef", "NYC", "KXHIGHNYC-26FEB10-T70");
        db.insert_order(&o).unwrap();

        let now = Utc::now();
        db.insert_fill(&Fill {
            order_ref: o.client_order_id(),
            filled_at: now - Duration::seconds(10),
            quantity: 10,
            price_cents: 71,
            fees_cents: 0,
            realized_pnl: None,
        })
        .unwrap();

        let visible = db.public_fills(now, 3600).unwrap();
        assert!(visible.is_empty());
    }

    #[test]
    fn shows_fills_past_the_delay_window_with_redacted_fields() {
        let db = Database::open_in_memory().unwrap();
        let o = order("deadbeef", "NYC", "KXHIGHNYC-26FEB10-T70");
        db.insert_order(&o).unwrap();

        let now = Utc::now();
        db.insert_fill(&Fill {
            order_ref: o.client_order_id(),
            filled_at: now - Duration::seconds(7200),
            quantity: 10,
            price_cents: 71,
            fees_cents: 0,
            realized_pnl: None,
        })
        .unwrap();

        let visible = db.public_fills(now, 3600).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].ticker, "KXHIGHNYC-26FEB10-T70");
        assert_eq!(visible[0].quantity, 10);
    }
}
