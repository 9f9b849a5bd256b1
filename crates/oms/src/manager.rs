//! OMS (C8): order placement, idempotency, cancel/replace policy, and
//! reconciliation, built around the intent key (§4.6) and the validated
//! state machine in [`crate::state_machine`].

use chrono::{DateTime, NaiveDate, Utc};
use domain::intent::intent_key;
use domain::{Error, Fill, Order, OrderStatus, Side};
use exchange_client::rest::ExchangeRestClient;
use exchange_client::wire::WireOrder;
use tracing::{info, warn};

use crate::state_machine::validate_transition;

pub struct OrderManager {
    rest: ExchangeRestClient,
}

impl OrderManager {
    pub fn new(rest: ExchangeRestClient) -> Self {
        Self { rest }
    }

    pub fn client_order_id(key: &str, version: u32) -> String {
        format!("{key}#{version}")
    }

    /// Place a new order for an intent that has no existing active order
    /// (§4.6 idempotency — the caller is responsible for checking
    /// `existing_active_order` before calling this).
    #[allow(clippy::too_many_arguments)]
    pub async fn place(
        &self,
        city_code: &str,
        ticker: &str,
        strategy_name: &str,
        event_date: NaiveDate,
        side: Side,
        quantity: i64,
        limit_price_cents: i64,
        version: u32,
    ) -> Result<Order, Error> {
        let key = intent_key(city_code, ticker, side, strategy_name, event_date);
        let client_order_id = Self::client_order_id(&key, version);

        let now = Utc::now();
        let wire = self
            .rest
            .place_order(&client_order_id, ticker, side, quantity, limit_price_cents)
            .await?;

        let status = map_wire_status(&wire.status);
        validate_transition(OrderStatus::New, OrderStatus::Submitted)?;

        info!(
            intent_key = %key,
            ticker,
            quantity,
            limit_price_cents,
            "order placed"
        );

        Ok(Order {
            intent_key: key,
            intent_version: version,
            exchange_order_id: Some(wire.order_id),
            city_code: city_code.to_string(),
            ticker: ticker.to_string(),
            side,
            quantity,
            limit_price_cents,
            status: if status == OrderStatus::New { OrderStatus::Submitted } else { status },
            created_at: now,
            updated_at: now,
        })
    }

    /// Cancel a resting/partial order. Terminal orders are left untouched.
    pub async fn cancel(&self, order: &mut Order) -> Result<(), Error> {
        if order.status.is_terminal() {
            return Ok(());
        }
        if let Some(id) = order.exchange_order_id.clone() {
            self.rest.cancel_order(&id).await?;
        }
        validate_transition(order.status, OrderStatus::Canceled)?;
        order.status = OrderStatus::Canceled;
        order.updated_at = Utc::now();
        Ok(())
    }

    /// Cancel/replace policy (§4.6): repricing is allowed only once per
    /// `reprice_interval_sec`, and only while the cumulative movement from
    /// the order's original price stays within `max_chase_cents`.
    pub fn should_reprice(
        order: &Order,
        original_price_cents: i64,
        candidate_price_cents: i64,
        now: DateTime<Utc>,
        reprice_interval_sec: i64,
        max_chase_cents: i64,
    ) -> bool {
        if order.status.is_terminal() {
            return false;
        }
        let elapsed = (now - order.updated_at).num_seconds();
        if elapsed < reprice_interval_sec {
            return false;
        }
        let total_movement = (candidate_price_cents - original_price_cents).abs();
        total_movement <= max_chase_cents
    }

    /// Apply a fill reported by the exchange, advancing the order's status
    /// through the state machine and producing the corresponding `Fill`
    /// row. Mandatory every cycle before risk checks (§4.6).
    pub fn apply_fill(order: &mut Order, fill_qty: i64, fill_price_cents: i64, fees_cents: i64) -> Result<Fill, Error> {
        let filled_so_far = order.quantity.min(fill_qty);
        let next_status = if filled_so_far >= order.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };
        validate_transition(order.status, next_status)?;
        order.status = next_status;
        order.updated_at = Utc::now();

        Ok(Fill {
            order_ref: order.client_order_id(),
            filled_at: order.updated_at,
            quantity: fill_qty,
            price_cents: fill_price_cents,
            fees_cents,
            realized_pnl: None,
        })
    }

    /// Close a `Filled` order once its position has been fully accounted
    /// for downstream.
    pub fn close(order: &mut Order) -> Result<(), Error> {
        validate_transition(order.status, OrderStatus::Closed)?;
        order.status = OrderStatus::Closed;
        order.updated_at = Utc::now();
        Ok(())
    }

    /// Startup reconciliation (§4.6): returns exchange orders with no
    /// matching local `client_order_id` (orphans, to be imported) and the
    /// local orders that no longer exist on the exchange (to be closed with
    /// `RECONCILE_STALE`).
    ///
    /// Force-closing a stale local order intentionally bypasses the
    /// validated transition table: the exchange's state has already
    /// diverged from ours, so there is no "from" state left to validate
    /// against. This is the one deliberate exception, scoped to startup
    /// reconciliation only.
    pub fn reconcile_startup<'a>(
        local_orders: &'a [Order],
        exchange_orders: &'a [WireOrder],
    ) -> (Vec<&'a WireOrder>, Vec<&'a Order>) {
        let orphans: Vec<&WireOrder> = exchange_orders
            .iter()
            .filter(|w| !local_orders.iter().any(|o| o.client_order_id() == w.client_order_id))
            .collect();

        let stale: Vec<&Order> = local_orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .filter(|o| !exchange_orders.iter().any(|w| w.client_order_id == o.client_order_id()))
            .collect();

        for o in &stale {
            warn!(intent_key = %o.intent_key, "local order missing on exchange, closing as RECONCILE_STALE");
        }

        (orphans, stale)
    }

    /// Force-close a stale local order discovered during startup
    /// reconciliation (see [`reconcile_startup`]).
    pub fn force_close_stale(order: &mut Order) {
        order.status = OrderStatus::Closed;
        order.updated_at = Utc::now();
    }
}

fn map_wire_status(status: &str) -> OrderStatus {
    match status {
        "resting" => OrderStatus::Resting,
        "canceled" => OrderStatus::Canceled,
        "executed" | "filled" => OrderStatus::Filled,
        "rejected" => OrderStatus::Rejected,
        "pending" | "" => OrderStatus::New,
        other => {
            warn!("unrecognized exchange order status {other:?}, defaulting to Submitted");
            OrderStatus::Submitted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order(status: OrderStatus, updated_at: DateTime<Utc>) -> Order {
        Order {
            intent_key: "deadbeef".into(),
            intent_version: 1,
            exchange_order_id: Some("ex-1".into()),
            city_code: "NYC".into(),
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            side: Side::Yes,
            quantity: 10,
            limit_price_cents: 71,
            status,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn apply_fill_partial_then_full() {
        let mut o = order(OrderStatus::Resting, Utc::now());
        let fill1 = OrderManager::apply_fill(&mut o, 4, 71, 0).unwrap();
        assert_eq!(o.status, OrderStatus::Partial);
        assert_eq!(fill1.quantity, 4);
    }

    #[test]
    fn apply_fill_beyond_terminal_rejected() {
        let mut o = order(OrderStatus::Filled, Utc::now());
        assert!(OrderManager::apply_fill(&mut o, 10, 71, 0).is_err());
    }

    #[test]
    fn reprice_refused_before_interval_elapsed() {
        let o = order(OrderStatus::Resting, Utc::now());
        let now = o.updated_at + Duration::seconds(30);
        assert!(!OrderManager::should_reprice(&o, 71, 72, now, 120, 6));
    }

    #[test]
    fn reprice_refused_beyond_max_chase() {
        let o = order(OrderStatus::Resting, Utc::now());
        let now = o.updated_at + Duration::seconds(200);
        assert!(!OrderManager::should_reprice(&o, 71, 80, now, 120, 6));
    }

    #[test]
    fn reprice_allowed_within_window_and_chase() {
        let o = order(OrderStatus::Resting, Utc::now());
        let now = o.updated_at + Duration::seconds(200);
        assert!(OrderManager::should_reprice(&o, 71, 75, now, 120, 6));
    }

    #[test]
    fn reconcile_startup_finds_orphans_and_stale() {
        let local = vec![order(OrderStatus::Resting, Utc::now())];
        let exchange = vec![WireOrder {
            order_id: "ex-2".into(),
            client_order_id: "other-key#1".into(),
            ticker: "KXHIGHBOS-26FEB10-T60".into(),
            side: Side::Yes,
            status: "resting".into(),
            fill_count: 0,
            remaining_count: 5,
            yes_price: Some(60),
            no_price: None,
        }];
        let (orphans, stale) = OrderManager::reconcile_startup(&local, &exchange);
        assert_eq!(orphans.len(), 1);
        assert_eq!(stale.len(), 1);
    }
}
