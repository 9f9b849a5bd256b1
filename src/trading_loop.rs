//! Trading Loop (C10, §4.7): the orchestrator that wires every other crate
//! together into the periodic cycle — reconcile fills, check circuit
//! breakers, run the bounded-concurrency per-city pipeline, sleep.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use domain::cities::{CityConfig, Cluster};
use domain::{
    Config, Fill, HealthState, HealthStatus, MarketSnapshot, Mode, Order, OrderStatus,
    Position, PositionStatus, ReasonCode, Result, Severity, Side, Signal, RiskEvent, RiskEventType,
};
use exchange_client::market_provider::MarketProvider;
use exchange_client::rest::ExchangeRestClient;
use oms::manager::OrderManager;
use repository::Database;
use risk::{daily_loss_tripped, size, ExposureAccumulator, RejectionTracker, SizingResult};
use strategy::engine::STRATEGY_NAME;
use strategy::{evaluate, run_gates, GateResult};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use weather_client::WeatherProvider;

/// The exchange's series-ticker prefix this engine trades. One fixed
/// series — the daily cumulative high-temperature contract — per §4.2.
const SERIES_PREFIX: &str = "KXHIGH";

/// Result of a startup or one-shot reconciliation pass (§4.6).
pub struct ReconcileReport {
    pub orphans_imported: usize,
    pub stale_closed: usize,
}

/// Fetch exchange-authoritative open orders, reconcile against local
/// records, import orphans, and force-close stale local orders.
pub async fn reconcile_startup(
    _cfg: &Config,
    db: &Database,
    rest: &ExchangeRestClient,
) -> Result<ReconcileReport> {
    let local_orders = db.list_open_orders()?;
    let exchange_orders = rest.list_open_orders().await?;
    let (orphans, stale) = OrderManager::reconcile_startup(&local_orders, &exchange_orders);

    let orphans_imported = orphans.len();
    for w in &orphans {
        warn!(order_id = %w.order_id, client_order_id = %w.client_order_id, "importing orphaned exchange order");
        let (intent_key, version) = split_client_order_id(&w.client_order_id);
        let now = Utc::now();
        db.insert_order(&Order {
            intent_key,
            intent_version: version,
            exchange_order_id: Some(w.order_id.clone()),
            city_code: "UNKNOWN".into(),
            ticker: w.ticker.clone(),
            side: w.side,
            quantity: w.fill_count + w.remaining_count,
            limit_price_cents: w.yes_price.or(w.no_price).unwrap_or(0),
            status: map_status_for_import(&w.status),
            created_at: now,
            updated_at: now,
        })?;
    }

    let stale_closed = stale.len();
    for o in &stale {
        let mut local = (*o).clone();
        OrderManager::force_close_stale(&mut local);
        db.update_order_status(&local.intent_key, local.intent_version, local.status, local.updated_at)?;
    }

    Ok(ReconcileReport { orphans_imported, stale_closed })
}

fn split_client_order_id(client_order_id: &str) -> (String, u32) {
    match client_order_id.rsplit_once('#') {
        Some((key, version)) => (key.to_string(), version.parse().unwrap_or(1)),
        None => (client_order_id.to_string(), 1),
    }
}

fn map_status_for_import(status: &str) -> OrderStatus {
    match status {
        "resting" => OrderStatus::Resting,
        "canceled" => OrderStatus::Canceled,
        "executed" | "filled" => OrderStatus::Filled,
        "rejected" => OrderStatus::Rejected,
        _ => OrderStatus::Submitted,
    }
}

/// Owns every long-lived provider/client and drives the periodic cycle.
pub struct Trader {
    cfg: Config,
    db: Arc<Mutex<Database>>,
    weather: Arc<WeatherProvider>,
    market: Arc<MarketProvider>,
    oms: Arc<OrderManager>,
    rest: ExchangeRestClient,
    rejection_tracker: Arc<Mutex<RejectionTracker>>,
    fills_cursor: Arc<Mutex<chrono::DateTime<Utc>>>,
}

impl Trader {
    pub fn new(cfg: Config, db: Database, rest: ExchangeRestClient) -> Self {
        let weather = WeatherProvider::new(
            StdDuration::from_secs(cfg.timing.per_call_timeout_sec),
            cfg.timing.weather_cache_ttl_sec,
            cfg.timing.weather_stale_ceiling_sec,
            cfg.weather.fallback_stddev_f,
        );
        let market = MarketProvider::new(rest.clone());
        let oms = OrderManager::new(rest.clone());
        let rejection_tracker = RejectionTracker::new(
            cfg.risk.rejection_window_sec,
            cfg.risk.rejection_burst_threshold,
        );
        Self {
            fills_cursor: Arc::new(Mutex::new(Utc::now() - chrono::Duration::days(1))),
            cfg,
            db: Arc::new(Mutex::new(db)),
            weather: Arc::new(weather),
            market: Arc::new(market),
            oms: Arc::new(oms),
            rest,
            rejection_tracker: Arc::new(Mutex::new(rejection_tracker)),
        }
    }

    /// Run until `shutdown` is set, checked at every suspension point (§5).
    pub async fn run(&self, mode: Mode, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.run_cycle(mode).await {
                error!("trading cycle failed: {e}");
                self.set_health(HealthState::Degraded, &e.to_string()).await;
                tokio::select! {
                    _ = tokio::time::sleep(StdDuration::from_secs(self.cfg.timing.error_sleep_sec)) => {}
                    _ = shutdown.changed() => {}
                }
                continue;
            }
            self.set_health(HealthState::Ok, "cycle completed").await;
            tokio::select! {
                _ = tokio::time::sleep(StdDuration::from_secs(self.cfg.timing.cycle_interval_sec)) => {}
                _ = shutdown.changed() => {}
            }
        }
        info!("trading loop shut down");
    }

    async fn set_health(&self, status: HealthState, message: &str) {
        let db = self.db.lock().await;
        let _ = db.upsert_health_status(&HealthStatus {
            component: "trader".into(),
            status,
            last_ok: (status == HealthState::Ok).then(Utc::now),
            message: message.to_string(),
        });
    }

    /// One full cycle (§4.7): reconcile, check breakers, per-city pipeline.
    async fn run_cycle(&self, mode: Mode) -> Result<()> {
        self.reconcile_fills().await?;

        let (realized_today, unrealized) = self.pnl_snapshot().await?;
        if daily_loss_tripped(self.cfg.bankroll, self.cfg.risk.max_daily_loss_pct, realized_today, unrealized) {
            warn!("daily loss breaker tripped, skipping cycle");
            self.record_risk_event(RiskEventType::DailyLossHit, Severity::Critical, "daily loss cap reached").await?;
            return Ok(());
        }
        if self.rejection_tracker.lock().await.is_tripped(Utc::now()) {
            warn!("rejection burst breaker tripped, skipping cycle");
            self.record_risk_event(RiskEventType::RejectBurst, Severity::Warning, "rejection burst threshold reached").await?;
            return Ok(());
        }

        self.reprice_open_orders().await?;

        let accumulator = Arc::new(Mutex::new(ExposureAccumulator::new()));
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.cfg.timing.city_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for city in self.cfg.cities.clone() {
            let sem = semaphore.clone();
            let weather = self.weather.clone();
            let market = self.market.clone();
            let oms = self.oms.clone();
            let db = self.db.clone();
            let accumulator = accumulator.clone();
            let cfg = self.cfg.clone();
            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await.expect("semaphore closed");
                let code = city.code.clone();
                if let Err(e) = run_city_cycle(city, cfg, weather, market, oms, db, accumulator, mode).await {
                    warn!(city = %code, "city pipeline failed: {e}");
                }
            });
        }

        let budget = tokio::time::sleep(StdDuration::from_secs(self.cfg.timing.per_cycle_budget_sec));
        tokio::pin!(budget);
        loop {
            tokio::select! {
                next = tasks.join_next() => {
                    if next.is_none() {
                        break;
                    }
                }
                _ = &mut budget => {
                    warn!("per-cycle budget exceeded, abandoning remaining city tasks");
                    tasks.abort_all();
                    break;
                }
            }
        }
        Ok(())
    }

    /// Today's realized pnl (from the city rollups) plus mark-to-market
    /// unrealized pnl on open positions.
    async fn pnl_snapshot(&self) -> Result<(i64, i64)> {
        let db = self.db.lock().await;
        let today = Utc::now().date_naive();
        let realized_today: i64 = db
            .compute_daily_city_rollups(today)?
            .iter()
            .map(|r| r.realized_pnl_cents)
            .sum();
        let equity = db.compute_equity_point(today, 0)?;
        Ok((realized_today, equity.unrealized_pnl_cents))
    }

    async fn record_risk_event(&self, event_type: RiskEventType, severity: Severity, message: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.insert_risk_event(&RiskEvent {
            event_type,
            severity,
            payload: message.to_string(),
            created_at: Utc::now(),
        })
    }

    /// In-cycle fill reconciliation (§4.6): fetch fills since the last
    /// cursor, advance order state, write `Fill`/`Position` rows, and
    /// advance the cursor. Mandatory every cycle, before risk checks.
    async fn reconcile_fills(&self) -> Result<()> {
        let since = *self.fills_cursor.lock().await;
        let wire_fills = self.rest.list_fills(since).await?;
        if wire_fills.is_empty() {
            return Ok(());
        }

        let db = self.db.lock().await;
        let mut open_orders = db.list_open_orders()?;
        let mut latest = since;
        for wf in &wire_fills {
            if wf.created_time > latest {
                latest = wf.created_time;
            }
            let Some(order) = open_orders
                .iter_mut()
                .find(|o| o.exchange_order_id.as_deref() == Some(wf.order_id.as_str()))
            else {
                warn!(order_id = %wf.order_id, "fill for unknown local order, skipping");
                continue;
            };
            let fill = OrderManager::apply_fill(order, wf.count, wf.price, wf.fees)?;
            db.update_order_status(&order.intent_key, order.intent_version, order.status, order.updated_at)?;
            db.insert_fill(&fill)?;
            let cluster = cluster_for(&self.cfg.cities, &order.city_code);
            upsert_position_from_fill(&db, order, &fill, cluster)?;
        }
        drop(db);
        *self.fills_cursor.lock().await = latest;
        Ok(())
    }

    /// Cancel/replace chase-bound reprice pass (§4.6): revisits every
    /// locally resting/partial order, and for those due under
    /// `should_reprice` (past `reprice_interval_sec` and still within
    /// `max_chase_cents` of the order's original price), cancels and
    /// replaces it at the current ask under an incremented intent version.
    async fn reprice_open_orders(&self) -> Result<()> {
        let open_orders = {
            let db = self.db.lock().await;
            db.list_open_orders()?
        };
        let now = Utc::now();

        for order in open_orders {
            if order.status != OrderStatus::Resting && order.status != OrderStatus::Partial {
                continue;
            }
            let quote = match self.market.quote(&order.ticker, &order.city_code).await {
                Ok(q) => q,
                Err(e) => {
                    warn!(ticker = %order.ticker, "could not fetch quote for reprice check: {e}");
                    continue;
                }
            };
            let candidate_price_cents = match order.side {
                Side::Yes => quote.yes_ask,
                Side::No => quote.no_ask,
            };
            let Some(candidate_price_cents) = candidate_price_cents else {
                continue;
            };
            if !OrderManager::should_reprice(
                &order,
                order.limit_price_cents,
                candidate_price_cents,
                now,
                self.cfg.timing.reprice_interval_sec,
                self.cfg.timing.max_chase_cents,
            ) {
                continue;
            }

            let mut canceled = order.clone();
            if let Err(e) = self.oms.cancel(&mut canceled).await {
                warn!(ticker = %order.ticker, "reprice cancel failed: {e}");
                continue;
            }
            {
                let db = self.db.lock().await;
                db.update_order_status(&canceled.intent_key, canceled.intent_version, canceled.status, canceled.updated_at)?;
            }

            let next_version = order.intent_version + 1;
            match self
                .oms
                .place(
                    &order.city_code,
                    &order.ticker,
                    STRATEGY_NAME,
                    quote.event_date,
                    order.side,
                    order.quantity,
                    candidate_price_cents,
                    next_version,
                )
                .await
            {
                Ok(new_order) => {
                    let db = self.db.lock().await;
                    db.insert_order(&new_order)?;
                    info!(
                        ticker = %order.ticker,
                        old_price = order.limit_price_cents,
                        new_price = candidate_price_cents,
                        "order repriced"
                    );
                }
                Err(e) => {
                    warn!(ticker = %order.ticker, "reprice replacement failed: {e}");
                }
            }
        }
        Ok(())
    }
}

fn cluster_for(cities: &[CityConfig], code: &str) -> Cluster {
    cities
        .iter()
        .find(|c| c.code == code)
        .map(|c| c.cluster)
        .unwrap_or(Cluster::Ne)
}

/// Weighted-average position accumulation: a fill on (ticker, side) either
/// opens a new `Position` or grows an existing open one. Closing a
/// position (realizing pnl) is out of scope here — this engine never
/// submits an offsetting order, so every fill is an addition.
fn upsert_position_from_fill(db: &Database, order: &Order, fill: &Fill, cluster: Cluster) -> Result<()> {
    let existing = db
        .list_open_positions()?
        .into_iter()
        .find(|p| p.ticker == order.ticker && p.side == order.side);

    let position = match existing {
        Some(mut p) => {
            let total_cost = p.avg_entry_cents * p.quantity_open as f64 + fill.price_cents as f64 * fill.quantity as f64;
            p.quantity_open += fill.quantity;
            p.avg_entry_cents = total_cost / p.quantity_open as f64;
            p
        }
        None => Position {
            ticker: order.ticker.clone(),
            city_code: order.city_code.clone(),
            cluster,
            side: order.side,
            quantity_open: fill.quantity,
            avg_entry_cents: fill.price_cents as f64,
            avg_exit_cents: None,
            realized_pnl: 0,
            status: PositionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        },
    };
    db.upsert_position(&position)
}

/// Fetch weather once per city, then evaluate every active market for it.
async fn run_city_cycle(
    city: CityConfig,
    cfg: Config,
    weather: Arc<WeatherProvider>,
    market: Arc<MarketProvider>,
    oms: Arc<OrderManager>,
    db: Arc<Mutex<Database>>,
    accumulator: Arc<Mutex<ExposureAccumulator>>,
    mode: Mode,
) -> Result<()> {
    let snapshot = weather.get(&city).await;
    {
        let db = db.lock().await;
        db.insert_weather_snapshot(&snapshot)?;
    }
    if snapshot.stale {
        let db = db.lock().await;
        db.insert_risk_event(&RiskEvent {
            event_type: RiskEventType::StaleWeather,
            severity: Severity::Warning,
            payload: format!("{} weather snapshot is stale", city.code),
            created_at: Utc::now(),
        })?;
    }

    let event_date = Utc::now().date_naive();
    let tickers = market.list_active(SERIES_PREFIX, &city.code, event_date).await?;
    for ticker in tickers {
        if let Err(e) = evaluate_one(&ticker, &city, &cfg, &snapshot, &market, &oms, &db, &accumulator, mode).await {
            warn!(city = %city.code, ticker, "candidate evaluation failed: {e}");
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn evaluate_one(
    ticker: &str,
    city: &CityConfig,
    cfg: &Config,
    weather_snapshot: &domain::WeatherSnapshot,
    market: &MarketProvider,
    oms: &OrderManager,
    db: &Arc<Mutex<Database>>,
    accumulator: &Arc<Mutex<ExposureAccumulator>>,
    mode: Mode,
) -> Result<()> {
    let quote = market.quote(ticker, &city.code).await?;
    {
        let db = db.lock().await;
        db.insert_market_snapshot(&quote)?;
    }
    if !quote.is_eligible() {
        return Ok(());
    }

    let signal = evaluate(weather_snapshot, &quote, cfg.gates.min_edge_after_costs, cfg.gates.max_uncertainty);
    {
        let db = db.lock().await;
        db.insert_signal(&signal)?;
    }
    if signal.action == domain::Action::Hold {
        return Ok(());
    }

    let gate = run_gates(
        &signal,
        &quote,
        cfg.gates.spread_max_cents,
        cfg.gates.liquidity_min,
        cfg.gates.min_liquidity_multiple,
        cfg.gates.min_edge_after_costs,
    );
    if let GateResult::Refused { reason } = gate {
        debug_refusal(ticker, reason);
        return Ok(());
    }

    let positions = {
        let db = db.lock().await;
        db.list_open_positions()?
    };
    let sizing = {
        let acc = accumulator.lock().await;
        size(&signal, cfg.bankroll, &cfg.risk, cfg.gates.max_uncertainty, city.cluster, &positions, &acc)
    };
    let (quantity, limit_price_cents) = match sizing {
        SizingResult::Approved { quantity, limit_price_cents } => (quantity, limit_price_cents),
        SizingResult::Refused { reason } => {
            if let Some(event_type) = reason_to_risk_event(reason) {
                let db = db.lock().await;
                db.insert_risk_event(&RiskEvent {
                    event_type,
                    severity: Severity::Warning,
                    payload: format!("{ticker} refused: {reason:?}"),
                    created_at: Utc::now(),
                })?;
            }
            return Ok(());
        }
    };

    let version = 1u32;
    let intent_key = domain::intent::intent_key(&city.code, ticker, signal.side, STRATEGY_NAME, quote.event_date);
    let existing = {
        let db = db.lock().await;
        db.find_order(&intent_key, version)?
    };
    if existing.is_some() {
        tracing::debug!(ticker, intent_key = %intent_key, "order already exists for this intent, skipping duplicate placement");
        return Ok(());
    }

    let order = match mode {
        Mode::Shadow => simulate_fill(city, &quote, &signal, quantity, limit_price_cents, version),
        Mode::Paper | Mode::Live => {
            oms.place(
                &city.code,
                ticker,
                STRATEGY_NAME,
                quote.event_date,
                signal.side,
                quantity,
                limit_price_cents,
                version,
            )
            .await?
        }
    };

    let cost_cents = quantity * limit_price_cents;
    accumulator.lock().await.commit(&city.code, city.cluster, cost_cents);

    let db = db.lock().await;
    db.insert_order(&order)?;
    if order.status == OrderStatus::Filled {
        let fill = Fill {
            order_ref: order.client_order_id(),
            filled_at: order.updated_at,
            quantity,
            price_cents: limit_price_cents,
            fees_cents: 0,
            realized_pnl: None,
        };
        db.insert_fill(&fill)?;
        upsert_position_from_fill(&db, &order, &fill, city.cluster)?;
    }
    info!(city = %city.code, ticker, side = ?signal.side, quantity, limit_price_cents, "order recorded");
    Ok(())
}

fn debug_refusal(ticker: &str, reason: ReasonCode) {
    tracing::debug!(ticker, ?reason, "candidate refused by gates");
}

fn reason_to_risk_event(reason: ReasonCode) -> Option<RiskEventType> {
    match reason {
        ReasonCode::CityCapHit => Some(RiskEventType::CityCapHit),
        ReasonCode::ClusterCapHit => Some(RiskEventType::ClusterCapHit),
        ReasonCode::TradeCapHit => Some(RiskEventType::TradeCapHit),
        _ => None,
    }
}

/// SHADOW mode (§4.7): never submits to the exchange. The signal's own
/// price (already vetted by the gates as the resting ask) stands in for a
/// fill.
fn simulate_fill(
    city: &CityConfig,
    quote: &MarketSnapshot,
    signal: &Signal,
    quantity: i64,
    limit_price_cents: i64,
    version: u32,
) -> Order {
    let now = Utc::now();
    let key = domain::intent::intent_key(&city.code, &quote.ticker, signal.side, STRATEGY_NAME, quote.event_date);
    Order {
        intent_key: key,
        intent_version: version,
        exchange_order_id: None,
        city_code: city.code.clone(),
        ticker: quote.ticker.clone(),
        side: signal.side,
        quantity,
        limit_price_cents,
        status: OrderStatus::Filled,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::cities::default_cities;
    use domain::Side;

    #[test]
    fn split_client_order_id_versioned() {
        assert_eq!(
            split_client_order_id("NYC-KXHIGH-23JUL26-above_60-yes-trend_follow#3"),
            ("NYC-KXHIGH-23JUL26-above_60-yes-trend_follow".to_string(), 3)
        );
    }

    #[test]
    fn split_client_order_id_no_version_defaults_to_one() {
        assert_eq!(split_client_order_id("bare-key"), ("bare-key".to_string(), 1));
    }

    #[test]
    fn map_status_for_import_covers_known_states() {
        assert_eq!(map_status_for_import("resting"), OrderStatus::Resting);
        assert_eq!(map_status_for_import("canceled"), OrderStatus::Canceled);
        assert_eq!(map_status_for_import("executed"), OrderStatus::Filled);
        assert_eq!(map_status_for_import("filled"), OrderStatus::Filled);
        assert_eq!(map_status_for_import("rejected"), OrderStatus::Rejected);
        assert_eq!(map_status_for_import("something_unknown"), OrderStatus::Submitted);
    }

    #[test]
    fn cluster_for_known_and_unknown_city() {
        let cities = default_cities();
        assert_eq!(cluster_for(&cities, "NYC"), Cluster::Ne);
        assert_eq!(cluster_for(&cities, "DEN"), Cluster::Mountain);
        assert_eq!(cluster_for(&cities, "NOPE"), Cluster::Ne);
    }

    fn sample_order(ticker: &str, side: Side, city_code: &str) -> Order {
        let now = Utc::now();
        Order {
            intent_key: format!("{city_code}-{ticker}-key"),
            intent_version: 1,
            exchange_order_id: None,
            city_code: city_code.to_string(),
            ticker: ticker.to_string(),
            side,
            quantity: 10,
            limit_price_cents: 50,
            status: OrderStatus::Filled,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_fill(order: &Order, quantity: i64, price_cents: i64) -> Fill {
        Fill {
            order_ref: order.client_order_id(),
            filled_at: Utc::now(),
            quantity,
            price_cents,
            fees_cents: 0,
            realized_pnl: None,
        }
    }

    #[test]
    fn upsert_position_from_fill_opens_new_position() {
        let db = Database::open_in_memory().unwrap();
        let order = sample_order("KXHIGHNYC-26JUL23-T60", Side::Yes, "NYC");
        let fill = sample_fill(&order, 10, 50);

        upsert_position_from_fill(&db, &order, &fill, Cluster::Ne).unwrap();

        let positions = db.list_open_positions().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].quantity_open, 10);
        assert_eq!(positions[0].avg_entry_cents, 50.0);
    }

    #[test]
    fn upsert_position_from_fill_averages_into_existing_position() {
        let db = Database::open_in_memory().unwrap();
        let order = sample_order("KXHIGHNYC-26JUL23-T60", Side::Yes, "NYC");

        upsert_position_from_fill(&db, &order, &sample_fill(&order, 10, 50), Cluster::Ne).unwrap();
        upsert_position_from_fill(&db, &order, &sample_fill(&order, 10, 70), Cluster::Ne).unwrap();

        let positions = db.list_open_positions().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].quantity_open, 20);
        assert_eq!(positions[0].avg_entry_cents, 60.0);
    }

    #[test]
    fn upsert_position_from_fill_keeps_opposite_sides_separate() {
        let db = Database::open_in_memory().unwrap();
        let yes_order = sample_order("KXHIGHNYC-26JUL23-T60", Side::Yes, "NYC");
        let no_order = sample_order("KXHIGHNYC-26JUL23-T60", Side::No, "NYC");

        upsert_position_from_fill(&db, &yes_order, &sample_fill(&yes_order, 10, 50), Cluster::Ne).unwrap();
        upsert_position_from_fill(&db, &no_order, &sample_fill(&no_order, 5, 45), Cluster::Ne).unwrap();

        let positions = db.list_open_positions().unwrap();
        assert_eq!(positions.len(), 2);
    }

    #[test]
    fn reason_to_risk_event_maps_cap_hits_only() {
        assert_eq!(reason_to_risk_event(ReasonCode::CityCapHit), Some(RiskEventType::CityCapHit));
        assert_eq!(reason_to_risk_event(ReasonCode::ClusterCapHit), Some(RiskEventType::ClusterCapHit));
        assert_eq!(reason_to_risk_event(ReasonCode::TradeCapHit), Some(RiskEventType::TradeCapHit));
        assert_eq!(reason_to_risk_event(ReasonCode::SpreadWide), None);
    }
}
