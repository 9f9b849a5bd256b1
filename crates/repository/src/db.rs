//! Repository Layer (C9): `ops` (private) and `analytics` (rollups +
//! public delayed view) namespaces, backed by a single SQLite file. WAL
//! mode, idempotent migrations, and manual `query_map` row mapping follow
//! the pattern the enrichment source uses for its own trade/position
//! tables.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use domain::cities::Cluster;
use domain::{
    Fill, HealthState, HealthStatus, MarketSnapshot, Order, Position, Result, RiskEvent, Signal,
    WeatherSnapshot,
};
use rusqlite::{params, Connection};

use crate::codec::*;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn open(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.run_migrations()?;
        db.enable_wal()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn enable_wal(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS weather_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_code TEXT NOT NULL,
                captured_at TEXT NOT NULL,
                forecast_high_f REAL NOT NULL,
                forecast_stddev_f REAL NOT NULL,
                observed_temp_f REAL,
                source_timestamps TEXT NOT NULL,
                stale INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS market_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                city_code TEXT NOT NULL,
                threshold_f REAL NOT NULL,
                direction TEXT NOT NULL,
                event_date TEXT NOT NULL,
                yes_bid INTEGER,
                yes_ask INTEGER,
                no_bid INTEGER,
                no_ask INTEGER,
                volume INTEGER NOT NULL,
                open_interest INTEGER NOT NULL,
                close_time TEXT NOT NULL,
                captured_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_code TEXT NOT NULL,
                ticker TEXT NOT NULL,
                strategy_name TEXT NOT NULL,
                p_yes_model REAL NOT NULL,
                uncertainty REAL NOT NULL,
                p_yes_market REAL NOT NULL,
                edge REAL NOT NULL,
                action TEXT NOT NULL,
                side TEXT NOT NULL,
                max_price_cents INTEGER NOT NULL,
                reasons TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                intent_key TEXT NOT NULL,
                intent_version INTEGER NOT NULL,
                exchange_order_id TEXT,
                city_code TEXT NOT NULL,
                ticker TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                limit_price_cents INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (intent_key, intent_version)
            );

            CREATE TABLE IF NOT EXISTS fills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_ref TEXT NOT NULL,
                filled_at TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price_cents INTEGER NOT NULL,
                fees_cents INTEGER NOT NULL,
                realized_pnl INTEGER
            );

            CREATE TABLE IF NOT EXISTS positions (
                ticker TEXT NOT NULL,
                city_code TEXT NOT NULL,
                cluster TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity_open INTEGER NOT NULL,
                avg_entry_cents REAL NOT NULL,
                avg_exit_cents REAL,
                realized_pnl INTEGER NOT NULL,
                status TEXT NOT NULL,
                opened_at TEXT NOT NULL,
                closed_at TEXT,
                PRIMARY KEY (ticker, side)
            );

            CREATE TABLE IF NOT EXISTS risk_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS health_status (
                component TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                last_ok TEXT,
                message TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_city_rollups (
                day TEXT NOT NULL,
                city_code TEXT NOT NULL,
                realized_pnl_cents INTEGER NOT NULL,
                trade_count INTEGER NOT NULL,
                win_count INTEGER NOT NULL,
                PRIMARY KEY (day, city_code)
            );

            CREATE TABLE IF NOT EXISTS daily_strategy_rollups (
                day TEXT NOT NULL,
                strategy_name TEXT NOT NULL,
                signal_count INTEGER NOT NULL,
                realized_edge REAL NOT NULL,
                PRIMARY KEY (day, strategy_name)
            );

            CREATE TABLE IF NOT EXISTS equity_curve (
                day TEXT PRIMARY KEY,
                realized_pnl_cents INTEGER NOT NULL,
                unrealized_pnl_cents INTEGER NOT NULL,
                bankroll_baseline_cents INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Weather snapshots ────────────────────────────────────────────

    pub fn insert_weather_snapshot(&self, s: &WeatherSnapshot) -> Result<()> {
        self.conn.execute(
            "INSERT INTO weather_snapshots
             (city_code, captured_at, forecast_high_f, forecast_stddev_f, observed_temp_f, source_timestamps, stale)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                s.city_code,
                s.captured_at.to_rfc3339(),
                s.forecast_high_f,
                s.forecast_stddev_f,
                s.observed_temp_f,
                s.source_timestamps,
                s.stale as i64,
            ],
        )?;
        Ok(())
    }

    // ── Market snapshots ─────────────────────────────────────────────

    pub fn insert_market_snapshot(&self, m: &MarketSnapshot) -> Result<()> {
        self.conn.execute(
            "INSERT INTO market_snapshots
             (ticker, city_code, threshold_f, direction, event_date, yes_bid, yes_ask, no_bid, no_ask,
              volume, open_interest, close_time, captured_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                m.ticker,
                m.city_code,
                m.threshold_f,
                direction_to_str(m.direction),
                m.event_date.format("%Y-%m-%d").to_string(),
                m.yes_bid,
                m.yes_ask,
                m.no_bid,
                m.no_ask,
                m.volume,
                m.open_interest,
                m.close_time.to_rfc3339(),
                m.captured_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ── Signals ──────────────────────────────────────────────────────

    pub fn insert_signal(&self, s: &Signal) -> Result<()> {
        self.conn.execute(
            "INSERT INTO signals
             (city_code, ticker, strategy_name, p_yes_model, uncertainty, p_yes_market, edge,
              action, side, max_price_cents, reasons, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                s.city_code,
                s.ticker,
                s.strategy_name,
                s.p_yes_model,
                s.uncertainty,
                s.p_yes_market,
                s.edge,
                action_to_str(s.action),
                side_to_str(s.side),
                s.max_price_cents,
                reasons_to_str(&s.reasons),
                s.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ── Orders ───────────────────────────────────────────────────────

    /// Insert a brand-new order. Fails with `FatalInternal` if
    /// `(intent_key, intent_version)` already exists — the caller is
    /// responsible for the idempotency check described in §4.6.
    pub fn insert_order(&self, o: &Order) -> Result<()> {
        self.conn.execute(
            "INSERT INTO orders
             (intent_key, intent_version, exchange_order_id, city_code, ticker, side, quantity,
              limit_price_cents, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                o.intent_key,
                o.intent_version,
                o.exchange_order_id,
                o.city_code,
                o.ticker,
                side_to_str(o.side),
                o.quantity,
                o.limit_price_cents,
                order_status_to_str(o.status),
                o.created_at.to_rfc3339(),
                o.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update_order_status(&self, intent_key: &str, intent_version: u32, status: domain::OrderStatus, updated_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE intent_key = ?3 AND intent_version = ?4",
            params![order_status_to_str(status), updated_at.to_rfc3339(), intent_key, intent_version],
        )?;
        Ok(())
    }

    pub fn find_order(&self, intent_key: &str, intent_version: u32) -> Result<Option<Order>> {
        let mut stmt = self.conn.prepare(
            "SELECT intent_key, intent_version, exchange_order_id, city_code, ticker, side, quantity,
                    limit_price_cents, status, created_at, updated_at
             FROM orders WHERE intent_key = ?1 AND intent_version = ?2",
        )?;
        let mut rows = stmt.query(params![intent_key, intent_version])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_order(row)?)),
            None => Ok(None),
        }
    }

    pub fn list_open_orders(&self) -> Result<Vec<Order>> {
        let mut stmt = self.conn.prepare(
            "SELECT intent_key, intent_version, exchange_order_id, city_code, ticker, side, quantity,
                    limit_price_cents, status, created_at, updated_at
             FROM orders WHERE status NOT IN ('canceled', 'rejected', 'closed')",
        )?;
        let rows = stmt.query_map([], row_to_order)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // ── Fills ────────────────────────────────────────────────────────

    pub fn insert_fill(&self, f: &Fill) -> Result<()> {
        self.conn.execute(
            "INSERT INTO fills (order_ref, filled_at, quantity, price_cents, fees_cents, realized_pnl)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![f.order_ref, f.filled_at.to_rfc3339(), f.quantity, f.price_cents, f.fees_cents, f.realized_pnl],
        )?;
        Ok(())
    }

    // ── Positions ────────────────────────────────────────────────────

    /// Insert a position or update it in place if `(ticker, side)` exists.
    pub fn upsert_position(&self, p: &Position) -> Result<()> {
        self.conn.execute(
            "INSERT INTO positions
             (ticker, city_code, cluster, side, quantity_open, avg_entry_cents, avg_exit_cents,
              realized_pnl, status, opened_at, closed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(ticker, side) DO UPDATE SET
                quantity_open = excluded.quantity_open,
                avg_entry_cents = excluded.avg_entry_cents,
                avg_exit_cents = excluded.avg_exit_cents,
                realized_pnl = excluded.realized_pnl,
                status = excluded.status,
                closed_at = excluded.closed_at",
            params![
                p.ticker,
                p.city_code,
                cluster_to_str(p.cluster),
                side_to_str(p.side),
                p.quantity_open,
                p.avg_entry_cents,
                p.avg_exit_cents,
                p.realized_pnl,
                position_status_to_str(p.status),
                p.opened_at.to_rfc3339(),
                p.closed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn list_positions(&self) -> Result<Vec<Position>> {
        let mut stmt = self.conn.prepare(
            "SELECT ticker, city_code, cluster, side, quantity_open, avg_entry_cents, avg_exit_cents,
                    realized_pnl, status, opened_at, closed_at
             FROM positions",
        )?;
        let rows = stmt.query_map([], row_to_position)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn list_open_positions(&self) -> Result<Vec<Position>> {
        Ok(self
            .list_positions()?
            .into_iter()
            .filter(|p| p.status == domain::PositionStatus::Open)
            .collect())
    }

    // ── Risk events ──────────────────────────────────────────────────

    pub fn insert_risk_event(&self, e: &RiskEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO risk_events (event_type, severity, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                risk_event_type_to_str(e.event_type),
                severity_to_str(e.severity),
                e.payload,
                e.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ── Health ───────────────────────────────────────────────────────

    pub fn upsert_health_status(&self, h: &HealthStatus) -> Result<()> {
        self.conn.execute(
            "INSERT INTO health_status (component, status, last_ok, message) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(component) DO UPDATE SET
                status = excluded.status, last_ok = excluded.last_ok, message = excluded.message",
            params![
                h.component,
                health_state_to_str(h.status),
                h.last_ok.map(|t| t.to_rfc3339()),
                h.message,
            ],
        )?;
        Ok(())
    }

    pub fn get_health_status(&self, component: &str) -> Result<Option<HealthStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT component, status, last_ok, message FROM health_status WHERE component = ?1",
        )?;
        let mut rows = stmt.query(params![component])?;
        match rows.next()? {
            Some(row) => {
                let status_str: String = row.get(1)?;
                let last_ok_str: Option<String> = row.get(2)?;
                Ok(Some(HealthStatus {
                    component: row.get(0)?,
                    status: health_state_from_str(&status_str).unwrap_or(HealthState::Down),
                    last_ok: last_ok_str.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|t| t.with_timezone(&Utc)),
                    message: row.get(3)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Most recent snapshot captured for a ticker, used to mark open
    /// positions to market for the equity curve.
    pub fn latest_market_snapshot(&self, ticker: &str) -> Result<Option<MarketSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT ticker, city_code, threshold_f, direction, event_date, yes_bid, yes_ask, no_bid, no_ask,
                    volume, open_interest, close_time, captured_at
             FROM market_snapshots WHERE ticker = ?1 ORDER BY captured_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query(params![ticker])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_market_snapshot(row)?)),
            None => Ok(None),
        }
    }

    // ── Rollups (C12) ────────────────────────────────────────────────

    /// Per-city aggregate of realized pnl, trade count, and win count for
    /// fills that closed a position on `day`. Reads only from `fills`/
    /// `orders`, so it is safe to recompute from scratch at any time.
    pub fn compute_daily_city_rollups(&self, day: NaiveDate) -> Result<Vec<CityRollup>> {
        let day_str = day.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT o.city_code,
                    COALESCE(SUM(f.realized_pnl), 0),
                    COUNT(*),
                    SUM(CASE WHEN f.realized_pnl > 0 THEN 1 ELSE 0 END)
             FROM fills f
             JOIN orders o ON f.order_ref = o.intent_key || '#' || o.intent_version
             WHERE f.realized_pnl IS NOT NULL AND substr(f.filled_at, 1, 10) = ?1
             GROUP BY o.city_code",
        )?;
        let rows = stmt.query_map(params![day_str], |row| {
            Ok(CityRollup {
                day,
                city_code: row.get(0)?,
                realized_pnl_cents: row.get(1)?,
                trade_count: row.get(2)?,
                win_count: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn upsert_daily_city_rollup(&self, r: &CityRollup) -> Result<()> {
        self.conn.execute(
            "INSERT INTO daily_city_rollups (day, city_code, realized_pnl_cents, trade_count, win_count)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(day, city_code) DO UPDATE SET
                realized_pnl_cents = excluded.realized_pnl_cents,
                trade_count = excluded.trade_count,
                win_count = excluded.win_count",
            params![
                r.day.format("%Y-%m-%d").to_string(),
                r.city_code,
                r.realized_pnl_cents,
                r.trade_count,
                r.win_count,
            ],
        )?;
        Ok(())
    }

    /// Per-strategy signal count and mean edge for signals produced on
    /// `day`.
    pub fn compute_daily_strategy_rollups(&self, day: NaiveDate) -> Result<Vec<StrategyRollup>> {
        let day_str = day.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT strategy_name, COUNT(*), COALESCE(AVG(edge), 0.0)
             FROM signals
             WHERE substr(created_at, 1, 10) = ?1
             GROUP BY strategy_name",
        )?;
        let rows = stmt.query_map(params![day_str], |row| {
            Ok(StrategyRollup {
                day,
                strategy_name: row.get(0)?,
                signal_count: row.get(1)?,
                realized_edge: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn upsert_daily_strategy_rollup(&self, r: &StrategyRollup) -> Result<()> {
        self.conn.execute(
            "INSERT INTO daily_strategy_rollups (day, strategy_name, signal_count, realized_edge)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(day, strategy_name) DO UPDATE SET
                signal_count = excluded.signal_count,
                realized_edge = excluded.realized_edge",
            params![
                r.day.format("%Y-%m-%d").to_string(),
                r.strategy_name,
                r.signal_count,
                r.realized_edge,
            ],
        )?;
        Ok(())
    }

    /// Cumulative realized pnl through `day` plus today's mark-to-market
    /// unrealized pnl on open positions, using each position's latest
    /// market snapshot.
    pub fn compute_equity_point(&self, day: NaiveDate, bankroll_baseline_cents: i64) -> Result<EquityPoint> {
        let day_str = day.format("%Y-%m-%d").to_string();
        let realized_pnl_cents: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(realized_pnl), 0) FROM fills
             WHERE realized_pnl IS NOT NULL AND substr(filled_at, 1, 10) <= ?1",
            params![day_str],
            |row| row.get(0),
        )?;

        let mut unrealized_pnl_cents = 0i64;
        for p in self.list_open_positions()? {
            if let Some(mark) = self.latest_market_snapshot(&p.ticker)? {
                let mid = match p.side {
                    domain::Side::Yes => mark.mid_yes(),
                    domain::Side::No => mark.mid_no(),
                };
                if let Some(mid) = mid {
                    unrealized_pnl_cents +=
                        ((mid - p.avg_entry_cents) * p.quantity_open as f64).round() as i64;
                }
            }
        }

        Ok(EquityPoint {
            day,
            realized_pnl_cents,
            unrealized_pnl_cents,
            bankroll_baseline_cents,
        })
    }

    pub fn upsert_equity_point(&self, e: &EquityPoint) -> Result<()> {
        self.conn.execute(
            "INSERT INTO equity_curve (day, realized_pnl_cents, unrealized_pnl_cents, bankroll_baseline_cents)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(day) DO UPDATE SET
                realized_pnl_cents = excluded.realized_pnl_cents,
                unrealized_pnl_cents = excluded.unrealized_pnl_cents,
                bankroll_baseline_cents = excluded.bankroll_baseline_cents",
            params![
                e.day.format("%Y-%m-%d").to_string(),
                e.realized_pnl_cents,
                e.unrealized_pnl_cents,
                e.bankroll_baseline_cents,
            ],
        )?;
        Ok(())
    }
}

/// Per-city daily aggregate (`daily_city_rollups`).
#[derive(Debug, Clone, PartialEq)]
pub struct CityRollup {
    pub day: NaiveDate,
    pub city_code: String,
    pub realized_pnl_cents: i64,
    pub trade_count: i64,
    pub win_count: i64,
}

/// Per-strategy daily aggregate (`daily_strategy_rollups`).
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRollup {
    pub day: NaiveDate,
    pub strategy_name: String,
    pub signal_count: i64,
    pub realized_edge: f64,
}

/// One point on the equity curve (`equity_curve`).
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub day: NaiveDate,
    pub realized_pnl_cents: i64,
    pub unrealized_pnl_cents: i64,
    pub bankroll_baseline_cents: i64,
}

fn row_to_order(row: &rusqlite::Row) -> rusqlite::Result<Order> {
    let side_str: String = row.get(5)?;
    let status_str: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;
    Ok(Order {
        intent_key: row.get(0)?,
        intent_version: row.get(1)?,
        exchange_order_id: row.get(2)?,
        city_code: row.get(3)?,
        ticker: row.get(4)?,
        side: side_from_str(&side_str).unwrap_or(domain::Side::Yes),
        quantity: row.get(6)?,
        limit_price_cents: row.get(7)?,
        status: order_status_from_str(&status_str).unwrap_or(domain::OrderStatus::New),
        created_at: parse_rfc3339(&created_at),
        updated_at: parse_rfc3339(&updated_at),
    })
}

fn row_to_position(row: &rusqlite::Row) -> rusqlite::Result<Position> {
    let cluster_str: String = row.get(2)?;
    let side_str: String = row.get(3)?;
    let status_str: String = row.get(8)?;
    let opened_at: String = row.get(9)?;
    let closed_at: Option<String> = row.get(10)?;
    Ok(Position {
        ticker: row.get(0)?,
        city_code: row.get(1)?,
        cluster: cluster_from_str(&cluster_str).unwrap_or(Cluster::Ne),
        side: side_from_str(&side_str).unwrap_or(domain::Side::Yes),
        quantity_open: row.get(4)?,
        avg_entry_cents: row.get(5)?,
        avg_exit_cents: row.get(6)?,
        realized_pnl: row.get(7)?,
        status: position_status_from_str(&status_str).unwrap_or(domain::PositionStatus::Open),
        opened_at: parse_rfc3339(&opened_at),
        closed_at: closed_at.map(|s| parse_rfc3339(&s)),
    })
}

fn row_to_market_snapshot(row: &rusqlite::Row) -> rusqlite::Result<MarketSnapshot> {
    let direction_str: String = row.get(3)?;
    let event_date_str: String = row.get(4)?;
    let close_time: String = row.get(11)?;
    let captured_at: String = row.get(12)?;
    Ok(MarketSnapshot {
        ticker: row.get(0)?,
        city_code: row.get(1)?,
        threshold_f: row.get(2)?,
        direction: direction_from_str(&direction_str).unwrap_or(domain::Direction::Above),
        event_date: parse_date(&event_date_str),
        yes_bid: row.get(5)?,
        yes_ask: row.get(6)?,
        no_bid: row.get(7)?,
        no_ask: row.get(8)?,
        volume: row.get(9)?,
        open_interest: row.get(10)?,
        close_time: parse_rfc3339(&close_time),
        captured_at: parse_rfc3339(&captured_at),
    })
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::cities::Cluster;
    use domain::{OrderStatus, PositionStatus, Side};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    fn order(key: &str, city: &str, ticker: &str) -> Order {
        let now = Utc::now();
        Order {
            intent_key: key.to_string(),
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

    fn filled_at_noon() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-10T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn city_rollup_sums_realized_pnl_and_counts_wins() {
        let db = Database::open_in_memory().unwrap();
        let o = order("k1", "NYC", "KXHIGHNYC-26FEB10-T70");
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
        db.insert_fill(&Fill {
            order_ref: o.client_order_id(),
            filled_at: filled_at_noon(),
            quantity: 5,
            price_cents: 60,
            fees_cents: 1,
            realized_pnl: Some(-200),
        })
        .unwrap();

        let rollups = db.compute_daily_city_rollups(day()).unwrap();
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].city_code, "NYC");
        assert_eq!(rollups[0].realized_pnl_cents, 300);
        assert_eq!(rollups[0].trade_count, 2);
        assert_eq!(rollups[0].win_count, 1);

        db.upsert_daily_city_rollup(&rollups[0]).unwrap();
        // Recomputing and re-upserting must be idempotent.
        let recomputed = db.compute_daily_city_rollups(day()).unwrap();
        assert_eq!(recomputed, rollups);
    }

    #[test]
    fn strategy_rollup_counts_signals_and_averages_edge() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        for edge in [0.10, 0.20] {
            db.insert_signal(&Signal {
                city_code: "NYC".into(),
                ticker: "KXHIGHNYC-26FEB10-T70".into(),
                strategy_name: "daily_high_temp".into(),
                p_yes_model: 0.7,
                uncertainty: 0.1,
                p_yes_market: 0.5,
                edge,
                action: domain::Action::Buy,
                side: Side::Yes,
                max_price_cents: 71,
                reasons: vec![],
                created_at: filled_at_noon(),
            })
            .unwrap();
        }
        let _ = now;

        let rollups = db.compute_daily_strategy_rollups(day()).unwrap();
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].signal_count, 2);
        assert!((rollups[0].realized_edge - 0.15).abs() < 1e-9);
    }

    #[test]
    fn equity_point_marks_open_positions_to_latest_snapshot() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_position(&Position {
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            city_code: "NYC".into(),
            cluster: Cluster::Ne,
            side: Side::Yes,
            quantity_open: 10,
            avg_entry_cents: 60.0,
            avg_exit_cents: None,
            realized_pnl: 0,
            status: PositionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        })
        .unwrap();
        db.insert_market_snapshot(&MarketSnapshot {
            ticker: "KXHIGHNYC-26FEB10-T70".into(),
            city_code: "NYC".into(),
            threshold_f: 70.0,
            direction: domain::Direction::Above,
            event_date: day(),
            yes_bid: Some(68),
            yes_ask: Some(70),
            no_bid: Some(30),
            no_ask: Some(32),
            volume: 100,
            open_interest: 100,
            close_time: Utc::now() + chrono::Duration::hours(1),
            captured_at: Utc::now(),
        })
        .unwrap();

        let point = db.compute_equity_point(day(), 1_000_000).unwrap();
        assert_eq!(point.unrealized_pnl_cents, 90); // (69 - 60) * 10
        assert_eq!(point.bankroll_baseline_cents, 1_000_000);
    }
}
