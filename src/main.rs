//! weather-trader: autonomous agent that trades binary weather-outcome
//! contracts across ten U.S. cities on a regulated event-market exchange.
//!
//! Single-binary Tokio application. `run` drives the Trading Loop (C10);
//! `reconcile` performs a one-shot startup reconciliation; `rollups`
//! regenerates the analytics tables for a given day.

mod config;
mod trading_loop;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "weather-trader", about = "Autonomous weather-contract trading engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Trading Loop.
    Run {
        #[arg(long, value_enum, default_value = "shadow")]
        mode: CliMode,
        /// Required to actually run in LIVE mode.
        #[arg(long)]
        confirm_live: bool,
    },
    /// One-shot startup reconciliation against the exchange.
    Reconcile,
    /// Regenerate analytics rollups for a given day (YYYY-MM-DD).
    Rollups {
        #[arg(long)]
        date: String,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum CliMode {
    Shadow,
    Paper,
    Live,
}

impl From<CliMode> for domain::Mode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::Shadow => domain::Mode::Shadow,
            CliMode::Paper => domain::Mode::Paper,
            CliMode::Live => domain::Mode::Live,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_trader=info,domain=info,risk=info,oms=info".into()),
        )
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Run { mode, confirm_live } => run(&mut cfg, mode, confirm_live).await,
        Commands::Reconcile => reconcile(&cfg).await,
        Commands::Rollups { date } => run_rollups(&cfg, &date),
    }
}

async fn run(cfg: &mut domain::Config, mode: CliMode, confirm_live: bool) {
    let mode: domain::Mode = mode.into();

    if mode == domain::Mode::Live && !confirm_live {
        error!("refusing to start in LIVE mode without --confirm-live");
        std::process::exit(1);
    }
    cfg.mode = mode;
    cfg.exchange.use_demo = mode != domain::Mode::Live;
    if let Err(e) = cfg.validate() {
        error!("configuration error: {e}");
        std::process::exit(1);
    }

    info!(?mode, bankroll = cfg.bankroll, cities = cfg.cities.len(), "weather-trader starting up");

    let db = open_db(cfg);
    let rest = match build_rest_client(cfg) {
        Ok(r) => r,
        Err(e) => {
            error!("exchange auth initialization failed: {e}");
            std::process::exit(3);
        }
    };

    if mode != domain::Mode::Shadow {
        if let Err(e) = rest.get_balance().await {
            error!("exchange auth check failed: {e}");
            std::process::exit(3);
        }
    }

    if let Err(e) = trading_loop::reconcile_startup(cfg, &db, &rest).await {
        error!("startup reconciliation failed, continuing: {e}");
    }

    let trader = trading_loop::Trader::new(cfg.clone(), db, rest);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let run_handle = tokio::spawn(async move { trader.run(mode, shutdown_rx).await });

    tokio::signal::ctrl_c().await.ok();
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = run_handle.await;
    info!("weather-trader shut down");
}

async fn reconcile(cfg: &domain::Config) {
    let db = open_db(cfg);
    let rest = match build_rest_client(cfg) {
        Ok(r) => r,
        Err(e) => {
            error!("exchange auth initialization failed: {e}");
            std::process::exit(3);
        }
    };

    match trading_loop::reconcile_startup(cfg, &db, &rest).await {
        Ok(report) => {
            info!(
                orphans_imported = report.orphans_imported,
                stale_closed = report.stale_closed,
                "reconciliation complete"
            );
            if report.orphans_imported > 0 || report.stale_closed > 0 {
                std::process::exit(2);
            }
        }
        Err(e) => {
            error!("reconciliation failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run_rollups(cfg: &domain::Config, date: &str) {
    let day = match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(e) => {
            error!("invalid --date {date}: {e}");
            std::process::exit(1);
        }
    };
    let db = open_db(cfg);
    if let Err(e) = rollups::run_for_day(&db, day, cfg.bankroll) {
        error!("rollups failed: {e}");
        std::process::exit(1);
    }
}

fn open_db(cfg: &domain::Config) -> repository::Database {
    match repository::Database::open(&cfg.db_path) {
        Ok(db) => db,
        Err(e) => {
            error!("failed to open database at {}: {e}", cfg.db_path);
            std::process::exit(1);
        }
    }
}

fn build_rest_client(cfg: &domain::Config) -> domain::Result<exchange_client::ExchangeRestClient> {
    let auth = exchange_client::ExchangeAuth::new(&cfg.exchange.api_key_id, &cfg.exchange.private_key_pem)?;
    Ok(exchange_client::ExchangeRestClient::new(
        auth,
        cfg.exchange.use_demo,
        cfg.exchange.rate_limit_per_sec,
        std::time::Duration::from_secs(cfg.timing.per_call_timeout_sec),
    ))
}
