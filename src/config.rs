//! Configuration loader (SPEC_FULL.md §10.3): merges env vars, a `.env`
//! file, and an optional `config.toml` on top of `domain::Config`'s
//! defaults, then validates the result.

use domain::{Config, Error, Result};
use std::path::Path;

/// Load the trading engine's configuration from environment and optional
/// config file. Precedence, lowest to highest: `Config::default()` →
/// `config.toml` (if present) → environment variables.
pub fn load_config() -> Result<Config> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }

    let mut config = Config::default();

    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::ConfigError(format!("failed to read config.toml: {e}")))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("failed to parse config.toml: {e}")))?;
    }

    if let Ok(key_id) = std::env::var("EXCHANGE_API_KEY_ID") {
        config.exchange.api_key_id = key_id;
    }
    if let Ok(pem) = std::env::var("EXCHANGE_PRIVATE_KEY_PEM") {
        config.exchange.private_key_pem = pem.replace("\\n", "\n");
    }
    if let Ok(bankroll) = std::env::var("BANKROLL_DOLLARS") {
        config.bankroll = bankroll
            .parse()
            .map_err(|e| Error::ConfigError(format!("invalid BANKROLL_DOLLARS: {e}")))?;
    }
    if let Ok(path) = std::env::var("DB_PATH") {
        config.db_path = path;
    }
    if let Ok(demo) = std::env::var("EXCHANGE_USE_DEMO") {
        config.exchange.use_demo = demo != "0" && demo.to_lowercase() != "false";
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Mode;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that touch them so they
    // don't race against each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn env_overrides_win_over_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("BANKROLL_DOLLARS", "2500");
        std::env::set_var("DB_PATH", "/tmp/override.db");
        std::env::set_var("EXCHANGE_USE_DEMO", "false");

        let cfg = load_config().expect("config should load and validate");

        assert_eq!(cfg.bankroll, 2500.0);
        assert_eq!(cfg.db_path, "/tmp/override.db");
        assert!(!cfg.exchange.use_demo);

        std::env::remove_var("BANKROLL_DOLLARS");
        std::env::remove_var("DB_PATH");
        std::env::remove_var("EXCHANGE_USE_DEMO");
    }

    #[test]
    fn invalid_bankroll_env_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("BANKROLL_DOLLARS", "not-a-number");

        let result = load_config();

        std::env::remove_var("BANKROLL_DOLLARS");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn defaults_without_env_overrides_validate() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("BANKROLL_DOLLARS");
        std::env::remove_var("DB_PATH");
        std::env::remove_var("EXCHANGE_USE_DEMO");
        std::env::remove_var("EXCHANGE_API_KEY_ID");
        std::env::remove_var("EXCHANGE_PRIVATE_KEY_PEM");

        let cfg = load_config().expect("defaults must validate");
        assert_eq!(cfg.db_path, "weather_trader.db");
        assert_eq!(cfg.mode, Mode::Shadow);
    }
}
