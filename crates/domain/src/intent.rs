//! Deterministic intent keys (§3, §4.6, §9). Replaces the reference bot's
//! non-deterministic `Uuid::new_v4()` client-order-id generation with a
//! canonical byte encoding fed to a cryptographic digest — a correctness
//! fix, not a stylistic one: two process runs that reach the same logical
//! state must produce the same key.

use crate::types::Side;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// `sha256(city_code ‖ ticker ‖ side ‖ strategy_name ‖ event_date_iso)`,
/// hex-encoded. Stable across process restarts for identical inputs.
pub fn intent_key(
    city_code: &str,
    ticker: &str,
    side: Side,
    strategy_name: &str,
    event_date: NaiveDate,
) -> String {
    let side_str = match side {
        Side::Yes => "YES",
        Side::No => "NO",
    };
    let canonical = format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
        city_code,
        ticker,
        side_str,
        strategy_name,
        event_date.format("%Y-%m-%d")
    );
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    #[test]
    fn stable_across_calls() {
        let a = intent_key("NYC", "KXHIGHNYC-26FEB10-T70", Side::Yes, "daily_high_temp", date());
        let b = intent_key("NYC", "KXHIGHNYC-26FEB10-T70", Side::Yes, "daily_high_temp", date());
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn distinguishes_side() {
        let yes = intent_key("NYC", "T", Side::Yes, "s", date());
        let no = intent_key("NYC", "T", Side::No, "s", date());
        assert_ne!(yes, no);
    }

    #[test]
    fn distinguishes_event_date() {
        let a = intent_key("NYC", "T", Side::Yes, "s", date());
        let b = intent_key("NYC", "T", Side::Yes, "s", NaiveDate::from_ymd_opt(2026, 2, 11).unwrap());
        assert_ne!(a, b);
    }
}
