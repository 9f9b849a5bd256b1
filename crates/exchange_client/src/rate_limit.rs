//! Token-bucket rate limiter for the exchange REST client (§5: "token-bucket
//! limiters ... with fair, FIFO waiting"). One shared bucket per client, at
//! a single configured rate — the spec does not distinguish reads from
//! writes, unlike the tiered read/write buckets of the reference bot.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type Inner = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    /// Create with a configured requests-per-second rate (§6:
    /// `exchange.rate_limit_per_sec`, default 10).
    pub fn new(requests_per_sec: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(requests_per_sec.max(1)).unwrap());
        Self {
            inner: Arc::new(GovLimiter::direct(quota)),
        }
    }

    /// Wait until a slot is available.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }

    /// Try to acquire a slot without waiting.
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }
}
