//! REST client for the exchange API (§6 exchange client surface): market
//! discovery, orderbook quotes, order placement/cancellation,
//! open-orders/positions/fills polling. All write calls are rate-limited
//! and RSA-PSS authenticated; retries (by the caller) apply to 5xx only,
//! never to 4xx (§6: "retries on 5xx only (not on 4xx)").

use chrono::{DateTime, Utc};
use domain::{Error, Side};
use tracing::debug;

use crate::auth::ExchangeAuth;
use crate::rate_limit::RateLimiter;
use crate::wire::*;

const DEMO_BASE_URL: &str = "https://demo-api.exchange.example.com";
const PROD_BASE_URL: &str = "https://api.exchange.example.com";

fn resolve_base_url(use_demo: bool) -> String {
    if let Ok(override_url) = std::env::var("EXCHANGE_API_BASE_URL") {
        let normalized = override_url.trim().trim_end_matches('/').to_string();
        if !normalized.is_empty() {
            return normalized;
        }
    }
    if use_demo {
        DEMO_BASE_URL.to_string()
    } else {
        PROD_BASE_URL.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeRestClient {
    client: reqwest::Client,
    auth: ExchangeAuth,
    base_url: String,
    limiter: RateLimiter,
}

impl ExchangeRestClient {
    pub fn new(
        auth: ExchangeAuth,
        use_demo: bool,
        rate_limit_per_sec: u32,
        per_call_timeout: std::time::Duration,
    ) -> Self {
        let base_url = resolve_base_url(use_demo);
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .timeout(per_call_timeout)
            .build()
            .expect("failed to build exchange HTTP client");

        Self {
            client,
            auth,
            base_url,
            limiter: RateLimiter::new(rate_limit_per_sec),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `list_markets(series, event_date) -> [Market]` (§6).
    pub async fn list_markets(&self, series_ticker: &str) -> Result<Vec<WireMarket>, Error> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            self.limiter.wait().await;
            let path = "/trade-api/v2/markets";
            let headers = self.auth.headers("GET", path);
            let mut req = self
                .client
                .get(self.url(path))
                .headers(headers)
                .query(&[("series_ticker", series_ticker), ("status", "open")]);
            if let Some(ref c) = cursor {
                req = req.query(&[("cursor", c.as_str())]);
            }

            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(map_http_error(status.as_u16(), body));
            }

            let body: MarketsResponse = resp.json().await?;
            let count = body.markets.len();
            all.extend(body.markets);
            debug!("fetched {count} markets for series {series_ticker} (total {})", all.len());

            match body.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }
        Ok(all)
    }

    /// `get_orderbook(ticker) -> Quote` (§6). Returns the single market row.
    pub async fn get_orderbook(&self, ticker: &str) -> Result<WireMarket, Error> {
        self.limiter.wait().await;
        let path = format!("/trade-api/v2/markets/{ticker}");
        let headers = self.auth.headers("GET", &path);

        let resp = self.client.get(self.url(&path)).headers(headers).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), body));
        }

        #[derive(serde::Deserialize)]
        struct Wrapper {
            market: WireMarket,
        }
        let w: Wrapper = resp.json().await?;
        Ok(w.market)
    }

    /// `place_order(client_order_id, ticker, side, quantity, limit_price_cents) -> OrderAck | Error`.
    pub async fn place_order(
        &self,
        client_order_id: &str,
        ticker: &str,
        side: Side,
        quantity: i64,
        limit_price_cents: i64,
    ) -> Result<WireOrder, Error> {
        self.limiter.wait().await;
        let path = "/trade-api/v2/portfolio/orders";
        let headers = self.auth.headers("POST", path);

        let (yes_price, no_price) = match side {
            Side::Yes => (Some(limit_price_cents), None),
            Side::No => (None, Some(limit_price_cents)),
        };

        let body = CreateOrderRequest {
            ticker: ticker.to_string(),
            side,
            action: "buy",
            client_order_id: client_order_id.to_string(),
            count: quantity,
            order_type: "limit",
            yes_price,
            no_price,
        };

        let resp = self
            .client
            .post(self.url(path))
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(Error::TransientNetworkError(
                "rate limited on order creation".into(),
            ));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), text));
        }

        let parsed: CreateOrderResponse = resp.json().await?;
        debug!(
            "order placed: id={} status={} fill_count={}",
            parsed.order.order_id, parsed.order.status, parsed.order.fill_count
        );
        Ok(parsed.order)
    }

    /// `cancel_order(exchange_order_id) -> Ack | Error`.
    pub async fn cancel_order(&self, exchange_order_id: &str) -> Result<(), Error> {
        self.limiter.wait().await;
        let path = format!("/trade-api/v2/portfolio/orders/{exchange_order_id}");
        let headers = self.auth.headers("DELETE", &path);

        let resp = self.client.delete(self.url(&path)).headers(headers).send().await?;
        let status = resp.status();
        if !status.is_success() && status.as_u16() != 204 {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), body));
        }
        Ok(())
    }

    /// `list_open_orders() -> [Order]`.
    pub async fn list_open_orders(&self) -> Result<Vec<WireOrder>, Error> {
        self.limiter.wait().await;
        let path = "/trade-api/v2/portfolio/orders";
        let headers = self.auth.headers("GET", path);
        let resp = self
            .client
            .get(self.url(path))
            .headers(headers)
            .query(&[("status", "resting")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), body));
        }
        let body: OrdersResponse = resp.json().await?;
        Ok(body.orders)
    }

    /// `list_positions() -> [Position]`.
    pub async fn list_positions(&self) -> Result<Vec<WirePosition>, Error> {
        self.limiter.wait().await;
        let path = "/trade-api/v2/portfolio/positions";
        let headers = self.auth.headers("GET", path);
        let resp = self.client.get(self.url(path)).headers(headers).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), body));
        }
        let body: PositionsResponse = resp.json().await?;
        Ok(body.market_positions)
    }

    /// `list_fills(since) -> [Fill]`.
    pub async fn list_fills(&self, since: DateTime<Utc>) -> Result<Vec<WireFill>, Error> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            self.limiter.wait().await;
            let path = "/trade-api/v2/portfolio/fills";
            let headers = self.auth.headers("GET", path);
            let mut req = self
                .client
                .get(self.url(path))
                .headers(headers)
                .query(&[("min_ts", since.timestamp().to_string())]);
            if let Some(ref c) = cursor {
                req = req.query(&[("cursor", c.as_str())]);
            }

            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(map_http_error(status.as_u16(), body));
            }

            let body: FillsResponse = resp.json().await?;
            all.extend(body.fills);
            match body.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }
        Ok(all)
    }

    pub async fn get_balance(&self) -> Result<i64, Error> {
        self.limiter.wait().await;
        let path = "/trade-api/v2/portfolio/balance";
        let headers = self.auth.headers("GET", path);
        let resp = self.client.get(self.url(path)).headers(headers).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), body));
        }
        let body: BalanceResponse = resp.json().await?;
        Ok(body.balance)
    }
}
