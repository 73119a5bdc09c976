//! Binance klines data provider.
//!
//! Fetches OHLCV bars from the spot klines API, trying the primary host
//! first and the public data mirror on failure. Handles retries with
//! exponential backoff and response parsing. Hosts and paths are
//! overridable through environment variables for proxies and mirrors.

use std::time::Duration;

use chrono::DateTime;

use crate::domain::{Bar, Timeframe};

use super::provider::{BarProvider, DataError};

const PRIMARY_URL: &str = "https://api.binance.com";
const FALLBACK_URL: &str = "https://data-api.binance.vision";
const KLINES_PATH: &str = "/api/v3/klines";

/// One kline row: open time (ms), OHLCV as decimal strings, close time,
/// quote volume, trade count, taker volumes, and an ignored field.
type Kline = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    String,
);

/// Binance klines provider with an ordered list of (base, path) sources.
pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    sources: Vec<(String, String)>,
    max_retries: u32,
    base_delay: Duration,
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Source list from the environment, duplicates removed in order.
fn build_sources() -> Vec<(String, String)> {
    let primary_base = std::env::var("BINANCE_BASE_URL")
        .unwrap_or_else(|_| PRIMARY_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    let primary_path =
        normalize_path(&std::env::var("BINANCE_KLINES_PATH").unwrap_or_else(|_| KLINES_PATH.to_string()));
    let fallback_base = std::env::var("BINANCE_FALLBACK_URL")
        .unwrap_or_else(|_| FALLBACK_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    let fallback_path = normalize_path(
        &std::env::var("BINANCE_FALLBACK_KLINES_PATH").unwrap_or_else(|_| KLINES_PATH.to_string()),
    );

    let mut sources = Vec::new();
    for source in [(primary_base, primary_path), (fallback_base, fallback_path)] {
        if !source.0.is_empty() && !sources.contains(&source) {
            sources.push(source);
        }
    }
    if sources.is_empty() {
        sources.push((FALLBACK_URL.to_string(), KLINES_PATH.to_string()));
    }
    sources
}

impl BinanceProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            sources: build_sources(),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }

    fn parse_klines(source: &str, klines: Vec<Kline>) -> Result<Vec<Bar>, DataError> {
        if klines.is_empty() {
            return Err(DataError::EmptyPayload(source.to_string()));
        }

        let mut bars = Vec::with_capacity(klines.len());
        for k in klines {
            let ts = DateTime::from_timestamp_millis(k.0)
                .ok_or_else(|| DataError::InvalidResponse(format!("invalid open time: {}", k.0)))?;
            let parse = |s: &str, field: &str| {
                s.parse::<f64>()
                    .map_err(|_| DataError::InvalidResponse(format!("bad {field}: {s:?}")))
            };
            let bar = Bar {
                ts,
                open: parse(&k.1, "open")?,
                high: parse(&k.2, "high")?,
                low: parse(&k.3, "low")?,
                close: parse(&k.4, "close")?,
                volume: parse(&k.5, "volume")?,
            };
            // Drop rows with unusable prices rather than failing the fetch
            if bar.is_sane() {
                bars.push(bar);
            }
        }

        bars.sort_by_key(|b| b.ts);
        bars.dedup_by_key(|b| b.ts);

        if bars.is_empty() {
            return Err(DataError::EmptyPayload(source.to_string()));
        }
        Ok(bars)
    }

    /// Fetch from one source with retry and exponential backoff.
    fn fetch_from_source(
        &self,
        base: &str,
        path: &str,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let url = format!(
            "{base}{path}?symbol={symbol}&interval={interval}&limit={limit}",
            interval = timeframe.interval()
        );
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        let body = resp.text().unwrap_or_default();
                        last_error = Some(DataError::HttpStatus {
                            status: status.as_u16(),
                            body: body.chars().take(120).collect(),
                        });
                        continue;
                    }

                    let klines: Vec<Kline> = resp.json().map_err(|e| {
                        DataError::InvalidResponse(format!("failed to parse klines: {e}"))
                    })?;
                    return Self::parse_klines(base, klines);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::NetworkUnreachable("max retries exceeded".into())))
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BarProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let mut errors = Vec::new();
        for (base, path) in &self.sources {
            match self.fetch_from_source(base, path, symbol, timeframe, limit) {
                Ok(bars) => return Ok(bars),
                Err(e) => {
                    eprintln!("warning: {base}{path} failed for {symbol}: {e}");
                    errors.push(format!("{base}{path}: {e}"));
                }
            }
        }
        Err(DataError::AllSourcesFailed(errors.join(" | ")))
    }
}
