#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loop_evaluator::controller::{Controller, LiveVenue, Timeouts};
use loop_evaluator::error::{ArbError, Result};
use loop_evaluator::models::{BookSide, CurrencyPair, Quote};
use loop_evaluator::sources::QuoteSource;
use loop_evaluator::store::MemoryStore;

/// Two-step loop stored out of order relative to the USDT base: a bank
/// transfer back to USDT followed by the live OKX USDT->BTC trade.
pub fn seed(back_rate: f64) -> String {
    format!(
        r#"{{
        "platforms": [{{"platform_id": 1, "platform_name": "OKX"}}],
        "methods": [{{"method_id": 1, "method_name": "Trade"}}],
        "courses": [
            {{"currency_from": "USDT", "currency_to": "BTC", "platform_id": 1, "method_id": 1, "rate": 0.5, "tax": 0.0}},
            {{"currency_from": "BTC", "currency_to": "USDT", "platform_id": 1, "method_id": 1, "rate": {back_rate}, "tax": 0.0}}
        ],
        "loops": [
            {{"loop_id": 5, "steps": [
                {{"step_number": 1, "currency_from": "BTC", "currency_to": "USDT", "platform_from": "Bank",
                  "platform_to": "Bank", "method": "Transfer", "rule_id": 51, "tax": 0.0}},
                {{"step_number": 2, "currency_from": "USDT", "currency_to": "BTC", "platform_from": "OKX",
                  "platform_to": "OKX", "method": "Trade", "rule_id": 52, "tax": 0.0}}
            ]}},
            {{"loop_id": 6, "steps": [
                {{"step_number": 1, "currency_from": "USDT", "currency_to": "DOGE", "platform_from": "OKX",
                  "platform_to": "OKX", "method": "Trade", "rule_id": 61, "tax": 0.0}},
                {{"step_number": 2, "currency_from": "DOGE", "currency_to": "USDT", "platform_from": "OKX",
                  "platform_to": "OKX", "method": "Trade", "rule_id": 62, "tax": 0.0}}
            ]}}
        ],
        "clients": [{{"key": "good", "status": 2}}, {{"key": "suspended", "status": 0}}]
    }}"#
    )
}

#[derive(Default)]
pub struct StubBook {
    pub asks: HashMap<String, Vec<Quote>>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubBook {
    /// Ask depth on USDT-BTC giving cumulative liquidity 100 / 250 / 600.
    pub fn usdt_btc() -> Self {
        let mut asks = HashMap::new();
        asks.insert(
            "USDT-BTC".to_string(),
            vec![
                Quote { price: 0.5, size: 100.0 },
                Quote { price: 0.51, size: 150.0 },
                Quote { price: 0.52, size: 350.0 },
            ],
        );
        Self { asks, ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for StubBook {
    async fn fetch_quotes(&self, pair: &CurrencyPair, side: BookSide) -> Result<Vec<Quote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ArbError::QuoteFetch { pair: pair.to_string(), reason: "connection reset".into() });
        }
        Ok(match side {
            BookSide::Asks => self.asks.get(&pair.inst_id()).cloned().unwrap_or_default(),
            BookSide::Bids => Vec::new(),
        })
    }
}

pub fn controller(store: Arc<MemoryStore>, book: Arc<StubBook>) -> Controller {
    controller_for(store, book, "OKX")
}

pub fn controller_for(store: Arc<MemoryStore>, book: Arc<StubBook>, platform: &str) -> Controller {
    Controller::new(
        store.clone(),
        store.clone(),
        book,
        store,
        LiveVenue { platform: platform.to_string(), method: "Trade".to_string() },
        Timeouts { quotes: Duration::from_secs(1), persist: Duration::from_secs(1) },
    )
}
