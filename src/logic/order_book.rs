use futures_util::future::try_join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ArbError, Result};
use crate::models::{BookSide, CurrencyPair, LiquidityTranche, LoopStep, MethodInfo, PlatformInfo, Quote};
use crate::sources::{QuoteSource, RateLookup};
use crate::utils::bounded;

/// Quotes of one live leg, already oriented (ask side as-is, bid side of
/// the reversed pair inverted).
#[derive(Debug, Clone)]
struct LegBook {
    currency_from: String,
    currency_to: String,
    rule_id: i64,
    platform_from: String,
    platform_to: String,
    levels: Vec<(f64, f64)>,
}

/// Turns live order-book depth into base-currency liquidity tranches.
pub struct OrderBookConverter<'a> {
    quotes: &'a dyn QuoteSource,
    rates: &'a dyn RateLookup,
    quote_timeout: Duration,
}

impl<'a> OrderBookConverter<'a> {
    pub fn new(quotes: &'a dyn QuoteSource, rates: &'a dyn RateLookup, quote_timeout: Duration) -> Self {
        Self { quotes, rates, quote_timeout }
    }

    /// Builds the merged tranche list for every live leg of `steps`,
    /// ascending by cumulative base quantity.
    pub async fn build_tranches(
        &self,
        steps: &[LoopStep],
        base: &str,
        platform: &PlatformInfo,
        method: &MethodInfo,
    ) -> Result<Vec<LiquidityTranche>> {
        let live: Vec<&LoopStep> = steps.iter().filter(|s| is_live_leg(s, platform, method)).collect();
        if live.is_empty() {
            warn!(platform = %platform.platform_name, method = %method.method_name, "loop has no live legs");
        }

        // legs are fetched concurrently; order only matters at the final merge
        let books = try_join_all(live.into_iter().map(|step| self.fetch_leg(step))).await?;

        let mut tranches = Vec::new();
        for book in books {
            tranches.extend(self.to_base_currency(book, base, platform, method).await?);
        }

        tranches.sort_by(|a, b| a.cumulative_base_quantity.total_cmp(&b.cumulative_base_quantity));
        info!(count = tranches.len(), base, "built liquidity tranches");
        Ok(tranches)
    }

    async fn fetch_leg(&self, step: &LoopStep) -> Result<LegBook> {
        let pair = step.pair();
        let asks = self.fetch(&pair, BookSide::Asks).await?;

        if !asks.is_empty() {
            debug!(pair = %pair, levels = asks.len(), best = asks[0].price, "using asks");
            return Ok(LegBook {
                currency_from: step.currency_from.clone(),
                currency_to: step.currency_to.clone(),
                rule_id: step.rule_id,
                platform_from: step.platform_from.clone(),
                platform_to: step.platform_to.clone(),
                levels: asks.iter().map(|q| (q.price, q.size)).collect(),
            });
        }

        let reversed = pair.reversed();
        debug!(pair = %pair, reversed = %reversed, "no asks, falling back to reversed bids");
        let bids = self.fetch(&reversed, BookSide::Bids).await?;
        if bids.is_empty() {
            return Err(ArbError::EmptyOrderBook { pair: pair.to_string() });
        }

        // rate is the reciprocal of the quoted size, not the price
        Ok(LegBook {
            currency_from: step.currency_to.clone(),
            currency_to: step.currency_from.clone(),
            rule_id: step.rule_id,
            platform_from: step.platform_from.clone(),
            platform_to: step.platform_to.clone(),
            levels: bids.iter().map(|q| (1.0 / q.size, q.size)).collect(),
        })
    }

    async fn fetch(&self, pair: &CurrencyPair, side: BookSide) -> Result<Vec<Quote>> {
        let quotes = bounded(
            self.quote_timeout,
            format!("fetch {side:?} for {pair}"),
            self.quotes.fetch_quotes(pair, side),
        )
        .await?;
        Ok(quotes.into_iter().filter(is_usable).collect())
    }

    async fn to_base_currency(
        &self,
        book: LegBook,
        base: &str,
        platform: &PlatformInfo,
        method: &MethodInfo,
    ) -> Result<Vec<LiquidityTranche>> {
        let (rate, tax) = if book.currency_from == base {
            (1.0, 0.0)
        } else {
            let stored = self
                .rates
                .lookup_rate(&book.currency_from, base, platform.platform_id, method.method_id)
                .await?
                .ok_or_else(|| ArbError::RateUnavailable {
                    pair: format!("{}-{}", book.currency_from, base),
                    platform_id: platform.platform_id,
                    method_id: method.method_id,
                })?;
            (stored.rate, stored.tax)
        };
        debug!(
            leg = %format!("{}-{}", book.currency_from, book.currency_to),
            levels = book.levels.len(),
            rate,
            "converting leg to {}",
            base
        );

        let mut cumulative = 0.0;
        let tranches = book
            .levels
            .iter()
            .map(|&(_, leg_quantity)| {
                let base_quantity = leg_quantity * rate;
                cumulative += base_quantity;
                LiquidityTranche {
                    currency_from: book.currency_from.clone(),
                    currency_to: base.to_string(),
                    rate,
                    leg_quantity,
                    base_quantity,
                    cumulative_base_quantity: cumulative,
                    rule_id: book.rule_id,
                    platform_from: book.platform_from.clone(),
                    platform_to: book.platform_to.clone(),
                    tax,
                }
            })
            .collect();
        Ok(tranches)
    }
}

/// A leg is priced from the live book when it trades on the live
/// platform with the live method.
pub fn is_live_leg(step: &LoopStep, platform: &PlatformInfo, method: &MethodInfo) -> bool {
    step.platform_from.eq_ignore_ascii_case(&platform.platform_name)
        && step.method.eq_ignore_ascii_case(&method.method_name)
}

fn is_usable(q: &Quote) -> bool {
    q.price.is_finite() && q.price > 0.0 && q.size.is_finite() && q.size > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoredRate;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Book {
        asks: HashMap<String, Vec<Quote>>,
        bids: HashMap<String, Vec<Quote>>,
    }

    #[async_trait]
    impl QuoteSource for Book {
        async fn fetch_quotes(&self, pair: &CurrencyPair, side: BookSide) -> Result<Vec<Quote>> {
            let side = match side {
                BookSide::Asks => &self.asks,
                BookSide::Bids => &self.bids,
            };
            Ok(side.get(&pair.inst_id()).cloned().unwrap_or_default())
        }
    }

    struct SlowBook;

    #[async_trait]
    impl QuoteSource for SlowBook {
        async fn fetch_quotes(&self, _pair: &CurrencyPair, _side: BookSide) -> Result<Vec<Quote>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Rates(HashMap<(String, String), StoredRate>);

    #[async_trait]
    impl RateLookup for Rates {
        async fn lookup_rate(&self, from: &str, to: &str, _p: i64, _m: i64) -> Result<Option<StoredRate>> {
            Ok(self.0.get(&(from.to_string(), to.to_string())).copied())
        }
    }

    fn q(price: f64, size: f64) -> Quote {
        Quote { price, size }
    }

    fn step(from: &str, to: &str, platform: &str, rule_id: i64) -> LoopStep {
        LoopStep {
            currency_from: from.into(),
            currency_to: to.into(),
            platform_from: platform.into(),
            platform_to: platform.into(),
            method: "Trade".into(),
            rule_id,
            tax: 0.1,
        }
    }

    fn okx() -> (PlatformInfo, MethodInfo) {
        (
            PlatformInfo { platform_id: 1, platform_name: "OKX".into() },
            MethodInfo { method_id: 2, method_name: "Trade".into() },
        )
    }

    #[tokio::test]
    async fn base_leg_uses_quote_sizes_directly() {
        let mut book = Book::default();
        book.asks.insert("USDT-BTC".into(), vec![q(0.000016, 40.0), q(0.000017, 60.0)]);
        let rates = Rates::default();
        let (platform, method) = okx();

        let tranches = OrderBookConverter::new(&book, &rates, Duration::from_secs(1))
            .build_tranches(&[step("USDT", "BTC", "OKX", 5)], "USDT", &platform, &method)
            .await
            .unwrap();

        let cumulative: Vec<f64> = tranches.iter().map(|t| t.cumulative_base_quantity).collect();
        assert_eq!(cumulative, vec![40.0, 100.0]);
        assert!(tranches.iter().all(|t| t.rate == 1.0 && t.tax == 0.0 && t.rule_id == 5));
        assert_eq!(tranches[1].currency_to, "USDT");
    }

    #[tokio::test]
    async fn non_base_leg_is_converted_with_stored_rate() {
        let mut book = Book::default();
        book.asks.insert("BTC-ETH".into(), vec![q(15.0, 2.0), q(15.1, 1.0)]);
        let mut rates = Rates::default();
        rates.0.insert(("BTC".into(), "USDT".into()), StoredRate { rate: 60000.0, tax: 0.1 });
        let (platform, method) = okx();

        let tranches = OrderBookConverter::new(&book, &rates, Duration::from_secs(1))
            .build_tranches(&[step("BTC", "ETH", "OKX", 1)], "USDT", &platform, &method)
            .await
            .unwrap();

        assert_eq!(tranches.len(), 2);
        assert_eq!(tranches[0].leg_quantity, 2.0);
        assert_eq!(tranches[0].base_quantity, 120000.0);
        assert_eq!(tranches[1].cumulative_base_quantity, 180000.0);
        assert_eq!(tranches[1].tax, 0.1);
    }

    #[tokio::test]
    async fn falls_back_to_reversed_bids_with_reciprocal_size() {
        let mut book = Book::default();
        book.bids.insert("ETH-USDT".into(), vec![q(3000.0, 4.0), q(2999.0, 8.0)]);
        let rates = Rates::default();
        let (platform, method) = okx();

        let tranches = OrderBookConverter::new(&book, &rates, Duration::from_secs(1))
            .build_tranches(&[step("USDT", "ETH", "OKX", 3)], "ETH", &platform, &method)
            .await
            .unwrap();

        // source currency flips to ETH which is the base, so sizes pass through
        assert_eq!(tranches[0].currency_from, "ETH");
        assert_eq!(tranches[0].leg_quantity, 4.0);
        assert_eq!(tranches[1].cumulative_base_quantity, 12.0);
    }

    #[tokio::test]
    async fn empty_book_on_both_sides_fails() {
        let book = Book::default();
        let rates = Rates::default();
        let (platform, method) = okx();

        let err = OrderBookConverter::new(&book, &rates, Duration::from_secs(1))
            .build_tranches(&[step("USDT", "XYZ", "OKX", 3)], "USDT", &platform, &method)
            .await
            .unwrap_err();
        assert_eq!(err, ArbError::EmptyOrderBook { pair: "USDT-XYZ".into() });
    }

    #[tokio::test]
    async fn missing_conversion_rate_is_fatal() {
        let mut book = Book::default();
        book.asks.insert("BTC-ETH".into(), vec![q(15.0, 2.0)]);
        let rates = Rates::default();
        let (platform, method) = okx();

        let err = OrderBookConverter::new(&book, &rates, Duration::from_secs(1))
            .build_tranches(&[step("BTC", "ETH", "OKX", 1)], "USDT", &platform, &method)
            .await
            .unwrap_err();
        assert_eq!(err, ArbError::RateUnavailable { pair: "BTC-USDT".into(), platform_id: 1, method_id: 2 });
    }

    #[tokio::test]
    async fn legs_merge_in_ascending_cumulative_order() {
        let mut book = Book::default();
        book.asks.insert("USDT-BTC".into(), vec![q(1.0, 100.0), q(1.0, 150.0), q(1.0, 350.0)]);
        book.asks.insert("BTC-ETH".into(), vec![q(15.0, 0.002), q(15.0, 0.004)]);
        let mut rates = Rates::default();
        rates.0.insert(("BTC".into(), "USDT".into()), StoredRate { rate: 50000.0, tax: 0.0 });
        let (platform, method) = okx();
        let steps = vec![
            step("USDT", "BTC", "OKX", 1),
            step("BTC", "ETH", "OKX", 2),
            step("ETH", "USDT", "Binance", 3),
        ];

        let tranches = OrderBookConverter::new(&book, &rates, Duration::from_secs(1))
            .build_tranches(&steps, "USDT", &platform, &method)
            .await
            .unwrap();

        let cumulative: Vec<f64> = tranches.iter().map(|t| t.cumulative_base_quantity.round()).collect();
        assert_eq!(cumulative, vec![100.0, 100.0, 250.0, 300.0, 600.0]);
        assert!(tranches.windows(2).all(|w| w[0].cumulative_base_quantity <= w[1].cumulative_base_quantity));
        // the Binance leg is not live and contributes nothing
        assert!(tranches.iter().all(|t| t.rule_id != 3));
    }

    #[tokio::test]
    async fn unusable_levels_are_dropped() {
        let mut book = Book::default();
        book.asks.insert("USDT-BTC".into(), vec![q(1.0, 0.0), q(f64::NAN, 3.0), q(1.0, 5.0)]);
        let rates = Rates::default();
        let (platform, method) = okx();

        let tranches = OrderBookConverter::new(&book, &rates, Duration::from_secs(1))
            .build_tranches(&[step("USDT", "BTC", "OKX", 1)], "USDT", &platform, &method)
            .await
            .unwrap();
        assert_eq!(tranches.len(), 1);
        assert_eq!(tranches[0].cumulative_base_quantity, 5.0);
    }

    #[tokio::test]
    async fn slow_quote_source_surfaces_timeout() {
        let rates = Rates::default();
        let (platform, method) = okx();

        let err = OrderBookConverter::new(&SlowBook, &rates, Duration::from_millis(20))
            .build_tranches(&[step("USDT", "BTC", "OKX", 1)], "USDT", &platform, &method)
            .await
            .unwrap_err();
        assert!(matches!(err, ArbError::Timeout { after_ms: 20, .. }));
    }
}
