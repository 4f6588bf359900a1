//! Capabilities the evaluator consumes. Implementations live in `store` and
//! `exchanges`; tests provide their own stubs.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    BookSide, CurrencyPair, LoopRecord, LoopStep, MethodInfo, PlatformInfo, Quote, StoredRate,
};

/// Order-book depth for a pair, best price first. An empty vec means the
/// venue has no book for that pair.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self, pair: &CurrencyPair, side: BookSide) -> Result<Vec<Quote>>;
}

/// Stored rate and tax for a conversion on a platform/method.
#[async_trait]
pub trait RateLookup: Send + Sync {
    async fn lookup_rate(
        &self,
        currency_from: &str,
        currency_to: &str,
        platform_id: i64,
        method_id: i64,
    ) -> Result<Option<StoredRate>>;
}

#[async_trait]
pub trait LoopPathProvider: Send + Sync {
    /// Steps ordered by step number; empty when the loop id is unknown.
    async fn load_loop(&self, loop_id: i64) -> Result<Vec<LoopStep>>;
    async fn resolve_method(&self, name: &str) -> Result<Option<MethodInfo>>;
    async fn resolve_platform(&self, name: &str) -> Result<Option<PlatformInfo>>;
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist_result(&self, record: LoopRecord) -> Result<()>;
}

#[async_trait]
pub trait AccessKeys: Send + Sync {
    async fn check_key(&self, key: &str) -> Result<bool>;
}
