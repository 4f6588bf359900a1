use std::future::Future;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::error::{ArbError, Result};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs `fut` under `limit`; running out of time is an error, never an
/// empty result.
pub async fn bounded<T, F>(limit: Duration, operation: impl Into<String>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(ArbError::Timeout {
            operation: operation.into(),
            after_ms: limit.as_millis() as u64,
        }),
    }
}
