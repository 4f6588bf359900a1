use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::{ArbError, Result};
use crate::logic::{rotate_to_base, select_outcome, LoopProjector, OrderBookConverter};
use crate::models::{EvalMode, EvaluationResult, LoopRecord, MethodInfo, PlatformInfo};
use crate::sources::{LoopPathProvider, QuoteSource, RateLookup, ResultSink};
use crate::utils::bounded;

/// Nominal loop speed written with every result.
pub const LOOP_SPEED: f64 = 1.0;
/// Result frequency tag written with every result.
pub const LOOP_FREQUENCY: &str = "s";

#[derive(Debug, Clone)]
pub struct LiveVenue {
    pub platform: String,
    pub method: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub quotes: Duration,
    pub persist: Duration,
}

/// Wires the loop store, stored rates, the live book and the result sink
/// into one evaluation. Handles are injected once and reused per call.
#[derive(Clone)]
pub struct Controller {
    loops: Arc<dyn LoopPathProvider>,
    rates: Arc<dyn RateLookup>,
    quotes: Arc<dyn QuoteSource>,
    sink: Arc<dyn ResultSink>,
    venue: LiveVenue,
    timeouts: Timeouts,
}

impl Controller {
    pub fn new(
        loops: Arc<dyn LoopPathProvider>,
        rates: Arc<dyn RateLookup>,
        quotes: Arc<dyn QuoteSource>,
        sink: Arc<dyn ResultSink>,
        venue: LiveVenue,
        timeouts: Timeouts,
    ) -> Self {
        Self { loops, rates, quotes, sink, venue, timeouts }
    }

    pub fn venue(&self) -> &LiveVenue {
        &self.venue
    }

    #[instrument(skip(self), fields(platform = %self.venue.platform))]
    pub async fn evaluate(
        &self,
        loop_id: i64,
        base_currency: &str,
        profit_threshold: Option<f64>,
        requested_amount: Option<f64>,
    ) -> Result<EvaluationResult> {
        let mode = EvalMode::from_options(profit_threshold, requested_amount).ok_or_else(|| {
            ArbError::InvalidRequest("exactly one of profit or amount must be supplied".to_string())
        })?;

        let platform = self.platform().await?;
        let method = self.method().await?;

        let steps = self.loops.load_loop(loop_id).await?;
        if steps.is_empty() {
            return Err(ArbError::LoopUnresolved { loop_id });
        }
        let steps = rotate_to_base(loop_id, steps, base_currency)?;

        let tranches = OrderBookConverter::new(self.quotes.as_ref(), self.rates.as_ref(), self.timeouts.quotes)
            .build_tranches(&steps, base_currency, &platform, &method)
            .await?;

        let projector = LoopProjector::new(self.rates.as_ref(), &steps, platform.platform_id, method.method_id);
        let selection = select_outcome(tranches, mode, &projector).await?;

        if let Some(outcome) = selection.outcome {
            let record = LoopRecord {
                loop_id,
                spread: outcome.profit_fraction,
                max_flow: outcome.ending_quantity,
                loop_speed: LOOP_SPEED,
                frequency: LOOP_FREQUENCY.to_string(),
                added: Utc::now(),
            };
            bounded(self.timeouts.persist, format!("persist loop {loop_id}"), self.sink.persist_result(record)).await?;
        } else {
            info!(loop_id, "no qualifying tranche, nothing persisted");
        }

        info!(
            loop_id,
            profit = ?selection.outcome.map(|o| o.profit_fraction),
            rows = selection.emitted.len(),
            "evaluation finished"
        );

        Ok(EvaluationResult {
            profit_fraction: selection.outcome.map(|o| o.profit_fraction),
            matched_amount: selection.outcome.map(|o| o.ending_quantity),
            emitted_tranches: selection.emitted,
        })
    }

    async fn platform(&self) -> Result<PlatformInfo> {
        self.loops
            .resolve_platform(&self.venue.platform)
            .await?
            .ok_or_else(|| ArbError::PlatformUnresolved { platform: self.venue.platform.clone() })
    }

    async fn method(&self) -> Result<MethodInfo> {
        self.loops
            .resolve_method(&self.venue.method)
            .await?
            .ok_or_else(|| ArbError::MethodUnresolved { method: self.venue.method.clone() })
    }
}
