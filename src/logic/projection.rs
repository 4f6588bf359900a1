use tracing::debug;

use crate::error::{ArbError, Result};
use crate::models::{LoopStep, ProjectedOutcome};
use crate::sources::RateLookup;

/// Walks a quantity around the whole normalized loop using stored rates.
pub struct LoopProjector<'a> {
    rates: &'a dyn RateLookup,
    steps: &'a [LoopStep],
    platform_id: i64,
    method_id: i64,
}

impl<'a> LoopProjector<'a> {
    pub fn new(rates: &'a dyn RateLookup, steps: &'a [LoopStep], platform_id: i64, method_id: i64) -> Self {
        Self { rates, steps, platform_id, method_id }
    }

    /// Lookups run one after another: each step consumes the previous
    /// step's output quantity.
    pub async fn project(&self, starting_quantity: f64) -> Result<ProjectedOutcome> {
        let mut quantity = starting_quantity;

        for step in self.steps {
            let stored = self
                .rates
                .lookup_rate(&step.currency_from, &step.currency_to, self.platform_id, self.method_id)
                .await?
                .ok_or_else(|| ArbError::RateUnavailable {
                    pair: step.pair().to_string(),
                    platform_id: self.platform_id,
                    method_id: self.method_id,
                })?;

            quantity = apply_step(quantity, stored.rate, stored.tax);
        }

        let outcome = ProjectedOutcome::new(starting_quantity, quantity);
        debug!(
            start = starting_quantity,
            end = outcome.ending_quantity,
            profit = outcome.profit_fraction,
            "projected loop"
        );
        Ok(outcome)
    }
}

/// Converts at `rate`, then takes `tax_percent` of the converted amount.
pub fn apply_step(quantity: f64, rate: f64, tax_percent: f64) -> f64 {
    let converted = quantity * rate;
    let tax = converted * tax_percent / 100.0;
    converted - tax
}
