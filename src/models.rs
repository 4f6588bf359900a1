use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One conversion of a stored loop, ordered by step number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopStep {
    pub currency_from: String,
    pub currency_to: String,
    pub platform_from: String,
    pub platform_to: String,
    pub method: String,
    pub rule_id: i64,
    pub tax: f64,
}

impl LoopStep {
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.currency_from, &self.currency_to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self { base: base.to_string(), quote: quote.to_string() }
    }

    pub fn reversed(&self) -> Self {
        Self { base: self.quote.clone(), quote: self.base.clone() }
    }

    /// Instrument id as the exchange spells it, e.g. `BTC-USDT`.
    pub fn inst_id(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Asks,
    Bids,
}

/// One order-book price level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub size: f64,
}

/// Stored conversion rate and tax percent for a pair on a platform/method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredRate {
    pub rate: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub method_id: i64,
    pub method_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub platform_id: i64,
    pub platform_name: String,
}

/// A slice of live-leg liquidity indexed by cumulative base-currency volume.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityTranche {
    pub currency_from: String,
    pub currency_to: String,
    pub rate: f64,
    pub leg_quantity: f64,
    pub base_quantity: f64,
    pub cumulative_base_quantity: f64,
    pub rule_id: i64,
    pub platform_from: String,
    pub platform_to: String,
    pub tax: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedOutcome {
    pub starting_quantity: f64,
    pub ending_quantity: f64,
    pub profit_fraction: f64,
}

impl ProjectedOutcome {
    /// Profit is scaled by 1/100 of the absolute gain, not a ratio.
    pub fn new(starting_quantity: f64, ending_quantity: f64) -> Self {
        Self {
            starting_quantity,
            ending_quantity,
            profit_fraction: (ending_quantity - starting_quantity) / 100.0,
        }
    }
}

/// Which stop rule drives the tranche scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalMode {
    ProfitThreshold(f64),
    RequestedAmount(f64),
}

impl EvalMode {
    /// Exactly one of the two optional knobs must be present.
    pub fn from_options(profit: Option<f64>, amount: Option<f64>) -> Option<Self> {
        match (profit, amount) {
            (Some(p), None) => Some(EvalMode::ProfitThreshold(p)),
            (None, Some(a)) => Some(EvalMode::RequestedAmount(a)),
            _ => None,
        }
    }
}

/// The decision artifact: chosen outcome plus the tranche rows that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub profit_fraction: Option<f64>,
    pub matched_amount: Option<f64>,
    pub emitted_tranches: Vec<LiquidityTranche>,
}

/// Row stored in the results table after a successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopRecord {
    pub loop_id: i64,
    pub spread: f64,
    pub max_flow: f64,
    pub loop_speed: f64,
    pub frequency: String,
    pub added: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParserRequest {
    pub key: Option<String>,
    pub loop_id: Option<i64>,
    pub currency_name: Option<String>,
    pub profit: Option<f64>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheRow {
    pub platform_from: String,
    pub platform_to: String,
    pub method: String,
    pub currency_from: String,
    pub currency_to: String,
    pub rate: f64,
    pub rule_id: i64,
    pub tax: f64,
    pub sum_start: f64,
    pub sum_end: f64,
}

impl TrancheRow {
    pub fn from_tranche(t: &LiquidityTranche, method: &str) -> Self {
        Self {
            platform_from: t.platform_from.clone(),
            platform_to: t.platform_to.clone(),
            method: method.to_string(),
            currency_from: t.currency_from.clone(),
            currency_to: t.currency_to.clone(),
            rate: t.rate,
            rule_id: t.rule_id,
            tax: t.tax,
            sum_start: t.leg_quantity,
            sum_end: t.base_quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserResponse {
    pub profit: Option<f64>,
    pub amount: Option<f64>,
    pub data: Vec<TrancheRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profit_fraction_is_gain_over_hundred() {
        let o = ProjectedOutcome::new(1000.0, 1012.0);
        assert!((o.profit_fraction - 0.12).abs() < 1e-12);
    }

    #[test]
    fn mode_requires_exactly_one_option() {
        assert_eq!(EvalMode::from_options(Some(0.0), None), Some(EvalMode::ProfitThreshold(0.0)));
        assert_eq!(EvalMode::from_options(None, Some(5.0)), Some(EvalMode::RequestedAmount(5.0)));
        assert_eq!(EvalMode::from_options(None, None), None);
        assert_eq!(EvalMode::from_options(Some(1.0), Some(5.0)), None);
    }

    #[test]
    fn reversed_pair_swaps_currencies() {
        let p = CurrencyPair::new("BTC", "USDT");
        assert_eq!(p.reversed().inst_id(), "USDT-BTC");
        assert_eq!(p.to_string(), "BTC-USDT");
    }
}
