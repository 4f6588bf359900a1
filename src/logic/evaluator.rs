use tracing::{debug, info};

use crate::error::Result;
use crate::logic::projection::LoopProjector;
use crate::models::{EvalMode, LiquidityTranche, ProjectedOutcome};

/// What the scan does after looking at one tranche.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Continue,
    /// Stop and report this tranche's outcome, keeping its row.
    StopInclusive(ProjectedOutcome),
    /// Stop and report the last remembered candidate, dropping this row.
    StopExclusivePrevious(Option<ProjectedOutcome>),
}

/// Stop-rule state machine for one scan over ascending tranches.
#[derive(Debug, Clone)]
pub struct ScanState {
    mode: EvalMode,
    best: Option<ProjectedOutcome>,
}

impl ScanState {
    pub fn new(mode: EvalMode) -> Self {
        Self { mode, best: None }
    }

    pub fn best(&self) -> Option<ProjectedOutcome> {
        self.best
    }

    /// Quantity pushed around the loop for a tranche with the given
    /// cumulative liquidity.
    pub fn starting_quantity(&self, cumulative: f64) -> f64 {
        match self.mode {
            EvalMode::ProfitThreshold(_) => cumulative,
            EvalMode::RequestedAmount(amount) => amount,
        }
    }

    pub fn observe(&mut self, cumulative: f64, outcome: ProjectedOutcome) -> Decision {
        match self.mode {
            EvalMode::ProfitThreshold(threshold) => {
                if outcome.ending_quantity <= cumulative {
                    Decision::StopInclusive(outcome)
                } else if outcome.profit_fraction > threshold {
                    self.best = Some(outcome);
                    Decision::Continue
                } else if outcome.profit_fraction == threshold {
                    Decision::StopInclusive(outcome)
                } else if self.best.is_some() {
                    Decision::StopExclusivePrevious(self.best)
                } else {
                    // nothing cleared the threshold yet, keep looking deeper
                    Decision::Continue
                }
            }
            EvalMode::RequestedAmount(amount) => {
                self.best = Some(outcome);
                if amount < cumulative {
                    Decision::StopInclusive(outcome)
                } else {
                    Decision::Continue
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub outcome: Option<ProjectedOutcome>,
    pub emitted: Vec<LiquidityTranche>,
}

/// Scans `tranches` in order, projecting each through the loop, until a
/// stop rule fires. A missing rate aborts the whole scan.
pub async fn select_outcome(
    mut tranches: Vec<LiquidityTranche>,
    mode: EvalMode,
    projector: &LoopProjector<'_>,
) -> Result<Selection> {
    let mut state = ScanState::new(mode);

    for i in 0..tranches.len() {
        let cumulative = tranches[i].cumulative_base_quantity;
        let outcome = projector.project(state.starting_quantity(cumulative)).await?;

        match state.observe(cumulative, outcome) {
            Decision::Continue => {
                debug!(index = i, cumulative, profit = outcome.profit_fraction, "tranche accepted");
            }
            Decision::StopInclusive(chosen) => {
                info!(index = i, cumulative, profit = chosen.profit_fraction, "stopped at tranche");
                tranches.truncate(i + 1);
                return Ok(Selection { outcome: Some(chosen), emitted: tranches });
            }
            Decision::StopExclusivePrevious(previous) => {
                info!(index = i, cumulative, "profit fell below threshold, keeping previous tranche");
                tranches.truncate(i);
                return Ok(Selection { outcome: previous, emitted: tranches });
            }
        }
    }

    info!(tranches = tranches.len(), "liquidity exhausted without a stop");
    Ok(Selection { outcome: state.best(), emitted: tranches })
}
