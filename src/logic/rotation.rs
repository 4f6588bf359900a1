use crate::error::{ArbError, Result};
use crate::models::LoopStep;

/// Rotates `steps` so the first step leaves from `base`.
///
/// Moves the last step to the front at most `n` times; a loop that never
/// passes through `base` is rejected instead of spinning forever.
pub fn rotate_to_base(loop_id: i64, mut steps: Vec<LoopStep>, base: &str) -> Result<Vec<LoopStep>> {
    for _ in 0..steps.len() {
        if steps[0].currency_from == base {
            return Ok(steps);
        }
        steps.rotate_right(1);
    }

    Err(ArbError::NoBaseCurrencyInLoop { loop_id, currency: base.to_string() })
}
