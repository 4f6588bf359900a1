//! Live order-book sources.

pub mod okx;

use crate::models::Quote;

/// Parses a `[price, size, ...]` level as sent by exchange REST books.
/// Returns `None` for malformed or non-positive levels.
pub fn parse_level(level: &[String]) -> Option<Quote> {
    let price = level.first()?.parse::<f64>().ok()?;
    let size = level.get(1)?.parse::<f64>().ok()?;
    if price.is_finite() && size.is_finite() && price > 0.0 && size > 0.0 {
        Some(Quote { price, size })
    } else {
        None
    }
}
