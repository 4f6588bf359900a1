//! Loop evaluation engine: rotation, order-book conversion, projection and
//! the tranche scan.

pub mod evaluator;
pub mod order_book;
pub mod projection;
pub mod rotation;

pub use evaluator::{select_outcome, Decision, ScanState, Selection};
pub use order_book::OrderBookConverter;
pub use projection::LoopProjector;
pub use rotation::rotate_to_base;
