//! Rate calculation modules.
//!
//! Ordering of display lines, per-line amounts, the base-rate sum used as
//! the percent-tax basis, and the booking totals built on top of them.

pub mod aggregator;
pub mod common;
pub mod ordering;
pub mod worksheet;

pub use aggregator::{PayoutPolicy, PayoutPolicyError, QuoteBreakdown, RateCalculator, Totals};
pub use common::{DEFAULT_CURRENCY_SYMBOL, format_currency};
pub use ordering::resolve_order;
pub use worksheet::{BASE_RATE_KEY, LineKind, RateLine, RateWorksheet, compute_base_sum};
