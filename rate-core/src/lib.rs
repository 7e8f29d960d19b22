pub mod calculations;
pub mod models;
pub mod state;

pub use calculations::{
    BASE_RATE_KEY, DEFAULT_CURRENCY_SYMBOL, LineKind, PayoutPolicy, PayoutPolicyError,
    QuoteBreakdown, RateCalculator, RateLine, RateWorksheet, Totals, compute_base_sum,
    format_currency, resolve_order,
};
pub use models::*;
pub use state::{
    DynamicRateState, EditError, RateEditor, RateEditorState, RateEvent, SubscriptionId,
    TaxModeState,
};
