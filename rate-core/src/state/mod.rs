//! Editing state for a booking's rate lines.
//!
//! Entered values are kept as raw text so partially typed numbers survive
//! between keystrokes; parsing happens only when amounts are calculated.

mod dynamic_rates;
mod editor;

pub use dynamic_rates::{DynamicRateState, RateEditorState, TaxModeState, seed_collection};
pub use editor::{EditError, RateEditor, RateEvent, SubscriptionId};
