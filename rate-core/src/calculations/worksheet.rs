//! Per-line rate amounts and the base-rate sum used as the percent-tax basis.
//!
//! # Line Rules
//!
//! | Line | Amount |
//! |------|--------|
//! | `Base_Rate` on a charter/tour booking | rate × hours |
//! | Tax in percent mode | base-rate sum × percent / 100 |
//! | Everything else | the entered amount |
//!
//! Entered text that does not parse falls back to the item's declared base
//! rate; the user is never blocked while typing.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rate_core::{
//!     CalculationContext, RateCategory, RateItemDefinition, RateSchedule, RateWorksheet,
//!     state::RateEditorState,
//! };
//!
//! let mut schedule = RateSchedule::new("bk-42");
//! schedule.base_rates.insert("Base_Rate", RateItemDefinition::new("Base Rate", Some(dec!(50)), None));
//! schedule.taxes.insert("City_Tax", RateItemDefinition::new("City Tax", Some(dec!(10)), Some("percent")));
//!
//! let mut state = RateEditorState::new();
//! state.seed_schedule(&schedule);
//!
//! let context = CalculationContext::new("Charter/Tour").with_hours(dec!(3));
//! let worksheet = RateWorksheet::new(&schedule, &state.rates, &state.tax_modes, &context);
//!
//! assert_eq!(worksheet.base_rates_sum(), dec!(150));
//! let taxes = worksheet.lines(RateCategory::Taxes);
//! assert_eq!(taxes[0].amount, dec!(15.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{capped_mul, capped_sum, parse_amount_or, round_half_up};
use crate::models::{
    CalculationContext, RateCategory, RateItemCollection, RateSchedule, is_charter_service,
};
use crate::state::{DynamicRateState, TaxModeState};

/// The only base-rate key billed per hour on charter/tour bookings.
pub const BASE_RATE_KEY: &str = "Base_Rate";

/// How a line's amount was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LineKind {
    Flat,
    /// Charter base rate billed per hour.
    Hourly { rate: Decimal, hours: Decimal },
    /// Tax charged as a percentage of the base-rate sum.
    Percent { percent: Decimal, basis: Decimal },
}

/// One displayed rate line with its calculated amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLine {
    pub category: RateCategory,
    pub key: String,
    pub label: String,
    /// Text currently held for the line, exactly as entered.
    pub entered: Option<String>,
    /// Calculated amount, rounded to cents.
    pub amount: Decimal,
    pub kind: LineKind,
}

/// Sums every base-rate line as the basis for percent-mode taxes.
///
/// Each item contributes its entered amount (or its base rate when missing or
/// unparseable). On charter/tour service types the `Base_Rate` item
/// contributes `amount × hours` instead. No other category feeds the sum.
///
/// Contributions are rounded to cents first, so the sum always equals the
/// total of the displayed base-rate lines.
pub fn compute_base_sum(
    base_rates: &RateItemCollection,
    rates: &DynamicRateState,
    service_type: &str,
    hours: Decimal,
) -> Decimal {
    let charter = is_charter_service(service_type);

    capped_sum(base_rates.iter().map(|(key, item)| {
        let base = parse_amount_or(rates.get(key), item.base_rate_or_zero());
        if charter && key == BASE_RATE_KEY {
            round_half_up(capped_mul(base, hours))
        } else {
            round_half_up(base)
        }
    }))
}

/// Read-only view that calculates rate lines for one editing session.
#[derive(Debug, Clone, Copy)]
pub struct RateWorksheet<'a> {
    schedule: &'a RateSchedule,
    rates: &'a DynamicRateState,
    tax_modes: &'a TaxModeState,
    context: &'a CalculationContext,
}

impl<'a> RateWorksheet<'a> {
    pub fn new(
        schedule: &'a RateSchedule,
        rates: &'a DynamicRateState,
        tax_modes: &'a TaxModeState,
        context: &'a CalculationContext,
    ) -> Self {
        Self {
            schedule,
            rates,
            tax_modes,
            context,
        }
    }

    /// Base-rate sum for the current state; recomputed from scratch each call.
    pub fn base_rates_sum(&self) -> Decimal {
        compute_base_sum(
            &self.schedule.base_rates,
            self.rates,
            &self.context.service_type,
            self.context.hours,
        )
    }

    /// Calculated line for `key`, or `None` when the category has no such item.
    pub fn line(
        &self,
        category: RateCategory,
        key: &str,
    ) -> Option<RateLine> {
        self.line_with_basis(category, key, self.base_rates_sum())
    }

    /// All lines of `category` in display order. Ordered keys without an item
    /// are skipped.
    pub fn lines(
        &self,
        category: RateCategory,
    ) -> Vec<RateLine> {
        let basis = self.base_rates_sum();
        self.lines_with_basis(category, basis)
    }

    pub(crate) fn lines_with_basis(
        &self,
        category: RateCategory,
        basis: Decimal,
    ) -> Vec<RateLine> {
        self.schedule
            .collection(category)
            .ordered_keys(category)
            .iter()
            .filter_map(|key| self.line_with_basis(category, key, basis))
            .collect()
    }

    fn line_with_basis(
        &self,
        category: RateCategory,
        key: &str,
        basis: Decimal,
    ) -> Option<RateLine> {
        let Some(item) = self.schedule.collection(category).get(key) else {
            debug!(%category, key, "ordered key has no rate item; skipping line");
            return None;
        };

        let entered = self.rates.get(key);
        let value = parse_amount_or(entered, item.base_rate_or_zero());
        let (amount, kind) = self.calculate(category, key, value, basis);

        Some(RateLine {
            category,
            key: key.to_string(),
            label: item.label.clone(),
            entered: entered.map(str::to_string),
            amount: round_half_up(amount),
            kind,
        })
    }

    fn calculate(
        &self,
        category: RateCategory,
        key: &str,
        value: Decimal,
        basis: Decimal,
    ) -> (Decimal, LineKind) {
        match category {
            RateCategory::BaseRates if key == BASE_RATE_KEY && self.context.is_charter() => {
                let hours = self.context.hours;
                (
                    capped_mul(value, hours),
                    LineKind::Hourly { rate: value, hours },
                )
            }
            RateCategory::Taxes if self.tax_modes.is_percent(key) => (
                capped_mul(basis, value) / Decimal::ONE_HUNDRED,
                LineKind::Percent {
                    percent: value,
                    basis,
                },
            ),
            _ => (value, LineKind::Flat),
        }
    }
}
