//! Booking totals and affiliate payout.
//!
//! The aggregator turns the calculated rate lines of a booking into the
//! totals shown in the booking summary. It reuses the worksheet's per-line
//! amounts and base-rate sum, so the percent-tax amounts on screen and the
//! taxes inside the grand total always share one basis.
//!
//! # Totals
//!
//! | Total | Formula |
//! |-------|---------|
//! | Sub total | (base rates + amenities + misc) × vehicles |
//! | Tax total | taxes × vehicles |
//! | Grand total | sub total + tax total |
//! | Affiliate payout | grand total − commission on sub total (affiliate reservations only) |
//!
//! All amounts are rounded half-up to cents and never negative.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rate_core::{
//!     CalculationContext, PayoutPolicy, RateCalculator, RateItemDefinition, RateSchedule,
//!     state::RateEditorState,
//! };
//!
//! let mut schedule = RateSchedule::new("bk-9");
//! schedule.base_rates.insert("Base_Rate", RateItemDefinition::new("Base Rate", Some(dec!(100)), Some("flat")));
//! schedule.taxes.insert("City_Tax", RateItemDefinition::new("City Tax", Some(dec!(8)), Some("percent")));
//!
//! let mut state = RateEditorState::new();
//! state.seed_schedule(&schedule);
//!
//! let calculator = RateCalculator::new(PayoutPolicy::default()).unwrap();
//! let context = CalculationContext::new("One Way").with_vehicles(2);
//! let totals = calculator.calculate(&schedule, &state.rates, &state.tax_modes, &context);
//!
//! assert_eq!(totals.sub_total, dec!(200.00));
//! assert_eq!(totals.tax_total, dec!(16.00));
//! assert_eq!(totals.grand_total, dec!(216.00));
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{capped_add, capped_mul, capped_sum, max, round_half_up};
use crate::calculations::worksheet::{RateLine, RateWorksheet};
use crate::models::{CalculationContext, RateCategory, RateSchedule};
use crate::state::{DynamicRateState, TaxModeState};

/// Errors raised when a payout policy is outside its valid range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayoutPolicyError {
    /// The default commission percent must be between 0 and 100.
    #[error("commission percent must be between 0 and 100, got {0}")]
    InvalidCommissionPercent(Decimal),

    /// A per-account commission percent must be between 0 and 100.
    #[error("commission percent for account type '{account_type}' must be between 0 and 100, got {percent}")]
    InvalidAccountCommissionPercent {
        account_type: String,
        percent: Decimal,
    },
}

/// Rules that split a booking's total between the platform and the
/// affiliate that fulfils it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutPolicy {
    /// Platform commission taken from the sub total, in percent.
    pub commission_percent: Decimal,

    /// Commission overrides keyed by account type (matched ignoring case).
    pub account_commission_percent: BTreeMap<String, Decimal>,

    /// Reservation types fulfilled by an affiliate (matched ignoring case).
    /// Other reservation types have no affiliate payout.
    pub affiliate_reservation_types: Vec<String>,

    /// Creators whose bookings carry no commission.
    pub commission_exempt_creators: Vec<i64>,
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        Self {
            commission_percent: Decimal::ZERO,
            account_commission_percent: BTreeMap::new(),
            affiliate_reservation_types: vec![
                "farm_out".to_string(),
                "farm-out".to_string(),
                "farmout".to_string(),
            ],
            commission_exempt_creators: Vec::new(),
        }
    }
}

impl PayoutPolicy {
    /// Validates every percent in the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutPolicyError`] if the default or any per-account
    /// commission percent is outside [0, 100].
    pub fn validate(&self) -> Result<(), PayoutPolicyError> {
        if !is_percent(self.commission_percent) {
            return Err(PayoutPolicyError::InvalidCommissionPercent(
                self.commission_percent,
            ));
        }
        if let Some((account_type, percent)) = self
            .account_commission_percent
            .iter()
            .find(|(_, percent)| !is_percent(**percent))
        {
            return Err(PayoutPolicyError::InvalidAccountCommissionPercent {
                account_type: account_type.clone(),
                percent: *percent,
            });
        }
        Ok(())
    }

    pub fn is_affiliate_reservation(
        &self,
        reservation_type: &str,
    ) -> bool {
        let reservation_type = reservation_type.trim();
        self.affiliate_reservation_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(reservation_type))
    }

    /// Commission percent that applies to a booking.
    pub fn commission_percent_for(
        &self,
        context: &CalculationContext,
    ) -> Decimal {
        if context
            .created_by
            .is_some_and(|creator| self.commission_exempt_creators.contains(&creator))
        {
            return Decimal::ZERO;
        }

        let account_type = context.account_type.trim();
        self.account_commission_percent
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(account_type))
            .map(|(_, percent)| *percent)
            .unwrap_or(self.commission_percent)
    }
}

fn is_percent(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED
}

/// Summary amounts of a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub sub_total: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
    pub affiliate_payout: Decimal,
}

/// Every displayed line of a booking plus its totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub base_rates: Vec<RateLine>,
    pub taxes: Vec<RateLine>,
    pub amenities: Vec<RateLine>,
    pub misc: Vec<RateLine>,
    /// Basis for percent-mode taxes.
    pub base_rates_sum: Decimal,
    pub totals: Totals,
}

impl QuoteBreakdown {
    pub fn lines(
        &self,
        category: RateCategory,
    ) -> &[RateLine] {
        match category {
            RateCategory::BaseRates => &self.base_rates,
            RateCategory::Taxes => &self.taxes,
            RateCategory::Amenities => &self.amenities,
            RateCategory::Misc => &self.misc,
        }
    }

    /// Sum of the rounded line amounts of one category, for one vehicle.
    pub fn category_total(
        &self,
        category: RateCategory,
    ) -> Decimal {
        capped_sum(self.lines(category).iter().map(|line| line.amount))
    }

    /// Categories paired with their lines, in display order.
    pub fn sections(&self) -> impl Iterator<Item = (RateCategory, &[RateLine])> {
        RateCategory::ALL
            .into_iter()
            .map(move |category| (category, self.lines(category)))
    }
}

/// Computes booking totals from the editor state of a rate schedule.
///
/// Built once per payout policy; calculation is pure and deterministic.
#[derive(Debug, Clone)]
pub struct RateCalculator {
    policy: PayoutPolicy,
}

impl RateCalculator {
    /// Creates a calculator after validating `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutPolicyError`] when the policy is invalid.
    pub fn new(policy: PayoutPolicy) -> Result<Self, PayoutPolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &PayoutPolicy {
        &self.policy
    }

    /// Totals only. See [`RateCalculator::breakdown`] for the lines.
    pub fn calculate(
        &self,
        schedule: &RateSchedule,
        rates: &DynamicRateState,
        tax_modes: &TaxModeState,
        context: &CalculationContext,
    ) -> Totals {
        self.breakdown(schedule, rates, tax_modes, context).totals
    }

    /// Calculates every line of every category and the booking totals.
    pub fn breakdown(
        &self,
        schedule: &RateSchedule,
        rates: &DynamicRateState,
        tax_modes: &TaxModeState,
        context: &CalculationContext,
    ) -> QuoteBreakdown {
        let worksheet = RateWorksheet::new(schedule, rates, tax_modes, context);
        let basis = worksheet.base_rates_sum();

        let mut breakdown = QuoteBreakdown {
            base_rates: worksheet.lines_with_basis(RateCategory::BaseRates, basis),
            taxes: worksheet.lines_with_basis(RateCategory::Taxes, basis),
            amenities: worksheet.lines_with_basis(RateCategory::Amenities, basis),
            misc: worksheet.lines_with_basis(RateCategory::Misc, basis),
            base_rates_sum: round_half_up(basis),
            totals: Totals::default(),
        };
        breakdown.totals = self.totals(&breakdown, context);

        debug!(
            schedule = %schedule.id,
            sub_total = %breakdown.totals.sub_total,
            grand_total = %breakdown.totals.grand_total,
            "recalculated booking totals"
        );
        breakdown
    }

    fn totals(
        &self,
        breakdown: &QuoteBreakdown,
        context: &CalculationContext,
    ) -> Totals {
        let vehicles = Decimal::from(context.vehicles.max(1));

        let per_vehicle = capped_sum([
            breakdown.category_total(RateCategory::BaseRates),
            breakdown.category_total(RateCategory::Amenities),
            breakdown.category_total(RateCategory::Misc),
        ]);
        let sub_total = non_negative(
            "sub_total",
            round_half_up(capped_mul(per_vehicle, vehicles)),
        );
        let tax_total = non_negative(
            "tax_total",
            round_half_up(capped_mul(
                breakdown.category_total(RateCategory::Taxes),
                vehicles,
            )),
        );
        let grand_total = round_half_up(capped_add(sub_total, tax_total));
        let affiliate_payout = self.affiliate_payout(context, sub_total, grand_total);

        Totals {
            sub_total,
            tax_total,
            grand_total,
            affiliate_payout,
        }
    }

    fn affiliate_payout(
        &self,
        context: &CalculationContext,
        sub_total: Decimal,
        grand_total: Decimal,
    ) -> Decimal {
        if !self
            .policy
            .is_affiliate_reservation(&context.reservation_type)
        {
            return Decimal::ZERO;
        }

        let percent = self.policy.commission_percent_for(context);
        let commission = round_half_up(capped_mul(sub_total, percent) / Decimal::ONE_HUNDRED);
        round_half_up(max(grand_total - commission, Decimal::ZERO))
    }
}

fn non_negative(
    total: &'static str,
    value: Decimal,
) -> Decimal {
    if value < Decimal::ZERO {
        warn!(total, %value, "negative total clamped to zero");
        return Decimal::ZERO;
    }
    value
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;
    use crate::models::RateItemDefinition;
    use crate::state::RateEditorState;

    fn schedule() -> RateSchedule {
        let mut schedule = RateSchedule::new("bk-100");
        schedule.base_rates.insert(
            "Base_Rate",
            RateItemDefinition::new("Base Rate", Some(dec!(100.00)), Some("flat")),
        );
        schedule.taxes.insert(
            "City_Tax",
            RateItemDefinition::new("City Tax", Some(dec!(8)), Some("percent")),
        );
        schedule.taxes.insert(
            "Tolls",
            RateItemDefinition::new("Tolls", Some(dec!(5.00)), Some("flat")),
        );
        schedule.amenities.insert(
            "Baby_Seat",
            RateItemDefinition::new("Baby Seat", Some(dec!(15.00)), None),
        );
        schedule.misc.insert(
            "Extra_Gratuity",
            RateItemDefinition::new("Extra Gratuity", Some(dec!(20.00)), None),
        );
        schedule
    }

    fn seeded(schedule: &RateSchedule) -> RateEditorState {
        let mut state = RateEditorState::new();
        state.seed_schedule(schedule);
        state
    }

    /// Initializes tracing subscriber for tests that exercise warning paths.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn calculator() -> RateCalculator {
        RateCalculator::new(PayoutPolicy::default()).expect("default policy is valid")
    }

    fn farm_out_context() -> CalculationContext {
        CalculationContext {
            reservation_type: "farm_out".to_string(),
            ..CalculationContext::new("One Way")
        }
    }

    // =========================================================================
    // PayoutPolicy::validate
    // =========================================================================

    #[test]
    fn validate_accepts_default_policy() {
        assert_eq!(PayoutPolicy::default().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_commission_above_hundred() {
        let policy = PayoutPolicy {
            commission_percent: dec!(120),
            ..PayoutPolicy::default()
        };

        assert_eq!(
            policy.validate(),
            Err(PayoutPolicyError::InvalidCommissionPercent(dec!(120)))
        );
    }

    #[test]
    fn validate_rejects_negative_account_commission() {
        let policy = PayoutPolicy {
            account_commission_percent: BTreeMap::from([("corporate".to_string(), dec!(-1))]),
            ..PayoutPolicy::default()
        };

        assert_eq!(
            policy.validate(),
            Err(PayoutPolicyError::InvalidAccountCommissionPercent {
                account_type: "corporate".to_string(),
                percent: dec!(-1),
            })
        );
    }

    #[test]
    fn new_rejects_invalid_policy() {
        let policy = PayoutPolicy {
            commission_percent: dec!(-5),
            ..PayoutPolicy::default()
        };

        assert!(RateCalculator::new(policy).is_err());
    }

    // =========================================================================
    // commission_percent_for
    // =========================================================================

    #[test]
    fn account_override_matches_ignoring_case() {
        let policy = PayoutPolicy {
            commission_percent: dec!(20),
            account_commission_percent: BTreeMap::from([("Corporate".to_string(), dec!(15))]),
            ..PayoutPolicy::default()
        };
        let context = CalculationContext {
            account_type: "corporate".to_string(),
            ..CalculationContext::default()
        };

        assert_eq!(policy.commission_percent_for(&context), dec!(15));
    }

    #[test]
    fn exempt_creator_pays_no_commission() {
        let policy = PayoutPolicy {
            commission_percent: dec!(20),
            commission_exempt_creators: vec![42],
            ..PayoutPolicy::default()
        };
        let context = CalculationContext {
            created_by: Some(42),
            ..CalculationContext::default()
        };

        assert_eq!(policy.commission_percent_for(&context), dec!(0));
    }

    #[test]
    fn unknown_account_uses_default_commission() {
        let policy = PayoutPolicy {
            commission_percent: dec!(20),
            ..PayoutPolicy::default()
        };

        assert_eq!(
            policy.commission_percent_for(&CalculationContext::default()),
            dec!(20)
        );
    }

    // =========================================================================
    // totals
    // =========================================================================

    #[test]
    fn end_to_end_non_charter_booking() {
        let mut schedule = RateSchedule::new("bk-e2e");
        schedule.base_rates.insert(
            "Base_Rate",
            RateItemDefinition::new("Base Rate", Some(dec!(100.00)), Some("flat")),
        );
        schedule.taxes.insert(
            "City_Tax",
            RateItemDefinition::new("City Tax", Some(dec!(8)), Some("percent")),
        );
        let state = seeded(&schedule);
        let context = CalculationContext::new("One Way").with_hours(dec!(0));

        let breakdown = calculator().breakdown(&schedule, &state.rates, &state.tax_modes, &context);

        assert_eq!(breakdown.base_rates_sum, dec!(100.00));
        assert_eq!(breakdown.taxes[0].amount, dec!(8.00));
        assert_eq!(breakdown.totals.sub_total, dec!(100.00));
        assert_eq!(breakdown.totals.grand_total, dec!(108.00));
    }

    #[test]
    fn totals_sum_all_categories() {
        let schedule = schedule();
        let state = seeded(&schedule);

        let totals = calculator().calculate(
            &schedule,
            &state.rates,
            &state.tax_modes,
            &CalculationContext::new("One Way"),
        );

        assert_eq!(
            totals,
            Totals {
                sub_total: dec!(135.00),
                tax_total: dec!(13.00),
                grand_total: dec!(148.00),
                affiliate_payout: dec!(0),
            }
        );
    }

    #[test]
    fn base_rates_sum_matches_base_rate_total_for_half_cents() {
        let mut schedule = schedule();
        schedule
            .base_rates
            .insert("Stops", RateItemDefinition::new("Stops", None, None));
        schedule
            .base_rates
            .insert("Wait", RateItemDefinition::new("Wait", None, None));
        let mut state = seeded(&schedule);
        state.rates.set("Base_Rate", "0");
        state.rates.set("Stops", "0.005");
        state.rates.set("Wait", "0.005");

        let breakdown = calculator().breakdown(
            &schedule,
            &state.rates,
            &state.tax_modes,
            &CalculationContext::new("One Way"),
        );

        let base_total = breakdown.category_total(RateCategory::BaseRates);
        assert_eq!(base_total, dec!(0.02));
        assert_eq!(breakdown.base_rates_sum, base_total);
        // 15 + 20 from amenities and misc
        assert_eq!(breakdown.totals.sub_total, dec!(35.02));
    }

    #[test]
    fn overflowing_vehicle_multiplication_caps_totals() {
        let _guard = init_test_tracing();
        let schedule = schedule();
        let mut state = seeded(&schedule);
        state.rates.set("Base_Rate", "1000000000000000000000000000");
        let context = CalculationContext::new("One Way").with_vehicles(4_000_000_000);

        let totals = calculator().calculate(&schedule, &state.rates, &state.tax_modes, &context);

        assert_eq!(totals.sub_total, Decimal::MAX);
        assert_eq!(totals.grand_total, Decimal::MAX);
    }

    #[test]
    fn totals_scale_with_vehicle_count() {
        let schedule = schedule();
        let state = seeded(&schedule);
        let context = CalculationContext::new("One Way").with_vehicles(3);

        let totals = calculator().calculate(&schedule, &state.rates, &state.tax_modes, &context);

        assert_eq!(totals.sub_total, dec!(405.00));
        assert_eq!(totals.tax_total, dec!(39.00));
        assert_eq!(totals.grand_total, dec!(444.00));
    }

    #[test]
    fn charter_hours_feed_totals_and_percent_taxes() {
        let schedule = schedule();
        let state = seeded(&schedule);
        let context = CalculationContext::new("charter").with_hours(dec!(4));

        let breakdown = calculator().breakdown(&schedule, &state.rates, &state.tax_modes, &context);

        assert_eq!(breakdown.base_rates_sum, dec!(400.00));
        assert_eq!(
            breakdown.category_total(RateCategory::BaseRates),
            breakdown.base_rates_sum
        );
        assert_eq!(breakdown.totals.tax_total, dec!(37.00));
        assert_eq!(breakdown.totals.grand_total, dec!(472.00));
    }

    #[test]
    fn empty_schedule_totals_are_zero() {
        let schedule = RateSchedule::new("empty");
        let state = seeded(&schedule);

        let totals = calculator().calculate(
            &schedule,
            &state.rates,
            &state.tax_modes,
            &CalculationContext::default(),
        );

        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn negative_overrides_never_produce_negative_totals() {
        let _guard = init_test_tracing();
        let schedule = schedule();
        let mut state = seeded(&schedule);
        state.rates.set("Base_Rate", "-500");

        let totals = calculator().calculate(
            &schedule,
            &state.rates,
            &state.tax_modes,
            &CalculationContext::new("One Way"),
        );

        assert_eq!(totals.sub_total, dec!(0));
        assert!(totals.tax_total >= dec!(0));
        assert!(totals.grand_total >= dec!(0));
    }

    #[test]
    fn affiliate_payout_is_zero_for_non_affiliate_reservations() {
        let schedule = schedule();
        let state = seeded(&schedule);

        let totals = calculator().calculate(
            &schedule,
            &state.rates,
            &state.tax_modes,
            &CalculationContext::new("One Way"),
        );

        assert_eq!(totals.affiliate_payout, dec!(0));
    }

    #[test]
    fn affiliate_payout_deducts_commission_from_sub_total_only() {
        let schedule = schedule();
        let state = seeded(&schedule);
        let policy = PayoutPolicy {
            commission_percent: dec!(20),
            ..PayoutPolicy::default()
        };
        let calculator = RateCalculator::new(policy).expect("valid policy");

        let totals = calculator.calculate(
            &schedule,
            &state.rates,
            &state.tax_modes,
            &farm_out_context(),
        );

        // 148.00 - 20% of 135.00
        assert_eq!(totals.affiliate_payout, dec!(121.00));
    }

    #[test]
    fn affiliate_reservation_type_matches_ignoring_case() {
        let schedule = schedule();
        let state = seeded(&schedule);
        let context = CalculationContext {
            reservation_type: "Farm-Out".to_string(),
            ..CalculationContext::new("One Way")
        };

        let totals = calculator().calculate(&schedule, &state.rates, &state.tax_modes, &context);

        assert_eq!(totals.affiliate_payout, totals.grand_total);
    }

    #[test]
    fn calculation_is_deterministic() {
        let schedule = schedule();
        let state = seeded(&schedule);
        let context = farm_out_context();
        let calculator = calculator();

        let first = calculator.breakdown(&schedule, &state.rates, &state.tax_modes, &context);
        let second = calculator.breakdown(&schedule, &state.rates, &state.tax_modes, &context);

        assert_eq!(first, second);
    }
}
