use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use super::RateEditorState;
use crate::calculations::common::{parse_hours, parse_vehicles};
use crate::calculations::{QuoteBreakdown, RateCalculator, Totals};
use crate::models::{CalculationContext, RateSchedule};

/// Edits rejected because they would break the schedule invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("rate key '{0}' is not part of the active schedule")]
    UnknownKey(String),

    #[error("rate key '{0}' is not a tax")]
    NotATax(String),
}

/// What changed in the editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateEvent {
    RateEdited { key: String },
    TaxModeChanged { key: String, percent: bool },
    ContextChanged,
    ScheduleReplaced { schedule_id: String, pruned: usize },
    Reset { schedule_id: String },
}

/// Handle returned by [`RateEditor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&RateEvent, &QuoteBreakdown)>;

/// One rate-editing session for a booking.
///
/// Every mutation recalculates the full breakdown before returning and hands
/// it to each subscriber together with the event that caused it.
///
/// ```
/// use rust_decimal_macros::dec;
/// use rate_core::{
///     CalculationContext, PayoutPolicy, RateCalculator, RateEditor, RateItemDefinition,
///     RateSchedule,
/// };
///
/// let mut schedule = RateSchedule::new("bk-1");
/// schedule.base_rates.insert("Base_Rate", RateItemDefinition::new("Base Rate", Some(dec!(50)), None));
///
/// let calculator = RateCalculator::new(PayoutPolicy::default()).unwrap();
/// let mut editor = RateEditor::new(schedule, CalculationContext::new("Charter/Tour"), calculator);
///
/// editor.set_hours_text("3");
/// assert_eq!(editor.totals().grand_total, dec!(150.00));
///
/// editor.set_rate("Base_Rate", "60").unwrap();
/// assert_eq!(editor.totals().grand_total, dec!(180.00));
/// ```
pub struct RateEditor {
    schedule: RateSchedule,
    state: RateEditorState,
    context: CalculationContext,
    hours_text: String,
    vehicles_text: String,
    calculator: RateCalculator,
    breakdown: QuoteBreakdown,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl RateEditor {
    /// Starts a session, seeding defaults from `schedule`.
    pub fn new(
        schedule: RateSchedule,
        context: CalculationContext,
        calculator: RateCalculator,
    ) -> Self {
        let mut state = RateEditorState::new();
        state.seed_schedule(&schedule);
        let breakdown = calculator.breakdown(&schedule, &state.rates, &state.tax_modes, &context);

        Self {
            hours_text: context.hours.to_string(),
            vehicles_text: context.vehicles.to_string(),
            schedule,
            state,
            context,
            calculator,
            breakdown,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn schedule(&self) -> &RateSchedule {
        &self.schedule
    }

    pub fn state(&self) -> &RateEditorState {
        &self.state
    }

    pub fn context(&self) -> &CalculationContext {
        &self.context
    }

    pub fn hours_text(&self) -> &str {
        &self.hours_text
    }

    pub fn vehicles_text(&self) -> &str {
        &self.vehicles_text
    }

    pub fn breakdown(&self) -> &QuoteBreakdown {
        &self.breakdown
    }

    pub fn totals(&self) -> &Totals {
        &self.breakdown.totals
    }

    /// Registers a listener called after every recalculation.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&RateEvent, &QuoteBreakdown) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns false when `id` was not subscribed.
    pub fn unsubscribe(
        &mut self,
        id: SubscriptionId,
    ) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Stores entered text for a rate line. Any text is accepted for a known key.
    ///
    /// # Errors
    ///
    /// [`EditError::UnknownKey`] when the key is not in the schedule.
    pub fn set_rate(
        &mut self,
        key: &str,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        if !self.schedule.contains_key(key) {
            return Err(EditError::UnknownKey(key.to_string()));
        }
        self.state.rates.set(key, text);
        self.recalculate(RateEvent::RateEdited {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Puts a tax line in percent (`true`) or flat (`false`) mode.
    ///
    /// # Errors
    ///
    /// [`EditError::UnknownKey`] for keys outside the schedule and
    /// [`EditError::NotATax`] for keys outside the taxes category.
    pub fn set_tax_mode(
        &mut self,
        key: &str,
        percent: bool,
    ) -> Result<(), EditError> {
        self.check_tax_key(key)?;
        self.state.tax_modes.set(key, percent);
        self.recalculate(RateEvent::TaxModeChanged {
            key: key.to_string(),
            percent,
        });
        Ok(())
    }

    /// Flips a tax line between percent and flat mode; returns the new mode.
    pub fn toggle_tax_mode(
        &mut self,
        key: &str,
    ) -> Result<bool, EditError> {
        self.check_tax_key(key)?;
        let percent = self.state.tax_modes.toggle(key);
        self.recalculate(RateEvent::TaxModeChanged {
            key: key.to_string(),
            percent,
        });
        Ok(percent)
    }

    /// Stores the "number of hours" text; unparseable text counts as 0 hours.
    pub fn set_hours_text(
        &mut self,
        text: impl Into<String>,
    ) {
        self.hours_text = text.into();
        let hours = parse_hours(&self.hours_text);
        self.change_context(|context| context.hours = hours);
    }

    /// Stores the vehicle-count text; unparseable text counts as 1 vehicle.
    pub fn set_vehicles_text(
        &mut self,
        text: impl Into<String>,
    ) {
        self.vehicles_text = text.into();
        let vehicles = parse_vehicles(&self.vehicles_text);
        self.change_context(|context| context.vehicles = vehicles);
    }

    pub fn set_service_type(
        &mut self,
        service_type: impl Into<String>,
    ) {
        let service_type = service_type.into();
        self.change_context(|context| context.service_type = service_type);
    }

    pub fn set_account_type(
        &mut self,
        account_type: impl Into<String>,
    ) {
        let account_type = account_type.into();
        self.change_context(|context| context.account_type = account_type);
    }

    pub fn set_created_by(
        &mut self,
        created_by: Option<i64>,
    ) {
        self.change_context(|context| context.created_by = created_by);
    }

    pub fn set_reservation_type(
        &mut self,
        reservation_type: impl Into<String>,
    ) {
        let reservation_type = reservation_type.into();
        self.change_context(|context| context.reservation_type = reservation_type);
    }

    /// Swaps in a freshly fetched schedule.
    ///
    /// Defaults are seeded for keys that have none yet; entries for keys the
    /// new schedule no longer has are dropped. Entered text for unchanged
    /// keys is kept.
    pub fn replace_schedule(
        &mut self,
        schedule: RateSchedule,
    ) {
        self.schedule = schedule;
        let seeded = self.state.seed_schedule(&self.schedule);
        let pruned = self.state.prune_to(&self.schedule);
        if pruned > 0 {
            warn!(schedule = %self.schedule.id, pruned, "dropped entries for keys no longer in schedule");
        }
        debug!(schedule = %self.schedule.id, seeded, "schedule replaced");

        self.recalculate(RateEvent::ScheduleReplaced {
            schedule_id: self.schedule.id.clone(),
            pruned,
        });
    }

    /// Discards every entered value and seeds the schedule defaults again.
    pub fn reset(&mut self) {
        self.state.clear();
        self.state.seed_schedule(&self.schedule);
        self.recalculate(RateEvent::Reset {
            schedule_id: self.schedule.id.clone(),
        });
    }

    /// Parsed hours, for hosts that display them next to the raw text.
    pub fn hours(&self) -> Decimal {
        self.context.hours
    }

    fn check_tax_key(
        &self,
        key: &str,
    ) -> Result<(), EditError> {
        if self.schedule.is_tax_key(key) {
            Ok(())
        } else if self.schedule.contains_key(key) {
            Err(EditError::NotATax(key.to_string()))
        } else {
            Err(EditError::UnknownKey(key.to_string()))
        }
    }

    fn change_context(
        &mut self,
        update: impl FnOnce(&mut CalculationContext),
    ) {
        update(&mut self.context);
        self.recalculate(RateEvent::ContextChanged);
    }

    fn recalculate(
        &mut self,
        event: RateEvent,
    ) {
        self.breakdown = self.calculator.breakdown(
            &self.schedule,
            &self.state.rates,
            &self.state.tax_modes,
            &self.context,
        );

        let breakdown = &self.breakdown;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, breakdown);
        }
    }
}

impl std::fmt::Debug for RateEditor {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RateEditor")
            .field("schedule", &self.schedule.id)
            .field("context", &self.context)
            .field("totals", &self.breakdown.totals)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
