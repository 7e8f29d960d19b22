use std::collections::HashMap;

use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::models::{RateItemCollection, RateSchedule};

/// Entered text per rate key, across all categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicRateState {
    values: HashMap<String, String>,
}

impl DynamicRateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Keeps only keys for which `keep` returns true; returns how many were removed.
    pub fn retain(
        &mut self,
        mut keep: impl FnMut(&str) -> bool,
    ) -> usize {
        let before = self.values.len();
        self.values.retain(|key, _| keep(key));
        before - self.values.len()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Percent (`true`) or flat (`false`) mode per tax key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxModeState {
    modes: HashMap<String, bool>,
}

impl TaxModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<bool> {
        self.modes.get(key).copied()
    }

    /// Unknown keys are in flat mode.
    pub fn is_percent(
        &self,
        key: &str,
    ) -> bool {
        self.get(key).unwrap_or(false)
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        percent: bool,
    ) {
        self.modes.insert(key.into(), percent);
    }

    /// Flips the mode of `key` and returns the new mode.
    pub fn toggle(
        &mut self,
        key: &str,
    ) -> bool {
        let mode = self.modes.entry(key.to_string()).or_insert(false);
        *mode = !*mode;
        *mode
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.modes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn retain(
        &mut self,
        mut keep: impl FnMut(&str) -> bool,
    ) -> usize {
        let before = self.modes.len();
        self.modes.retain(|key, _| keep(key));
        before - self.modes.len()
    }

    pub fn clear(&mut self) {
        self.modes.clear();
    }
}

/// Seeds defaults for one collection without touching existing entries.
///
/// Missing rate entries get the item's base rate with two decimals (zero when
/// absent). For tax collections, missing modes are set to percent when the
/// item's type is `"percent"` and flat otherwise. Returns the number of rate
/// entries added.
pub fn seed_collection(
    collection: &RateItemCollection,
    rates: &mut DynamicRateState,
    tax_modes: &mut TaxModeState,
    is_tax: bool,
) -> usize {
    let mut added = 0;
    for (key, item) in collection.iter() {
        if !rates.contains_key(key) {
            rates.set(key, format!("{:.2}", round_half_up(item.base_rate_or_zero())));
            added += 1;
        }
        if is_tax && !tax_modes.contains_key(key) {
            tax_modes.set(key, item.declares_percent());
        }
    }
    added
}

/// Rate text and tax modes of one editing session, plus the id of the
/// schedule they were last seeded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateEditorState {
    pub rates: DynamicRateState,
    pub tax_modes: TaxModeState,
    seeded_for: Option<String>,
}

impl RateEditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded_for(&self) -> Option<&str> {
        self.seeded_for.as_deref()
    }

    /// Seeds every category of `schedule` unless this schedule id was the
    /// last one seeded. Returns whether seeding ran.
    pub fn seed_schedule(
        &mut self,
        schedule: &RateSchedule,
    ) -> bool {
        if self.seeded_for.as_deref() == Some(schedule.id.as_str()) {
            debug!(schedule = %schedule.id, "schedule already seeded; skipping");
            return false;
        }

        let added: usize = schedule
            .collections()
            .map(|(category, collection)| {
                seed_collection(
                    collection,
                    &mut self.rates,
                    &mut self.tax_modes,
                    category.is_tax(),
                )
            })
            .sum();

        debug!(schedule = %schedule.id, added, "seeded rate defaults");
        self.seeded_for = Some(schedule.id.clone());
        true
    }

    /// Drops entries whose keys are not in `schedule`; returns how many went.
    pub fn prune_to(
        &mut self,
        schedule: &RateSchedule,
    ) -> usize {
        let rates = self.rates.retain(|key| schedule.contains_key(key));
        let modes = self.tax_modes.retain(|key| schedule.is_tax_key(key));
        rates + modes
    }

    /// Forgets all entries and the seeded schedule id.
    pub fn clear(&mut self) {
        self.rates.clear();
        self.tax_modes.clear();
        self.seeded_for = None;
    }
}
