use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RateCategory;
use crate::calculations::resolve_order;

/// Type discriminator that switches a tax line into percent mode.
pub const PERCENT_TYPE: &str = "percent";

/// A single named charge from the upstream rate schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateItemDefinition {
    pub label: String,
    /// Declared amount; `None` is treated as zero.
    pub base_rate: Option<Decimal>,
    /// `"percent"` or `"flat"`. Only meaningful for taxes.
    pub rate_type: Option<String>,
}

impl RateItemDefinition {
    pub fn new(
        label: impl Into<String>,
        base_rate: Option<Decimal>,
        rate_type: Option<&str>,
    ) -> Self {
        Self {
            label: label.into(),
            base_rate,
            rate_type: rate_type.map(str::to_string),
        }
    }

    pub fn base_rate_or_zero(&self) -> Decimal {
        self.base_rate.unwrap_or(Decimal::ZERO)
    }

    /// True only when the declared type is literally `"percent"`.
    pub fn declares_percent(&self) -> bool {
        self.rate_type.as_deref() == Some(PERCENT_TYPE)
    }
}

/// All rate definitions of one category plus the order the server asked for.
///
/// Items are keyed by a name unique within the category. `order` may be
/// empty, in which case the category's fallback order applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateItemCollection {
    pub items: BTreeMap<String, RateItemDefinition>,
    #[serde(default)]
    pub order: Vec<String>,
}

impl RateItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order<I, S>(
        mut self,
        order: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = order.into_iter().map(Into::into).collect();
        self
    }

    /// Adds or replaces a definition, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        item: RateItemDefinition,
    ) -> Option<RateItemDefinition> {
        self.items.insert(key.into(), item)
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&RateItemDefinition> {
        self.items.get(key)
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.items.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RateItemDefinition)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys in display order for `category`: the declared order when
    /// present, otherwise the category fallback, with leftovers appended.
    pub fn ordered_keys(
        &self,
        category: RateCategory,
    ) -> Vec<String> {
        resolve_order(&self.order, self.keys(), category.fallback_order())
    }
}
