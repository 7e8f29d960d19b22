use serde::{Deserialize, Serialize};

use super::{RateCategory, RateItemCollection, RateItemDefinition};

/// The rate schedule of one booking context, as fetched from upstream.
///
/// `id` identifies the schedule object; editor state is seeded at most once
/// per distinct id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub id: String,
    #[serde(default)]
    pub base_rates: RateItemCollection,
    #[serde(default)]
    pub taxes: RateItemCollection,
    #[serde(default)]
    pub amenities: RateItemCollection,
    #[serde(default)]
    pub misc: RateItemCollection,
}

impl RateSchedule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn collection(
        &self,
        category: RateCategory,
    ) -> &RateItemCollection {
        match category {
            RateCategory::BaseRates => &self.base_rates,
            RateCategory::Taxes => &self.taxes,
            RateCategory::Amenities => &self.amenities,
            RateCategory::Misc => &self.misc,
        }
    }

    pub fn collection_mut(
        &mut self,
        category: RateCategory,
    ) -> &mut RateItemCollection {
        match category {
            RateCategory::BaseRates => &mut self.base_rates,
            RateCategory::Taxes => &mut self.taxes,
            RateCategory::Amenities => &mut self.amenities,
            RateCategory::Misc => &mut self.misc,
        }
    }

    /// Every category paired with its collection, in display order.
    pub fn collections(&self) -> impl Iterator<Item = (RateCategory, &RateItemCollection)> {
        RateCategory::ALL
            .into_iter()
            .map(move |category| (category, self.collection(category)))
    }

    /// Finds the first category holding `key`.
    pub fn find(
        &self,
        key: &str,
    ) -> Option<(RateCategory, &RateItemDefinition)> {
        self.collections()
            .find_map(|(category, collection)| collection.get(key).map(|item| (category, item)))
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.find(key).is_some()
    }

    pub fn is_tax_key(
        &self,
        key: &str,
    ) -> bool {
        self.taxes.contains_key(key)
    }

    pub fn item_count(&self) -> usize {
        self.collections().map(|(_, c)| c.len()).sum()
    }
}
