//! Loader for upstream rate schedules.
//!
//! ## JSON payload
//!
//! The booking API returns a schedule shaped like this (every category and
//! order list is optional):
//!
//! ```json
//! {
//!   "id": "bk-1042",
//!   "rate_array": {
//!     "all_inclusive_rates": { "Base_Rate": { "rate_label": "Base Rate", "baserate": 95.0, "type": "flat" } },
//!     "taxes": { "City_Tax": { "rate_label": "City Tax", "baserate": "8.875", "type": "percent" } },
//!     "amenities": {},
//!     "misc": {}
//!   },
//!   "rate_order": { "taxes": ["City_Tax"] }
//! }
//! ```
//!
//! ## CSV
//!
//! | Column      | Required | Notes |
//! |-------------|----------|-------|
//! | `category`  | yes | `base_rates` (or `all_inclusive_rates`), `taxes`, `amenities`, `misc` |
//! | `key`       | yes | unique within the category |
//! | `label`     | no  | defaults to the key with underscores as spaces |
//! | `base_rate` | no  | empty means no declared rate |
//! | `type`      | no  | `percent` or `flat` |
//! | `position`  | no  | declared display position within the category |

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use rate_core::{RateCategory, RateItemDefinition, RateSchedule};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading a rate schedule.
#[derive(Debug, Error)]
pub enum ScheduleLoadError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown rate category '{category}' on row {row}")]
    UnknownCategory { category: String, row: usize },

    #[error("duplicate rate key '{key}' in {category} on row {row}")]
    DuplicateKey {
        category: RateCategory,
        key: String,
        row: usize,
    },

    #[error("duplicate rate key '{key}' in {category} of the JSON payload")]
    DuplicateJsonKey { category: RateCategory, key: String },

    #[error("rate key '{key}' has negative base rate {base_rate}")]
    NegativeBaseRate { key: String, base_rate: Decimal },

    #[error("unsupported schedule file '{0}'; expected .json or .csv")]
    UnsupportedFormat(PathBuf),
}

impl From<csv::Error> for ScheduleLoadError {
    fn from(err: csv::Error) -> Self {
        ScheduleLoadError::CsvParse(err.to_string())
    }
}

impl From<serde_json::Error> for ScheduleLoadError {
    fn from(err: serde_json::Error) -> Self {
        ScheduleLoadError::JsonParse(err.to_string())
    }
}

/// A single row of a rate schedule CSV file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RateRecord {
    pub category: String,
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub base_rate: Option<Decimal>,
    #[serde(default, rename = "type")]
    pub rate_type: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// JSON wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    id: String,
    #[serde(default)]
    rate_array: CategoryMap<ItemEntries>,
    #[serde(default)]
    rate_order: CategoryMap<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Default + Deserialize<'de>"))]
struct CategoryMap<T> {
    #[serde(default, alias = "base_rates")]
    all_inclusive_rates: T,
    #[serde(default)]
    taxes: T,
    #[serde(default)]
    amenities: T,
    #[serde(default)]
    misc: T,
}

impl<T: Default> Default for CategoryMap<T> {
    fn default() -> Self {
        Self {
            all_inclusive_rates: T::default(),
            taxes: T::default(),
            amenities: T::default(),
            misc: T::default(),
        }
    }
}

impl<T> CategoryMap<T> {
    fn into_entries(self) -> [(RateCategory, T); 4] {
        [
            (RateCategory::BaseRates, self.all_inclusive_rates),
            (RateCategory::Taxes, self.taxes),
            (RateCategory::Amenities, self.amenities),
            (RateCategory::Misc, self.misc),
        ]
    }
}

/// Items of one category in payload order, duplicates included.
///
/// A map type would keep only the last of two equal keys.
#[derive(Debug, Default)]
struct ItemEntries(Vec<(String, RateItemPayload)>);

impl<'de> Deserialize<'de> for ItemEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> serde::de::Visitor<'de> for EntriesVisitor {
            type Value = ItemEntries;

            fn expecting(
                &self,
                f: &mut std::fmt::Formatter<'_>,
            ) -> std::fmt::Result {
                f.write_str("a map of rate items")
            }

            fn visit_map<A>(
                self,
                mut map: A,
            ) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, RateItemPayload>()? {
                    entries.push(entry);
                }
                Ok(ItemEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct RateItemPayload {
    #[serde(default)]
    rate_label: Option<String>,
    #[serde(default)]
    baserate: Option<Decimal>,
    #[serde(default, rename = "type")]
    rate_type: Option<String>,
}

/// Label shown when the schedule does not provide one.
fn default_label(key: &str) -> String {
    key.replace('_', " ")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn build_item(
    key: &str,
    label: Option<String>,
    base_rate: Option<Decimal>,
    rate_type: Option<String>,
) -> Result<RateItemDefinition, ScheduleLoadError> {
    if let Some(base_rate) = base_rate.filter(|rate| *rate < Decimal::ZERO) {
        return Err(ScheduleLoadError::NegativeBaseRate {
            key: key.to_string(),
            base_rate,
        });
    }

    Ok(RateItemDefinition {
        label: non_empty(label).unwrap_or_else(|| default_label(key)),
        base_rate,
        rate_type: non_empty(rate_type),
    })
}

/// Loader for rate schedules from JSON payloads or CSV files.
pub struct RateScheduleLoader;

impl RateScheduleLoader {
    /// Parse a schedule from the booking API's JSON payload.
    pub fn from_json<R: Read>(reader: R) -> Result<RateSchedule, ScheduleLoadError> {
        let payload: SchedulePayload = serde_json::from_reader(reader)?;
        Self::from_payload(payload)
    }

    pub fn from_json_str(input: &str) -> Result<RateSchedule, ScheduleLoadError> {
        let payload: SchedulePayload = serde_json::from_str(input)?;
        Self::from_payload(payload)
    }

    fn from_payload(payload: SchedulePayload) -> Result<RateSchedule, ScheduleLoadError> {
        let mut schedule = RateSchedule::new(payload.id);

        for (category, ItemEntries(items)) in payload.rate_array.into_entries() {
            let collection = schedule.collection_mut(category);
            for (key, item) in items {
                if collection.contains_key(&key) {
                    return Err(ScheduleLoadError::DuplicateJsonKey { category, key });
                }
                let definition = build_item(&key, item.rate_label, item.baserate, item.rate_type)?;
                collection.insert(key, definition);
            }
        }
        for (category, order) in payload.rate_order.into_entries() {
            schedule.collection_mut(category).order = order;
        }

        info!(
            schedule = %schedule.id,
            items = schedule.item_count(),
            "loaded rate schedule from JSON"
        );
        Ok(schedule)
    }

    /// Parse rate records from a CSV reader.
    pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RateRecord>, ScheduleLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.deserialize() {
            let record: RateRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Build a schedule from parsed CSV records.
    ///
    /// A category's declared order is its positioned keys sorted by
    /// position; keys without a position are left for the fallback order.
    pub fn from_records(
        schedule_id: &str,
        records: &[RateRecord],
    ) -> Result<RateSchedule, ScheduleLoadError> {
        let mut schedule = RateSchedule::new(schedule_id);
        let mut seen: HashSet<(RateCategory, &str)> = HashSet::new();
        let mut positions: BTreeMap<RateCategory, Vec<(u32, &str)>> = BTreeMap::new();

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1; // 1-based, header excluded
            let category = RateCategory::parse(&record.category).ok_or_else(|| {
                ScheduleLoadError::UnknownCategory {
                    category: record.category.clone(),
                    row,
                }
            })?;

            if !seen.insert((category, record.key.as_str())) {
                return Err(ScheduleLoadError::DuplicateKey {
                    category,
                    key: record.key.clone(),
                    row,
                });
            }

            let item = build_item(
                &record.key,
                record.label.clone(),
                record.base_rate,
                record.rate_type.clone(),
            )?;
            schedule.collection_mut(category).insert(record.key.clone(), item);

            if let Some(position) = record.position {
                positions
                    .entry(category)
                    .or_default()
                    .push((position, record.key.as_str()));
            }
        }

        for (category, mut declared) in positions {
            declared.sort();
            schedule.collection_mut(category).order =
                declared.into_iter().map(|(_, key)| key.to_string()).collect();
        }

        debug!(
            schedule = %schedule.id,
            items = schedule.item_count(),
            "built rate schedule from CSV records"
        );
        Ok(schedule)
    }

    pub fn from_csv<R: Read>(
        schedule_id: &str,
        reader: R,
    ) -> Result<RateSchedule, ScheduleLoadError> {
        let records = Self::parse_csv(reader)?;
        Self::from_records(schedule_id, &records)
    }

    /// Load a `.json` or `.csv` schedule from disk.
    ///
    /// CSV files carry no id, so the file stem is used.
    pub fn load_file(path: &Path) -> Result<RateSchedule, ScheduleLoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let open = || {
            std::fs::File::open(path).map_err(|source| ScheduleLoadError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        match extension.as_deref() {
            Some("json") => Self::from_json(std::io::BufReader::new(open()?)),
            Some("csv") => {
                let schedule_id = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Self::from_csv(&schedule_id, open()?)
            }
            _ => Err(ScheduleLoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}
