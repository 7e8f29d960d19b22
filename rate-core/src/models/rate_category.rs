use serde::{Deserialize, Serialize};

/// Display order used for base rates when the schedule declares none.
pub const BASE_RATES_FALLBACK_ORDER: &[&str] = &["Base_Rate", "Stops", "Wait", "ELH_Charges"];

/// Display order used for taxes when the schedule declares none.
pub const TAXES_FALLBACK_ORDER: &[&str] = &[
    "Airport_Arrival_Tax_Per_US",
    "Airport_Departure_Tax_Per_US",
    "Sea_Port_Tax_Per_US",
    "City_Congestion_Tax_Per_US",
    "City_Tax",
    "State_Tax",
    "VAT_Tax",
    "Workman_Comp_Tax",
    "Other_Transportation_Tax",
    "Tolls",
];

/// Display order used for amenities when the schedule declares none.
pub const AMENITIES_FALLBACK_ORDER: &[&str] = &[
    "Baby_Seat",
    "Booster_Seat",
    "Baggage_Meet_(Dom)",
    "Baggage_Meet_(Int)",
    "Bike_Rack",
    "Lei_Greeting",
    "Security/Guard",
    "Per_Diem",
    "Tour_Guide",
    "Luggage_Trailer",
    "Wedding_Package",
    "Red_Carpet",
    "Skis",
    "Golf_Bags",
];

/// Display order used for miscellaneous charges when the schedule declares none.
pub const MISC_FALLBACK_ORDER: &[&str] = &["Extra_Gratuity", "Parking", "Bar_Stock", "Misc_Charges"];

/// The four fixed groups every rate line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateCategory {
    /// Vehicle base rates ("all inclusive rates" upstream).
    BaseRates,
    Taxes,
    Amenities,
    Misc,
}

impl RateCategory {
    /// All categories in display order.
    pub const ALL: [RateCategory; 4] = [
        RateCategory::BaseRates,
        RateCategory::Taxes,
        RateCategory::Amenities,
        RateCategory::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseRates => "base_rates",
            Self::Taxes => "taxes",
            Self::Amenities => "amenities",
            Self::Misc => "misc",
        }
    }

    /// Parses a category name as it appears in upstream payloads.
    ///
    /// `all_inclusive_rates` is accepted as an alias for base rates.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base_rates" | "all_inclusive_rates" => Some(Self::BaseRates),
            "taxes" => Some(Self::Taxes),
            "amenities" => Some(Self::Amenities),
            "misc" => Some(Self::Misc),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BaseRates => "Base Rates",
            Self::Taxes => "Taxes",
            Self::Amenities => "Amenities",
            Self::Misc => "Misc",
        }
    }

    /// Hardcoded display order applied when a schedule carries no API order.
    pub fn fallback_order(&self) -> &'static [&'static str] {
        match self {
            Self::BaseRates => BASE_RATES_FALLBACK_ORDER,
            Self::Taxes => TAXES_FALLBACK_ORDER,
            Self::Amenities => AMENITIES_FALLBACK_ORDER,
            Self::Misc => MISC_FALLBACK_ORDER,
        }
    }

    pub fn is_tax(&self) -> bool {
        matches!(self, Self::Taxes)
    }
}

impl std::fmt::Display for RateCategory {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
