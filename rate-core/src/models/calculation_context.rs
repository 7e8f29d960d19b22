use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// True when the service type bills the base rate per booked hour.
///
/// Matches `"charter"`, `"tour"` and `"charter/tour"` anywhere in the
/// string, ignoring case.
pub fn is_charter_service(service_type: &str) -> bool {
    let lowered = service_type.to_lowercase();
    lowered.contains("charter") || lowered.contains("tour")
}

/// Booking-level values the rate calculation depends on.
///
/// Hours and vehicles are already parsed here; raw field text is kept by
/// the editor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationContext {
    pub service_type: String,
    pub hours: Decimal,
    /// Always at least 1.
    pub vehicles: u32,
    pub account_type: String,
    /// Id of the user that created the booking, if known.
    pub created_by: Option<i64>,
    pub reservation_type: String,
}

impl Default for CalculationContext {
    fn default() -> Self {
        Self {
            service_type: String::new(),
            hours: Decimal::ZERO,
            vehicles: 1,
            account_type: String::new(),
            created_by: None,
            reservation_type: String::new(),
        }
    }
}

impl CalculationContext {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            ..Default::default()
        }
    }

    pub fn with_hours(
        mut self,
        hours: Decimal,
    ) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_vehicles(
        mut self,
        vehicles: u32,
    ) -> Self {
        self.vehicles = vehicles.max(1);
        self
    }

    pub fn is_charter(&self) -> bool {
        is_charter_service(&self.service_type)
    }
}
