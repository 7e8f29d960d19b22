mod calculation_context;
mod rate_category;
mod rate_item;
mod rate_schedule;

pub use calculation_context::{CalculationContext, is_charter_service};
pub use rate_category::RateCategory;
pub use rate_item::{RateItemCollection, RateItemDefinition};
pub use rate_schedule::RateSchedule;
