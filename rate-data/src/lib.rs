pub mod loader;

pub use loader::{RateScheduleLoader, RateRecord, ScheduleLoadError};
