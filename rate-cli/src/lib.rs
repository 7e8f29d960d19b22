pub mod app;
pub mod logging;
pub mod settings;
pub mod utils;
pub mod view;

pub use settings::{Settings, SettingsError};
