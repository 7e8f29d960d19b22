//! TOML settings for the quote tool.
//!
//! ```toml
//! currency_symbol = "$"
//!
//! [payout]
//! commission_percent = 15
//! affiliate_reservation_types = ["farm_out"]
//! commission_exempt_creators = [7]
//!
//! [payout.account_commission_percent]
//! corporate = 10
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};

use rate_core::{DEFAULT_CURRENCY_SYMBOL, PayoutPolicy, PayoutPolicyError, RateCalculator};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Payout(#[from] PayoutPolicyError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub currency_symbol: String,
    pub payout: PayoutPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            payout: PayoutPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Reads and validates a settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.payout.validate()?;

        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("no settings file given; using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn calculator(&self) -> Result<RateCalculator, SettingsError> {
        Ok(RateCalculator::new(self.payout.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.currency_symbol, "$");
        assert_eq!(settings.payout.commission_percent, dec!(0));
    }

    #[test]
    fn payout_table_overrides_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            currency_symbol = "€"

            [payout]
            commission_percent = 12.5
            affiliate_reservation_types = ["affiliate"]
            commission_exempt_creators = [7, 9]

            [payout.account_commission_percent]
            corporate = 10
            "#,
        )
        .unwrap();

        assert_eq!(settings.currency_symbol, "€");
        assert_eq!(settings.payout.commission_percent, dec!(12.5));
        assert_eq!(
            settings.payout.affiliate_reservation_types,
            vec!["affiliate".to_string()]
        );
        assert_eq!(settings.payout.commission_exempt_creators, vec![7, 9]);
        assert_eq!(
            settings.payout.account_commission_percent.get("corporate"),
            Some(&dec!(10))
        );
    }

    #[test]
    fn partial_payout_table_keeps_default_affiliate_types() {
        let settings = Settings::from_toml_str("[payout]\ncommission_percent = 20").unwrap();

        assert!(settings.payout.is_affiliate_reservation("farm_out"));
    }

    #[test]
    fn calculator_rejects_out_of_range_commission() {
        let settings = Settings::from_toml_str("[payout]\ncommission_percent = 150").unwrap();

        let err = settings.calculator().unwrap_err();

        assert!(matches!(
            err,
            SettingsError::Payout(PayoutPolicyError::InvalidCommissionPercent(_))
        ));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(Settings::from_toml_str("currency_symbol = ").is_err());
    }

    #[test]
    fn load_optional_without_path_is_default() {
        assert_eq!(Settings::load_optional(None).unwrap(), Settings::default());
    }
}
