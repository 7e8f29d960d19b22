use thiserror::Error;

/// Error returned when a `KEY=VALUE` rate override cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverrideParseError {
    #[error("expected KEY=VALUE, got '{0}'")]
    MissingSeparator(String),

    #[error("rate override '{0}' has an empty key")]
    EmptyKey(String),
}

/// Splits a `KEY=VALUE` rate override at the first `=`.
///
/// The key is trimmed; the value is kept exactly as typed so that partial
/// input like `"12."` or an empty value reaches the editor unchanged.
pub fn parse_assignment(s: &str) -> Result<(String, String), OverrideParseError> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(OverrideParseError::MissingSeparator(s.to_string()));
    };

    let key = key.trim();
    if key.is_empty() {
        return Err(OverrideParseError::EmptyKey(s.to_string()));
    }

    Ok((key.to_string(), value.to_string()))
}
