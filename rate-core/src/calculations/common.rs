//! Common helpers shared by the rate calculations.
//!
//! Rounding, lenient parsing of user-typed amounts, and currency display.

use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Symbol used when the host does not supply one.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rate_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Multiplies two amounts, capping at `Decimal::MAX`/`Decimal::MIN` on
/// overflow.
///
/// Typed amounts are unbounded; a 29-digit rate times hours must not panic.
pub fn capped_mul(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| {
        let capped = if a.is_sign_negative() == b.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        };
        warn!(%a, %b, %capped, "amount multiplication overflowed; capping");
        capped
    })
}

/// Adds two amounts, capping at `Decimal::MAX`/`Decimal::MIN` on overflow.
pub fn capped_add(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        let capped = if a.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        };
        warn!(%a, %b, %capped, "amount addition overflowed; capping");
        capped
    })
}

/// Sums amounts with [`capped_add`].
pub fn capped_sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().fold(Decimal::ZERO, capped_add)
}

/// Trims whitespace, drops thousands separators and a trailing decimal point
/// left over from in-progress typing (`"12."`).
fn normalize_amount_input(s: &str) -> String {
    let cleaned = s.trim().replace(',', "");
    match cleaned.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => cleaned,
    }
}

/// Parses user-typed text as an amount.
///
/// Returns `None` for empty or non-numeric input; never logs or errors.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rate_core::calculations::common::parse_amount;
///
/// assert_eq!(parse_amount("1,234.50"), Some(dec!(1234.50)));
/// assert_eq!(parse_amount("12."), Some(dec!(12)));
/// assert_eq!(parse_amount("abc"), None);
/// ```
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let normalized = normalize_amount_input(raw);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse().ok()
}

/// Parses `raw`, falling back to `fallback` when it is missing or unparseable.
pub fn parse_amount_or(
    raw: Option<&str>,
    fallback: Decimal,
) -> Decimal {
    match raw.and_then(parse_amount) {
        Some(value) => value,
        None => {
            debug!(input = ?raw, %fallback, "unparseable amount; using fallback");
            fallback
        }
    }
}

/// Parses the "number of hours" field. Unparseable text counts as 0 hours.
pub fn parse_hours(raw: &str) -> Decimal {
    parse_amount_or(Some(raw), Decimal::ZERO)
}

/// Parses the vehicle-count field. Unparseable or zero counts as 1 vehicle.
pub fn parse_vehicles(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(count) if count >= 1 => count,
        _ => {
            debug!(input = %raw, "unusable vehicle count; using 1");
            1
        }
    }
}

/// Formats an amount as `"<symbol> <amount>"` with exactly two decimals.
///
/// An absent or blank symbol falls back to [`DEFAULT_CURRENCY_SYMBOL`].
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rate_core::format_currency;
///
/// assert_eq!(format_currency(dec!(1234.5), Some("€")), "€ 1234.50");
/// assert_eq!(format_currency(dec!(7), None), "$ 7.00");
/// ```
pub fn format_currency(
    amount: Decimal,
    symbol: Option<&str>,
) -> String {
    let symbol = symbol
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CURRENCY_SYMBOL);
    format!("{} {:.2}", symbol, round_half_up(amount))
}
