//! Quotes built from fixture files the way the `rate-quote` binary builds them.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use rate_cli::{
    Settings, SettingsError,
    app::{self, QuoteRequest},
    view,
};
use rate_core::PayoutPolicyError;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn settings() -> Settings {
    Settings::load(&fixture("settings.toml")).expect("Failed to load settings")
}

/// Five-hour farm-out charter with no edits.
fn charter_request() -> QuoteRequest {
    QuoteRequest {
        schedule_path: fixture("charter_schedule.json"),
        service_type: "Charter/Tour".to_string(),
        hours: Some("5".to_string()),
        reservation_type: "farm_out".to_string(),
        ..Default::default()
    }
}

// =============================================================================
// Totals
// =============================================================================

#[test]
fn test_charter_quote_totals() {
    let editor = app::quote(&charter_request(), &settings()).expect("quote");

    let totals = editor.totals();
    // 85 × 5 + 40 base, 10 misc
    assert_eq!(totals.sub_total, dec!(475.00));
    // 18% of 465 + 12
    assert_eq!(totals.tax_total, dec!(95.70));
    assert_eq!(totals.grand_total, dec!(570.70));
    // 570.70 − 20% of 475
    assert_eq!(totals.affiliate_payout, dec!(475.70));
}

#[test]
fn test_account_override_changes_payout() {
    let request = QuoteRequest {
        account_type: "Corporate".to_string(),
        ..charter_request()
    };

    let editor = app::quote(&request, &settings()).expect("quote");

    assert_eq!(editor.totals().affiliate_payout, dec!(523.20));
}

#[test]
fn test_exempt_creator_receives_grand_total() {
    let request = QuoteRequest {
        created_by: Some(7),
        ..charter_request()
    };

    let editor = app::quote(&request, &settings()).expect("quote");

    assert_eq!(editor.totals().affiliate_payout, dec!(570.70));
}

#[test]
fn test_vehicle_count_multiplies_totals() {
    let request = QuoteRequest {
        vehicles: Some("2".to_string()),
        ..charter_request()
    };

    let editor = app::quote(&request, &settings()).expect("quote");

    let totals = editor.totals();
    assert_eq!(totals.sub_total, dec!(950.00));
    assert_eq!(totals.tax_total, dec!(191.40));
    assert_eq!(totals.grand_total, dec!(1141.40));
    assert_eq!(totals.affiliate_payout, dec!(951.40));
}

#[test]
fn test_default_settings_have_no_commission() {
    let editor = app::quote(&charter_request(), &Settings::default()).expect("quote");

    assert_eq!(editor.totals().affiliate_payout, dec!(570.70));
}

// =============================================================================
// Edits
// =============================================================================

#[test]
fn test_rate_override_is_applied() {
    let request = QuoteRequest {
        rate_overrides: vec![("Tolls".to_string(), "20".to_string())],
        ..charter_request()
    };

    let editor = app::quote(&request, &settings()).expect("quote");

    assert_eq!(editor.totals().grand_total, dec!(578.70));
}

#[test]
fn test_flat_mode_charges_entered_amount() {
    let request = QuoteRequest {
        flat_taxes: vec!["Gratuity".to_string()],
        ..charter_request()
    };

    let editor = app::quote(&request, &settings()).expect("quote");

    assert_eq!(editor.totals().tax_total, dec!(30.00));
    assert_eq!(editor.totals().grand_total, dec!(505.00));
}

#[test]
fn test_unknown_override_key_fails() {
    let request = QuoteRequest {
        rate_overrides: vec![("Fuel".to_string(), "5".to_string())],
        ..charter_request()
    };

    let err = app::quote(&request, &settings()).expect_err("unknown key should fail");

    assert!(err.to_string().contains("Fuel"), "got: {err}");
}

#[test]
fn test_percent_mode_on_non_tax_fails() {
    let request = QuoteRequest {
        percent_taxes: vec!["Parking".to_string()],
        ..charter_request()
    };

    assert!(app::quote(&request, &settings()).is_err());
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_missing_schedule_names_path() {
    let request = QuoteRequest {
        schedule_path: fixture("missing.json"),
        ..charter_request()
    };

    let err = app::quote(&request, &settings()).expect_err("missing file should fail");

    assert!(err.to_string().contains("missing.json"), "got: {err}");
}

#[test]
fn test_out_of_range_commission_is_rejected() {
    let err = Settings::load(&fixture("bad_commission.toml")).expect_err("invalid policy");

    assert!(matches!(
        err,
        SettingsError::Payout(PayoutPolicyError::InvalidCommissionPercent(_))
    ));
}

// =============================================================================
// Report
// =============================================================================

#[test]
fn test_report_follows_declared_order_and_currency() {
    let settings = settings();
    let editor = app::quote(&charter_request(), &settings).expect("quote");

    let report = view::render_report(&editor, &settings.currency_symbol);

    assert!(report.starts_with("Quote bk-3310 (Charter/Tour, 1 vehicle)\nHours: 5\n"));
    assert!(report.contains("€ 85.00 x 5 hrs = € 425.00"));
    assert!(report.contains("18% of € 465.00 = € 83.70"));

    let tolls = report.find("Tolls").expect("tolls line");
    let gratuity = report.find("Gratuity").expect("gratuity line");
    assert!(tolls < gratuity);
}

#[test]
fn test_breakdown_serializes_to_json() {
    let editor = app::quote(&charter_request(), &settings()).expect("quote");

    let json = serde_json::to_value(editor.breakdown()).expect("serializable");

    assert_eq!(json["taxes"][0]["key"], "Tolls");
    assert_eq!(json["taxes"][1]["kind"]["mode"], "percent");
    assert_eq!(json["base_rates"][0]["kind"]["mode"], "hourly");
}
