//! Builds a priced quote from a schedule file and command-line edits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rate_core::{CalculationContext, RateEditor, RateSchedule};
use rate_data::RateScheduleLoader;
use tracing::{debug, info};

use crate::settings::Settings;

/// Everything needed to price one booking.
#[derive(Debug, Clone, Default)]
pub struct QuoteRequest {
    pub schedule_path: PathBuf,
    pub service_type: String,
    /// Raw "number of hours" text; unparseable text counts as 0.
    pub hours: Option<String>,
    /// Raw vehicle-count text; unparseable text counts as 1.
    pub vehicles: Option<String>,
    pub account_type: String,
    pub created_by: Option<i64>,
    pub reservation_type: String,
    /// `(key, text)` edits applied in order.
    pub rate_overrides: Vec<(String, String)>,
    pub percent_taxes: Vec<String>,
    pub flat_taxes: Vec<String>,
}

pub fn load_schedule(path: &Path) -> Result<RateSchedule> {
    let schedule = RateScheduleLoader::load_file(path)
        .with_context(|| format!("failed to load rate schedule '{}'", path.display()))?;
    info!(
        schedule = %schedule.id,
        items = schedule.item_count(),
        "rate schedule ready"
    );
    Ok(schedule)
}

/// Opens an editing session on `schedule` and applies the request's edits.
pub fn build_editor(
    schedule: RateSchedule,
    request: &QuoteRequest,
    settings: &Settings,
) -> Result<RateEditor> {
    let calculator = settings.calculator()?;

    let mut context = CalculationContext::new(&request.service_type);
    context.account_type = request.account_type.clone();
    context.created_by = request.created_by;
    context.reservation_type = request.reservation_type.clone();

    let mut editor = RateEditor::new(schedule, context, calculator);

    if let Some(hours) = &request.hours {
        editor.set_hours_text(hours.as_str());
    }
    if let Some(vehicles) = &request.vehicles {
        editor.set_vehicles_text(vehicles.as_str());
    }

    for (key, text) in &request.rate_overrides {
        editor
            .set_rate(key, text.as_str())
            .with_context(|| format!("cannot set rate '{key}'"))?;
    }
    for key in &request.percent_taxes {
        editor
            .set_tax_mode(key, true)
            .with_context(|| format!("cannot switch '{key}' to percent"))?;
    }
    for key in &request.flat_taxes {
        editor
            .set_tax_mode(key, false)
            .with_context(|| format!("cannot switch '{key}' to flat"))?;
    }

    debug!(
        overrides = request.rate_overrides.len(),
        grand_total = %editor.totals().grand_total,
        "applied quote edits"
    );
    Ok(editor)
}

/// Loads the schedule named by `request` and prices it.
pub fn quote(
    request: &QuoteRequest,
    settings: &Settings,
) -> Result<RateEditor> {
    let schedule = load_schedule(&request.schedule_path)?;
    build_editor(schedule, request, settings)
}
