use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use rate_cli::{
    Settings,
    app::{self, QuoteRequest},
    logging::{self, LogOptions},
    utils::parse_assignment,
    view,
};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Prices a limo booking from its rate schedule.
///
/// Loads a JSON or CSV rate schedule, seeds each line with its default,
/// applies any edits given on the command line and prints the quote.
#[derive(Debug, Parser)]
#[command(name = "rate-quote", version)]
struct Cli {
    /// Rate schedule file (`.json` or `.csv`).
    #[arg(long)]
    schedule: PathBuf,

    /// TOML settings file with currency and payout rules.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Service type; charter/tour bookings bill the base rate per hour.
    #[arg(long, default_value = "Point to Point")]
    service_type: String,

    /// Number of hours, as typed.
    #[arg(long)]
    hours: Option<String>,

    /// Number of vehicles, as typed.
    #[arg(long)]
    vehicles: Option<String>,

    #[arg(long, default_value = "")]
    account_type: String,

    /// Id of the user creating the booking.
    #[arg(long)]
    created_by: Option<i64>,

    #[arg(long, default_value = "")]
    reservation_type: String,

    /// Rate edit as KEY=VALUE. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    rate_overrides: Vec<(String, String)>,

    /// Charge a tax as a percent of the base-rate sum. Repeatable.
    #[arg(long = "percent", value_name = "KEY")]
    percent_taxes: Vec<String>,

    /// Charge a tax as a flat amount. Repeatable.
    #[arg(long = "flat", value_name = "KEY")]
    flat_taxes: Vec<String>,

    /// Currency symbol; overrides the settings file.
    #[arg(long)]
    currency: Option<String>,

    /// Log filter, e.g. `debug` or `rate_core=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Hide log output on stderr.
    #[arg(long)]
    quiet: bool,

    /// Print the breakdown as JSON instead of a text report.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn quote_request(&self) -> QuoteRequest {
        QuoteRequest {
            schedule_path: self.schedule.clone(),
            service_type: self.service_type.clone(),
            hours: self.hours.clone(),
            vehicles: self.vehicles.clone(),
            account_type: self.account_type.clone(),
            created_by: self.created_by,
            reservation_type: self.reservation_type.clone(),
            rate_overrides: self.rate_overrides.clone(),
            percent_taxes: self.percent_taxes.clone(),
            flat_taxes: self.flat_taxes.clone(),
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(&LogOptions {
        level: cli.log_level.clone(),
        file: cli.log_file.clone(),
        quiet: cli.quiet,
    })?;

    let settings = Settings::load_optional(cli.config.as_deref())?;
    let currency = cli
        .currency
        .clone()
        .unwrap_or_else(|| settings.currency_symbol.clone());
    debug!(%currency, "settings resolved");

    let editor = app::quote(&cli.quote_request(), &settings)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(editor.breakdown())?);
    } else {
        print!("{}", view::render_report(&editor, &currency));
    }

    Ok(())
}
