//! Plain-text quote report.

use rate_core::{LineKind, QuoteBreakdown, RateEditor, RateLine, format_currency};

const LABEL_WIDTH: usize = 20;

fn describe_line(
    line: &RateLine,
    currency: &str,
) -> String {
    let amount = format_currency(line.amount, Some(currency));
    match &line.kind {
        LineKind::Flat => amount,
        LineKind::Hourly { rate, hours } => format!(
            "{} x {} hrs = {}",
            format_currency(*rate, Some(currency)),
            hours.normalize(),
            amount
        ),
        LineKind::Percent { percent, basis } => format!(
            "{}% of {} = {}",
            percent.normalize(),
            format_currency(*basis, Some(currency)),
            amount
        ),
    }
}

fn push_row(
    out: &mut String,
    label: &str,
    value: &str,
) {
    out.push_str(&format!("  {label:<LABEL_WIDTH$} {value}\n"));
}

/// Renders every category in display order followed by the totals.
pub fn render_breakdown(
    breakdown: &QuoteBreakdown,
    currency: &str,
) -> String {
    let mut out = String::new();

    for (category, lines) in breakdown.sections() {
        out.push_str(&format!("{}\n", category.label()));
        if lines.is_empty() {
            out.push_str("  (none)\n");
        }
        for line in lines {
            push_row(&mut out, &line.label, &describe_line(line, currency));
        }
        out.push('\n');
    }

    let totals = &breakdown.totals;
    push_row(&mut out, "Subtotal", &format_currency(totals.sub_total, Some(currency)));
    push_row(&mut out, "Taxes", &format_currency(totals.tax_total, Some(currency)));
    push_row(&mut out, "Grand Total", &format_currency(totals.grand_total, Some(currency)));
    push_row(
        &mut out,
        "Affiliate Payout",
        &format_currency(totals.affiliate_payout, Some(currency)),
    );
    out
}

/// Full report for an editing session, with a booking header.
pub fn render_report(
    editor: &RateEditor,
    currency: &str,
) -> String {
    let context = editor.context();
    let mut out = format!(
        "Quote {} ({}, {} vehicle{})\n",
        editor.schedule().id,
        context.service_type,
        context.vehicles,
        if context.vehicles == 1 { "" } else { "s" }
    );
    if context.is_charter() {
        out.push_str(&format!("Hours: {}\n", context.hours.normalize()));
    }
    out.push('\n');
    out.push_str(&render_breakdown(editor.breakdown(), currency));
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use rate_core::RateCategory;

    fn line(kind: LineKind, amount: rust_decimal::Decimal) -> RateLine {
        RateLine {
            category: RateCategory::Taxes,
            key: "City_Tax".to_string(),
            label: "City Tax".to_string(),
            entered: None,
            amount,
            kind,
        }
    }

    #[test]
    fn flat_line_shows_amount_only() {
        assert_eq!(describe_line(&line(LineKind::Flat, dec!(12.5)), "$"), "$ 12.50");
    }

    #[test]
    fn hourly_line_shows_rate_and_hours() {
        let kind = LineKind::Hourly {
            rate: dec!(85.00),
            hours: dec!(2.50),
        };

        assert_eq!(
            describe_line(&line(kind, dec!(212.50)), "$"),
            "$ 85.00 x 2.5 hrs = $ 212.50"
        );
    }

    #[test]
    fn percent_line_shows_percent_and_basis() {
        let kind = LineKind::Percent {
            percent: dec!(8.875),
            basis: dec!(200),
        };

        assert_eq!(
            describe_line(&line(kind, dec!(17.75)), "€"),
            "8.875% of € 200.00 = € 17.75"
        );
    }

    #[test]
    fn empty_breakdown_lists_every_category() {
        let report = render_breakdown(&QuoteBreakdown::default(), "$");

        assert_eq!(report.matches("(none)").count(), 4);
        assert!(report.contains("Grand Total          $ 0.00"));
    }
}
