//! Small display helpers shared by the views

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dpgf_core::money::format_plain;

use crate::element_card::NO_DATE;

/// Two-decimal amount with the euro sign, as document tables show it (`1234.50 €`)
pub fn plain_euros(amount: Option<f64>) -> String {
    format!("{} €", format_plain(amount))
}

/// Quantity as typed in the spreadsheet: `12`, `3.5`, blank when missing
pub fn format_quantity(quantity: Option<f64>) -> String {
    match quantity {
        Some(q) if q.is_finite() && q.fract() == 0.0 && q.abs() < 1e15 => format!("{}", q as i64),
        Some(q) if q.is_finite() => format!("{}", q),
        _ => String::new(),
    }
}

/// Render a backend date (`2024-05-14`, or an ISO timestamp) as `dd/mm/yyyy`
///
/// Blank input gives the "unspecified" placeholder; anything unparseable is
/// shown as sent.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return NO_DATE.to_string();
    }
    parse_date(raw)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts_and_quantities() {
        assert_eq!(plain_euros(Some(1234.5)), "1234.50 €");
        assert_eq!(plain_euros(None), "0.00 €");
        assert_eq!(format_quantity(Some(12.0)), "12");
        assert_eq!(format_quantity(Some(3.25)), "3.25");
        assert_eq!(format_quantity(None), "");
    }

    #[test]
    fn test_formats() {
        assert_eq!(format_date("2024-05-14"), "14/05/2024");
        assert_eq!(format_date("2024-05-14T09:30:00Z"), "14/05/2024");
        assert_eq!(format_date("2024-05-14T09:30:00"), "14/05/2024");
        assert_eq!(format_date("  "), NO_DATE);
        assert_eq!(format_date("T2 2024"), "T2 2024");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn format_date_never_panics(raw in ".*") {
            let _ = format_date(&raw);
        }

        #[test]
        fn valid_dates_render_day_first(y in 1900i32..2100, m in 1u32..=12, d in 1u32..=28) {
            let raw = format!("{:04}-{:02}-{:02}", y, m, d);
            prop_assert_eq!(format_date(&raw), format!("{:02}/{:02}/{:04}", d, m, y));
        }

        #[test]
        fn whole_quantities_have_no_decimals(q in 0i64..1_000_000) {
            prop_assert_eq!(format_quantity(Some(q as f64)), q.to_string());
        }
    }
}
