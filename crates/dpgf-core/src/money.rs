//! Euro amount formatting in the fr-FR convention
//!
//! Output matches what a browser's `Intl.NumberFormat('fr-FR', {style:
//! 'currency', currency: 'EUR'})` produces: comma decimal separator, narrow
//! no-break space between thousands groups, no-break space before the symbol.

/// Thousands separator (U+202F NARROW NO-BREAK SPACE)
pub const GROUP_SEPARATOR: char = '\u{202f}';

/// Space between amount and currency symbol (U+00A0 NO-BREAK SPACE)
pub const SYMBOL_SEPARATOR: char = '\u{a0}';

pub const CURRENCY_SYMBOL: &str = "€";

// Largest cent count that still fits an exact integer in an f64 mantissa.
const MAX_EXACT_CENTS: f64 = 9_007_199_254_740_992.0;

/// Format an amount as `1 234,50 €`
///
/// Falls back to `"<amount:.2> €"` when the amount cannot be grouped
/// (non-finite or beyond exact cent precision).
pub fn format_price(amount: f64) -> String {
    match grouped(amount) {
        Some(text) => format!("{}{}{}", text, SYMBOL_SEPARATOR, CURRENCY_SYMBOL),
        None => format!("{:.2} {}", amount, CURRENCY_SYMBOL),
    }
}

/// Like [`format_price`], with missing or NaN input shown as zero
pub fn format_price_tolerant(amount: Option<f64>) -> String {
    format_price(coerce(amount))
}

/// Plain two-decimal rendering (`1234.50`) used in table cells and headers
pub fn format_plain(amount: Option<f64>) -> String {
    format!("{:.2}", coerce(amount))
}

/// Signed percentage with one decimal (`+12.5%`, `-3.0%`)
pub fn format_percent_delta(percent: f64) -> String {
    if percent > 0.0 {
        format!("+{:.1}%", percent)
    } else {
        format!("{:.1}%", percent)
    }
}

fn coerce(amount: Option<f64>) -> f64 {
    match amount {
        Some(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

fn grouped(amount: f64) -> Option<String> {
    if !amount.is_finite() {
        return None;
    }

    let cents = (amount.abs() * 100.0).round();
    if cents > MAX_EXACT_CENTS {
        return None;
    }
    let cents = cents as u64;

    let units = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut out = String::with_capacity(units.len() + units.len() / 3 + 4);
    if amount < 0.0 && cents > 0 {
        out.push('-');
    }
    for (idx, digit) in units.chars().enumerate() {
        if idx > 0 && (units.len() - idx) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(digit);
    }
    out.push(',');
    out.push_str(&format!("{:02}", fraction));
    Some(out)
}
