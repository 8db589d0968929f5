//! Read-time price arithmetic.
//!
//! Prices are persisted as strings. Discounts are the one place where a price is
//! parsed into a float; the result is rendered the way a Python `str(float)`
//! would render it, so `100 * 90 / 100` becomes `"90.0"` and
//! `10.5 * 90 / 100` becomes `"9.45"`.

/// Largest accepted discount percentage.
pub const MAX_DISCOUNT: u8 = 100;

/// Apply `discount` percent to `price`. Returns `None` when `price` is not a
/// finite number.
pub fn apply_discount(price: &str, discount: u8) -> Option<String> {
    let value: f64 = price.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let discount = discount.min(MAX_DISCOUNT);
    let discounted = value * f64::from(100 - discount) / 100.0;
    Some(format_float(discounted))
}

/// Render a float the way Python's `repr` does: positional with at least
/// one fractional digit inside `[1e-4, 1e16)`, scientific with a signed
/// two-digit exponent outside it (`1e-05`, `1.5e+16`).
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return scientific(value);
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn scientific(value: f64) -> String {
    let rendered = format!("{value:e}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exponent) => {
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exponent.abs())
            }
            Err(_) => rendered,
        },
        None => rendered,
    }
}

/// Parse a discount cell such as `"20"`, `"20.0"` or `" 15 "`.
pub fn parse_discount(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = raw.parse::<u8>() {
        return (value <= MAX_DISCOUNT).then_some(value);
    }
    let value: f64 = raw.parse().ok()?;
    if value.fract() != 0.0 || !(0.0..=f64::from(MAX_DISCOUNT)).contains(&value) {
        return None;
    }
    Some(value as u8)
}
