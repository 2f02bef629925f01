//! Decimal unit conversion (wei/gwei/ether style scaling).
//!
//! Values cross this boundary as decimal strings so callers never round
//! through floats. `parse_units("1.5", 9)` yields `"1500000000"`;
//! `format_units("1500000000", 9)` yields `"1.5"`.

use primitive_types::U256;
use thiserror::Error;

/// Unit conversion error
#[derive(Debug, Error)]
pub enum UnitsError {
    /// Input is not a decimal number
    #[error("invalid decimal value: {0}")]
    InvalidDecimal(String),
    /// Fractional digits exceed the unit's decimals
    #[error("fractional component exceeds {0} decimals")]
    ExcessPrecision(u32),
    /// Result does not fit in 256 bits
    #[error("value overflows 256 bits")]
    Overflow,
    /// Decimals out of the representable range
    #[error("decimals must be at most 77, got {0}")]
    DecimalsTooLarge(u32),
}

/// Largest decimals value for which 10^decimals fits in a U256
const MAX_DECIMALS: u32 = 77;

/// Parse a decimal string into an integer decimal string scaled by
/// `10^decimals`.
///
/// Accepts an optional leading `-` and an optional fractional part.
/// Fails when the fractional part has more than `decimals` digits.
pub fn parse_units(value: &str, decimals: u32) -> Result<String, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::DecimalsTooLarge(decimals));
    }

    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::InvalidDecimal(value.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::InvalidDecimal(value.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitsError::ExcessPrecision(decimals));
    }

    let whole_int = parse_digits(whole)?;
    let frac_scaled = if frac.is_empty() {
        U256::zero()
    } else {
        // "5" with decimals=9 means 5 * 10^8
        let shift = pow10(decimals - frac.len() as u32)?;
        parse_digits(frac)?.checked_mul(shift).ok_or(UnitsError::Overflow)?
    };

    let scale = pow10(decimals)?;
    let scaled = whole_int
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_scaled))
        .ok_or(UnitsError::Overflow)?;

    if negative && !scaled.is_zero() {
        Ok(format!("-{}", scaled))
    } else {
        Ok(scaled.to_string())
    }
}

/// Format an integer decimal string as a decimal number with `decimals`
/// fractional digits.
///
/// Trailing zeros are stripped from the fraction (`"1.50"` becomes
/// `"1.5"`, a whole value renders as `"1.0"`). The sign is preserved.
pub fn format_units(value: &str, decimals: u32) -> Result<String, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::DecimalsTooLarge(decimals));
    }

    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::InvalidDecimal(value.to_string()));
    }
    let magnitude = parse_digits(digits)?;

    if decimals == 0 {
        let rendered = magnitude.to_string();
        return Ok(apply_sign(negative, &magnitude, rendered));
    }

    let scale = pow10(decimals)?;
    let whole = magnitude / scale;
    let frac = magnitude % scale;

    let mut frac_str = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    while frac_str.len() > 1 && frac_str.ends_with('0') {
        frac_str.pop();
    }

    let rendered = format!("{}.{}", whole, frac_str);
    Ok(apply_sign(negative, &magnitude, rendered))
}

/// Parse a decimal string into wei (18 decimals)
pub fn parse_ether(value: &str) -> Result<String, UnitsError> {
    parse_units(value, 18)
}

/// Format a wei string as ether (18 decimals)
pub fn format_ether(value: &str) -> Result<String, UnitsError> {
    format_units(value, 18)
}

fn apply_sign(negative: bool, magnitude: &U256, rendered: String) -> String {
    if negative && !magnitude.is_zero() {
        format!("-{}", rendered)
    } else {
        rendered
    }
}

fn parse_digits(s: &str) -> Result<U256, UnitsError> {
    if s.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(s).map_err(|_| UnitsError::Overflow)
}

fn pow10(exp: u32) -> Result<U256, UnitsError> {
    U256::from(10u64)
        .checked_pow(U256::from(exp))
        .ok_or(UnitsError::Overflow)
}
