//! Duration strings in the `1h30m` / `1.5s` / `300ms` format
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit. Valid units are `ns`, `us` (or `µs`),
//! `ms`, `s`, `m` and `h`. A bare `0` needs no unit. Negative values are
//! rejected.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("negative duration {0:?} is not allowed")]
    Negative(String),

    #[error("duration {0:?} is out of range")]
    OutOfRange(String),
}

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000), // U+00B5 micro sign
    ("μs", 1_000), // U+03BC greek mu
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
];

/// Fraction digits beyond this cannot change the nanosecond result
const MAX_FRACTION_DIGITS: usize = 20;

/// Parse a duration string
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let rest = match input.as_bytes().first() {
        Some(b'-') => {
            return match &input[1..] {
                "" => Err(invalid()),
                "0" => Ok(Duration::ZERO),
                _ => Err(DurationError::Negative(input.to_string())),
            };
        }
        Some(b'+') => &input[1..],
        Some(_) => input,
        None => return Err(invalid()),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    let mut rest = rest;

    while !rest.is_empty() {
        // Integer part
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, after_int) = rest.split_at(int_len);

        // Fraction part
        let (frac_digits, after_frac) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        // Unit runs until the next number
        let unit_len = after_frac
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_frac.len());
        let (unit, after_unit) = after_frac.split_at(unit_len);

        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }

        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| DurationError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;

        let out_of_range = || DurationError::OutOfRange(input.to_string());

        let whole = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse::<u128>().map_err(|_| out_of_range())?
        };

        let mut nanos = whole.checked_mul(scale).ok_or_else(out_of_range)?;

        if !frac_digits.is_empty() {
            let kept = &frac_digits[..frac_digits.len().min(MAX_FRACTION_DIGITS)];
            let numerator = kept.parse::<u128>().map_err(|_| invalid())?;
            let denominator = 10u128.pow(kept.len() as u32);
            nanos = nanos
                .checked_add(numerator.saturating_mul(scale) / denominator)
                .ok_or_else(out_of_range)?;
        }

        total = total.checked_add(nanos).ok_or_else(out_of_range)?;
        rest = after_unit;
    }

    let nanos = u64::try_from(total).map_err(|_| DurationError::OutOfRange(input.to_string()))?;
    Ok(Duration::from_nanos(nanos))
}
