use std::time::Duration;

use crate::error::ConfigError;

/// Longest accepted routine interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(86_400);

/// Fraction digits beyond this many are ignored.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses a routine interval.
///
/// A bare number is seconds and may be fractional (`2`, `0.5`); otherwise
/// the number carries one of the units `ms`, `s`, `m` or `h`. Fractions
/// are resolved to whole nanoseconds, rounding down.
///
/// # Errors
///
/// Returns an error for empty or malformed text, an unknown unit, a value
/// that is not strictly positive, or one above [`MAX_INTERVAL`].
pub fn parse_interval(text: &str) -> Result<Duration, ConfigError> {
    let value = text.trim();
    if value.is_empty() {
        return Err(ConfigError::IntervalEmpty);
    }

    let (negative, unsigned) = value.strip_prefix('-').map_or_else(
        || (false, value.strip_prefix('+').unwrap_or(value)),
        |rest| (true, rest),
    );
    let number_len = unsigned
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
        .unwrap_or(unsigned.len());
    let (num_part, unit_part) = unsigned.split_at(number_len);
    let (whole, fraction) = num_part.split_once('.').unwrap_or((num_part, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return Err(ConfigError::InvalidInterval {
            value: value.to_owned(),
        });
    }

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let nanos_per_unit: u128 = match unit {
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => {
            return Err(ConfigError::InvalidIntervalUnit {
                value: value.to_owned(),
                unit: unit.to_owned(),
            });
        }
    };

    let overflow = || ConfigError::IntervalOverflow {
        value: value.to_owned(),
    };
    let whole_nanos = digits_value(whole)
        .ok_or_else(overflow)?
        .checked_mul(nanos_per_unit)
        .ok_or_else(overflow)?;
    let fraction = fraction.get(..MAX_FRACTION_DIGITS).unwrap_or(fraction);
    let fraction_nanos = digits_value(fraction)
        .and_then(|numerator| numerator.checked_mul(nanos_per_unit))
        .zip(u32::try_from(fraction.len()).ok())
        .and_then(|(scaled, places)| scaled.checked_div(10_u128.checked_pow(places)?))
        .ok_or_else(overflow)?;
    let total = whole_nanos.checked_add(fraction_nanos).ok_or_else(overflow)?;

    if total == 0 || negative {
        return Err(ConfigError::IntervalNotPositive {
            value: value.to_owned(),
        });
    }
    let duration = u64::try_from(total)
        .map(Duration::from_nanos)
        .map_err(|_range_err| overflow())?;
    if duration > MAX_INTERVAL {
        return Err(overflow());
    }
    Ok(duration)
}

/// Value of an ASCII digit run; `Some(0)` for an empty run.
fn digits_value(digits: &str) -> Option<u128> {
    digits.bytes().try_fold(0_u128, |acc, digit| {
        acc.checked_mul(10)?
            .checked_add(u128::from(digit.checked_sub(b'0')?))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};

    #[test]
    fn bare_numbers_are_seconds() -> AppResult<()> {
        for (text, expected) in [
            ("2", Duration::from_secs(2)),
            ("0.5", Duration::from_millis(500)),
            (" 6 ", Duration::from_secs(6)),
        ] {
            let parsed = parse_interval(text)?;
            if parsed != expected {
                return Err(AppError::config(format!("{} parsed as {:?}", text, parsed)));
            }
        }
        Ok(())
    }

    #[test]
    fn units_are_applied() -> AppResult<()> {
        for (text, expected) in [
            ("250ms", Duration::from_millis(250)),
            ("3s", Duration::from_secs(3)),
            ("1.5m", Duration::from_secs(90)),
            ("1h", Duration::from_secs(3600)),
        ] {
            let parsed = parse_interval(text)?;
            if parsed != expected {
                return Err(AppError::config(format!("{} parsed as {:?}", text, parsed)));
            }
        }
        Ok(())
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        assert!(matches!(
            parse_interval("soon"),
            Err(ConfigError::InvalidInterval { .. })
        ));
        assert!(matches!(parse_interval(""), Err(ConfigError::IntervalEmpty)));
        assert!(matches!(
            parse_interval("5d"),
            Err(ConfigError::InvalidIntervalUnit { .. })
        ));
    }

    #[test]
    fn zero_negative_and_huge_values_are_rejected() {
        assert!(matches!(
            parse_interval("0"),
            Err(ConfigError::IntervalNotPositive { .. })
        ));
        assert!(matches!(
            parse_interval("-2"),
            Err(ConfigError::IntervalNotPositive { .. })
        ));
        assert!(matches!(
            parse_interval("25h"),
            Err(ConfigError::IntervalOverflow { .. })
        ));
        assert!(matches!(
            parse_interval("NaN"),
            Err(ConfigError::InvalidInterval { .. })
        ));
        assert!(matches!(
            parse_interval("1.2.3"),
            Err(ConfigError::InvalidInterval { .. })
        ));
        assert!(matches!(
            parse_interval("0.0000000001"),
            Err(ConfigError::IntervalNotPositive { .. })
        ));
    }

    #[test]
    fn fractions_resolve_to_whole_nanoseconds() -> AppResult<()> {
        for (text, expected) in [
            ("0.001ms", Duration::from_nanos(1_000)),
            (".25", Duration::from_millis(250)),
            ("+2.5h", Duration::from_secs(9_000)),
            ("0.3333333333333333333333", Duration::from_nanos(333_333_333)),
            ("24h", MAX_INTERVAL),
        ] {
            let parsed = parse_interval(text)?;
            if parsed != expected {
                return Err(AppError::config(format!("{} parsed as {:?}", text, parsed)));
            }
        }
        Ok(())
    }
}
