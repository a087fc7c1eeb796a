//! Human-readable duration strings
//!
//! Fault rules and property checks both express time as a run of
//! `<number><unit>` pairs without separators, e.g. `"1h2m3s500ms"`.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use domain::parse_duration;
//!
//! assert_eq!(parse_duration("1s500ms").unwrap(), Duration::from_millis(1500));
//! assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
//! assert!(parse_duration("3x").is_err());
//! ```

use std::time::Duration;

use crate::errors::DomainError;

const NANOS_PER_MICRO: f64 = 1e3;
const NANOS_PER_MILLI: f64 = 1e6;
const NANOS_PER_SECOND: f64 = 1e9;
const NANOS_PER_MINUTE: f64 = 60.0 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: f64 = 60.0 * NANOS_PER_MINUTE;

/// Supported duration units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Hours,
    Minutes,
    Seconds,
    Millis,
    Micros,
}

impl Unit {
    fn parse(unit: &str) -> Option<Self> {
        match unit {
            "h" => Some(Self::Hours),
            "m" => Some(Self::Minutes),
            "s" => Some(Self::Seconds),
            "ms" => Some(Self::Millis),
            "us" | "µs" => Some(Self::Micros),
            _ => None,
        }
    }

    const fn nanos(self) -> f64 {
        match self {
            Self::Hours => NANOS_PER_HOUR,
            Self::Minutes => NANOS_PER_MINUTE,
            Self::Seconds => NANOS_PER_SECOND,
            Self::Millis => NANOS_PER_MILLI,
            Self::Micros => NANOS_PER_MICRO,
        }
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Parse a duration string such as `"1s500ms"` into a [`Duration`]
///
/// Units are `h`, `m`, `s`, `ms` and `us` (`µs` is accepted as well). Pairs
/// are summed. A number that cannot be read (e.g. `"ms"` or `"1.2.3s"`)
/// contributes zero for its own pair without discarding the others. An empty
/// string is a zero duration.
///
/// # Errors
///
/// Returns [`DomainError::MalformedDuration`] for unknown units, a trailing
/// number without a unit, or a value too large to represent.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn parse_duration(input: &str) -> Result<Duration, DomainError> {
    let mut rest = input.trim();
    let mut total_nanos = 0.0_f64;

    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number_char(c)).unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail.find(is_number_char).unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        if unit.is_empty() {
            return Err(DomainError::malformed_duration(
                input,
                format!("missing unit after '{number}'"),
            ));
        }

        let unit = Unit::parse(unit).ok_or_else(|| {
            DomainError::malformed_duration(input, format!("unknown unit '{unit}'"))
        })?;

        let value = number.parse::<f64>().unwrap_or(0.0);
        total_nanos += value * unit.nanos();
        rest = next;
    }

    let total_nanos = total_nanos.round();
    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(DomainError::malformed_duration(input, "value out of range"));
    }

    Ok(Duration::from_nanos(total_nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_duration() {
        assert_eq!(
            parse_duration("1s500ms").unwrap(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn parses_minutes() {
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn parses_every_unit() {
        assert_eq!(
            parse_duration("1h2m3s4ms5us").unwrap(),
            Duration::from_secs(3600 + 120 + 3) + Duration::from_micros(4005)
        );
    }

    #[test]
    fn parses_micro_sign() {
        assert_eq!(parse_duration("250µs").unwrap(), Duration::from_micros(250));
    }

    #[test]
    fn parses_fractional_values() {
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("0.25ms").unwrap(), Duration::from_micros(250));
    }

    #[test]
    fn minutes_are_not_confused_with_millis() {
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1ms").unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let err = parse_duration("3x").unwrap_err();
        assert!(matches!(err, DomainError::MalformedDuration { .. }));
        assert!(err.to_string().contains("unknown unit 'x'"));
    }

    #[test]
    fn trailing_number_without_unit_is_rejected() {
        assert!(matches!(
            parse_duration("1s500"),
            Err(DomainError::MalformedDuration { .. })
        ));
    }

    #[test]
    fn unreadable_number_contributes_zero_for_its_pair() {
        assert_eq!(parse_duration("ms").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("1.2.3s250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(parse_duration("").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("  ").unwrap(), Duration::ZERO);
    }

    #[test]
    fn repeated_units_are_summed() {
        assert_eq!(parse_duration("1s1s").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn absurdly_large_value_is_rejected() {
        assert!(parse_duration("99999999999999999999h").is_err());
    }
}
