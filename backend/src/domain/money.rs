//! Point amounts held as integer minor units.
//!
//! The ledger never stores fractional values. Conversion to and from the
//! two-decimal display form happens only at the outer boundary (the accrual
//! adapter and whatever inbound layer renders balances).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of minor units in one major unit.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Monetary or point amount in minor units.
///
/// # Examples
/// ```
/// use gophermart::domain::Money;
///
/// let amount: Money = "729.98".parse().expect("valid amount");
/// assert_eq!(amount.minor_units(), 72_998);
/// assert_eq!(amount.to_string(), "729.98");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

/// Errors raised while parsing the display form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    /// Input was blank.
    #[error("amount must not be empty")]
    Empty,
    /// Input contained something other than an optional sign, digits and one
    /// decimal point.
    #[error("amount `{input}` is not a plain decimal number")]
    Malformed {
        /// Offending input.
        input: String,
    },
    /// Input does not fit into 64-bit minor units.
    #[error("amount `{input}` is out of range")]
    OutOfRange {
        /// Offending input.
        input: String,
    },
}

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build an amount from minor units.
    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Raw minor units.
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is below zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Add, returning `None` on overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtract, returning `None` on overflow.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Parse a decimal that may use exponent notation, such as `1e+16` or
    /// `1.5E-3`, as JSON numbers are commonly rendered.
    ///
    /// The exponent is folded into a plain decimal before the usual
    /// [`FromStr`] rules (including rounding) apply.
    ///
    /// # Examples
    /// ```
    /// use gophermart::domain::Money;
    ///
    /// assert_eq!(Money::from_decimal("1e+2").expect("valid").minor_units(), 10_000);
    /// assert_eq!(Money::from_decimal("729.98").expect("valid").minor_units(), 72_998);
    /// ```
    pub fn from_decimal(raw: &str) -> Result<Self, MoneyParseError> {
        let trimmed = raw.trim();
        match trimmed.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => {
                let plain = shift_decimal_point(mantissa, exponent).ok_or_else(|| {
                    MoneyParseError::Malformed {
                        input: trimmed.to_owned(),
                    }
                })?;
                plain.parse::<Self>().map_err(|err| match err {
                    MoneyParseError::OutOfRange { .. } => MoneyParseError::OutOfRange {
                        input: trimmed.to_owned(),
                    },
                    _ => MoneyParseError::Malformed {
                        input: trimmed.to_owned(),
                    },
                })
            }
            None => trimmed.parse(),
        }
    }
}

/// Integer digits beyond which no `i64` minor-unit amount fits.
const MAX_WHOLE_DIGITS: i64 = 20;

/// Rewrite `mantissa * 10^exponent` as a plain decimal string.
///
/// Returns `None` when either part is malformed. Values too small to reach
/// the rounding digit collapse to zero; values too large keep enough digits
/// to be reported as out of range.
fn shift_decimal_point(mantissa: &str, exponent: &str) -> Option<String> {
    let exponent: i64 = exponent.parse().ok()?;
    let (sign, unsigned) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let digits = format!("{whole}{fraction}");
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let whole_len = i64::try_from(whole.len()).ok()?;
    let point = whole_len.saturating_add(exponent);
    if point < -2 {
        return Some("0".to_owned());
    }
    if point > MAX_WHOLE_DIGITS {
        return Some(format!("{sign}1{}", "0".repeat(40)));
    }

    let digit_count = i64::try_from(digits.len()).ok()?;
    let plain = if point <= 0 {
        let zeros = usize::try_from(-point).ok()?;
        format!("0.{}{digits}", "0".repeat(zeros))
    } else if point >= digit_count {
        let zeros = usize::try_from(point - digit_count).ok()?;
        format!("{digits}{}", "0".repeat(zeros))
    } else {
        let split = usize::try_from(point).ok()?;
        let (head, tail) = digits.split_at(split);
        format!("{head}.{tail}")
    };
    Some(format!("{sign}{plain}"))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_major, abs % per_major)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    /// Parse a plain decimal such as `500`, `500.5` or `-0.25`.
    ///
    /// Digits beyond the second decimal place are rounded half away from zero.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MoneyParseError::Empty);
        }
        let malformed = || MoneyParseError::Malformed {
            input: trimmed.to_owned(),
        };
        let out_of_range = || MoneyParseError::OutOfRange {
            input: trimmed.to_owned(),
        };

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(malformed());
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().map_err(|_| out_of_range())?
        };

        let mut digits = fraction.bytes().map(|byte| i64::from(byte - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().is_some_and(|digit| digit >= 5);
        let fraction_units = tenths * 10 + hundredths + i64::from(round_up);

        let magnitude = whole_units
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|units| units.checked_add(fraction_units))
            .ok_or_else(out_of_range)?;
        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("500", 50_000)]
    #[case("500.5", 50_050)]
    #[case("729.98", 72_998)]
    #[case(".25", 25)]
    #[case("0.125", 13)]
    #[case("0.124", 12)]
    #[case("-3.10", -310)]
    fn parses_display_form(#[case] raw: &str, #[case] expected: i64) {
        let parsed: Money = raw.parse().expect("valid amount");
        assert_eq!(parsed.minor_units(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1.2.3")]
    #[case("1e3")]
    #[case(".")]
    #[case("12,50")]
    fn rejects_malformed_input(#[case] raw: &str) {
        assert!(raw.parse::<Money>().is_err());
    }

    #[rstest]
    #[case("1e16", 1_000_000_000_000_000_000)]
    #[case("1e+16", 1_000_000_000_000_000_000)]
    #[case("1.5E-3", 0)]
    #[case("5e-3", 1)]
    #[case("1e-5", 0)]
    #[case("7.2998e2", 72_998)]
    #[case("-2.5e1", -2_500)]
    #[case("729.98", 72_998)]
    fn decimal_form_accepts_exponent_notation(#[case] raw: &str, #[case] expected: i64) {
        let parsed = Money::from_decimal(raw).expect("valid amount");
        assert_eq!(parsed.minor_units(), expected);
    }

    #[rstest]
    #[case("1e400", true)]
    #[case("1e", false)]
    #[case("e5", false)]
    #[case("1.2.3e4", false)]
    fn decimal_form_rejects_unusable_exponents(#[case] raw: &str, #[case] out_of_range: bool) {
        let error = Money::from_decimal(raw).expect_err("unusable amount");
        assert_eq!(
            matches!(error, MoneyParseError::OutOfRange { .. }),
            out_of_range,
            "{error}"
        );
    }

    #[rstest]
    fn rejects_out_of_range_values() {
        let result = "99999999999999999999".parse::<Money>();
        assert!(matches!(result, Err(MoneyParseError::OutOfRange { .. })));
    }

    #[rstest]
    #[case(0, "0.00")]
    #[case(5, "0.05")]
    #[case(50_000, "500.00")]
    #[case(-310, "-3.10")]
    fn renders_two_decimal_places(#[case] units: i64, #[case] expected: &str) {
        assert_eq!(Money::from_minor_units(units).to_string(), expected);
    }

    #[rstest]
    fn checked_arithmetic_detects_overflow() {
        let max = Money::from_minor_units(i64::MAX);
        assert!(max.checked_add(Money::from_minor_units(1)).is_none());
        assert_eq!(
            Money::from_minor_units(500).checked_sub(Money::from_minor_units(300)),
            Some(Money::from_minor_units(200))
        );
    }
}
