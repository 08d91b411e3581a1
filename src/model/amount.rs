//! Amount type for handling monetary values with optional dollar signs.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing form input
//! that may or may not include a dollar sign and thousands separators.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Represents a dollar amount.
///
/// The value is held as a `Decimal` so that totals are exact: summing `0.10` ten times is `1.00`,
/// not `0.9999999999999999`.
///
/// # Examples
///
/// ```
/// # use fintrack::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "$1,250.50");
/// assert_eq!(amount.plain(), "1250.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// The largest amount a single transaction may record: one trillion dollars.
    pub const MAX: Amount = Amount(Decimal::from_parts(3_567_587_328, 232, 0, false, 0));

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// The unformatted decimal string, e.g. `1250.5`. This is the form written to the store.
    pub fn plain(&self) -> String {
        self.0.normalize().to_string()
    }

    /// Adds two amounts, returning `None` if the result does not fit in a `Decimal`.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// The share of `total` that this amount represents, as a percentage rounded to one decimal
    /// place. Returns zero when `total` is zero.
    pub fn percent_of(&self, total: Amount) -> Decimal {
        if total.is_zero() {
            return Decimal::ZERO;
        }
        match self.0.checked_div(total.0) {
            Some(ratio) => ratio.saturating_mul(Decimal::ONE_HUNDRED).round_dp(1),
            None => Decimal::MAX,
        }
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(String);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError("An amount is required".to_string()));
        }

        // "-$5.00" and "$-5.00" are both accepted so that validation, not parsing, rejects them
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(after_minus) => (true, after_minus),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        if negative && rest.starts_with(['-', '+']) {
            return Err(AmountError(format!(
                "'{trimmed}' is not a valid amount: more than one sign"
            )));
        }
        let digits = rest.replace(',', "");

        let value = Decimal::from_str(&digits)
            .map_err(|e| AmountError(format!("'{trimmed}' is not a valid amount: {e}")))?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.0.is_sign_negative() && !self.is_zero() {
            "-"
        } else {
            ""
        };
        let num = format!("{:.2}", self.0.abs().round_dp(2));
        let (whole, cents) = num.split_once('.').unwrap_or((num.as_str(), "00"));
        write!(f, "{sign}${}.{cents}", group_thousands(whole))
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (ix, ch) in digits.chars().enumerate() {
        if ix > 0 && (len - ix) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        // Saturates rather than panicking; a single transaction is capped well below this.
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.plain())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        assert_eq!(amt("$50.00").value(), Decimal::from_str("50.00").unwrap());
    }

    #[test]
    fn test_parse_without_dollar_sign() {
        assert_eq!(amt("4.50").value(), Decimal::from_str("4.5").unwrap());
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        assert_eq!(amt("-$50.00").value(), Decimal::from_str("-50").unwrap());
    }

    #[test]
    fn test_parse_with_commas() {
        assert_eq!(
            amt("$1,234,567.89").value(),
            Decimal::from_str("1234567.89").unwrap()
        );
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(amt("  $50.00  ").value(), Decimal::from(50));
    }

    #[test]
    fn test_parse_double_sign_is_an_error() {
        for input in ["--5", "-$-5", "-+5", "-$+5"] {
            let err = Amount::from_str(input).unwrap_err();
            assert!(err.to_string().contains("more than one sign"), "{input}");
        }
        assert_eq!(amt("$-5").value(), Decimal::from(-5));
    }

    #[test]
    fn test_parse_empty_is_an_error() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("   ").is_err());
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        let err = Amount::from_str("twelve").unwrap_err();
        assert!(err.to_string().contains("'twelve' is not a valid amount"));
    }

    #[test]
    fn test_display() {
        assert_eq!(amt("4.5").to_string(), "$4.50");
        assert_eq!(amt("1000").to_string(), "$1,000.00");
        assert_eq!(amt("-60000").to_string(), "-$60,000.00");
        assert_eq!(Amount::ZERO.to_string(), "$0.00");
        assert_eq!(amt("999.999").to_string(), "$1,000.00");
        assert_eq!(amt("123456").to_string(), "$123,456.00");
    }

    #[test]
    fn test_display_is_exact_for_large_values() {
        assert_eq!(
            amt("12345678901234567.89").to_string(),
            "$12,345,678,901,234,567.89"
        );
        assert_eq!(Amount::MAX.to_string(), "$1,000,000,000,000.00");
    }

    #[test]
    fn test_add_saturates() {
        let big = Amount::new(Decimal::MAX);
        assert_eq!(big.checked_add(amt("1")), None);
        assert_eq!((big + amt("1")).value(), Decimal::MAX);
        assert_eq!(amt("1").checked_add(amt("2")), Some(amt("3")));
    }

    #[test]
    fn test_plain() {
        assert_eq!(amt("$4.50").plain(), "4.5");
        assert_eq!(amt("100.00").plain(), "100");
    }

    #[test]
    fn test_is_positive() {
        assert!(amt("0.01").is_positive());
        assert!(!amt("0").is_positive());
        assert!(!amt("-0.00").is_positive());
        assert!(!amt("-3").is_positive());
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Amount = std::iter::repeat(amt("0.10")).take(10).sum();
        assert_eq!(total.value(), Decimal::ONE);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(amt("80").percent_of(amt("100")), Decimal::from(80));
        assert_eq!(
            amt("1").percent_of(amt("3")),
            Decimal::from_str("33.3").unwrap()
        );
        assert_eq!(amt("1").percent_of(Amount::ZERO), Decimal::ZERO);
        let huge = Amount::new(Decimal::MAX);
        assert_eq!(huge.percent_of(huge), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&amt("$4.50")).unwrap();
        assert_eq!(json, "\"4.5\"");
        let back: Amount = serde_json::from_str("\"$1,000.25\"").unwrap();
        assert_eq!(back, amt("1000.25"));
    }
}
