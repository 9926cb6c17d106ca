use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::DomainError;

/// Billing currencies accepted by the payment provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Currency {
    EUR,
    USD,
    DKK,
    SEK,
    GBP,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::EUR,
        Currency::USD,
        Currency::DKK,
        Currency::SEK,
        Currency::GBP,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::DKK => "DKK",
            Self::SEK => "SEK",
            Self::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or(DomainError::UnknownCurrency(s.to_string()))
    }
}

/// Fixed-point decimal representation using i64 (multiply by 10,000)
/// Represents amounts with 4 decimal places of precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct FixedPoint(i64);

impl FixedPoint {
    const SCALE: i64 = 10_000;

    /// Create from raw scaled value
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Get raw scaled value
    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// Parse from decimal string (e.g., "1.5000")
    pub fn from_decimal_str(s: &str) -> Result<Self, DomainError> {
        let s = s.trim();

        let (is_negative, s) = match s.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };

        let (integer_part, decimal_part) = match s.split_once('.') {
            Some((int, dec)) => (int, dec),
            None => (s, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if integer_part.is_empty()
            || decimal_part.len() > 4
            || !all_digits(integer_part)
            || !all_digits(decimal_part)
        {
            return Err(DomainError::InvalidAmount);
        }

        let integer: i64 = integer_part
            .parse()
            .map_err(|_| DomainError::InvalidAmount)?;

        // Pad to 4 digits so "1.5" scales to 15_000
        let decimal: i64 = format!("{:0<4}", decimal_part)
            .parse()
            .map_err(|_| DomainError::InvalidAmount)?;

        let scaled = integer
            .checked_mul(Self::SCALE)
            .and_then(|v| v.checked_add(decimal))
            .ok_or(DomainError::Overflow)?;

        Ok(Self(if is_negative { -scaled } else { scaled }))
    }

    /// Convert to decimal string with 4 decimal places
    pub fn to_decimal_string(&self) -> String {
        let abs_value = self.0.abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        format!(
            "{}{}.{:04}",
            sign,
            abs_value / Self::SCALE,
            abs_value % Self::SCALE
        )
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

/// A monetary amount carrying its own currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Money {
    pub value: FixedPoint,
    pub currency: Currency,
}

impl Money {
    pub fn new(value: FixedPoint, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Parse a decimal amount in the given currency
    pub fn parse(value: &str, currency: Currency) -> Result<Self, DomainError> {
        Ok(Self::new(FixedPoint::from_decimal_str(value)?, currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}
