use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_FRACTION_DIGITS: u32 = 2;
/// EMV caps the transaction amount field at 13 characters.
const MAX_RENDERED_LEN: usize = 13;

/// A positive currency amount in major units with at most 2 fractional digits.
///
/// The amount is kept as a `rust_decimal::Decimal` so no float rounding ever
/// reaches the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }

        let normalized = value.normalize();
        if normalized.scale() > MAX_FRACTION_DIGITS {
            return Err(ValidationError::TooManyDecimals(value.to_string()));
        }

        let amount = Self(normalized);
        if amount.render().len() > MAX_RENDERED_LEN {
            return Err(ValidationError::AmountTooLarge(value.to_string()));
        }
        Ok(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The value carried at exactly 2 fractional digits, as it appears on the wire.
    pub fn rendered_value(&self) -> Decimal {
        let mut rendered = self.0;
        rendered.rescale(MAX_FRACTION_DIGITS);
        rendered
    }

    /// Formats the amount for tag 54, always with exactly 2 fractional digits.
    pub fn render(&self) -> String {
        self.rendered_value().to_string()
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-')
            && s.bytes().any(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(ValidationError::UnparseableAmount(s.to_string()));
        }

        // `from_str` rounds past 28 fractional digits, which could hide extra decimals.
        let value = Decimal::from_str_exact(s)
            .map_err(|_| ValidationError::UnparseableAmount(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
