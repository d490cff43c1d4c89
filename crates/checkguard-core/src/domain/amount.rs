use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Largest value a `NUMERIC(12,2)` column can hold, in cents.
pub const MAX_CHECK_AMOUNT_CENTS: i64 = 999_999_999_999;

/// Non-negative monetary amount of a returned check, kept in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckAmount(i64);

impl CheckAmount {
    pub fn from_cents(cents: i64) -> Result<Self, CoreError> {
        if !(0..=MAX_CHECK_AMOUNT_CENTS).contains(&cents) {
            return Err(CoreError::InvalidCheckAmount(cents.to_string()));
        }
        Ok(Self(cents))
    }

    /// Rounds to the nearest cent.
    pub fn from_dollars(value: f64) -> Result<Self, CoreError> {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::InvalidCheckAmount(value.to_string()));
        }
        let cents = (value * 100.0).round();
        if cents > MAX_CHECK_AMOUNT_CENTS as f64 {
            return Err(CoreError::InvalidCheckAmount(value.to_string()));
        }
        Ok(Self(cents as i64))
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::MissingCheckAmount);
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| CoreError::InvalidCheckAmount(trimmed.to_string()))?;
        Self::from_dollars(value).map_err(|_| CoreError::InvalidCheckAmount(trimmed.to_string()))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for CheckAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for CheckAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_dollars())
    }
}

impl<'de> Deserialize<'de> for CheckAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_dollars(value).map_err(serde::de::Error::custom)
    }
}
