use std::fmt;
use std::ops::Mul;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Index or share price in PKR.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl TryFrom<f64> for Price {
    type Error = anyhow::Error;

    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() {
            bail!("price must be finite, got {value}");
        }
        if value <= 0.0 {
            bail!("price must be positive, got {value}");
        }

        Ok(Price(value))
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.2}", self.0)
    }
}

impl Mul<f64> for Price {
    type Output = f64;

    fn mul(self, rhs: f64) -> f64 {
        self.0 * rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_and_non_finite_values() {
        assert!(Price::try_from(0.0).is_err());
        assert!(Price::try_from(-1.0).is_err());
        assert!(Price::try_from(f64::NAN).is_err());
        assert!(Price::try_from(f64::INFINITY).is_err());
        assert!(Price::try_from(132_920.0).is_ok());
    }

    #[test]
    fn displays_and_rounds_to_cents() {
        let price = Price::try_from(132_920.456).unwrap();

        assert_eq!(price.to_string(), "132920.46");
        assert_eq!(round_to_cents(price.as_f64()), 132_920.46);
    }
}
