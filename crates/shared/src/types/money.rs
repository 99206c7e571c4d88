//! Currencies and their minor-unit rounding.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` throughout.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Indonesian Rupiah
    Idr,
    /// Euro
    Eur,
    /// Singapore Dollar
    Sgd,
    /// Japanese Yen
    Jpy,
    /// Pound Sterling
    Gbp,
    /// Australian Dollar
    Aud,
}

impl Currency {
    /// Number of decimal places of the currency's minor unit.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Jpy => 0,
            Self::Usd | Self::Idr | Self::Eur | Self::Sgd | Self::Gbp | Self::Aud => 2,
        }
    }

    /// Smallest representable amount, e.g. `0.01` for USD.
    #[must_use]
    pub fn minor_unit(self) -> Decimal {
        Decimal::new(1, self.minor_units())
    }

    /// Rounds `amount` to the minor unit using banker's rounding.
    ///
    /// This is the only rounding rule the engine applies to money, and
    /// only where a whole is split into period-sized parts.
    #[must_use]
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.minor_units(), RoundingStrategy::MidpointNearestEven)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usd => write!(f, "USD"),
            Self::Idr => write!(f, "IDR"),
            Self::Eur => write!(f, "EUR"),
            Self::Sgd => write!(f, "SGD"),
            Self::Jpy => write!(f, "JPY"),
            Self::Gbp => write!(f, "GBP"),
            Self::Aud => write!(f, "AUD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "IDR" => Ok(Self::Idr),
            "EUR" => Ok(Self::Eur),
            "SGD" => Ok(Self::Sgd),
            "JPY" => Ok(Self::Jpy),
            "GBP" => Ok(Self::Gbp),
            "AUD" => Ok(Self::Aud),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
