use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named yield source in the rate catalog.
///
/// `apy` is an annualized ratio (0.85 = 85%), `weight` the share of the
/// notional position allocated to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    #[serde(rename = "apy")]
    pub annualized_yield: Decimal,
    pub weight: Decimal,
}

impl Strategy {
    pub fn new(name: impl Into<String>, annualized_yield: Decimal, weight: Decimal) -> Self {
        Self {
            name: name.into(),
            annualized_yield,
            weight,
        }
    }

    /// Contribution of this strategy to the unboosted blended rate.
    pub fn weighted_yield(&self) -> Decimal {
        self.annualized_yield * self.weight
    }
}
