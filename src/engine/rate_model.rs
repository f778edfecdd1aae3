use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Strategy;

/// Boost applied on top of the weighted catalog yield unless configured otherwise.
pub const DEFAULT_BOOST_MULTIPLIER: Decimal = Decimal::from_parts(25, 0, 0, false, 1); // 2.5

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("strategy {name}: weight {weight} outside [0, 1]")]
    WeightOutOfRange { name: String, weight: Decimal },

    #[error("strategy {name}: negative annualized yield {apy}")]
    NegativeYield { name: String, apy: Decimal },

    #[error("duplicate strategy name: {0}")]
    DuplicateStrategy(String),

    #[error("boost multiplier must be non-negative, got {0}")]
    NegativeBoost(Decimal),

    #[error("cannot read strategy catalog: {0}")]
    Unreadable(String),
}

/// Fixed catalog of strategies blended into a single annualized rate.
#[derive(Debug, Clone)]
pub struct RateModel {
    strategies: Vec<Strategy>,
    boost_multiplier: Decimal,
}

impl RateModel {
    /// Validate and build a model. Weights are not required to sum to 1.
    pub fn new(strategies: Vec<Strategy>, boost_multiplier: Decimal) -> Result<Self, CatalogError> {
        if boost_multiplier.is_sign_negative() {
            return Err(CatalogError::NegativeBoost(boost_multiplier));
        }

        let mut seen = HashSet::new();
        for s in &strategies {
            if s.weight < Decimal::ZERO || s.weight > Decimal::ONE {
                return Err(CatalogError::WeightOutOfRange {
                    name: s.name.clone(),
                    weight: s.weight,
                });
            }
            if s.annualized_yield.is_sign_negative() {
                return Err(CatalogError::NegativeYield {
                    name: s.name.clone(),
                    apy: s.annualized_yield,
                });
            }
            if !seen.insert(s.name.as_str()) {
                return Err(CatalogError::DuplicateStrategy(s.name.clone()));
            }
        }

        let total = strategies.iter().map(|s| s.weight).sum::<Decimal>();
        if !strategies.is_empty() && total != Decimal::ONE {
            tracing::warn!(
                total_weight = %total,
                "Strategy weights do not sum to 1; blended rate is not a weighted average"
            );
        }

        Ok(Self {
            strategies,
            boost_multiplier,
        })
    }

    /// The catalog the service ships with.
    pub fn default_catalog() -> Vec<Strategy> {
        [
            ("aave_lending", 85, 15),
            ("compound_lending", 78, 12),
            ("uniswap_v3_lp", 245, 18),
            ("curve_stable", 125, 10),
            ("yearn_vaults", 198, 15),
            ("convex_boosted", 312, 10),
            ("balancer_weighted", 167, 8),
            ("sushiswap_farms", 289, 5),
            ("mev_arbitrage", 425, 3),
            ("flashloan_arb", 512, 2),
            ("governance_rewards", 95, 1),
            ("staking_rewards", 142, 1),
        ]
        .into_iter()
        .map(|(name, apy, weight)| Strategy::new(name, Decimal::new(apy, 2), Decimal::new(weight, 2)))
        .collect()
    }

    /// Rescale weights so they sum to exactly 1. A zero-weight catalog is left untouched.
    pub fn normalized(mut self) -> Self {
        let total = self.strategies.iter().map(|s| s.weight).sum::<Decimal>();
        if total.is_zero() {
            return self;
        }
        for s in &mut self.strategies {
            s.weight /= total;
        }
        self
    }

    /// Σ(apy × weight) × boost. Recomputed on every call.
    pub fn blended_rate(&self) -> Decimal {
        let weighted: Decimal = self.strategies.iter().map(Strategy::weighted_yield).sum();
        weighted * self.boost_multiplier
    }

    pub fn boost_multiplier(&self) -> Decimal {
        self.boost_multiplier
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }
}

impl Default for RateModel {
    fn default() -> Self {
        Self {
            strategies: Self::default_catalog(),
            boost_multiplier: DEFAULT_BOOST_MULTIPLIER,
        }
    }
}
