use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::AggregateError;

const ROUNDING_STEP: u64 = 1000;

/// Rule for reducing the observed prices of one product to a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Lowest unique price.
    Cheapest,
    /// Mean of the unique prices, rounded up to the next multiple of 1000.
    AverageRoundedUp,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Cheapest => "cheapest",
            Strategy::AverageRoundedUp => "average-rounded-up",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = AggregateError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim() {
            "cheapest" | "nofoozi" => Ok(Strategy::Cheapest),
            "average-rounded-up" | "reghabati" => Ok(Strategy::AverageRoundedUp),
            other => Err(AggregateError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Reduce a price list to one value under `strategy`.
///
/// Duplicate prices count once. An empty list is an error for every strategy.
pub fn aggregate(prices: &[u64], strategy: Strategy) -> Result<u64, AggregateError> {
    if prices.is_empty() {
        return Err(AggregateError::EmptyInput);
    }

    let unique: BTreeSet<u64> = prices.iter().copied().collect();

    match strategy {
        Strategy::Cheapest => unique.first().copied().ok_or(AggregateError::EmptyInput),
        Strategy::AverageRoundedUp => ceil_mean_to_step(&unique),
    }
}

// ceil(mean / step) * step == ceil(sum / (n * step)) * step, kept in u128 so the sum can't overflow
fn ceil_mean_to_step(values: &BTreeSet<u64>) -> Result<u64, AggregateError> {
    let sum: u128 = values.iter().map(|&v| u128::from(v)).sum();
    let divisor = values.len() as u128 * u128::from(ROUNDING_STEP);
    let rounded = sum.div_ceil(divisor) * u128::from(ROUNDING_STEP);
    u64::try_from(rounded).map_err(|_| AggregateError::Overflow)
}
