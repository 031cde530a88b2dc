//! Environmental-impact score for an amount spread over an asset mix.

use serde::{Deserialize, Serialize};

use super::tax::AssetClass;
use super::{require_amount, round_to};

/// Impact bonus applied once to the summed total when the discipline streak is active.
pub const DISCIPLINE_BONUS: f64 = 1.10;

/// One slice of an allocation.
///
/// Fractions across a mix are expected to sum to at most 1.0. This is not
/// checked; callers own that invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixEntry {
    pub asset: AssetClass,
    pub allocation: f64,
}

impl MixEntry {
    pub fn new(asset: AssetClass, allocation: f64) -> Self {
        Self { asset, allocation }
    }
}

pub fn sustainability_factor(asset: AssetClass) -> f64 {
    match asset {
        AssetClass::Equity => 2e-5,
        AssetClass::Crypto => 5e-6,
        AssetClass::Esg => 5e-5,
    }
}

/// Impact score rounded to 3 decimals.
pub fn compute_impact(amount: f64, mix: &[MixEntry], discipline_active: bool) -> f64 {
    require_amount(amount);
    let mut impact: f64 = mix
        .iter()
        .map(|e| amount * e.allocation * sustainability_factor(e.asset))
        .sum();

    if discipline_active {
        impact *= DISCIPLINE_BONUS;
    }

    round_to(impact, 3)
}
