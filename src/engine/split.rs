//! Salary split into needs / wants / investments, and the fixed asset
//! allocation applied to staged capital at execution.

use serde::{Deserialize, Serialize};

use super::guard::RiskProfile;
use super::require_amount;

/// Share of executed capital per destination, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetAllocation {
    pub equity: u8,
    pub crypto: u8,
    pub esg: u8,
    pub liquid: u8,
}

pub const ASSET_ALLOCATION: AssetAllocation = AssetAllocation {
    equity: 40,
    crypto: 25,
    esg: 20,
    liquid: 15,
};

/// Whole-percentage budget buckets. Always sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalarySplit {
    pub needs: u8,
    pub wants: u8,
    pub investments: u8,
}

impl SalarySplit {
    pub fn new(needs: u8, wants: u8) -> Self {
        assert!(
            u16::from(needs) + u16::from(wants) <= 100,
            "needs + wants exceeds 100%: {} + {}",
            needs,
            wants
        );
        Self {
            needs,
            wants,
            investments: 100 - needs - wants,
        }
    }

    pub fn recommended(profile: RiskProfile) -> Self {
        match profile {
            RiskProfile::Conservative => Self::new(60, 25),
            RiskProfile::Balanced => Self::new(50, 30),
            RiskProfile::Aggressive => Self::new(40, 25),
        }
    }

    /// Change needs; investments absorbs the difference.
    pub fn with_needs(&self, needs: u8) -> Self {
        Self::new(needs, self.wants)
    }

    /// Change wants; investments absorbs the difference.
    pub fn with_wants(&self, wants: u8) -> Self {
        Self::new(self.needs, wants)
    }
}

impl Default for SalarySplit {
    fn default() -> Self {
        Self::new(50, 30)
    }
}

/// Amount staged each period from a monthly salary.
pub fn monthly_contribution(salary: f64, split: &SalarySplit) -> f64 {
    require_amount(salary);
    salary * f64::from(split.investments) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_sums_to_100() {
        let a = ASSET_ALLOCATION;
        assert_eq!(u16::from(a.equity) + u16::from(a.crypto) + u16::from(a.esg) + u16::from(a.liquid), 100);
    }

    #[test]
    fn test_recommendations() {
        assert_eq!(SalarySplit::recommended(RiskProfile::Conservative).investments, 15);
        assert_eq!(SalarySplit::recommended(RiskProfile::Balanced), SalarySplit::default());
        assert_eq!(SalarySplit::recommended(RiskProfile::Aggressive).investments, 35);
    }

    #[test]
    fn test_adjusting_bucket_rebalances_investments() {
        let s = SalarySplit::default().with_needs(40);
        assert_eq!((s.needs, s.wants, s.investments), (40, 30, 30));
        let s = s.with_wants(60);
        assert_eq!((s.needs, s.wants, s.investments), (40, 60, 0));
    }

    #[test]
    #[should_panic]
    fn test_overcommitted_split_fails_fast() {
        SalarySplit::new(70, 40);
    }

    #[test]
    fn test_monthly_contribution() {
        assert_eq!(monthly_contribution(50_000.0, &SalarySplit::default()), 10_000.0);
        assert_eq!(monthly_contribution(0.0, &SalarySplit::default()), 0.0);
    }
}
