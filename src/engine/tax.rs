//! Tax-net-return calculation per asset class.
//!
//! Flat illustrative rates, not real tax law:
//!
//! | Asset  | Rate  |
//! |--------|-------|
//! | equity | 12.5% |
//! | crypto | 30%   |
//! | esg    | 25%   |

use serde::{Deserialize, Serialize};

use super::require_amount;

/// Asset classes the system stages capital into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Crypto,
    Esg,
}

impl AssetClass {
    pub const ALL: [AssetClass; 3] = [AssetClass::Equity, AssetClass::Crypto, AssetClass::Esg];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Crypto => "crypto",
            AssetClass::Esg => "esg",
        }
    }

    pub fn tax_rate(&self) -> f64 {
        match self {
            AssetClass::Equity => 0.125,
            AssetClass::Crypto => 0.30,
            AssetClass::Esg => 0.25,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equity" => Some(AssetClass::Equity),
            "crypto" => Some(AssetClass::Crypto),
            "esg" => Some(AssetClass::Esg),
            _ => None,
        }
    }
}

/// Gross/tax/net breakdown for a single amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetReturn {
    pub gross: f64,
    pub tax: f64,
    pub net: f64,
    pub tax_rate: f64,
}

/// Apply the flat rate for `asset` to `amount`.
pub fn compute_net(amount: f64, asset: AssetClass) -> NetReturn {
    require_amount(amount);
    let tax_rate = asset.tax_rate();
    let tax = amount * tax_rate;
    NetReturn {
        gross: amount,
        tax,
        net: amount - tax,
        tax_rate,
    }
}

/// Net-return preview for every asset class at the same amount.
pub fn preview(amount: f64) -> Vec<(AssetClass, NetReturn)> {
    AssetClass::ALL
        .iter()
        .map(|&asset| (asset, compute_net(amount, asset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_crypto_net_return() {
        let r = compute_net(10_000.0, AssetClass::Crypto);
        assert!(approx(r.gross, 10_000.0));
        assert!(approx(r.tax, 3_000.0));
        assert!(approx(r.net, 7_000.0));
        assert!(approx(r.tax_rate, 0.3));
    }

    #[test]
    fn test_equity_and_esg_rates() {
        let eq = compute_net(8_000.0, AssetClass::Equity);
        assert!(approx(eq.tax, 1_000.0));
        assert!(approx(eq.net, 7_000.0));

        let esg = compute_net(8_000.0, AssetClass::Esg);
        assert!(approx(esg.tax, 2_000.0));
        assert!(approx(esg.net, 6_000.0));
    }

    #[test]
    fn test_zero_amount() {
        let r = compute_net(0.0, AssetClass::Equity);
        assert_eq!(r.tax, 0.0);
        assert_eq!(r.net, 0.0);
    }

    #[test]
    fn test_preview_covers_all_assets() {
        let rows = preview(10_000.0);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|(_, r)| approx(r.gross, 10_000.0)));
    }

    #[test]
    #[should_panic]
    fn test_negative_amount_fails_fast() {
        compute_net(-1.0, AssetClass::Crypto);
    }

    #[test]
    fn test_parse_asset() {
        assert_eq!(AssetClass::parse("ESG"), Some(AssetClass::Esg));
        assert_eq!(AssetClass::parse("bonds"), None);
    }
}
