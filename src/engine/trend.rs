//! Market trend synthesis at the staging/strike boundary.
//!
//! There is no market feed behind this: confidence and volatility are drawn
//! from an injected RNG and bounded, then classified into an entry signal.
//! Seed the RNG to make assessments reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::round_to;

pub const CONFIDENCE_MIN: u8 = 60;
pub const CONFIDENCE_MAX: u8 = 100;

/// Coarse market-timing classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySignal {
    Strong,
    Moderate,
    Weak,
}

impl EntrySignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySignal::Strong => "strong",
            EntrySignal::Moderate => "moderate",
            EntrySignal::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendAssessment {
    /// 60..=100
    pub confidence: u8,
    /// 0.0..=1.0, two decimals
    pub volatility: f64,
    pub entry_signal: EntrySignal,
}

/// First match wins: strong needs both high confidence and calm volatility.
pub fn classify(confidence: u8, volatility: f64) -> EntrySignal {
    if confidence > 80 && volatility < 0.4 {
        EntrySignal::Strong
    } else if confidence > 70 {
        EntrySignal::Moderate
    } else {
        EntrySignal::Weak
    }
}

/// Produces trend assessments from an owned random source.
#[derive(Debug, Clone)]
pub struct TrendSynthesizer<R: Rng> {
    rng: R,
    invocations: u64,
}

impl TrendSynthesizer<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> TrendSynthesizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, invocations: 0 }
    }

    pub fn synthesize(&mut self) -> TrendAssessment {
        self.invocations += 1;
        let confidence = self.rng.gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX);
        let volatility = round_to(self.rng.gen_range(0.0..1.0), 2);
        TrendAssessment {
            confidence,
            volatility,
            entry_signal: classify(confidence, volatility),
        }
    }

    /// Number of assessments produced so far.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_order() {
        assert_eq!(classify(81, 0.39), EntrySignal::Strong);
        assert_eq!(classify(81, 0.40), EntrySignal::Moderate);
        assert_eq!(classify(80, 0.10), EntrySignal::Moderate);
        assert_eq!(classify(71, 0.90), EntrySignal::Moderate);
        assert_eq!(classify(70, 0.10), EntrySignal::Weak);
        assert_eq!(classify(60, 0.00), EntrySignal::Weak);
    }

    #[test]
    fn test_bounds_hold_over_many_draws() {
        let mut synth = TrendSynthesizer::seeded(7);
        for _ in 0..2_000 {
            let t = synth.synthesize();
            assert!((CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&t.confidence));
            assert!((0.0..=1.0).contains(&t.volatility));
            assert_eq!(round_to(t.volatility, 2), t.volatility);
            assert_eq!(t.entry_signal, classify(t.confidence, t.volatility));
        }
        assert_eq!(synth.invocations(), 2_000);
    }

    #[test]
    fn test_same_seed_same_assessment() {
        let mut a = TrendSynthesizer::seeded(42);
        let mut b = TrendSynthesizer::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.synthesize(), b.synthesize());
        }
    }
}
