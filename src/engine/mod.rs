//! Staged-capital lifecycle engine with a composite behavioral gate.
//!
//! Architecture:
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Session    │────►│   Reducer    │────►│    Pulse     │──strike──► Trend
//! │ (load/save)  │     │  (pure fn)   │     │ (3 periods)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        ▲                    │
//!        │                    ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Commands   │◄────│ Triple Guard │────►│ Orchestrator │
//! │ (log/persist)│     │ (score gate) │     │ (holdings)   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Tax and sustainability scoring are display-side calculations, independent
//! of the flow above.
//!
//! Every function in this module is total over its documented domain.
//! Out-of-domain numbers (negative or non-finite amounts) are programming
//! errors and panic immediately.

pub mod events;
pub mod state;
pub mod reducer;
pub mod guard;
pub mod pulse;
pub mod trend;
pub mod tax;
pub mod sustainability;
pub mod orchestrator;
pub mod split;

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

pub(crate) fn require_amount(amount: f64) {
    assert!(
        amount.is_finite() && amount >= 0.0,
        "monetary amount must be finite and non-negative, got {}",
        amount
    );
}
