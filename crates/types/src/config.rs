//! Rule configuration for the token economy.
//!
//! These structures hold the "physics" of the economy: trade fees and burns,
//! the commission adaptation rule, and the bonding-curve event schedule.
//! Defaults come from the constants at the top of this module.

use serde::{Deserialize, Serialize};

// =============================================================================
// Constants
// =============================================================================

/// Supply every token starts with.
pub const INITIAL_SUPPLY: f64 = 10_000.0;
/// Fee charged on every trade (0.25%).
pub const TRANSACTION_FEE_RATE: f64 = 0.0025;
/// Fraction of supply burned after every trade (0.02%).
pub const BURN_RATE: f64 = 0.0002;

/// Steps between commission-rate adaptations.
pub const COMMISSION_DYNAMICS_STEP: u64 = 10;
/// Commission rate change per adaptation.
pub const COMMISSION_ADJUSTMENT_STEP: f64 = 0.0005;
/// Average investment above which the commission rate rises.
pub const INVESTMENT_THRESHOLD: f64 = 50.0;
pub const COMMISSION_RATE_MIN: f64 = 0.0;
pub const COMMISSION_RATE_MAX: f64 = 0.20;

/// Whale order sizes, in base currency.
pub const WHALE_INVESTMENT_RANGE: (f64, f64) = (5_000.0, 10_000.0);

/// Bounds for the randomised per-token curve-switch interval.
pub const CURVE_SWITCH_INTERVAL_RANGE: (u64, u64) = (500, 1_000);
/// Steps between bonding-curve parameter drifts.
pub const PARAMETER_DRIFT_INTERVAL: u64 = 20;

// =============================================================================
// Market Constants
// =============================================================================

/// Fee and burn mechanics shared by every token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketConstants {
    /// Supply each token is created with.
    pub initial_supply: f64,
    /// Fraction of each trade's gross value kept as fee.
    pub transaction_fee_rate: f64,
    /// Fraction of supply removed after each trade.
    pub burn_rate: f64,
}

impl Default for MarketConstants {
    fn default() -> Self {
        Self {
            initial_supply: INITIAL_SUPPLY,
            transaction_fee_rate: TRANSACTION_FEE_RATE,
            burn_rate: BURN_RATE,
        }
    }
}

impl MarketConstants {
    /// Set the transaction fee rate.
    pub fn with_fee_rate(mut self, rate: f64) -> Self {
        self.transaction_fee_rate = rate;
        self
    }

    /// Set the burn rate.
    pub fn with_burn_rate(mut self, rate: f64) -> Self {
        self.burn_rate = rate;
        self
    }

    /// Set the initial supply.
    pub fn with_initial_supply(mut self, supply: f64) -> Self {
        self.initial_supply = supply;
        self
    }
}

// =============================================================================
// Commission Policy
// =============================================================================

/// Threshold rule that nudges an affiliate's commission rate.
///
/// Every `adjustment_interval` steps the affiliate's average investment over
/// the interval is compared against `investment_threshold`: above it the
/// rate rises by `adjustment_step`, otherwise it falls by the same amount.
/// The result is always clamped to `[min_rate, max_rate]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionPolicy {
    pub adjustment_interval: u64,
    pub adjustment_step: f64,
    pub investment_threshold: f64,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            adjustment_interval: COMMISSION_DYNAMICS_STEP,
            adjustment_step: COMMISSION_ADJUSTMENT_STEP,
            investment_threshold: INVESTMENT_THRESHOLD,
            min_rate: COMMISSION_RATE_MIN,
            max_rate: COMMISSION_RATE_MAX,
        }
    }
}

impl CommissionPolicy {
    /// Clamp a rate into the allowed band.
    #[inline]
    pub fn clamp(&self, rate: f64) -> f64 {
        rate.clamp(self.min_rate, self.max_rate)
    }

    /// Apply one adaptation to `rate` given the interval's average investment.
    pub fn adjusted(&self, rate: f64, average_investment: f64) -> f64 {
        let next = if average_investment > self.investment_threshold {
            rate + self.adjustment_step
        } else {
            rate - self.adjustment_step
        };
        self.clamp(next)
    }

    /// Whether `rate` lies inside the allowed band.
    pub fn contains(&self, rate: f64) -> bool {
        rate >= self.min_rate && rate <= self.max_rate
    }
}

// =============================================================================
// Curve Schedule
// =============================================================================

/// Timing and magnitude of bonding-curve events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSchedule {
    /// Smallest interval between curve switches for one token.
    pub switch_interval_min: u64,
    /// Largest interval between curve switches for one token.
    pub switch_interval_max: u64,
    /// Steps between parameter drifts (applies to all tokens).
    pub drift_interval: u64,
    /// Relative half-width of the drift band around the anchor parameters.
    pub drift_spread: f64,
    /// Curves are validated over `[0, horizon_multiple * initial_supply]`
    /// (or twice the current supply, if larger).
    pub horizon_multiple: f64,
}

impl Default for CurveSchedule {
    fn default() -> Self {
        Self {
            switch_interval_min: CURVE_SWITCH_INTERVAL_RANGE.0,
            switch_interval_max: CURVE_SWITCH_INTERVAL_RANGE.1,
            drift_interval: PARAMETER_DRIFT_INTERVAL,
            drift_spread: 0.2,
            horizon_multiple: 10.0,
        }
    }
}

impl CurveSchedule {
    /// Set the curve-switch interval bounds.
    pub fn with_switch_interval(mut self, min: u64, max: u64) -> Self {
        self.switch_interval_min = min;
        self.switch_interval_max = max;
        self
    }

    /// Set the drift interval.
    pub fn with_drift_interval(mut self, interval: u64) -> Self {
        self.drift_interval = interval;
        self
    }

    /// Set the drift spread.
    pub fn with_drift_spread(mut self, spread: f64) -> Self {
        self.drift_spread = spread;
        self
    }

    /// Upper end of the supply range a curve must stay well-behaved on.
    pub fn validation_horizon(&self, initial_supply: f64, current_supply: f64) -> f64 {
        (self.horizon_multiple * initial_supply).max(2.0 * current_supply)
    }
}
