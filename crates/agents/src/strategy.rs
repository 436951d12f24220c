//! Strategy policies: how often an affiliate trades, how large, and which side.
//!
//! Regular and whale affiliates share one [`Affiliate`](crate::Affiliate)
//! implementation and differ only in the [`StrategyProfile`] they carry.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use types::{OrderSide, WHALE_INVESTMENT_RANGE};

/// Strategy class of an affiliate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Regular,
    Whale,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Regular => write!(f, "regular"),
            StrategyKind::Whale => write!(f, "whale"),
        }
    }
}

// =============================================================================
// Strategy Profile
// =============================================================================

/// Order frequency and sizing for one strategy class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub kind: StrategyKind,
    /// Probability of trading at all on a given step.
    pub trade_probability: f64,
    /// Inclusive bounds on the number of trades on a trading step.
    pub min_trades: u32,
    pub max_trades: u32,
    /// Inclusive bounds on the base-currency notional of one trade.
    pub min_order_size: f64,
    pub max_order_size: f64,
    /// Starting base-currency balance.
    pub initial_balance: f64,
}

impl StrategyProfile {
    /// 1-2 small trades every step.
    pub fn regular() -> Self {
        Self {
            kind: StrategyKind::Regular,
            trade_probability: 1.0,
            min_trades: 1,
            max_trades: 2,
            min_order_size: 10.0,
            max_order_size: 15.0,
            initial_balance: 1_000.0,
        }
    }

    /// At most one bulk trade per step, on half of the steps.
    pub fn whale() -> Self {
        Self {
            kind: StrategyKind::Whale,
            trade_probability: 0.5,
            min_trades: 1,
            max_trades: 1,
            min_order_size: WHALE_INVESTMENT_RANGE.0,
            max_order_size: WHALE_INVESTMENT_RANGE.1,
            initial_balance: 50_000.0,
        }
    }

    pub fn with_order_size(mut self, min: f64, max: f64) -> Self {
        self.min_order_size = min;
        self.max_order_size = max;
        self
    }

    pub fn with_trades(mut self, min: u32, max: u32) -> Self {
        self.min_trades = min;
        self.max_trades = max;
        self
    }

    pub fn with_trade_probability(mut self, probability: f64) -> Self {
        self.trade_probability = probability;
        self
    }

    pub fn with_initial_balance(mut self, balance: f64) -> Self {
        self.initial_balance = balance;
        self
    }

    /// Number of trades to attempt this step.
    pub fn sample_trade_count<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if !rng.random_bool(self.trade_probability) {
            return 0;
        }
        if self.max_trades <= self.min_trades {
            self.min_trades
        } else {
            rng.random_range(self.min_trades..=self.max_trades)
        }
    }

    /// Base-currency notional of one trade.
    pub fn sample_order_size<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max_order_size <= self.min_order_size {
            self.min_order_size
        } else {
            rng.random_range(self.min_order_size..=self.max_order_size)
        }
    }

    /// Human-readable problems with the profile, if any.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !is_probability(self.trade_probability) {
            problems.push(format!(
                "{} trade_probability {} outside [0, 1]",
                self.kind, self.trade_probability
            ));
        }
        if self.min_trades > self.max_trades {
            problems.push(format!(
                "{} min_trades {} exceeds max_trades {}",
                self.kind, self.min_trades, self.max_trades
            ));
        }
        if !(self.min_order_size.is_finite() && self.min_order_size > 0.0)
            || !self.max_order_size.is_finite()
            || self.min_order_size > self.max_order_size
        {
            problems.push(format!(
                "{} order size range [{}, {}] is not a positive interval",
                self.kind, self.min_order_size, self.max_order_size
            ));
        }
        if !(self.initial_balance.is_finite() && self.initial_balance >= 0.0) {
            problems.push(format!(
                "{} initial_balance {} must be non-negative",
                self.kind, self.initial_balance
            ));
        }
        problems
    }
}

// =============================================================================
// Side Selection
// =============================================================================

/// Buy-the-dip side selection against a token's recent mean price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPolicy {
    /// Number of step-close prices in the reference mean.
    pub window: usize,
    /// Probability of buying when price is below the mean.
    pub buy_below_mean: f64,
    /// Probability of selling when price is at or above the mean.
    pub sell_above_mean: f64,
    /// Probability of buying before any close has been recorded.
    pub buy_without_history: f64,
}

impl Default for TrendPolicy {
    fn default() -> Self {
        Self {
            window: 5,
            buy_below_mean: 0.7,
            sell_above_mean: 0.7,
            buy_without_history: 0.6,
        }
    }
}

impl TrendPolicy {
    pub fn choose_side<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        price: f64,
        reference: Option<f64>,
    ) -> OrderSide {
        match reference {
            Some(mean) if price < mean => pick(rng, self.buy_below_mean, OrderSide::Buy),
            Some(_) => pick(rng, self.sell_above_mean, OrderSide::Sell),
            None => pick(rng, self.buy_without_history, OrderSide::Buy),
        }
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.window == 0 {
            problems.push("trend window must hold at least one price".to_string());
        }
        for (name, p) in [
            ("buy_below_mean", self.buy_below_mean),
            ("sell_above_mean", self.sell_above_mean),
            ("buy_without_history", self.buy_without_history),
        ] {
            if !is_probability(p) {
                problems.push(format!("trend {name} {p} outside [0, 1]"));
            }
        }
        problems
    }
}

/// Trend-independent maintenance sells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebalancePolicy {
    /// Per-holding probability of a rebalancing sell each step.
    pub probability: f64,
    /// Upper bound on the fraction of the holding sold.
    pub max_fraction: f64,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        Self {
            probability: 0.05,
            max_fraction: 0.05,
        }
    }
}

impl RebalancePolicy {
    /// Quantity of `held` to sell this step, if any.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, held: f64) -> Option<f64> {
        if held <= 0.0 || !rng.random_bool(self.probability) {
            return None;
        }
        let quantity = held * rng.random_range(0.0..=self.max_fraction);
        (quantity > 0.0).then_some(quantity)
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !is_probability(self.probability) {
            problems.push(format!(
                "rebalance probability {} outside [0, 1]",
                self.probability
            ));
        }
        if !is_probability(self.max_fraction) {
            problems.push(format!(
                "rebalance max_fraction {} outside [0, 1]",
                self.max_fraction
            ));
        }
        problems
    }
}

// =============================================================================
// Sampling helpers
// =============================================================================

// `Rng::random_bool` panics outside [0, 1]; every probability above is
// checked by `problems()` before a simulation is built.
fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

fn pick<R: Rng + ?Sized>(rng: &mut R, p: f64, preferred: OrderSide) -> OrderSide {
    if rng.random_bool(p) {
        preferred
    } else {
        preferred.opposite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn buy_share(policy: &TrendPolicy, price: f64, reference: Option<f64>) -> f64 {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let buys = (0..n)
            .filter(|_| policy.choose_side(&mut rng, price, reference) == OrderSide::Buy)
            .count();
        buys as f64 / n as f64
    }

    #[test]
    fn test_trend_policy_buys_the_dip() {
        let policy = TrendPolicy::default();
        assert!((buy_share(&policy, 0.9, Some(1.0)) - 0.7).abs() < 0.02);
        assert!((buy_share(&policy, 1.1, Some(1.0)) - 0.3).abs() < 0.02);
        assert!((buy_share(&policy, 1.0, None) - 0.6).abs() < 0.02);
    }

    #[test]
    fn test_trend_policy_degenerate_probabilities() {
        let always_buy = TrendPolicy {
            buy_below_mean: 1.0,
            sell_above_mean: 0.0,
            buy_without_history: 1.0,
            ..TrendPolicy::default()
        };
        assert_eq!(buy_share(&always_buy, 5.0, Some(1.0)), 1.0);
        assert_eq!(buy_share(&always_buy, 0.5, Some(1.0)), 1.0);
    }

    #[test]
    fn test_regular_profile_sampling() {
        let profile = StrategyProfile::regular();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            let count = profile.sample_trade_count(&mut rng);
            assert!((1..=2).contains(&count));
            let size = profile.sample_order_size(&mut rng);
            assert!((10.0..=15.0).contains(&size));
        }
    }

    #[test]
    fn test_whale_profile_sampling() {
        let profile = StrategyProfile::whale();
        let mut rng = StdRng::seed_from_u64(2);
        let mut idle = 0;
        for _ in 0..2_000 {
            match profile.sample_trade_count(&mut rng) {
                0 => idle += 1,
                1 => {}
                other => panic!("whale attempted {other} trades"),
            }
            let size = profile.sample_order_size(&mut rng);
            assert!((5_000.0..=10_000.0).contains(&size));
        }
        assert!((800..1_200).contains(&idle), "idle steps: {idle}");
    }

    #[test]
    fn test_fixed_size_profile() {
        let profile = StrategyProfile::regular()
            .with_order_size(80.0, 80.0)
            .with_trades(3, 3);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(profile.sample_order_size(&mut rng), 80.0);
        assert_eq!(profile.sample_trade_count(&mut rng), 3);
        assert!(profile.problems().is_empty());
    }

    #[test]
    fn test_rebalance_sample_bounds() {
        let policy = RebalancePolicy::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut fired = 0;
        for _ in 0..10_000 {
            if let Some(qty) = policy.sample(&mut rng, 100.0) {
                assert!(qty > 0.0 && qty <= 5.0);
                fired += 1;
            }
        }
        assert!((350..650).contains(&fired), "fired {fired} times");
        assert_eq!(policy.sample(&mut rng, 0.0), None);
    }

    #[test]
    fn test_rebalance_edge_policies() {
        let mut rng = StdRng::seed_from_u64(5);
        let never = RebalancePolicy {
            probability: 0.0,
            max_fraction: 0.05,
        };
        let nothing = RebalancePolicy {
            probability: 1.0,
            max_fraction: 0.0,
        };
        let whole = RebalancePolicy {
            probability: 1.0,
            max_fraction: 1.0,
        };
        for _ in 0..1_000 {
            assert_eq!(never.sample(&mut rng, 100.0), None);
            assert_eq!(nothing.sample(&mut rng, 100.0), None);
            if let Some(qty) = whole.sample(&mut rng, 100.0) {
                assert!(qty <= 100.0);
            }
        }
        assert!(never.problems().is_empty());
        assert!(nothing.problems().is_empty());
    }

    #[test]
    fn test_always_and_never_trading_profiles() {
        let mut rng = StdRng::seed_from_u64(6);
        let always = StrategyProfile::regular().with_trade_probability(1.0);
        let never = StrategyProfile::regular().with_trade_probability(0.0);
        for _ in 0..500 {
            assert!(always.sample_trade_count(&mut rng) >= 1);
            assert_eq!(never.sample_trade_count(&mut rng), 0);
        }
    }

    #[test]
    fn test_problems_reported() {
        let profile = StrategyProfile::whale()
            .with_order_size(10.0, 5.0)
            .with_trade_probability(1.5);
        assert_eq!(profile.problems().len(), 2);

        let trend = TrendPolicy {
            window: 0,
            ..TrendPolicy::default()
        };
        assert_eq!(trend.problems().len(), 1);

        let rebalance = RebalancePolicy {
            probability: -0.1,
            max_fraction: 0.05,
        };
        assert_eq!(rebalance.problems().len(), 1);
    }
}
