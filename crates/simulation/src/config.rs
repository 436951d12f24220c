//! Simulation configuration options.

use agents::{AffiliateConfig, RebalancePolicy, StrategyProfile, TrendPolicy};
use serde::{Deserialize, Serialize};
use sim_core::CurveKind;
use types::{CommissionPolicy, CurveSchedule, MarketConstants};

use crate::error::{Result, SimulationError};

/// How the affiliate population is split and how each class trades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffiliateSettings {
    /// Fraction of affiliates (the lowest ids) that trade as whales.
    pub whale_fraction: f64,
    pub regular: StrategyProfile,
    pub whale: StrategyProfile,
    pub trend: TrendPolicy,
    pub rebalance: RebalancePolicy,
}

impl Default for AffiliateSettings {
    fn default() -> Self {
        Self {
            whale_fraction: 0.2,
            regular: StrategyProfile::regular(),
            whale: StrategyProfile::whale(),
            trend: TrendPolicy::default(),
            rebalance: RebalancePolicy::default(),
        }
    }
}

impl AffiliateSettings {
    /// Number of whales among `num_affiliates`.
    pub fn whale_count(&self, num_affiliates: usize) -> usize {
        ((num_affiliates as f64) * self.whale_fraction).floor() as usize
    }

    /// Configuration for the affiliate at `index`.
    pub fn config_for(
        &self,
        index: usize,
        num_affiliates: usize,
        initial_commission_rate: f64,
    ) -> AffiliateConfig {
        let profile = if index < self.whale_count(num_affiliates) {
            self.whale
        } else {
            self.regular
        };
        AffiliateConfig {
            profile,
            trend: self.trend,
            rebalance: self.rebalance,
            initial_commission_rate,
        }
    }
}

/// Configuration for the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_simulation_steps: u64,
    pub num_tokens: usize,
    pub num_affiliates: usize,
    /// Starting price of every token at the initial supply.
    pub initial_price: f64,
    pub initial_commission_rate: f64,
    /// Master seed. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Log per-step progress at `info` instead of `debug`.
    pub verbose: bool,
    pub market: MarketConstants,
    pub commission: CommissionPolicy,
    pub curves: CurveSchedule,
    pub affiliates: AffiliateSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulation_steps: 100,
            num_tokens: 5,
            num_affiliates: 5,
            initial_price: 1.0,
            initial_commission_rate: 0.10,
            seed: None,
            verbose: false,
            market: MarketConstants::default(),
            commission: CommissionPolicy::default(),
            curves: CurveSchedule::default(),
            affiliates: AffiliateSettings::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_steps(mut self, steps: u64) -> Self {
        self.num_simulation_steps = steps;
        self
    }

    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.num_tokens = tokens;
        self
    }

    pub fn with_affiliates(mut self, affiliates: usize) -> Self {
        self.num_affiliates = affiliates;
        self
    }

    pub fn with_initial_price(mut self, price: f64) -> Self {
        self.initial_price = price;
        self
    }

    pub fn with_initial_commission_rate(mut self, rate: f64) -> Self {
        self.initial_commission_rate = rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_market(mut self, market: MarketConstants) -> Self {
        self.market = market;
        self
    }

    pub fn with_commission_policy(mut self, policy: CommissionPolicy) -> Self {
        self.commission = policy;
        self
    }

    pub fn with_curve_schedule(mut self, schedule: CurveSchedule) -> Self {
        self.curves = schedule;
        self
    }

    pub fn with_affiliate_settings(mut self, settings: AffiliateSettings) -> Self {
        self.affiliates = settings;
        self
    }

    /// Check every value once, collecting all problems into a single
    /// [`SimulationError::InvalidConfiguration`].
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.num_tokens == 0 {
            problems.push("num_tokens must be at least 1".to_string());
        }
        if !(self.initial_price.is_finite() && self.initial_price > 0.0) {
            problems.push(format!(
                "initial_price must be positive, got {}",
                self.initial_price
            ));
        }
        if !self.initial_commission_rate.is_finite()
            || !self.commission.contains(self.initial_commission_rate)
        {
            problems.push(format!(
                "initial_commission_rate {} outside [{}, {}]",
                self.initial_commission_rate, self.commission.min_rate, self.commission.max_rate
            ));
        }

        let market = &self.market;
        if !(market.initial_supply.is_finite() && market.initial_supply > 0.0) {
            problems.push(format!(
                "initial_supply must be positive, got {}",
                market.initial_supply
            ));
        }
        for (name, rate) in [
            ("transaction_fee_rate", market.transaction_fee_rate),
            ("burn_rate", market.burn_rate),
        ] {
            if !(0.0..1.0).contains(&rate) {
                problems.push(format!("{name} {rate} outside [0, 1)"));
            }
        }

        let commission = &self.commission;
        if commission.adjustment_interval == 0 {
            problems.push("commission adjustment_interval must be at least 1".to_string());
        }
        if !(commission.adjustment_step.is_finite() && commission.adjustment_step >= 0.0) {
            problems.push(format!(
                "commission adjustment_step must be non-negative, got {}",
                commission.adjustment_step
            ));
        }
        if !commission.investment_threshold.is_finite() {
            problems.push("commission investment_threshold must be finite".to_string());
        }
        if !(commission.min_rate >= 0.0 && commission.min_rate <= commission.max_rate)
            || !commission.max_rate.is_finite()
        {
            problems.push(format!(
                "commission bounds [{}, {}] are not an interval within [0, inf)",
                commission.min_rate, commission.max_rate
            ));
        }

        let curves = &self.curves;
        if curves.switch_interval_min == 0 || curves.switch_interval_min > curves.switch_interval_max
        {
            problems.push(format!(
                "curve switch interval [{}, {}] must be a non-empty range of positive steps",
                curves.switch_interval_min, curves.switch_interval_max
            ));
        }
        if curves.drift_interval == 0 {
            problems.push("curve drift_interval must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&curves.drift_spread) {
            problems.push(format!(
                "curve drift_spread {} outside [0, 1)",
                curves.drift_spread
            ));
        }
        if !(curves.horizon_multiple.is_finite() && curves.horizon_multiple >= 1.0) {
            problems.push(format!(
                "curve horizon_multiple must be at least 1, got {}",
                curves.horizon_multiple
            ));
        }

        let settings = &self.affiliates;
        if !(0.0..=1.0).contains(&settings.whale_fraction) {
            problems.push(format!(
                "whale_fraction {} outside [0, 1]",
                settings.whale_fraction
            ));
        }
        problems.extend(settings.regular.problems());
        problems.extend(settings.whale.problems());
        problems.extend(settings.trend.problems());
        problems.extend(settings.rebalance.problems());

        // Tokens start on a random kind, so every kind must be usable at the
        // configured starting point.
        if problems.is_empty() {
            let horizon = curves.validation_horizon(market.initial_supply, market.initial_supply);
            for kind in CurveKind::ALL {
                let curve = kind
                    .default_curve()
                    .calibrated(market.initial_supply, self.initial_price);
                if let Err(err) = curve.validate(horizon) {
                    problems.push(format!("starting curve rejected: {err}"));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SimulationError::InvalidConfiguration(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.num_simulation_steps, 100);
        assert_eq!(config.num_tokens, 5);
        assert_eq!(config.num_affiliates, 5);
        assert_eq!(config.initial_price, 1.0);
        assert_eq!(config.initial_commission_rate, 0.10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SimulationConfig::new()
            .with_steps(0)
            .with_tokens(2)
            .with_affiliates(10)
            .with_initial_price(2.5)
            .with_seed(42)
            .with_verbose(true);
        assert_eq!(config.num_simulation_steps, 0);
        assert_eq!(config.num_tokens, 2);
        assert_eq!(config.seed, Some(42));
        assert!(config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let config = SimulationConfig::new()
            .with_tokens(0)
            .with_initial_price(-1.0)
            .with_initial_commission_rate(0.5);
        match config.validate() {
            Err(SimulationError::InvalidConfiguration(msg)) => {
                assert!(msg.contains("num_tokens"), "{msg}");
                assert!(msg.contains("initial_price"), "{msg}");
                assert!(msg.contains("initial_commission_rate"), "{msg}");
            }
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_rules() {
        let config = SimulationConfig::new().with_market(MarketConstants::default().with_fee_rate(1.5));
        assert!(config.validate().is_err());

        let config = SimulationConfig::new()
            .with_curve_schedule(CurveSchedule::default().with_switch_interval(10, 5));
        assert!(config.validate().is_err());

        let config = SimulationConfig::new().with_curve_schedule(CurveSchedule::default().with_drift_interval(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unusable_starting_curve() {
        // Exponential overflows long before ten times this supply
        let config = SimulationConfig::new()
            .with_market(MarketConstants::default().with_initial_supply(1_000_000.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_whale_split() {
        let settings = AffiliateSettings::default();
        assert_eq!(settings.whale_count(5), 1);
        assert_eq!(settings.whale_count(4), 0);
        assert_eq!(settings.whale_count(10), 2);

        let whale = settings.config_for(0, 5, 0.1);
        let regular = settings.config_for(1, 5, 0.1);
        assert_eq!(whale.profile.kind, agents::StrategyKind::Whale);
        assert_eq!(regular.profile.kind, agents::StrategyKind::Regular);
    }

    #[test]
    fn test_json_roundtrip_and_partial_documents() {
        let config = SimulationConfig::default().with_seed(7);
        let json = serde_json::to_string(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: SimulationConfig =
            serde_json::from_str(r#"{"num_simulation_steps": 250, "seed": 3}"#).unwrap();
        assert_eq!(partial.num_simulation_steps, 250);
        assert_eq!(partial.seed, Some(3));
        assert_eq!(partial.num_tokens, 5);
    }
}
