//! Named configuration presets for the CLI.
//!
//! Each preset starts from [`SimulationConfig::default`] and changes only what
//! makes it distinct. Command-line flags are applied on top of the preset.

use clap::ValueEnum;
use simulation::{AffiliateSettings, SimulationConfig};
use types::MarketConstants;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// The stock economy: 100 steps, 5 tokens, 5 affiliates.
    #[default]
    Default,
    /// Short seeded run with per-step progress logging.
    Demo,
    /// Long enough for curve switches to fire.
    LongRun,
    /// Half of the affiliates trade as whales.
    WhaleHeavy,
    /// Quadrupled fees and burns.
    HighFee,
}

impl Preset {
    pub fn config(self) -> SimulationConfig {
        match self {
            Preset::Default => SimulationConfig::default(),
            Preset::Demo => SimulationConfig::default()
                .with_steps(30)
                .with_seed(42)
                .with_verbose(true),
            Preset::LongRun => SimulationConfig::default().with_steps(2_000),
            Preset::WhaleHeavy => SimulationConfig::default()
                .with_affiliates(10)
                .with_affiliate_settings(AffiliateSettings {
                    whale_fraction: 0.5,
                    ..AffiliateSettings::default()
                }),
            Preset::HighFee => {
                let market = MarketConstants::default();
                SimulationConfig::default().with_market(
                    market
                        .with_fee_rate(market.transaction_fee_rate * 4.0)
                        .with_burn_rate(market.burn_rate * 4.0),
                )
            }
        }
    }
}
