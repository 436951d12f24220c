//! Token Economy Sim - Main binary
//!
//! Runs the bonding-curve token economy to completion and prints a summary
//! of every token and affiliate, or the full report as JSON.
//!
//! Configuration is layered: a preset (or a JSON file via `--config`), then
//! individual flags / `SIM_*` environment variables on top.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use simulation::{MetricsHook, MetricsSnapshot, Simulation, SimulationConfig, SimulationReport};
use tracing_subscriber::EnvFilter;

use config::Preset;

/// Token Economy Sim - bonding-curve tokens traded by adaptive affiliates
#[derive(Parser, Debug)]
#[command(name = "token-economy-sim")]
#[command(about = "Simulates a bonding-curve token economy driven by affiliate traders")]
#[command(version)]
struct Args {
    /// Number of simulation steps
    #[arg(long, env = "SIM_STEPS")]
    steps: Option<u64>,

    /// Number of tokens
    #[arg(long, env = "SIM_TOKENS")]
    tokens: Option<usize>,

    /// Number of affiliates
    #[arg(long, env = "SIM_AFFILIATES")]
    affiliates: Option<usize>,

    /// Starting price of every token
    #[arg(long, env = "SIM_INITIAL_PRICE")]
    initial_price: Option<f64>,

    /// Starting commission rate of every affiliate
    #[arg(long, env = "SIM_INITIAL_COMMISSION_RATE")]
    initial_commission_rate: Option<f64>,

    /// Master RNG seed (random if omitted)
    #[arg(long, env = "SIM_SEED")]
    seed: Option<u64>,

    /// Named configuration preset
    #[arg(long, env = "SIM_PRESET", value_enum, default_value_t = Preset::Default)]
    preset: Preset,

    /// Load the full configuration from a JSON file instead of a preset
    #[arg(long, env = "SIM_CONFIG", conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long, env = "SIM_JSON")]
    json: bool,

    /// Log per-step progress at info level
    #[arg(long, env = "SIM_VERBOSE")]
    verbose: bool,
}

impl Args {
    /// Resolve the base configuration and apply flag overrides.
    fn build_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => self.preset.config(),
        };

        if let Some(steps) = self.steps {
            config = config.with_steps(steps);
        }
        if let Some(tokens) = self.tokens {
            config = config.with_tokens(tokens);
        }
        if let Some(affiliates) = self.affiliates {
            config = config.with_affiliates(affiliates);
        }
        if let Some(price) = self.initial_price {
            config = config.with_initial_price(price);
        }
        if let Some(rate) = self.initial_commission_rate {
            config = config.with_initial_commission_rate(rate);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.verbose {
            config = config.with_verbose(true);
        }
        Ok(config)
    }
}

/// Calculate the number of digits needed to display a number.
fn digit_width(n: usize) -> usize {
    if n == 0 {
        1
    } else {
        (n as f64).log10().floor() as usize + 1
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.build_config()?;

    if !args.json {
        print_banner(&config);
    }

    let mut sim = Simulation::new(config)?;
    let metrics = Arc::new(MetricsHook::new());
    sim.add_hook(metrics.clone());

    let start = Instant::now();
    let report = sim.run();
    let elapsed = start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &metrics.snapshot(), elapsed.as_secs_f64());
    }
    Ok(())
}

fn print_banner(config: &SimulationConfig) {
    let seed = config
        .seed
        .map_or_else(|| "random".to_string(), |s| s.to_string());
    eprintln!("╔═══════════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Token Economy Sim                                                    ║");
    eprintln!("╠═══════════════════════════════════════════════════════════════════════╣");
    eprintln!(
        "║  Steps: {:<8}  │  Tokens: {:<5}  │  Affiliates: {:<5}            ║",
        config.num_simulation_steps, config.num_tokens, config.num_affiliates
    );
    eprintln!(
        "║  Initial Price: {:<10.4}  │  Commission: {:<6.4}  │  Seed: {:<10} ║",
        config.initial_price, config.initial_commission_rate, seed
    );
    eprintln!(
        "║  Fee: {:<7.4}  │  Burn: {:<7.5}  │  Whales: {:<5}                       ║",
        config.market.transaction_fee_rate,
        config.market.burn_rate,
        config.affiliates.whale_count(config.num_affiliates)
    );
    eprintln!("╚═══════════════════════════════════════════════════════════════════════╝");
    eprintln!();
}

fn print_summary(report: &SimulationReport, metrics: &MetricsSnapshot, elapsed_secs: f64) {
    let token_width = report
        .tokens
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(5);
    let id_width = digit_width(report.affiliates.len());

    println!("Tokens after {} steps:", report.steps_completed);
    for token in &report.tokens {
        println!(
            "  {:<token_width$}  price {:>14.6}  supply {:>14.4}  curve {:<11}  trades {:>6}  fees {:>12.4}",
            token.name,
            token.price,
            token.supply,
            token.curve_kind.name(),
            token.trade_count,
            token.fees_collected,
        );
    }

    println!();
    println!("Affiliates:");
    for affiliate in &report.affiliates {
        println!(
            "  #{:<id_width$} {:<7}  balance {:>12.4}  net worth {:>12.4}  rate {:.4}  earned {:>10.6}  trades {:>5}  rejected {:>4}",
            affiliate.id.0,
            affiliate.strategy.to_string(),
            affiliate.balance,
            affiliate.net_worth,
            affiliate.commission_rate,
            affiliate.total_earned,
            affiliate.trades_executed,
            affiliate.orders_rejected,
        );
    }

    println!();
    println!(
        "Metrics: {} fills ({} buys / {} sells, {} rebalance), {} rejected, fill rate {:.1}%",
        metrics.total_fills,
        metrics.buys,
        metrics.sells,
        metrics.rebalance_sells,
        metrics.rejected_orders,
        metrics.fill_rate * 100.0,
    );
    println!(
        "         volume {:.2}, fees {:.4}, burned {:.4}, commissions {:.4}",
        metrics.volume, metrics.fees, metrics.burned, metrics.commissions_paid,
    );
    println!(
        "         {} curve switches, {} drifts, {} rejected curve events, {} commission adjustments",
        metrics.curve_switches,
        metrics.parameter_drifts,
        metrics.rejected_curve_events,
        metrics.commission_adjustments,
    );
    println!(
        "         {:.2} steps/s",
        report.steps_completed as f64 / elapsed_secs.max(1e-9)
    );
}
