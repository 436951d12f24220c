//! Simulation runner implementing the step-based event loop.
//!
//! The simulation owns every token and affiliate, the master random source
//! and the event countdowns. Each step runs in a fixed order:
//!
//! 1. Due curve switches (per token, independently scheduled)
//! 2. Due parameter drift (all tokens)
//! 3. Affiliates in id order: fresh market snapshot, decide, execute
//! 4. Due commission adjustment (every affiliate)
//! 5. Trend windows fed with step-close prices, snapshot recorded
//!
//! Curve events land before trading so affiliates react to the updated
//! curve within the same step. Every trade and curve failure is recovered
//! inside the step: logged, reported to hooks and counted.

use std::sync::Arc;

use agents::{Affiliate, MarketData, RollingWindow, TokenQuote};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sim_core::{CurveKind, Token};
use tracing::{debug, info, warn};
use types::{AffiliateId, Fill, Tick, TokenId};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::history::{
    AffiliateState, AffiliateSummary, SimulationReport, StepSnapshot, TokenState, TokenSummary,
};
use crate::hooks::{CurveEvent, CurveEventKind, HookRunner, OrderRejection, SimulationHook};
use crate::schedule::EventSchedule;

/// Running counters for the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Next step to run (equals steps completed).
    pub tick: Tick,
    pub total_fills: u64,
    pub total_orders: u64,
    pub rejected_orders: u64,
    pub curve_switches: u64,
    pub parameter_drifts: u64,
    pub rejected_curve_events: u64,
    pub commission_adjustments: u64,
}

/// The main simulation runner.
pub struct Simulation {
    config: SimulationConfig,
    tokens: Vec<Token>,
    affiliates: Vec<Affiliate>,
    /// Step-close prices per token, indexed like `tokens`.
    trend_windows: Vec<RollingWindow>,
    schedule: EventSchedule,
    /// Master random source for curve events and seeding affiliates.
    rng: StdRng,
    tick: Tick,
    stats: SimulationStats,
    history: Vec<StepSnapshot>,
    hooks: HookRunner,
}

impl Simulation {
    /// Validate `config` and build the initial state.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let tokens: Vec<Token> = (0..config.num_tokens)
            .map(|i| {
                let id = TokenId(i as u32);
                Token::with_initial_price(
                    id,
                    id.default_name(),
                    CurveKind::random(&mut rng),
                    config.initial_price,
                    config.market,
                )
            })
            .collect();

        let affiliates = (0..config.num_affiliates)
            .map(|i| {
                let affiliate_config = config.affiliates.config_for(
                    i,
                    config.num_affiliates,
                    config.initial_commission_rate,
                );
                Affiliate::with_seed(AffiliateId(i as u32), affiliate_config, rng.random())
            })
            .collect();

        let trend_windows = (0..config.num_tokens)
            .map(|_| RollingWindow::new(config.affiliates.trend.window))
            .collect();

        let schedule = EventSchedule::new(
            &mut rng,
            config.num_tokens,
            &config.curves,
            config.commission.adjustment_interval,
        );

        info!(
            tokens = config.num_tokens,
            affiliates = config.num_affiliates,
            whales = config.affiliates.whale_count(config.num_affiliates),
            steps = config.num_simulation_steps,
            seed = ?config.seed,
            "simulation initialised"
        );
        for token in &tokens {
            debug!(token = %token.name(), curve = %token.curve(), price = token.price(), "token created");
        }

        Ok(Self {
            config,
            tokens,
            affiliates,
            trend_windows,
            schedule,
            rng,
            tick: 0,
            stats: SimulationStats::default(),
            history: Vec::new(),
            hooks: HookRunner::new(),
        })
    }

    /// Register an observer. Hooks are called in registration order.
    pub fn add_hook(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.add(hook);
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    pub fn affiliates(&self) -> &[Affiliate] {
        &self.affiliates
    }

    pub fn affiliate(&self, id: AffiliateId) -> Option<&Affiliate> {
        self.affiliates.get(id.index())
    }

    /// Steps completed so far.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Snapshots recorded at the end of every completed step.
    pub fn history(&self) -> &[StepSnapshot] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.config.num_simulation_steps
    }

    /// Run every remaining step and return the final report.
    pub fn run(&mut self) -> SimulationReport {
        while !self.is_finished() {
            self.step();
        }
        let report = self.report();
        info!(
            steps = report.steps_completed,
            fills = report.stats.total_fills,
            rejected = report.stats.rejected_orders,
            "simulation complete"
        );
        self.hooks.on_simulation_end(&report);
        report
    }

    /// Run one step and return the fills it produced. Does nothing once the
    /// configured number of steps has been reached.
    pub fn step(&mut self) -> Vec<Fill> {
        if self.is_finished() {
            return Vec::new();
        }
        let tick = self.tick;
        self.hooks.on_step_start(tick);
        for token in &mut self.tokens {
            token.set_tick(tick);
        }

        self.apply_curve_switches(tick);
        if self.schedule.drift_due() {
            self.apply_parameter_drift(tick);
        }

        let mut fills = Vec::new();
        let mut rejected = 0;
        for index in 0..self.affiliates.len() {
            let (step_fills, step_rejected) = self.run_affiliate(index, tick);
            fills.extend(step_fills);
            rejected += step_rejected;
        }

        if self.schedule.commission_due() {
            self.adjust_commissions(tick);
        }

        for (window, token) in self.trend_windows.iter_mut().zip(&self.tokens) {
            window.push(token.price());
        }
        let snapshot = StepSnapshot {
            tick,
            tokens: self.tokens.iter().map(TokenState::capture).collect(),
            affiliates: self.affiliates.iter().map(AffiliateState::capture).collect(),
            fills: fills.len(),
            rejected_orders: rejected,
        };
        self.hooks.on_step_end(&snapshot);
        self.history.push(snapshot);

        self.tick += 1;
        self.stats.tick = self.tick;

        if self.config.verbose {
            info!(tick, fills = fills.len(), rejected, "step complete");
        } else {
            debug!(tick, fills = fills.len(), rejected, "step complete");
        }
        fills
    }

    /// Final state of every token and affiliate.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            steps_completed: self.tick,
            seed: self.config.seed,
            tokens: self.tokens.iter().map(TokenSummary::capture).collect(),
            affiliates: self
                .affiliates
                .iter()
                .map(|affiliate| AffiliateSummary::capture(affiliate, &self.tokens))
                .collect(),
            stats: self.stats.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Step phases
    // ─────────────────────────────────────────────────────────────────────────

    fn apply_curve_switches(&mut self, tick: Tick) {
        for index in self.schedule.due_curve_switches(&mut self.rng) {
            let token = &mut self.tokens[index];
            let from = token.curve_kind();
            let kind = match token.switch_to_next_curve(&self.config.curves) {
                Ok(_) => {
                    self.stats.curve_switches += 1;
                    CurveEventKind::Switched {
                        from,
                        to: token.curve_kind(),
                    }
                }
                Err(err) => {
                    warn!(token = %token.name(), error = %err, "curve switch rejected");
                    self.stats.rejected_curve_events += 1;
                    CurveEventKind::SwitchRejected {
                        reason: err.to_string(),
                    }
                }
            };
            let event = CurveEvent {
                tick,
                token: token.id(),
                kind,
                price: token.price(),
            };
            self.hooks.on_curve_event(&event);
        }
    }

    fn apply_parameter_drift(&mut self, tick: Tick) {
        let mut drifted = 0;
        for token in &mut self.tokens {
            let kind = match token.drift_parameters(&mut self.rng, &self.config.curves) {
                Ok(()) => {
                    drifted += 1;
                    self.stats.parameter_drifts += 1;
                    CurveEventKind::Drifted
                }
                Err(err) => {
                    warn!(token = %token.name(), error = %err, "parameter drift rejected");
                    self.stats.rejected_curve_events += 1;
                    CurveEventKind::DriftRejected {
                        reason: err.to_string(),
                    }
                }
            };
            self.hooks.on_curve_event(&CurveEvent {
                tick,
                token: token.id(),
                kind,
                price: token.price(),
            });
        }
        info!(tick, drifted, tokens = self.tokens.len(), "curve parameters drifted");
    }

    /// One affiliate's turn. Returns its fills and the number of rejected
    /// orders.
    fn run_affiliate(&mut self, index: usize, tick: Tick) -> (Vec<Fill>, usize) {
        let market = capture_market(tick, &self.tokens, &self.trend_windows);
        let affiliate = &mut self.affiliates[index];
        let orders = affiliate.decide_orders(&market);
        self.stats.total_orders += orders.len() as u64;

        let mut fills = Vec::with_capacity(orders.len());
        let mut rejected = 0;
        for order in orders {
            let Some(token) = self.tokens.get_mut(order.token.index()) else {
                continue;
            };
            match affiliate.execute(&order, token, tick) {
                Ok(fill) => {
                    self.stats.total_fills += 1;
                    self.hooks.on_fill(&fill);
                    fills.push(fill);
                }
                Err(error) => {
                    rejected += 1;
                    self.stats.rejected_orders += 1;
                    self.hooks.on_order_rejected(&OrderRejection {
                        tick,
                        affiliate: affiliate.id(),
                        order,
                        error,
                    });
                }
            }
        }
        (fills, rejected)
    }

    fn adjust_commissions(&mut self, tick: Tick) {
        for affiliate in &mut self.affiliates {
            let adjustment = affiliate.adjust_commission(&self.config.commission, tick);
            self.stats.commission_adjustments += 1;
            self.hooks.on_commission_adjusted(&adjustment);
        }
    }
}

/// Prices as they stand right now, with each token's trend reference.
fn capture_market(tick: Tick, tokens: &[Token], windows: &[RollingWindow]) -> MarketData {
    let quotes = tokens
        .iter()
        .zip(windows)
        .map(|(token, window)| TokenQuote::from_token(token, window.mean()))
        .collect();
    MarketData::new(tick, quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulationError;

    fn seeded(steps: u64) -> Simulation {
        Simulation::new(SimulationConfig::new().with_steps(steps).with_seed(42)).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Simulation::new(SimulationConfig::new().with_tokens(0));
        assert!(matches!(
            result,
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_initial_state() {
        let sim = seeded(10);
        assert_eq!(sim.tokens().len(), 5);
        assert_eq!(sim.affiliates().len(), 5);
        for token in sim.tokens() {
            assert_eq!(token.supply(), 10_000.0);
            assert!((token.price() - 1.0).abs() < 1e-9);
        }
        assert_eq!(
            sim.affiliates()
                .iter()
                .filter(|a| a.strategy() == agents::StrategyKind::Whale)
                .count(),
            1
        );
        assert_eq!(sim.tick(), 0);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_step_advances_and_records() {
        let mut sim = seeded(3);
        sim.step();
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.history()[0].tick, 0);
        assert_eq!(sim.history()[0].tokens.len(), 5);
    }

    #[test]
    fn test_step_after_finish_is_noop() {
        let mut sim = seeded(2);
        sim.run();
        assert!(sim.is_finished());
        let fills = sim.step();
        assert!(fills.is_empty());
        assert_eq!(sim.tick(), 2);
        assert_eq!(sim.history().len(), 2);
    }

    #[test]
    fn test_commission_adjusts_on_interval() {
        let mut sim = seeded(25);
        sim.run();
        // Steps 9 and 19, every affiliate
        assert_eq!(sim.stats().commission_adjustments, 10);
        for affiliate in sim.affiliates() {
            let ticks: Vec<Tick> = affiliate
                .commission_rate_history()
                .iter()
                .map(|a| a.tick)
                .collect();
            assert_eq!(ticks, vec![9, 19]);
        }
    }

    #[test]
    fn test_drift_fires_every_interval() {
        let mut sim = seeded(45);
        sim.run();
        let stats = sim.stats();
        // Steps 19 and 39, every token
        assert_eq!(stats.parameter_drifts + stats.rejected_curve_events, 10);
        assert_eq!(stats.curve_switches, 0);
    }

    #[test]
    fn test_market_capture_uses_trend_window() {
        let mut sim = seeded(2);
        sim.step();
        let market = capture_market(1, &sim.tokens, &sim.trend_windows);
        for (quote, token) in market.quotes.iter().zip(sim.tokens()) {
            assert_eq!(quote.price, token.price());
            assert_eq!(quote.reference, Some(token.price()));
        }
    }
}
