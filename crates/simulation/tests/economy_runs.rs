//! Integration tests for full simulation runs.
//!
//! Tests drive the public `Simulation` API end to end and check the
//! properties that must hold after any sequence of steps: prices follow the
//! curves, wallets and supplies stay non-negative, commission rates stay in
//! bounds, and seeded runs are reproducible.

use std::sync::Arc;

use agents::CommissionAdjustment;
use parking_lot::Mutex;
use simulation::{
    CurveEvent, CurveEventKind, MetricsHook, OrderRejection, Simulation, SimulationConfig,
    SimulationHook, StepSnapshot,
};
use types::{CurveSchedule, Fill, OrderSide, Tick};

const EPS: f64 = 1e-9;

fn config(steps: u64, seed: u64) -> SimulationConfig {
    SimulationConfig::new().with_steps(steps).with_seed(seed)
}

/// Collects invariant violations seen at the end of every step.
#[derive(Default)]
struct InvariantHook {
    violations: Mutex<Vec<String>>,
    fills: Mutex<Vec<Fill>>,
    curve_events: Mutex<Vec<CurveEvent>>,
}

impl SimulationHook for InvariantHook {
    fn name(&self) -> &str {
        "Invariants"
    }

    fn on_fill(&self, fill: &Fill) {
        self.fills.lock().push(*fill);
    }

    fn on_curve_event(&self, event: &CurveEvent) {
        self.curve_events.lock().push(event.clone());
    }

    fn on_step_end(&self, snapshot: &StepSnapshot) {
        let mut violations = self.violations.lock();
        for token in &snapshot.tokens {
            let supply_ok = token.supply.is_finite() && token.supply >= 0.0;
            if !(supply_ok && token.price.is_finite() && token.price >= 0.0) {
                violations.push(format!("step {}: bad token state {token:?}", snapshot.tick));
            }
        }
        for affiliate in &snapshot.affiliates {
            if affiliate.balance < 0.0 {
                violations.push(format!("step {}: negative balance {affiliate:?}", snapshot.tick));
            }
            if affiliate.holdings.iter().any(|h| h.quantity < 0.0) {
                violations.push(format!("step {}: negative holding {affiliate:?}", snapshot.tick));
            }
            if !(0.0..=0.20).contains(&affiliate.commission_rate) {
                violations.push(format!("step {}: rate out of bounds {affiliate:?}", snapshot.tick));
            }
        }
    }
}

/// Phases of a step, in the order the runner must emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Start,
    Switch,
    Drift,
    Trade,
    Commission,
    End,
}

/// Records every hook call as `(tick, phase)` in arrival order.
#[derive(Default)]
struct OrderHook {
    events: Mutex<Vec<(Tick, Phase)>>,
}

impl OrderHook {
    fn push(&self, tick: Tick, phase: Phase) {
        self.events.lock().push((tick, phase));
    }
}

impl SimulationHook for OrderHook {
    fn name(&self) -> &str {
        "Order"
    }

    fn on_step_start(&self, tick: Tick) {
        self.push(tick, Phase::Start);
    }

    fn on_curve_event(&self, event: &CurveEvent) {
        let phase = match event.kind {
            CurveEventKind::Switched { .. } | CurveEventKind::SwitchRejected { .. } => {
                Phase::Switch
            }
            CurveEventKind::Drifted | CurveEventKind::DriftRejected { .. } => Phase::Drift,
        };
        self.push(event.tick, phase);
    }

    fn on_fill(&self, fill: &Fill) {
        self.push(fill.tick, Phase::Trade);
    }

    fn on_order_rejected(&self, rejection: &OrderRejection) {
        self.push(rejection.tick, Phase::Trade);
    }

    fn on_commission_adjusted(&self, adjustment: &CommissionAdjustment) {
        self.push(adjustment.tick, Phase::Commission);
    }

    fn on_step_end(&self, snapshot: &StepSnapshot) {
        self.push(snapshot.tick, Phase::End);
    }
}

/// A run of zero steps leaves the configured initial state untouched.
#[test]
fn test_zero_steps_leaves_initial_state() {
    let mut sim = Simulation::new(config(0, 1)).unwrap();
    let before = sim.report();
    assert!(sim.is_finished());

    let after = sim.run();
    assert_eq!(before, after);
    assert!(sim.history().is_empty());
    assert_eq!(after.steps_completed, 0);

    for token in &after.tokens {
        assert_eq!(token.supply, 10_000.0);
        assert!((token.price - 1.0).abs() < EPS);
        assert_eq!(token.trade_count, 0);
    }
    for affiliate in &after.affiliates {
        assert_eq!(affiliate.commission_rate, 0.10);
        assert_eq!(affiliate.total_earned, 0.0);
        assert!(affiliate.holdings.is_empty());
        assert_eq!(affiliate.net_worth, affiliate.balance);
    }
    assert_eq!(after.affiliates[0].balance, 50_000.0);
    assert_eq!(after.affiliates[1].balance, 1_000.0);
}

#[test]
fn test_invariants_hold_across_seeded_runs() {
    for seed in 0..5 {
        let mut sim = Simulation::new(config(300, seed)).unwrap();
        let hook = Arc::new(InvariantHook::default());
        sim.add_hook(hook.clone());
        let report = sim.run();

        let violations = hook.violations.lock();
        assert!(violations.is_empty(), "seed {seed}: {:?}", &violations[..violations.len().min(5)]);

        for token in sim.tokens() {
            assert_eq!(token.price(), token.quoted_price(), "seed {seed}");
        }
        assert_eq!(report.steps_completed, 300);
        assert_eq!(sim.history().len(), 300);
        assert!(report.stats.total_fills > 0, "seed {seed}: no trades");
    }
}

#[test]
fn test_commission_matches_fills() {
    let mut sim = Simulation::new(config(200, 11)).unwrap();
    let hook = Arc::new(InvariantHook::default());
    sim.add_hook(hook.clone());
    let report = sim.run();

    let fills = hook.fills.lock();
    let total_commission: f64 = fills.iter().map(|f| f.commission).sum();
    let total_earned: f64 = report.affiliates.iter().map(|a| a.total_earned).sum();
    assert!((total_commission - total_earned).abs() < 1e-9);

    let total_fees: f64 = fills.iter().map(|f| f.receipt.fee).sum();
    let token_fees: f64 = report.tokens.iter().map(|t| t.fees_collected).sum();
    assert!((total_fees - token_fees).abs() < 1e-6);

    for fill in fills.iter() {
        let expected = fill.receipt.fee * 0.20;
        assert!(fill.commission <= expected + EPS);
        assert!(fill.commission >= 0.0);
    }
    assert_eq!(fills.len() as u64, report.stats.total_fills);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let first = Simulation::new(config(150, 99)).unwrap().run();
    let second = Simulation::new(config(150, 99)).unwrap().run();
    assert_eq!(first, second);

    let other = Simulation::new(config(150, 100)).unwrap().run();
    assert_ne!(first, other);
}

#[test]
fn test_whales_trade_bulk_orders() {
    let mut sim = Simulation::new(config(100, 5).with_affiliates(10)).unwrap();
    let hook = Arc::new(InvariantHook::default());
    sim.add_hook(hook.clone());
    sim.run();

    let whales: Vec<_> = sim
        .affiliates()
        .iter()
        .filter(|a| a.strategy() == agents::StrategyKind::Whale)
        .map(|a| a.id())
        .collect();
    assert_eq!(whales.len(), 2);

    let fills = hook.fills.lock();
    let whale_buys: Vec<f64> = fills
        .iter()
        .filter(|f| whales.contains(&f.affiliate) && f.receipt.side == OrderSide::Buy)
        .map(|f| f.receipt.gross)
        .collect();
    assert!(!whale_buys.is_empty());
    let regular_buys = fills
        .iter()
        .filter(|f| !whales.contains(&f.affiliate) && f.receipt.side == OrderSide::Buy);
    for fill in regular_buys {
        assert!(fill.receipt.gross <= 15.0 + EPS);
    }
    assert!(whale_buys.iter().any(|gross| *gross > 15.0));
}

#[test]
fn test_curve_switches_fire_and_keep_price_continuous() {
    let schedule = CurveSchedule::default().with_switch_interval(5, 10);
    let mut sim =
        Simulation::new(config(120, 3).with_curve_schedule(schedule)).unwrap();
    let hook = Arc::new(InvariantHook::default());
    sim.add_hook(hook.clone());
    sim.run();

    let events = hook.curve_events.lock();
    let switches: Vec<&CurveEvent> = events
        .iter()
        .filter(|e| matches!(e.kind, CurveEventKind::Switched { .. }))
        .collect();
    let attempts = events
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                CurveEventKind::Switched { .. } | CurveEventKind::SwitchRejected { .. }
            )
        })
        .count();
    // Every token fires at least once per 10 steps
    assert!(attempts >= 5 * 12, "only {attempts} switch attempts");
    assert!(!switches.is_empty());
    assert_eq!(
        sim.stats().curve_switches + sim.stats().rejected_curve_events + sim.stats().parameter_drifts,
        events.len() as u64
    );

    for event in &switches {
        if let CurveEventKind::Switched { from, to } = event.kind {
            assert_eq!(from.next(), to);
        }
    }

    // The switch entry in a token's history carries the same price as the
    // entry before it.
    for token in sim.tokens() {
        for pair in token.history().windows(2) {
            if pair[0].curve != pair[1].curve {
                let rel = (pair[1].price - pair[0].price).abs() / pair[0].price.max(1e-12);
                assert!(rel < 1e-9, "{}: price jumped across switch", token.name());
            }
        }
    }
}

#[test]
fn test_metrics_hook_agrees_with_stats() {
    let mut sim = Simulation::new(config(120, 8)).unwrap();
    let metrics = Arc::new(MetricsHook::new());
    sim.add_hook(metrics.clone());
    let report = sim.run();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_steps, 120);
    assert_eq!(snapshot.total_fills, report.stats.total_fills);
    assert_eq!(snapshot.rejected_orders, report.stats.rejected_orders);
    assert_eq!(snapshot.buys + snapshot.sells, snapshot.total_fills);
    assert_eq!(snapshot.commission_adjustments, 12 * 5);
    assert_eq!(snapshot.parameter_drifts + snapshot.rejected_curve_events, 6 * 5);

    let volume: f64 = report.affiliates.iter().map(|a| a.total_referral_volume).sum();
    assert!((snapshot.volume - volume).abs() < 1e-6);
}

#[test]
fn test_report_values_holdings_at_final_prices() {
    let report = Simulation::new(config(60, 13)).unwrap().run();
    for affiliate in &report.affiliates {
        let holdings_value: f64 = affiliate
            .holdings
            .iter()
            .map(|h| h.quantity * report.tokens[h.token.index()].price)
            .sum();
        let expected = affiliate.balance + holdings_value;
        assert!((affiliate.net_worth - expected).abs() <= 1e-9 * expected.max(1.0));
        assert!(affiliate.net_worth >= affiliate.balance);
    }
}

#[test]
fn test_report_serializes_to_json() {
    let report = Simulation::new(config(30, 4)).unwrap().run();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["steps_completed"], 30);
    assert_eq!(json["seed"], 4);
    assert_eq!(json["tokens"].as_array().unwrap().len(), 5);
    assert_eq!(json["affiliates"].as_array().unwrap().len(), 5);
    assert!(json["tokens"][0]["curve"]["kind"].is_string());
    assert_eq!(json["tokens"][0]["name"], "Token_0");
    assert_eq!(json["affiliates"][0]["strategy"], "whale");
}

#[test]
fn test_step_phases_run_in_fixed_order() {
    let schedule = CurveSchedule::default().with_switch_interval(20, 20);
    let mut sim = Simulation::new(config(40, 21).with_curve_schedule(schedule)).unwrap();
    let hook = Arc::new(OrderHook::default());
    sim.add_hook(hook.clone());
    sim.run();

    let events = hook.events.lock();
    for pair in events.windows(2) {
        let ((tick_a, phase_a), (tick_b, phase_b)) = (pair[0], pair[1]);
        assert!(tick_a <= tick_b, "tick went backwards: {pair:?}");
        if tick_a == tick_b {
            assert!(phase_a <= phase_b, "out of order within tick {tick_a}: {pair:?}");
        } else {
            assert_eq!(phase_a, Phase::End, "tick {tick_a} did not end last");
            assert_eq!(phase_b, Phase::Start, "tick {tick_b} did not start first");
        }
    }

    let ticks_with = |phase: Phase| {
        let mut ticks: Vec<Tick> = events
            .iter()
            .filter(|(_, p)| *p == phase)
            .map(|(t, _)| *t)
            .collect();
        ticks.dedup();
        ticks
    };
    assert_eq!(ticks_with(Phase::Switch), vec![19, 39]);
    assert_eq!(ticks_with(Phase::Drift), vec![19, 39]);
    assert_eq!(ticks_with(Phase::Commission), vec![9, 19, 29, 39]);
    assert_eq!(ticks_with(Phase::End).len(), 40);
    assert!(!ticks_with(Phase::Trade).is_empty());
}

#[test]
fn test_tiny_initial_price_keeps_supply_finite() {
    for initial_price in [1e-3, 1e-4, 1e-6] {
        for seed in 0..5 {
            let mut sim =
                Simulation::new(config(1_000, seed).with_initial_price(initial_price)).unwrap();
            let hook = Arc::new(InvariantHook::default());
            sim.add_hook(hook.clone());
            sim.run();

            let violations = hook.violations.lock();
            assert!(
                violations.is_empty(),
                "price {initial_price} seed {seed}: {:?}",
                &violations[..violations.len().min(3)]
            );
            for token in sim.tokens() {
                assert!(token.supply().is_finite(), "{} supply {}", token.name(), token.supply());
                assert_eq!(token.price(), token.quoted_price());
            }
        }
    }
}
