//! MetricsHook - built-in hook aggregating trade and curve statistics.
//!
//! Counts are plain atomics; base-currency totals are accumulated under a
//! `parking_lot::Mutex` since there is no atomic `f64`.

use std::sync::atomic::{AtomicU64, Ordering};

use agents::CommissionAdjustment;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use types::{Fill, OrderOrigin, OrderSide, Tick};

use crate::hooks::{CurveEvent, CurveEventKind, OrderRejection, SimulationHook};
use crate::history::StepSnapshot;

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_steps: u64,
    pub total_fills: u64,
    pub buys: u64,
    pub sells: u64,
    /// Sells that came from rebalancing rather than the trend policy.
    pub rebalance_sells: u64,
    pub rejected_orders: u64,
    pub curve_switches: u64,
    pub parameter_drifts: u64,
    pub rejected_curve_events: u64,
    pub commission_adjustments: u64,
    /// Gross base-currency notional of all fills.
    pub volume: f64,
    pub fees: f64,
    pub burned: f64,
    pub commissions_paid: f64,
    pub avg_fills_per_step: f64,
    pub peak_fills_per_step: u64,
    /// Executed orders / attempted orders.
    pub fill_rate: f64,
}

#[derive(Debug, Default)]
struct Totals {
    volume: f64,
    fees: f64,
    burned: f64,
    commissions: f64,
}

/// Built-in hook for collecting simulation metrics.
///
/// # Example
///
/// ```ignore
/// use simulation::{MetricsHook, Simulation, SimulationConfig};
/// use std::sync::Arc;
///
/// let metrics = Arc::new(MetricsHook::new());
/// let mut sim = Simulation::new(SimulationConfig::default())?;
/// sim.add_hook(metrics.clone());
/// sim.run();
/// println!("fees: {:.2}", metrics.snapshot().fees);
/// ```
#[derive(Debug, Default)]
pub struct MetricsHook {
    step_count: AtomicU64,
    fill_count: AtomicU64,
    buy_count: AtomicU64,
    sell_count: AtomicU64,
    rebalance_count: AtomicU64,
    rejected_count: AtomicU64,
    switch_count: AtomicU64,
    drift_count: AtomicU64,
    curve_rejected_count: AtomicU64,
    adjustment_count: AtomicU64,
    fills_this_step: AtomicU64,
    peak_fills: AtomicU64,
    totals: Mutex<Totals>,
}

impl MetricsHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_steps = self.step_count.load(Ordering::Relaxed);
        let total_fills = self.fill_count.load(Ordering::Relaxed);
        let rejected_orders = self.rejected_count.load(Ordering::Relaxed);
        let totals = self.totals.lock();

        let attempted = total_fills + rejected_orders;
        MetricsSnapshot {
            total_steps,
            total_fills,
            buys: self.buy_count.load(Ordering::Relaxed),
            sells: self.sell_count.load(Ordering::Relaxed),
            rebalance_sells: self.rebalance_count.load(Ordering::Relaxed),
            rejected_orders,
            curve_switches: self.switch_count.load(Ordering::Relaxed),
            parameter_drifts: self.drift_count.load(Ordering::Relaxed),
            rejected_curve_events: self.curve_rejected_count.load(Ordering::Relaxed),
            commission_adjustments: self.adjustment_count.load(Ordering::Relaxed),
            volume: totals.volume,
            fees: totals.fees,
            burned: totals.burned,
            commissions_paid: totals.commissions,
            avg_fills_per_step: ratio(total_fills, total_steps),
            peak_fills_per_step: self.peak_fills.load(Ordering::Relaxed),
            fill_rate: ratio(total_fills, attempted),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        for counter in [
            &self.step_count,
            &self.fill_count,
            &self.buy_count,
            &self.sell_count,
            &self.rebalance_count,
            &self.rejected_count,
            &self.switch_count,
            &self.drift_count,
            &self.curve_rejected_count,
            &self.adjustment_count,
            &self.fills_this_step,
            &self.peak_fills,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.totals.lock() = Totals::default();
    }

    /// Update peak value atomically (CAS loop).
    fn update_peak(peak: &AtomicU64, value: u64) {
        let mut current = peak.load(Ordering::Relaxed);
        while value > current {
            match peak.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

impl SimulationHook for MetricsHook {
    fn name(&self) -> &str {
        "Metrics"
    }

    fn on_step_start(&self, _tick: Tick) {
        self.fills_this_step.store(0, Ordering::Relaxed);
    }

    fn on_curve_event(&self, event: &CurveEvent) {
        let counter = match event.kind {
            CurveEventKind::Switched { .. } => &self.switch_count,
            CurveEventKind::Drifted => &self.drift_count,
            CurveEventKind::SwitchRejected { .. } | CurveEventKind::DriftRejected { .. } => {
                &self.curve_rejected_count
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn on_fill(&self, fill: &Fill) {
        self.fill_count.fetch_add(1, Ordering::Relaxed);
        match fill.receipt.side {
            OrderSide::Buy => self.buy_count.fetch_add(1, Ordering::Relaxed),
            OrderSide::Sell => self.sell_count.fetch_add(1, Ordering::Relaxed),
        };
        if fill.origin == OrderOrigin::Rebalance {
            self.rebalance_count.fetch_add(1, Ordering::Relaxed);
        }
        let this_step = self.fills_this_step.fetch_add(1, Ordering::Relaxed) + 1;
        Self::update_peak(&self.peak_fills, this_step);

        let mut totals = self.totals.lock();
        totals.volume += fill.receipt.gross;
        totals.fees += fill.receipt.fee;
        totals.burned += fill.receipt.burned;
        totals.commissions += fill.commission;
    }

    fn on_order_rejected(&self, _rejection: &OrderRejection) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_commission_adjusted(&self, _adjustment: &CommissionAdjustment) {
        self.adjustment_count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_step_end(&self, _snapshot: &StepSnapshot) {
        self.step_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRunner;
    use sim_core::{CurveKind, SimCoreError};
    use std::sync::Arc;
    use types::{AffiliateId, TokenId, TradeOrder, TradeReceipt};

    fn make_fill(side: OrderSide, origin: OrderOrigin) -> Fill {
        Fill {
            tick: 0,
            affiliate: AffiliateId(0),
            origin,
            receipt: TradeReceipt {
                token: TokenId(0),
                side,
                quantity: 10.0,
                gross: 100.0,
                fee: 0.25,
                net: 99.75,
                burned: 0.002,
                price_before: 10.0,
                price_after: 10.1,
            },
            commission: 0.025,
        }
    }

    fn make_snapshot() -> StepSnapshot {
        StepSnapshot {
            tick: 0,
            tokens: Vec::new(),
            affiliates: Vec::new(),
            fills: 0,
            rejected_orders: 0,
        }
    }

    #[test]
    fn test_metrics_accumulation() {
        let metrics = Arc::new(MetricsHook::new());
        let mut runner = HookRunner::new();
        runner.add(metrics.clone());

        for tick in 0..3 {
            runner.on_step_start(tick);
            runner.on_fill(&make_fill(OrderSide::Buy, OrderOrigin::Strategy));
            runner.on_fill(&make_fill(OrderSide::Sell, OrderOrigin::Rebalance));
            runner.on_step_end(&make_snapshot());
        }
        runner.on_order_rejected(&OrderRejection {
            tick: 2,
            affiliate: AffiliateId(1),
            order: TradeOrder::sell(TokenId(0), 1.0),
            error: SimCoreError::InsufficientHoldings {
                requested: 1.0,
                available: 0.0,
            },
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_steps, 3);
        assert_eq!(snapshot.total_fills, 6);
        assert_eq!(snapshot.buys, 3);
        assert_eq!(snapshot.sells, 3);
        assert_eq!(snapshot.rebalance_sells, 3);
        assert_eq!(snapshot.rejected_orders, 1);
        assert_eq!(snapshot.peak_fills_per_step, 2);
        assert!((snapshot.avg_fills_per_step - 2.0).abs() < 1e-12);
        assert!((snapshot.volume - 600.0).abs() < 1e-9);
        assert!((snapshot.fees - 1.5).abs() < 1e-9);
        assert!((snapshot.fill_rate - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_curve_event_counts() {
        let metrics = MetricsHook::new();
        let event = |kind| CurveEvent {
            tick: 0,
            token: TokenId(0),
            kind,
            price: 1.0,
        };
        metrics.on_curve_event(&event(CurveEventKind::Switched {
            from: CurveKind::Linear,
            to: CurveKind::Exponential,
        }));
        metrics.on_curve_event(&event(CurveEventKind::Drifted));
        metrics.on_curve_event(&event(CurveEventKind::Drifted));
        metrics.on_curve_event(&event(CurveEventKind::DriftRejected {
            reason: "overflow".into(),
        }));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.curve_switches, 1);
        assert_eq!(snapshot.parameter_drifts, 2);
        assert_eq!(snapshot.rejected_curve_events, 1);
    }

    #[test]
    fn test_reset() {
        let metrics = MetricsHook::new();
        metrics.on_fill(&make_fill(OrderSide::Buy, OrderOrigin::Strategy));
        metrics.on_step_end(&make_snapshot());
        assert_eq!(metrics.snapshot().total_steps, 1);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
