//! Simulation hooks for observing step lifecycle events.
//!
//! Hooks are **observers**: they receive read-only views of what happened
//! and cannot modify simulation state. Use interior mutability (atomics,
//! `parking_lot::Mutex`) for hook-owned state.
//!
//! # Example
//!
//! ```ignore
//! use simulation::{SimulationHook};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use types::Fill;
//!
//! struct FillCounter {
//!     count: AtomicU64,
//! }
//!
//! impl SimulationHook for FillCounter {
//!     fn name(&self) -> &str { "FillCounter" }
//!
//!     fn on_fill(&self, _fill: &Fill) {
//!         self.count.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```

use std::sync::Arc;

use agents::CommissionAdjustment;
use serde::{Deserialize, Serialize};
use sim_core::{CurveKind, SimCoreError};
use types::{AffiliateId, Fill, Tick, TokenId, TradeOrder};

use crate::history::{SimulationReport, StepSnapshot};

// ─────────────────────────────────────────────────────────────────────────────
// Event payloads
// ─────────────────────────────────────────────────────────────────────────────

/// What happened to a token's curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CurveEventKind {
    Switched { from: CurveKind, to: CurveKind },
    Drifted,
    /// A switch candidate failed validation; the previous curve stays.
    SwitchRejected { reason: String },
    /// A drift candidate failed validation; the previous parameters stay.
    DriftRejected { reason: String },
}

impl CurveEventKind {
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CurveEventKind::SwitchRejected { .. } | CurveEventKind::DriftRejected { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveEvent {
    pub tick: Tick,
    pub token: TokenId,
    pub kind: CurveEventKind,
    /// Token price after the event.
    pub price: f64,
}

/// An order that could not be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRejection {
    pub tick: Tick,
    pub affiliate: AffiliateId,
    pub order: TradeOrder,
    pub error: SimCoreError,
}

// ─────────────────────────────────────────────────────────────────────────────
// SimulationHook Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for simulation observers.
///
/// # Lifecycle
///
/// ```text
/// ┌───────────────────────────────────────────────────────────┐
/// │  Simulation.step()                                        │
/// │                                                           │
/// │  on_step_start()          ← before any event fires        │
/// │  on_curve_event()         ← per switch / drift (or reject)│
/// │  on_fill()                ← per executed order            │
/// │  on_order_rejected()      ← per rejected order            │
/// │  on_commission_adjusted() ← per affiliate, on due steps   │
/// │  on_step_end()            ← with the step snapshot        │
/// └───────────────────────────────────────────────────────────┘
///            │
///            ▼ (after the final step, from `run()`)
///  on_simulation_end()
/// ```
pub trait SimulationHook: Send + Sync {
    /// Human-readable name for logging and debugging.
    fn name(&self) -> &str;

    #[allow(unused_variables)]
    fn on_step_start(&self, tick: Tick) {}

    #[allow(unused_variables)]
    fn on_curve_event(&self, event: &CurveEvent) {}

    #[allow(unused_variables)]
    fn on_fill(&self, fill: &Fill) {}

    #[allow(unused_variables)]
    fn on_order_rejected(&self, rejection: &OrderRejection) {}

    #[allow(unused_variables)]
    fn on_commission_adjusted(&self, adjustment: &CommissionAdjustment) {}

    /// Called after the step snapshot has been recorded.
    #[allow(unused_variables)]
    fn on_step_end(&self, snapshot: &StepSnapshot) {}

    /// Called once when `run()` completes.
    #[allow(unused_variables)]
    fn on_simulation_end(&self, report: &SimulationReport) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRunner
// ─────────────────────────────────────────────────────────────────────────────

/// Manages hook registration and sequential invocation.
///
/// Hooks are called in registration order.
#[derive(Default)]
pub struct HookRunner {
    hooks: Vec<Arc<dyn SimulationHook>>,
}

impl HookRunner {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook. Hooks are called in registration order.
    pub fn add(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn on_step_start(&self, tick: Tick) {
        for hook in &self.hooks {
            hook.on_step_start(tick);
        }
    }

    pub fn on_curve_event(&self, event: &CurveEvent) {
        for hook in &self.hooks {
            hook.on_curve_event(event);
        }
    }

    pub fn on_fill(&self, fill: &Fill) {
        for hook in &self.hooks {
            hook.on_fill(fill);
        }
    }

    pub fn on_order_rejected(&self, rejection: &OrderRejection) {
        for hook in &self.hooks {
            hook.on_order_rejected(rejection);
        }
    }

    pub fn on_commission_adjusted(&self, adjustment: &CommissionAdjustment) {
        for hook in &self.hooks {
            hook.on_commission_adjusted(adjustment);
        }
    }

    pub fn on_step_end(&self, snapshot: &StepSnapshot) {
        for hook in &self.hooks {
            hook.on_step_end(snapshot);
        }
    }

    pub fn on_simulation_end(&self, report: &SimulationReport) {
        for hook in &self.hooks {
            hook.on_simulation_end(report);
        }
    }
}

impl std::fmt::Debug for HookRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRunner")
            .field("hooks", &self.hook_names())
            .finish()
    }
}

/// A no-op hook useful for testing.
#[derive(Debug, Default)]
pub struct NoOpHook;

impl SimulationHook for NoOpHook {
    fn name(&self) -> &str {
        "NoOp"
    }
}
