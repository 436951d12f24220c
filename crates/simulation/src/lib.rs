//! Simulation crate: the step loop for the token economy simulation.
//!
//! This crate provides the runner that coordinates:
//! - Scheduled curve switches and parameter drift per token
//! - Affiliate decisions and trade execution
//! - Periodic commission-rate adaptation
//! - Step snapshots and the final report
//! - Hook-based observation
//!
//! # Architecture
//!
//! The simulation runs in discrete steps:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Simulation.step()               │
//! │                                              │
//! │  1. Hook: on_step_start                      │
//! │  2. Curve switches due this step             │
//! │  3. Parameter drift (every drift interval)   │
//! │  4. For each affiliate, in id order:         │
//! │       capture MarketData                     │
//! │       decide_orders() → execute() each order │
//! │       Hook: on_fill / on_order_rejected      │
//! │  5. Commission adaptation (every interval)   │
//! │  6. Feed trend windows, record StepSnapshot  │
//! │  7. Hook: on_step_end, advance step counter  │
//! │                                              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use simulation::{MetricsHook, Simulation, SimulationConfig};
//! use std::sync::Arc;
//!
//! let mut sim = Simulation::new(SimulationConfig::default().with_seed(7))?;
//! let metrics = Arc::new(MetricsHook::new());
//! sim.add_hook(metrics.clone());
//!
//! let report = sim.run();
//! println!("{} fills, fees {:.2}", report.stats.total_fills, metrics.snapshot().fees);
//! ```

pub mod config;
mod error;
mod history;
mod hooks;
mod metrics;
mod runner;
mod schedule;

pub use config::{AffiliateSettings, SimulationConfig};
pub use error::{Result, SimulationError};
pub use history::{
    AffiliateState, AffiliateSummary, Holding, SimulationReport, StepSnapshot, TokenState,
    TokenSummary,
};
pub use hooks::{CurveEvent, CurveEventKind, HookRunner, NoOpHook, OrderRejection, SimulationHook};
pub use metrics::{MetricsHook, MetricsSnapshot};
pub use runner::{Simulation, SimulationStats};
pub use schedule::{Countdown, EventSchedule};
