//! Sim-core: token market mechanics for the token economy simulation.
//!
//! This crate provides the pieces that move prices:
//! - Bonding curves mapping supply to price, with validation, calibration
//!   and parameter drift
//! - Tokens executing buys and sells against their curve, charging fees and
//!   burning a fraction of supply on every trade
//! - Error handling for rejected trades and curve events

mod curve;
mod error;
mod token;

pub use curve::{BondingCurve, CurveKind};
pub use error::{Result, SimCoreError};
pub use token::{Token, TokenSnapshot};
