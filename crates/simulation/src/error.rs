//! Errors surfaced by the simulation itself.
//!
//! Trade and curve failures are [`sim_core::SimCoreError`]s and never leave
//! a step; the only error a caller sees is a configuration rejected up front.

/// Result type for simulation construction.
pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// One or more configuration values are out of range. The message lists
    /// every problem found, separated by `; `.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
