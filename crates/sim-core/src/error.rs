//! Error types for curve and market operations.
//!
//! Every variant is recoverable: the scheduler logs it, counts it and moves
//! on with the state that was in place before the failed operation.

use types::TokenId;

use crate::curve::CurveKind;

/// Result type for sim-core operations.
pub type Result<T> = std::result::Result<T, SimCoreError>;

/// Errors that can occur while pricing or trading a token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimCoreError {
    /// A drift or switch would leave the curve non-finite or negative
    /// somewhere on the reachable supply range.
    #[error("invalid {kind} curve parameters: {reason}")]
    InvalidCurveParameters { kind: CurveKind, reason: String },

    /// A buy asked for more base currency than the wallet holds.
    #[error("insufficient balance: requested {requested:.4}, available {available:.4}")]
    InsufficientBalance { requested: f64, available: f64 },

    /// A sell asked for more tokens than the seller holds.
    #[error("insufficient holdings: requested {requested:.4}, available {available:.4}")]
    InsufficientHoldings { requested: f64, available: f64 },

    /// A sell would drive token supply below zero.
    #[error("selling {requested:.4} would drive supply {supply:.4} below zero")]
    SupplyUnderflow { requested: f64, supply: f64 },

    /// Trade amounts must be finite and strictly positive.
    #[error("trade amount must be finite and positive, got {0}")]
    InvalidAmount(f64),

    /// The token's price is not strictly positive, so base currency cannot
    /// be converted into a token quantity.
    #[error("{token} has no positive price to trade against")]
    UnpricedToken { token: TokenId },

    /// The trade would push supply, price or proceeds outside the finite
    /// range of `f64`.
    #[error("trade on {token} would overflow supply {supply:e}")]
    TradeOverflow { token: TokenId, supply: f64 },
}

impl SimCoreError {
    /// Short machine-friendly label, used for rejection counters.
    pub fn label(&self) -> &'static str {
        match self {
            SimCoreError::InvalidCurveParameters { .. } => "invalid_curve_parameters",
            SimCoreError::InsufficientBalance { .. } => "insufficient_balance",
            SimCoreError::InsufficientHoldings { .. } => "insufficient_holdings",
            SimCoreError::SupplyUnderflow { .. } => "supply_underflow",
            SimCoreError::InvalidAmount(_) => "invalid_amount",
            SimCoreError::UnpricedToken { .. } => "unpriced_token",
            SimCoreError::TradeOverflow { .. } => "trade_overflow",
        }
    }
}
