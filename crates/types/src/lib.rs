//! Core types for the token economy simulation.
//!
//! This crate provides the shared vocabulary used across the workspace:
//! identifiers, the rule configuration for fees, burns, commissions and
//! curve events, and the order/receipt/fill types exchanged between
//! affiliates, tokens and the scheduler.

mod config;
mod ids;
mod trade;

pub use config::{
    BURN_RATE, COMMISSION_ADJUSTMENT_STEP, COMMISSION_DYNAMICS_STEP, COMMISSION_RATE_MAX,
    COMMISSION_RATE_MIN, CURVE_SWITCH_INTERVAL_RANGE, CommissionPolicy, CurveSchedule,
    INITIAL_SUPPLY, INVESTMENT_THRESHOLD, MarketConstants, PARAMETER_DRIFT_INTERVAL,
    TRANSACTION_FEE_RATE, WHALE_INVESTMENT_RANGE,
};
pub use ids::{AffiliateId, Tick, TokenId};
pub use trade::{Fill, OrderOrigin, OrderSide, TradeOrder, TradeReceipt};
