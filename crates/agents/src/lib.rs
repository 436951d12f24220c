//! Agents crate: affiliates trading tokens for commission.
//!
//! This crate provides:
//! - [`Affiliate`], the single trading agent type, configured by an
//!   [`AffiliateConfig`]
//! - [`Wallet`] for base-currency balance and per-token holdings
//! - Strategy policies: [`StrategyProfile`] (regular | whale sizing and
//!   frequency), [`TrendPolicy`] (side selection), [`RebalancePolicy`]
//! - [`MarketData`], the price snapshot an affiliate decides against
//! - [`RollingWindow`] for per-token trend references
//!
//! # Architecture
//! Before its turn an affiliate receives a fresh `MarketData` snapshot and
//! returns a list of `TradeOrder`s. The simulation routes each order back
//! through [`Affiliate::execute`] with the target token, which settles the
//! wallet, credits commission and returns a `Fill`.
//!
//! # Example
//! ```ignore
//! use agents::{Affiliate, AffiliateConfig, MarketData};
//! use types::AffiliateId;
//!
//! let mut affiliate = Affiliate::with_seed(AffiliateId(0), AffiliateConfig::default(), 42);
//! for order in affiliate.decide_orders(&market) {
//!     let token = &mut tokens[order.token.index()];
//!     let _ = affiliate.execute(&order, token, tick);
//! }
//! ```

mod affiliate;
mod market;
mod rolling;
mod strategy;
mod wallet;

pub use affiliate::{Affiliate, AffiliateConfig, CommissionAdjustment, Earning};
pub use market::{MarketData, TokenQuote};
pub use rolling::RollingWindow;
pub use strategy::{RebalancePolicy, StrategyKind, StrategyProfile, TrendPolicy};
pub use wallet::Wallet;
