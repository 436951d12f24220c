//! Step snapshots and the final run report.
//!
//! Everything here is plain owned data deriving `Serialize`, so a reporting
//! layer can dump it as JSON without touching live simulation state.

use agents::{Affiliate, StrategyKind};
use serde::{Deserialize, Serialize};
use sim_core::{BondingCurve, CurveKind, Token};
use types::{AffiliateId, Tick, TokenId};

use crate::runner::SimulationStats;

// =============================================================================
// Step Snapshots
// =============================================================================

/// Token state at the close of a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenState {
    pub token: TokenId,
    pub price: f64,
    pub supply: f64,
    pub curve: CurveKind,
}

impl TokenState {
    pub fn capture(token: &Token) -> Self {
        Self {
            token: token.id(),
            price: token.price(),
            supply: token.supply(),
            curve: token.curve_kind(),
        }
    }
}

/// Quantity of one token held by an affiliate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub token: TokenId,
    pub quantity: f64,
}

/// Affiliate state at the close of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateState {
    pub affiliate: AffiliateId,
    pub balance: f64,
    pub commission_rate: f64,
    pub total_earned: f64,
    pub holdings: Vec<Holding>,
}

impl AffiliateState {
    pub fn capture(affiliate: &Affiliate) -> Self {
        Self {
            affiliate: affiliate.id(),
            balance: affiliate.balance(),
            commission_rate: affiliate.commission_rate(),
            total_earned: affiliate.total_earned(),
            holdings: holdings_of(affiliate),
        }
    }
}

/// Everything recorded at the end of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub tick: Tick,
    pub tokens: Vec<TokenState>,
    pub affiliates: Vec<AffiliateState>,
    /// Trades executed during this step.
    pub fills: usize,
    /// Orders rejected during this step.
    pub rejected_orders: usize,
}

// =============================================================================
// Final Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSummary {
    pub id: TokenId,
    pub name: String,
    pub price: f64,
    pub supply: f64,
    pub curve_kind: CurveKind,
    pub curve: BondingCurve,
    pub fees_collected: f64,
    pub total_burned: f64,
    pub trade_count: u64,
}

impl TokenSummary {
    pub fn capture(token: &Token) -> Self {
        Self {
            id: token.id(),
            name: token.name().to_string(),
            price: token.price(),
            supply: token.supply(),
            curve_kind: token.curve_kind(),
            curve: *token.curve(),
            fees_collected: token.fees_collected(),
            total_burned: token.total_burned(),
            trade_count: token.trade_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateSummary {
    pub id: AffiliateId,
    pub strategy: StrategyKind,
    pub balance: f64,
    pub holdings: Vec<Holding>,
    /// Balance plus holdings valued at the final token prices.
    pub net_worth: f64,
    pub commission_rate: f64,
    pub total_earned: f64,
    pub total_referral_volume: f64,
    pub trades_executed: u64,
    pub orders_rejected: u64,
    pub whale_capacity: Option<f64>,
}

impl AffiliateSummary {
    pub fn capture(affiliate: &Affiliate, tokens: &[Token]) -> Self {
        let net_worth = affiliate.wallet().net_worth(|id| {
            tokens
                .iter()
                .find(|token| token.id() == id)
                .map(Token::price)
        });
        Self {
            id: affiliate.id(),
            strategy: affiliate.strategy(),
            balance: affiliate.balance(),
            holdings: holdings_of(affiliate),
            net_worth,
            commission_rate: affiliate.commission_rate(),
            total_earned: affiliate.total_earned(),
            total_referral_volume: affiliate.total_referral_volume(),
            trades_executed: affiliate.trades_executed(),
            orders_rejected: affiliate.orders_rejected(),
            whale_capacity: affiliate.whale_capacity(),
        }
    }
}

/// Final state of a run, ready for a reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub steps_completed: u64,
    pub seed: Option<u64>,
    pub tokens: Vec<TokenSummary>,
    pub affiliates: Vec<AffiliateSummary>,
    pub stats: SimulationStats,
}

fn holdings_of(affiliate: &Affiliate) -> Vec<Holding> {
    affiliate
        .wallet()
        .holdings()
        .map(|(token, quantity)| Holding { token, quantity })
        .collect()
}
