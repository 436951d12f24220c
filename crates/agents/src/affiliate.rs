//! Affiliate - a trading agent earning commission on the fees it generates.
//!
//! Each step an affiliate looks at a [`MarketData`] snapshot, picks tokens at
//! random, and emits buy or sell orders sized by its [`StrategyProfile`] with
//! sides chosen by its [`TrendPolicy`]. Independently of the trend it may
//! also emit small rebalancing sells of existing holdings.
//!
//! Orders are caps: [`Affiliate::execute`] truncates a buy to the available
//! balance and a sell to the available holding, so the wallet never goes
//! negative.
//!
//! # Commission
//!
//! Every executed trade credits `commission_rate * fee` to `total_earned`.
//! Every adjustment interval the rate moves by one step, up when the average
//! gross notional since the last adjustment exceeds the investment threshold
//! and down otherwise, clamped to the policy bounds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sim_core::{Result, SimCoreError, Token};
use tracing::{debug, info};
use types::{AffiliateId, CommissionPolicy, Fill, OrderSide, Tick, TokenId, TradeOrder};

use crate::market::MarketData;
use crate::strategy::{RebalancePolicy, StrategyKind, StrategyProfile, TrendPolicy};
use crate::wallet::Wallet;

/// Configuration for an Affiliate.
#[derive(Debug, Clone, Copy)]
pub struct AffiliateConfig {
    pub profile: StrategyProfile,
    pub trend: TrendPolicy,
    pub rebalance: RebalancePolicy,
    pub initial_commission_rate: f64,
}

impl Default for AffiliateConfig {
    fn default() -> Self {
        Self {
            profile: StrategyProfile::regular(),
            trend: TrendPolicy::default(),
            rebalance: RebalancePolicy::default(),
            initial_commission_rate: 0.10,
        }
    }
}

impl AffiliateConfig {
    pub fn whale() -> Self {
        Self {
            profile: StrategyProfile::whale(),
            ..Self::default()
        }
    }
}

/// Commission credited for one executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Earning {
    pub tick: Tick,
    pub token: TokenId,
    pub amount: f64,
}

/// Outcome of one commission-rate adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionAdjustment {
    pub tick: Tick,
    pub affiliate: AffiliateId,
    pub previous_rate: f64,
    pub rate: f64,
    /// Average gross notional over the interval that drove the change.
    pub average_investment: f64,
}

/// A trading affiliate.
pub struct Affiliate {
    id: AffiliateId,
    profile: StrategyProfile,
    trend: TrendPolicy,
    rebalance: RebalancePolicy,
    wallet: Wallet,
    commission_rate: f64,
    /// Drawn once for whales from their order-size range, reported only.
    whale_capacity: Option<f64>,
    total_earned: f64,
    earnings_history: Vec<Earning>,
    commission_rate_history: Vec<CommissionAdjustment>,
    /// Gross notional of trades executed since the last adjustment.
    adaptation_window: Vec<f64>,
    total_referral_volume: f64,
    trades_executed: u64,
    orders_rejected: u64,
    rng: StdRng,
}

impl Affiliate {
    /// Create an affiliate seeded from the OS.
    pub fn new(id: AffiliateId, config: AffiliateConfig) -> Self {
        Self::build(id, config, StdRng::from_os_rng())
    }

    /// Create an affiliate with a specific seed (for reproducible runs).
    pub fn with_seed(id: AffiliateId, config: AffiliateConfig, seed: u64) -> Self {
        Self::build(id, config, StdRng::seed_from_u64(seed))
    }

    fn build(id: AffiliateId, config: AffiliateConfig, mut rng: StdRng) -> Self {
        let whale_capacity = match config.profile.kind {
            StrategyKind::Whale => Some(config.profile.sample_order_size(&mut rng)),
            StrategyKind::Regular => None,
        };
        Self {
            id,
            profile: config.profile,
            trend: config.trend,
            rebalance: config.rebalance,
            wallet: Wallet::new(config.profile.initial_balance),
            commission_rate: config.initial_commission_rate,
            whale_capacity,
            total_earned: 0.0,
            earnings_history: Vec::new(),
            commission_rate_history: Vec::new(),
            adaptation_window: Vec::new(),
            total_referral_volume: 0.0,
            trades_executed: 0,
            orders_rejected: 0,
            rng,
        }
    }

    pub fn id(&self) -> AffiliateId {
        self.id
    }

    pub fn strategy(&self) -> StrategyKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &StrategyProfile {
        &self.profile
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn balance(&self) -> f64 {
        self.wallet.balance()
    }

    pub fn holding(&self, token: TokenId) -> f64 {
        self.wallet.holding(token)
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn whale_capacity(&self) -> Option<f64> {
        self.whale_capacity
    }

    pub fn total_earned(&self) -> f64 {
        self.total_earned
    }

    pub fn earnings_history(&self) -> &[Earning] {
        &self.earnings_history
    }

    pub fn commission_rate_history(&self) -> &[CommissionAdjustment] {
        &self.commission_rate_history
    }

    pub fn total_referral_volume(&self) -> f64 {
        self.total_referral_volume
    }

    pub fn trades_executed(&self) -> u64 {
        self.trades_executed
    }

    pub fn orders_rejected(&self) -> u64 {
        self.orders_rejected
    }

    /// Average gross notional since the last adjustment (zero if none).
    pub fn average_investment(&self) -> f64 {
        if self.adaptation_window.is_empty() {
            0.0
        } else {
            self.adaptation_window.iter().sum::<f64>() / self.adaptation_window.len() as f64
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decisions
    // ─────────────────────────────────────────────────────────────────────────

    /// Orders for this step: strategy trades first, then rebalancing sells.
    pub fn decide_orders(&mut self, market: &MarketData) -> Vec<TradeOrder> {
        if market.is_empty() {
            return Vec::new();
        }

        let mut orders = Vec::new();
        for _ in 0..self.profile.sample_trade_count(&mut self.rng) {
            let quote = market.quotes[self.rng.random_range(0..market.quotes.len())];
            let notional = self.profile.sample_order_size(&mut self.rng);
            let side = self
                .trend
                .choose_side(&mut self.rng, quote.price, quote.reference);

            match side {
                OrderSide::Buy => orders.push(TradeOrder::buy(quote.token, notional)),
                OrderSide::Sell => {
                    if quote.price <= 0.0 {
                        continue;
                    }
                    let quantity = (notional / quote.price).min(self.wallet.holding(quote.token));
                    if quantity > 0.0 {
                        orders.push(TradeOrder::sell(quote.token, quantity));
                    }
                }
            }
        }

        let holdings: Vec<(TokenId, f64)> = self.wallet.holdings().collect();
        for (token, held) in holdings {
            if market.quote(token).is_none() {
                continue;
            }
            if let Some(quantity) = self.rebalance.sample(&mut self.rng, held) {
                orders.push(TradeOrder::rebalance(token, quantity));
            }
        }

        debug!(affiliate = %self.id, tick = market.tick, orders = orders.len(), "orders decided");
        orders
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute `order` against `token`, settling the wallet and crediting
    /// commission. A rejected order is counted and leaves every piece of
    /// state untouched.
    pub fn execute(&mut self, order: &TradeOrder, token: &mut Token, tick: Tick) -> Result<Fill> {
        let result = self.settle(order, token, tick);
        if let Err(err) = &result {
            self.orders_rejected += 1;
            debug!(affiliate = %self.id, %order, error = %err, "order rejected");
        }
        result
    }

    fn settle(&mut self, order: &TradeOrder, token: &mut Token, tick: Tick) -> Result<Fill> {
        let receipt = match order.side {
            OrderSide::Buy => {
                let available = self.wallet.balance();
                let amount = order.size.min(available);
                if amount <= 0.0 {
                    return Err(SimCoreError::InsufficientBalance {
                        requested: order.size,
                        available,
                    });
                }
                let receipt = token.buy(amount)?;
                self.wallet.debit(amount)?;
                self.wallet.add_tokens(token.id(), receipt.quantity);
                receipt
            }
            OrderSide::Sell => {
                let held = self.wallet.holding(token.id());
                let quantity = order.size.min(held);
                if quantity <= 0.0 {
                    return Err(SimCoreError::InsufficientHoldings {
                        requested: order.size,
                        available: held,
                    });
                }
                let receipt = token.sell(quantity, held)?;
                self.wallet.remove_tokens(token.id(), quantity)?;
                self.wallet.credit(receipt.net);
                receipt
            }
        };

        let commission = self.commission_rate * receipt.fee;
        self.total_earned += commission;
        self.earnings_history.push(Earning {
            tick,
            token: receipt.token,
            amount: commission,
        });
        self.adaptation_window.push(receipt.gross);
        self.total_referral_volume += receipt.gross;
        self.trades_executed += 1;

        Ok(Fill {
            tick,
            affiliate: self.id,
            origin: order.origin,
            receipt,
            commission,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Adaptation
    // ─────────────────────────────────────────────────────────────────────────

    /// Move the commission rate one step based on the average investment
    /// since the last call, then clear the window.
    pub fn adjust_commission(&mut self, policy: &CommissionPolicy, tick: Tick) -> CommissionAdjustment {
        let average_investment = self.average_investment();
        let previous_rate = self.commission_rate;
        self.commission_rate = policy.adjusted(previous_rate, average_investment);
        self.adaptation_window.clear();

        let adjustment = CommissionAdjustment {
            tick,
            affiliate: self.id,
            previous_rate,
            rate: self.commission_rate,
            average_investment,
        };
        self.commission_rate_history.push(adjustment);

        info!(
            affiliate = %self.id,
            average_investment,
            from = previous_rate,
            to = self.commission_rate,
            "commission rate adjusted"
        );
        adjustment
    }
}
