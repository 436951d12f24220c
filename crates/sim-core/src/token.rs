//! A token priced by its bonding curve.
//!
//! The token owns its supply, the active curve and a history of
//! `(supply, price)` snapshots. Price is never stored independently of
//! supply: every mutation goes through [`Token::reprice`], so
//! `curve.price(supply) == price` holds between calls.
//!
//! # Trade mechanics
//!
//! ```text
//! buy(amount):   fee = amount * fee_rate
//!                quantity = (amount - fee) / price
//!                burned = quantity * burn_rate
//!                supply += quantity - burned
//!
//! sell(qty):     gross = qty * price, fee = gross * fee_rate
//!                supply -= qty
//!                burned = supply * burn_rate
//!                supply -= burned
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::{CurveSchedule, MarketConstants, OrderSide, Tick, TokenId, TradeReceipt};

use crate::curve::{BondingCurve, CurveKind};
use crate::error::{Result, SimCoreError};

/// One entry of a token's price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub tick: Tick,
    pub supply: f64,
    pub price: f64,
    pub curve: CurveKind,
}

/// A tradeable token with a bonding-curve price.
#[derive(Debug, Clone)]
pub struct Token {
    id: TokenId,
    name: String,
    supply: f64,
    price: f64,
    /// Active pricing curve.
    curve: BondingCurve,
    /// Parameters drift is sampled around (set on creation and on switch).
    anchor: BondingCurve,
    constants: MarketConstants,
    /// Step stamped onto new history entries.
    tick: Tick,
    history: Vec<TokenSnapshot>,
    fees_collected: f64,
    total_burned: f64,
    trade_count: u64,
}

impl Token {
    /// Create a token whose price is read straight off `curve` at `supply`.
    pub fn new(
        id: TokenId,
        name: impl Into<String>,
        supply: f64,
        curve: BondingCurve,
        constants: MarketConstants,
    ) -> Self {
        let mut token = Self {
            id,
            name: name.into(),
            supply: supply.max(0.0),
            price: 0.0,
            curve,
            anchor: curve,
            constants,
            tick: 0,
            history: Vec::new(),
            fees_collected: 0.0,
            total_burned: 0.0,
            trade_count: 0,
        };
        token.reprice();
        token.record();
        token
    }

    /// Create a token whose curve is calibrated so the starting price is
    /// `initial_price` at `constants.initial_supply`.
    pub fn with_initial_price(
        id: TokenId,
        name: impl Into<String>,
        kind: CurveKind,
        initial_price: f64,
        constants: MarketConstants,
    ) -> Self {
        let curve = kind
            .default_curve()
            .calibrated(constants.initial_supply, initial_price);
        Self::new(id, name, constants.initial_supply, curve, constants)
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supply(&self) -> f64 {
        self.supply
    }

    /// Current price (always `curve().price(supply())`).
    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn curve(&self) -> &BondingCurve {
        &self.curve
    }

    pub fn curve_kind(&self) -> CurveKind {
        self.curve.kind()
    }

    pub fn anchor(&self) -> &BondingCurve {
        &self.anchor
    }

    pub fn constants(&self) -> &MarketConstants {
        &self.constants
    }

    pub fn history(&self) -> &[TokenSnapshot] {
        &self.history
    }

    /// Total fees withheld across all trades.
    pub fn fees_collected(&self) -> f64 {
        self.fees_collected
    }

    /// Total tokens removed from supply by burns.
    pub fn total_burned(&self) -> f64 {
        self.total_burned
    }

    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    /// Price recomputed from the stored supply, without touching state.
    pub fn quoted_price(&self) -> f64 {
        self.curve.price(self.supply)
    }

    /// Set the step stamped onto subsequent history entries.
    pub fn set_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }

    /// Supply range the active or a candidate curve must be valid on.
    pub fn validation_horizon(&self, schedule: &CurveSchedule) -> f64 {
        schedule.validation_horizon(self.constants.initial_supply, self.supply)
    }

    fn reprice(&mut self) {
        self.price = self.curve.price(self.supply);
    }

    fn record(&mut self) {
        self.history.push(TokenSnapshot {
            tick: self.tick,
            supply: self.supply,
            price: self.price,
            curve: self.curve.kind(),
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Trading
    // ─────────────────────────────────────────────────────────────────────────

    /// Spend `amount` of base currency on this token.
    ///
    /// The buyer pays `amount` and receives `receipt.quantity` tokens
    /// (purchased quantity net of the burn). A buy whose minted quantity,
    /// new supply or new price would not be finite is rejected before any
    /// state changes.
    pub fn buy(&mut self, amount: f64) -> Result<TradeReceipt> {
        ensure_amount(amount)?;
        let price_before = self.price;
        if !(price_before.is_finite() && price_before > 0.0) {
            return Err(SimCoreError::UnpricedToken { token: self.id });
        }

        let fee = amount * self.constants.transaction_fee_rate;
        let net = amount - fee;
        let purchased = net / price_before;
        let burned = purchased * self.constants.burn_rate;
        let minted = purchased - burned;
        let new_supply = self.supply + minted;
        let new_price = self.curve.price(new_supply);
        if !(minted.is_finite() && new_supply.is_finite() && new_price.is_finite()) {
            return Err(SimCoreError::TradeOverflow {
                token: self.id,
                supply: self.supply,
            });
        }

        self.supply = new_supply;
        self.reprice();
        self.settle(fee, burned);

        debug!(
            token = %self.name,
            amount,
            minted,
            price_before,
            price_after = self.price,
            "buy executed"
        );

        Ok(TradeReceipt {
            token: self.id,
            side: OrderSide::Buy,
            quantity: minted,
            gross: amount,
            fee,
            net,
            burned,
            price_before,
            price_after: self.price,
        })
    }

    /// Sell `quantity` tokens from a seller holding `held`.
    ///
    /// Rejected without touching state if the seller holds too little, the
    /// sale would drive supply below zero, or the proceeds overflow.
    pub fn sell(&mut self, quantity: f64, held: f64) -> Result<TradeReceipt> {
        ensure_amount(quantity)?;
        if quantity > held {
            return Err(SimCoreError::InsufficientHoldings {
                requested: quantity,
                available: held,
            });
        }
        if quantity > self.supply {
            return Err(SimCoreError::SupplyUnderflow {
                requested: quantity,
                supply: self.supply,
            });
        }

        let price_before = self.price;
        let gross = quantity * price_before;
        if !gross.is_finite() {
            return Err(SimCoreError::TradeOverflow {
                token: self.id,
                supply: self.supply,
            });
        }
        let fee = gross * self.constants.transaction_fee_rate;
        let net = gross - fee;
        let remaining = self.supply - quantity;
        let burned = remaining * self.constants.burn_rate;

        self.supply = remaining - burned;
        self.reprice();
        self.settle(fee, burned);

        debug!(
            token = %self.name,
            quantity,
            proceeds = net,
            price_before,
            price_after = self.price,
            "sell executed"
        );

        Ok(TradeReceipt {
            token: self.id,
            side: OrderSide::Sell,
            quantity,
            gross,
            fee,
            net,
            burned,
            price_before,
            price_after: self.price,
        })
    }

    fn settle(&mut self, fee: f64, burned: f64) {
        self.fees_collected += fee;
        self.total_burned += burned;
        self.trade_count += 1;
        self.record();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Curve events
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the active curve wholesale. The candidate becomes the new
    /// drift anchor. Returns the previous curve.
    pub fn replace_curve(
        &mut self,
        candidate: BondingCurve,
        schedule: &CurveSchedule,
    ) -> Result<BondingCurve> {
        candidate.validate(self.validation_horizon(schedule))?;
        let previous = self.curve;
        self.curve = candidate;
        self.anchor = candidate;
        self.reprice();
        self.record();
        info!(
            token = %self.name,
            from = %previous.kind(),
            to = %candidate.kind(),
            price = self.price,
            "bonding curve switched"
        );
        Ok(previous)
    }

    /// Switch to the next curve kind, calibrated to continue from the
    /// current price.
    pub fn switch_to_next_curve(&mut self, schedule: &CurveSchedule) -> Result<BondingCurve> {
        let candidate = self
            .curve
            .kind()
            .next()
            .default_curve()
            .calibrated(self.supply, self.price);
        self.replace_curve(candidate, schedule)
    }

    /// Perturb the active curve's parameters around the anchor. A candidate
    /// that fails validation is rejected and the current parameters stay.
    pub fn drift_parameters<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        schedule: &CurveSchedule,
    ) -> Result<()> {
        let candidate = self.anchor.drifted(rng, schedule.drift_spread);
        candidate.validate(self.validation_horizon(schedule))?;
        self.curve = candidate;
        self.reprice();
        self.record();
        debug!(token = %self.name, curve = %self.curve, price = self.price, "curve parameters drifted");
        Ok(())
    }
}

fn ensure_amount(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(SimCoreError::InvalidAmount(amount))
    }
}
