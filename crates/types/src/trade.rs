//! Orders, receipts and fills for the token market.
//!
//! An affiliate emits [`TradeOrder`]s, a token executes them and hands back a
//! [`TradeReceipt`], and the scheduler wraps the receipt together with the
//! commission it earned into a [`Fill`] for observers.

use crate::ids::{AffiliateId, Tick, TokenId};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Order Side
// =============================================================================

/// Direction of a trade from the affiliate's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Why an order was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderOrigin {
    /// Regular trend-driven decision.
    Strategy,
    /// Trend-independent portfolio maintenance sell.
    Rebalance,
}

/// An order emitted by an affiliate for one token.
///
/// `size` is denominated in base currency for buys and in token units for
/// sells. Orders are caps, not guarantees: execution truncates them to what
/// the wallet can cover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub token: TokenId,
    pub side: OrderSide,
    pub size: f64,
    pub origin: OrderOrigin,
}

impl TradeOrder {
    /// Buy `base_amount` worth of `token`.
    pub fn buy(token: TokenId, base_amount: f64) -> Self {
        Self {
            token,
            side: OrderSide::Buy,
            size: base_amount,
            origin: OrderOrigin::Strategy,
        }
    }

    /// Sell `quantity` units of `token`.
    pub fn sell(token: TokenId, quantity: f64) -> Self {
        Self {
            token,
            side: OrderSide::Sell,
            size: quantity,
            origin: OrderOrigin::Strategy,
        }
    }

    /// Sell `quantity` units of `token` as portfolio maintenance.
    pub fn rebalance(token: TokenId, quantity: f64) -> Self {
        Self {
            origin: OrderOrigin::Rebalance,
            ..Self::sell(token, quantity)
        }
    }
}

impl fmt::Display for TradeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.side {
            OrderSide::Buy => "base",
            OrderSide::Sell => "tokens",
        };
        write!(f, "{} {} {:.4} {}", self.side, self.token, self.size, unit)
    }
}

// =============================================================================
// Receipts and Fills
// =============================================================================

/// Result of executing one trade against a token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub token: TokenId,
    pub side: OrderSide,
    /// Tokens delivered to the buyer, or taken from the seller.
    pub quantity: f64,
    /// Base-currency value before fees.
    pub gross: f64,
    /// Fee withheld from `gross`.
    pub fee: f64,
    /// Base currency actually converted (buy) or paid out (sell).
    pub net: f64,
    /// Tokens removed from supply by the burn.
    pub burned: f64,
    pub price_before: f64,
    pub price_after: f64,
}

/// An executed trade attributed to an affiliate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub tick: Tick,
    pub affiliate: AffiliateId,
    pub origin: OrderOrigin,
    pub receipt: TradeReceipt,
    /// Commission credited to the affiliate for this trade.
    pub commission: f64,
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fill[step {}]: {} {} {:.4} {} @ {:.4} (fee {:.4}, commission {:.6})",
            self.tick,
            self.affiliate,
            self.receipt.side,
            self.receipt.quantity,
            self.receipt.token,
            self.receipt.price_before,
            self.receipt.fee,
            self.commission
        )
    }
}
