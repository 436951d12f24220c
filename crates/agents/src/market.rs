//! Read-only market snapshot handed to an affiliate before its turn.

use sim_core::Token;
use types::{Tick, TokenId};

/// One token as an affiliate sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenQuote {
    pub token: TokenId,
    pub price: f64,
    pub supply: f64,
    /// Mean of recent step-close prices, `None` before the first close.
    pub reference: Option<f64>,
}

impl TokenQuote {
    pub fn from_token(token: &Token, reference: Option<f64>) -> Self {
        Self {
            token: token.id(),
            price: token.price(),
            supply: token.supply(),
            reference,
        }
    }
}

/// Prices of every token at the moment an affiliate starts its turn.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub tick: Tick,
    pub quotes: Vec<TokenQuote>,
}

impl MarketData {
    pub fn new(tick: Tick, quotes: Vec<TokenQuote>) -> Self {
        Self { tick, quotes }
    }

    pub fn quote(&self, token: TokenId) -> Option<&TokenQuote> {
        self.quotes.iter().find(|q| q.token == token)
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
