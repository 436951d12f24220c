//! Affiliate wallet: base-currency balance plus per-token holdings.
//!
//! Neither the balance nor any holding can go below zero. Every debit is
//! checked and rejected with the matching [`SimCoreError`] rather than
//! clamped, so callers must cap orders before touching the wallet.

use std::collections::BTreeMap;

use sim_core::{Result, SimCoreError};
use types::TokenId;

/// Base-currency balance and token holdings of one affiliate.
#[derive(Debug, Clone, Default)]
pub struct Wallet {
    balance: f64,
    /// Ordered by token so iteration (and therefore rebalancing draws) is
    /// deterministic.
    holdings: BTreeMap<TokenId, f64>,
}

impl Wallet {
    /// Create a wallet with a starting balance and no holdings.
    pub fn new(balance: f64) -> Self {
        Self {
            balance: balance.max(0.0),
            holdings: BTreeMap::new(),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Quantity held of `token` (zero if never bought).
    pub fn holding(&self, token: TokenId) -> f64 {
        self.holdings.get(&token).copied().unwrap_or(0.0)
    }

    /// Non-zero holdings in token order.
    pub fn holdings(&self) -> impl Iterator<Item = (TokenId, f64)> + '_ {
        self.holdings
            .iter()
            .filter(|(_, qty)| **qty > 0.0)
            .map(|(token, qty)| (*token, *qty))
    }

    /// Holdings valued at the given price lookup, plus the cash balance.
    pub fn net_worth(&self, price_of: impl Fn(TokenId) -> Option<f64>) -> f64 {
        self.balance
            + self
                .holdings()
                .map(|(token, qty)| qty * price_of(token).unwrap_or(0.0))
                .sum::<f64>()
    }

    pub fn credit(&mut self, amount: f64) {
        self.balance += amount.max(0.0);
    }

    pub fn debit(&mut self, amount: f64) -> Result<()> {
        if amount > self.balance {
            return Err(SimCoreError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn add_tokens(&mut self, token: TokenId, quantity: f64) {
        *self.holdings.entry(token).or_insert(0.0) += quantity.max(0.0);
    }

    pub fn remove_tokens(&mut self, token: TokenId, quantity: f64) -> Result<()> {
        let held = self.holding(token);
        if quantity > held {
            return Err(SimCoreError::InsufficientHoldings {
                requested: quantity,
                available: held,
            });
        }
        self.holdings.insert(token, held - quantity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_new() {
        let wallet = Wallet::new(1_000.0);
        assert_eq!(wallet.balance(), 1_000.0);
        assert_eq!(wallet.holding(TokenId(0)), 0.0);
        assert_eq!(wallet.holdings().count(), 0);
    }

    #[test]
    fn test_debit_and_credit() {
        let mut wallet = Wallet::new(100.0);
        wallet.debit(40.0).unwrap();
        assert_eq!(wallet.balance(), 60.0);
        wallet.credit(15.0);
        assert_eq!(wallet.balance(), 75.0);

        let err = wallet.debit(80.0).unwrap_err();
        assert!(matches!(err, SimCoreError::InsufficientBalance { .. }));
        assert_eq!(wallet.balance(), 75.0);

        wallet.debit(75.0).unwrap();
        assert_eq!(wallet.balance(), 0.0);
    }

    #[test]
    fn test_token_holdings() {
        let mut wallet = Wallet::new(0.0);
        wallet.add_tokens(TokenId(2), 5.0);
        wallet.add_tokens(TokenId(1), 3.0);
        wallet.add_tokens(TokenId(2), 1.0);
        assert_eq!(wallet.holding(TokenId(2)), 6.0);

        wallet.remove_tokens(TokenId(1), 3.0).unwrap();
        let held: Vec<_> = wallet.holdings().collect();
        assert_eq!(held, vec![(TokenId(2), 6.0)]);

        let err = wallet.remove_tokens(TokenId(2), 7.0).unwrap_err();
        assert!(matches!(err, SimCoreError::InsufficientHoldings { .. }));
        assert_eq!(wallet.holding(TokenId(2)), 6.0);
    }

    #[test]
    fn test_net_worth() {
        let mut wallet = Wallet::new(10.0);
        wallet.add_tokens(TokenId(0), 4.0);
        wallet.add_tokens(TokenId(1), 2.0);
        let worth = wallet.net_worth(|token| (token == TokenId(0)).then_some(2.5));
        assert!((worth - 20.0).abs() < 1e-12);
    }
}
