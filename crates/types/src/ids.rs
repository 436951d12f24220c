//! Core identifier types for the token economy simulation.
//!
//! Tokens and affiliates are addressed by small dense integers so they can
//! double as indices into the scheduler's vectors.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Core ID Types
// =============================================================================

/// Stable identifier for a token in the market.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct TokenId(pub u32);

impl TokenId {
    /// Position of this token in the scheduler's token list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Default display name (`Token_<n>`).
    pub fn default_name(self) -> String {
        format!("Token_{}", self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token#{}", self.0)
    }
}

/// Stable identifier for an affiliate (trading agent).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct AffiliateId(pub u32);

impl AffiliateId {
    /// Position of this affiliate in the scheduler's affiliate list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AffiliateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Affiliate#{}", self.0)
    }
}

// =============================================================================
// Time Types
// =============================================================================

/// Simulation step (discrete time).
pub type Tick = u64;
