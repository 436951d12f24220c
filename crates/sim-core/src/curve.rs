//! Bonding curves: pure functions from token supply to price.
//!
//! Five curve families are supported, each a variant of [`BondingCurve`]
//! carrying its own coefficients:
//!
//! | Kind        | Formula                                           |
//! |-------------|---------------------------------------------------|
//! | linear      | `slope * s + intercept`                           |
//! | exponential | `scale * e^(rate * s)`                            |
//! | sigmoid     | `ceiling / (1 + e^(-steepness * (s - midpoint)))` |
//! | root        | `coefficient * s^(1 / exponent)`                  |
//! | inverse     | `coefficient / (s + offset)`                      |
//!
//! All families are monotone in supply, so a curve that is finite and
//! non-negative at both ends of a supply range is well-behaved on the whole
//! range. [`BondingCurve::validate`] relies on that.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimCoreError};

// =============================================================================
// Curve Kind
// =============================================================================

/// The formula family of a bonding curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Linear,
    Exponential,
    Sigmoid,
    Root,
    Inverse,
}

impl CurveKind {
    /// All kinds, in switch order.
    pub const ALL: [CurveKind; 5] = [
        CurveKind::Linear,
        CurveKind::Exponential,
        CurveKind::Sigmoid,
        CurveKind::Root,
        CurveKind::Inverse,
    ];

    /// The kind a curve switch moves to (cycles through [`CurveKind::ALL`]).
    pub fn next(self) -> Self {
        match self {
            CurveKind::Linear => CurveKind::Exponential,
            CurveKind::Exponential => CurveKind::Sigmoid,
            CurveKind::Sigmoid => CurveKind::Root,
            CurveKind::Root => CurveKind::Inverse,
            CurveKind::Inverse => CurveKind::Linear,
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            CurveKind::Linear => "linear",
            CurveKind::Exponential => "exponential",
            CurveKind::Sigmoid => "sigmoid",
            CurveKind::Root => "root",
            CurveKind::Inverse => "inverse",
        }
    }

    /// Reference parameters for this kind.
    pub fn default_curve(self) -> BondingCurve {
        match self {
            CurveKind::Linear => BondingCurve::Linear {
                slope: 0.001,
                intercept: 1.0,
            },
            CurveKind::Exponential => BondingCurve::Exponential {
                scale: 1.0,
                rate: 0.0005,
            },
            CurveKind::Sigmoid => BondingCurve::Sigmoid {
                ceiling: 10.0,
                steepness: 0.0001,
                midpoint: 5_000.0,
            },
            CurveKind::Root => BondingCurve::Root {
                coefficient: 0.1,
                exponent: 2.0,
            },
            CurveKind::Inverse => BondingCurve::Inverse {
                coefficient: 100_000.0,
                offset: 1.0,
            },
        }
    }

    /// Pick a kind uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Bonding Curve
// =============================================================================

/// A bonding curve: formula kind plus its coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BondingCurve {
    Linear {
        slope: f64,
        intercept: f64,
    },
    Exponential {
        scale: f64,
        rate: f64,
    },
    Sigmoid {
        ceiling: f64,
        steepness: f64,
        midpoint: f64,
    },
    Root {
        coefficient: f64,
        exponent: f64,
    },
    Inverse {
        coefficient: f64,
        offset: f64,
    },
}

impl Default for BondingCurve {
    fn default() -> Self {
        CurveKind::Linear.default_curve()
    }
}

impl BondingCurve {
    pub fn linear(slope: f64, intercept: f64) -> Self {
        BondingCurve::Linear { slope, intercept }
    }

    pub fn exponential(scale: f64, rate: f64) -> Self {
        BondingCurve::Exponential { scale, rate }
    }

    pub fn sigmoid(ceiling: f64, steepness: f64, midpoint: f64) -> Self {
        BondingCurve::Sigmoid {
            ceiling,
            steepness,
            midpoint,
        }
    }

    pub fn root(coefficient: f64, exponent: f64) -> Self {
        BondingCurve::Root {
            coefficient,
            exponent,
        }
    }

    pub fn inverse(coefficient: f64, offset: f64) -> Self {
        BondingCurve::Inverse {
            coefficient,
            offset,
        }
    }

    /// The formula family of this curve.
    pub fn kind(&self) -> CurveKind {
        match self {
            BondingCurve::Linear { .. } => CurveKind::Linear,
            BondingCurve::Exponential { .. } => CurveKind::Exponential,
            BondingCurve::Sigmoid { .. } => CurveKind::Sigmoid,
            BondingCurve::Root { .. } => CurveKind::Root,
            BondingCurve::Inverse { .. } => CurveKind::Inverse,
        }
    }

    /// Price at `supply`. Negative supply is treated as zero; a NaN supply
    /// yields a NaN price.
    pub fn price(&self, supply: f64) -> f64 {
        let s = if supply < 0.0 { 0.0 } else { supply };
        match *self {
            BondingCurve::Linear { slope, intercept } => slope * s + intercept,
            BondingCurve::Exponential { scale, rate } => scale * (rate * s).exp(),
            BondingCurve::Sigmoid {
                ceiling,
                steepness,
                midpoint,
            } => ceiling / (1.0 + (-steepness * (s - midpoint)).exp()),
            BondingCurve::Root {
                coefficient,
                exponent,
            } => coefficient * s.powf(exponent.recip()),
            BondingCurve::Inverse {
                coefficient,
                offset,
            } => coefficient / (s + offset),
        }
    }

    /// Named coefficients, in declaration order.
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        match *self {
            BondingCurve::Linear { slope, intercept } => {
                vec![("slope", slope), ("intercept", intercept)]
            }
            BondingCurve::Exponential { scale, rate } => vec![("scale", scale), ("rate", rate)],
            BondingCurve::Sigmoid {
                ceiling,
                steepness,
                midpoint,
            } => vec![
                ("ceiling", ceiling),
                ("steepness", steepness),
                ("midpoint", midpoint),
            ],
            BondingCurve::Root {
                coefficient,
                exponent,
            } => vec![("coefficient", coefficient), ("exponent", exponent)],
            BondingCurve::Inverse {
                coefficient,
                offset,
            } => vec![("coefficient", coefficient), ("offset", offset)],
        }
    }

    /// Check that the curve yields a finite, non-negative price for every
    /// supply in `[0, horizon]`.
    pub fn validate(&self, horizon: f64) -> Result<()> {
        let kind = self.kind();
        let invalid = |reason: String| SimCoreError::InvalidCurveParameters { kind, reason };

        if let Some((name, value)) = self.parameters().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} is not finite ({value})")));
        }

        let (ok, reason) = match *self {
            BondingCurve::Linear { slope, intercept } => (
                slope >= 0.0 && intercept >= 0.0,
                "slope and intercept must be non-negative",
            ),
            BondingCurve::Exponential { scale, rate } => (
                scale >= 0.0 && rate >= 0.0,
                "scale and rate must be non-negative",
            ),
            BondingCurve::Sigmoid {
                ceiling, steepness, ..
            } => (
                ceiling > 0.0 && steepness > 0.0,
                "ceiling and steepness must be positive",
            ),
            BondingCurve::Root {
                coefficient,
                exponent,
            } => (
                coefficient >= 0.0 && exponent > 0.0,
                "coefficient must be non-negative and exponent positive",
            ),
            BondingCurve::Inverse {
                coefficient,
                offset,
            } => (
                coefficient >= 0.0 && offset > 0.0,
                "coefficient must be non-negative and offset positive",
            ),
        };
        if !ok {
            return Err(invalid(reason.to_string()));
        }

        if !(horizon.is_finite() && horizon >= 0.0) {
            return Err(invalid(format!("validation horizon {horizon} is not usable")));
        }
        for supply in [0.0, horizon] {
            let price = self.price(supply);
            if !price.is_finite() || price < 0.0 {
                return Err(invalid(format!(
                    "price {price} at supply {supply} is outside [0, inf)"
                )));
            }
        }
        Ok(())
    }

    /// Rescale the level coefficient(s) so that `price(supply) == target_price`.
    ///
    /// Returns the curve unchanged when either the current or the target
    /// price is not a positive finite number.
    pub fn calibrated(self, supply: f64, target_price: f64) -> Self {
        let current = self.price(supply);
        let usable = |p: f64| p.is_finite() && p > 0.0;
        if !usable(current) || !usable(target_price) {
            return self;
        }
        self.scaled(target_price / current)
    }

    /// Multiply every price by `factor` (price is linear in the level
    /// coefficients of every family).
    fn scaled(self, factor: f64) -> Self {
        match self {
            BondingCurve::Linear { slope, intercept } => BondingCurve::Linear {
                slope: slope * factor,
                intercept: intercept * factor,
            },
            BondingCurve::Exponential { scale, rate } => BondingCurve::Exponential {
                scale: scale * factor,
                rate,
            },
            BondingCurve::Sigmoid {
                ceiling,
                steepness,
                midpoint,
            } => BondingCurve::Sigmoid {
                ceiling: ceiling * factor,
                steepness,
                midpoint,
            },
            BondingCurve::Root {
                coefficient,
                exponent,
            } => BondingCurve::Root {
                coefficient: coefficient * factor,
                exponent,
            },
            BondingCurve::Inverse {
                coefficient,
                offset,
            } => BondingCurve::Inverse {
                coefficient: coefficient * factor,
                offset,
            },
        }
    }

    /// Resample the drifting coefficients uniformly in
    /// `[value * (1 - spread), value * (1 + spread)]`.
    ///
    /// Root exponent and inverse offset define the curve's shape and stay put.
    pub fn drifted<R: Rng + ?Sized>(&self, rng: &mut R, spread: f64) -> Self {
        let spread = spread.abs();
        let mut jitter = |value: f64| value * rng.random_range((1.0 - spread)..=(1.0 + spread));
        match *self {
            BondingCurve::Linear { slope, intercept } => BondingCurve::Linear {
                slope: jitter(slope),
                intercept: jitter(intercept),
            },
            BondingCurve::Exponential { scale, rate } => BondingCurve::Exponential {
                scale: jitter(scale),
                rate: jitter(rate),
            },
            BondingCurve::Sigmoid {
                ceiling,
                steepness,
                midpoint,
            } => BondingCurve::Sigmoid {
                ceiling: jitter(ceiling),
                steepness: jitter(steepness),
                midpoint: jitter(midpoint),
            },
            BondingCurve::Root {
                coefficient,
                exponent,
            } => BondingCurve::Root {
                coefficient: jitter(coefficient),
                exponent,
            },
            BondingCurve::Inverse {
                coefficient,
                offset,
            } => BondingCurve::Inverse {
                coefficient: jitter(coefficient),
                offset,
            },
        }
    }
}

impl fmt::Display for BondingCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind())?;
        for (i, (name, value)) in self.parameters().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value:.6}")?;
        }
        write!(f, ")")
    }
}
