//! Rational fee fractions
//!
//! Fees are explicit numerator/denominator pairs applied with round-down
//! semantics, never floating point. The same type bounds oracle confidence
//! intervals (a confidence wider than `fraction * price` is rejected).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error raised for a malformed fraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FractionError {
    #[error("fraction denominator must be non-zero")]
    ZeroDenominator,

    #[error("fraction {numerator}/{denominator} exceeds one")]
    ImproperFraction { numerator: u64, denominator: u64 },
}

/// A rational fraction of an amount.
///
/// `apply` always rounds down, so fee collection can never create value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fraction {
    /// The zero fraction (no fee).
    pub const ZERO: Fraction = Fraction {
        numerator: 0,
        denominator: 1,
    };

    /// Build a fraction, rejecting a zero denominator.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, FractionError> {
        if denominator == 0 {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Check the invariant without constructing.
    pub fn validate(&self) -> Result<(), FractionError> {
        if self.denominator == 0 {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(())
    }

    /// Additionally require the fraction to be at most one, so applying it
    /// to an amount can never yield more than the amount.
    pub fn validate_proper(&self) -> Result<(), FractionError> {
        self.validate()?;
        if self.numerator > self.denominator {
            return Err(FractionError::ImproperFraction {
                numerator: self.numerator,
                denominator: self.denominator,
            });
        }
        Ok(())
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// `floor(amount * numerator / denominator)`.
    ///
    /// `None` on a zero denominator or u64 overflow of the result.
    pub fn apply(&self, amount: u64) -> Option<u64> {
        crate::numeric::mul_div_floor(amount, self.numerator, self.denominator)
    }

    /// Whether `part / whole` exceeds this fraction, by cross-multiplication.
    ///
    /// Used for oracle confidence checks: `conf / price > max_error`.
    pub fn exceeded_by(&self, part: u64, whole: u64) -> bool {
        (part as u128) * (self.denominator as u128) > (whole as u128) * (self.numerator as u128)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
