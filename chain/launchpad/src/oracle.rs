//! Price oracle adapter
//!
//! Reads externally published quotes, validates freshness and confidence
//! against each custody's configured bounds, and converts amounts between
//! assets by dividing their normalized prices. Quotes are consumed read-only
//! at the instant of use; the engine never persists one past an operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;
use types::ids::Address;

use crate::custody::OracleConfig;
use crate::errors::OracleError;

/// A published price quote.
///
/// `price * 10^expo` is the effective price; `conf` is the confidence
/// interval in the same scale; `publish_time` is seconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: u64,
    pub expo: i32,
    pub conf: u64,
    pub publish_time: i64,
}

/// A validated price: mantissa and power-of-ten exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub price: u64,
    pub expo: i32,
}

impl OraclePrice {
    /// Re-express the price at a target exponent with checked arithmetic.
    ///
    /// Scaling to a larger exponent truncates (rounds toward zero).
    pub fn scale_to_exponent(&self, target: i32) -> Result<OraclePrice, OracleError> {
        if target == self.expo {
            return Ok(*self);
        }
        if target > self.expo {
            let delta = (target - self.expo) as u32;
            let divisor = types::numeric::checked_pow10(delta).ok_or(OracleError::PriceOverflow)?;
            Ok(OraclePrice {
                price: u64::try_from(self.price as u128 / divisor)
                    .map_err(|_| OracleError::PriceOverflow)?,
                expo: target,
            })
        } else {
            let delta = (self.expo - target) as u32;
            let factor = types::numeric::checked_pow10(delta).ok_or(OracleError::PriceOverflow)?;
            let scaled = (self.price as u128)
                .checked_mul(factor)
                .ok_or(OracleError::PriceOverflow)?;
            Ok(OraclePrice {
                price: u64::try_from(scaled).map_err(|_| OracleError::PriceOverflow)?,
                expo: target,
            })
        }
    }
}

/// Rounding direction for cross-asset conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    Floor,
    Ceil,
}

/// Convert `amount` of asset A (scale `decimals_a`, priced `price_a`) into
/// base units of asset B, rounding down.
pub fn convert_amount_floor(
    amount: u64,
    price_a: OraclePrice,
    decimals_a: u8,
    price_b: OraclePrice,
    decimals_b: u8,
) -> Result<u64, OracleError> {
    convert_amount(amount, price_a, decimals_a, price_b, decimals_b, Rounding::Floor)
}

/// Convert `amount` of asset A into base units of asset B, rounding up.
pub fn convert_amount_ceil(
    amount: u64,
    price_a: OraclePrice,
    decimals_a: u8,
    price_b: OraclePrice,
    decimals_b: u8,
) -> Result<u64, OracleError> {
    convert_amount(amount, price_a, decimals_a, price_b, decimals_b, Rounding::Ceil)
}

fn convert_amount(
    amount: u64,
    price_a: OraclePrice,
    decimals_a: u8,
    price_b: OraclePrice,
    decimals_b: u8,
    rounding: Rounding,
) -> Result<u64, OracleError> {
    if price_b.price == 0 {
        return Err(OracleError::PriceOverflow);
    }

    // amount_b = amount_a * price_a * 10^shift / price_b
    // with shift = expo_a - expo_b + decimals_b - decimals_a
    let shift = price_a.expo - price_b.expo + i32::from(decimals_b) - i32::from(decimals_a);

    let mut numerator = (amount as u128)
        .checked_mul(price_a.price as u128)
        .ok_or(OracleError::PriceOverflow)?;
    let mut denominator = price_b.price as u128;

    if shift >= 0 {
        let factor = types::numeric::checked_pow10(shift as u32).ok_or(OracleError::PriceOverflow)?;
        numerator = numerator
            .checked_mul(factor)
            .ok_or(OracleError::PriceOverflow)?;
    } else {
        let factor =
            types::numeric::checked_pow10((-shift) as u32).ok_or(OracleError::PriceOverflow)?;
        denominator = denominator
            .checked_mul(factor)
            .ok_or(OracleError::PriceOverflow)?;
    }

    let converted = match rounding {
        Rounding::Floor => numerator / denominator,
        Rounding::Ceil => numerator.div_ceil(denominator),
    };
    u64::try_from(converted).map_err(|_| OracleError::PriceOverflow)
}

/// Latest published quote per oracle account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleBook {
    quotes: HashMap<Address, Quote>,
}

impl OracleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest quote for an oracle account, replacing any prior.
    pub fn publish(&mut self, oracle: Address, quote: Quote) {
        self.quotes.insert(oracle, quote);
    }

    pub fn quote(&self, oracle: &Address) -> Option<&Quote> {
        self.quotes.get(oracle)
    }

    /// Read a validated price under the custody's configured bounds.
    pub fn get_price(&self, config: &OracleConfig, now: i64) -> Result<OraclePrice, OracleError> {
        let quote = self
            .quotes
            .get(&config.oracle_account)
            .ok_or(OracleError::Unavailable {
                oracle: config.oracle_account,
            })?;

        if quote.price == 0 {
            return Err(OracleError::Unavailable {
                oracle: config.oracle_account,
            });
        }

        let age_sec = now.saturating_sub(quote.publish_time);
        if age_sec > i64::from(config.max_price_age_sec) {
            return Err(OracleError::Stale {
                age_sec,
                max_age_sec: config.max_price_age_sec,
            });
        }

        if config.max_price_error.exceeded_by(quote.conf, quote.price) {
            return Err(OracleError::LowConfidence {
                conf: quote.conf,
                price: quote.price,
            });
        }

        trace!(oracle = %config.oracle_account, price = quote.price, expo = quote.expo, "quote read");
        Ok(OraclePrice {
            price: quote.price,
            expo: quote.expo,
        })
    }
}
