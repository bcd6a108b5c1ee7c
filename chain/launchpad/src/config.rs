//! Global engine configuration
//!
//! The fee schedule and permission block are set at initialization and
//! mutated only through governance. Auctions snapshot the fee schedule at
//! creation time, so a later `set_fees` affects new auctions only.

use serde::{Deserialize, Serialize};
use types::fee::{Fraction, FractionError};

/// Fees charged by the engine, as rational fractions.
///
/// Bases: `new_auction` applies to the owner's first inventory funding;
/// `auction_update` applies pro-rata to remaining inventory at update time;
/// `invalid_bid` and `trade` apply to a bid's payment amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub new_auction: Fraction,
    pub auction_update: Fraction,
    pub invalid_bid: Fraction,
    pub trade: Fraction,
}

impl FeeSchedule {
    /// A schedule that charges nothing.
    pub const FREE: FeeSchedule = FeeSchedule {
        new_auction: Fraction::ZERO,
        auction_update: Fraction::ZERO,
        invalid_bid: Fraction::ZERO,
        trade: Fraction::ZERO,
    };

    /// Reject any fraction with a zero denominator or a rate above one:
    /// no fee may consume more than the amount it applies to.
    pub fn validate(&self) -> Result<(), FractionError> {
        self.new_auction.validate_proper()?;
        self.auction_update.validate_proper()?;
        self.invalid_bid.validate_proper()?;
        self.trade.validate_proper()?;
        Ok(())
    }
}

/// Kill-switches for the public operation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub allow_new_auctions: bool,
    pub allow_auction_updates: bool,
    pub allow_auction_refills: bool,
    pub allow_auction_pullouts: bool,
    pub allow_new_bids: bool,
    pub allow_withdrawals: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            allow_new_auctions: true,
            allow_auction_updates: true,
            allow_auction_refills: true,
            allow_auction_pullouts: true,
            allow_new_bids: true,
            allow_withdrawals: true,
        }
    }
}

/// Mutable global state guarded by governance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadConfig {
    pub permissions: Permissions,
    pub fees: FeeSchedule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_schedule_validate() {
        let mut fees = FeeSchedule::FREE;
        assert!(fees.validate().is_ok());

        fees.trade = Fraction {
            numerator: 1,
            denominator: 0,
        };
        assert_eq!(fees.validate(), Err(FractionError::ZeroDenominator));
    }

    #[test]
    fn test_permissions_default_all_open() {
        let perms = Permissions::default();
        assert!(perms.allow_new_auctions && perms.allow_new_bids && perms.allow_withdrawals);
    }
}
