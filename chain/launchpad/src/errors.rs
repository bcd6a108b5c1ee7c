//! Engine error taxonomy
//!
//! One enum per domain, converted into the top-level [`LaunchpadError`] via
//! `#[from]`. Every failure is detected before any state mutation: an `Err`
//! return always leaves the ledger exactly as it was.

use thiserror::Error;
use types::ids::Address;

/// Governance (multisig) errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("caller is not an administrator")]
    Unauthorized,

    #[error("a different operation is already pending approval")]
    StaleMismatch,

    #[error("invalid signature threshold {requested} for {admins} administrators")]
    InvalidThreshold { requested: u8, admins: usize },

    #[error("administrator set of {count} exceeds the maximum of {max}")]
    TooManyAdmins { count: usize, max: usize },

    #[error("administrator {admin} listed twice")]
    DuplicateAdmin { admin: Address },

    #[error("no operation is pending approval")]
    NoPendingOperation,
}

/// Custody ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("custody for asset {asset} already exists")]
    AlreadyExists { asset: Address },

    #[error("custody {custody} not found")]
    NotFound { custody: Address },

    #[error("insufficient custody funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("insufficient collected fees: required {required}, available {available}")]
    InsufficientFees { required: u64, available: u64 },

    #[error("arithmetic overflow in custody balance")]
    Overflow,
}

/// Price oracle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("no quote available for oracle {oracle}")]
    Unavailable { oracle: Address },

    #[error("custody {custody} has no oracle configured")]
    Unconfigured { custody: Address },

    #[error("quote is stale: {age_sec}s old, maximum {max_age_sec}s")]
    Stale { age_sec: i64, max_age_sec: u32 },

    #[error("quote confidence {conf} too wide for price {price}")]
    LowConfidence { conf: u64, price: u64 },

    #[error("price normalization overflow")]
    PriceOverflow,
}

/// Auction lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuctionError {
    #[error("caller is not the auction owner")]
    Unauthorized,

    #[error("auction {auction} not found")]
    NotFound { auction: Address },

    #[error("auction {auction} already exists")]
    AlreadyExists { auction: Address },

    #[error("operation illegal in auction state {state}")]
    InvalidState { state: &'static str },

    #[error("invalid auction parameters: {0}")]
    InvalidParams(String),

    #[error("insufficient inventory of {asset}: required {required}, available {available}")]
    InsufficientInventory {
        asset: Address,
        required: u64,
        available: u64,
    },

    #[error("auction inventory of {asset} not empty: {remaining} remaining")]
    InventoryNotEmpty { asset: Address, remaining: u64 },
}

/// Bid registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BidError {
    #[error("bidder is not whitelisted for this auction")]
    NotWhitelisted,

    #[error("auction is not open for bids")]
    AuctionNotOpen,

    #[error("bid price {submitted} out of range of current price {current}")]
    PriceOutOfRange { submitted: u64, current: u64 },

    #[error("no bid exists for this bidder and auction")]
    NoSuchBid,

    #[error("invalid bid parameters: {0}")]
    InvalidParams(String),
}

/// External token-account ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("insufficient account funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("arithmetic overflow in account balance")]
    Overflow,
}

/// Seller-balance errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("insufficient seller balance: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("arithmetic overflow in seller balance")]
    Overflow,
}

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchpadError {
    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("custody error: {0}")]
    Custody(#[from] CustodyError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("auction error: {0}")]
    Auction(#[from] AuctionError),

    #[error("bid error: {0}")]
    Bid(#[from] BidError),

    #[error("account error: {0}")]
    Bank(#[from] BankError),

    #[error("settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("operation disabled by governance: {operation}")]
    OperationDisabled { operation: &'static str },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("failed to encode governance payload: {message}")]
    PayloadEncoding { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custody_error_display() {
        let err = CustodyError::InsufficientFunds {
            required: 100,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "insufficient custody funds: required 100, available 40"
        );
    }

    #[test]
    fn test_oracle_error_display() {
        let err = OracleError::Stale {
            age_sec: 120,
            max_age_sec: 60,
        };
        assert!(err.to_string().contains("120"));
        assert!(err.to_string().contains("60"));
    }

    #[test]
    fn test_launchpad_error_from_governance() {
        let err: LaunchpadError = GovernanceError::Unauthorized.into();
        assert!(matches!(err, LaunchpadError::Governance(_)));
    }

    #[test]
    fn test_launchpad_error_from_bid() {
        let err: LaunchpadError = BidError::NoSuchBid.into();
        assert!(matches!(err, LaunchpadError::Bid(BidError::NoSuchBid)));
    }

    #[test]
    fn test_auction_error_display_includes_address() {
        let auction = Address::from_seed("missing");
        let err = AuctionError::NotFound { auction };
        assert!(err.to_string().contains(&auction.to_string()));
    }
}
