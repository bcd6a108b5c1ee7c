//! Engine events
//!
//! Immutable records appended for every successful state mutation, drained
//! by the host for indexing and notification. One struct per event plus an
//! enum wrapper for uniform handling.

use serde::{Deserialize, Serialize};
use types::ids::Address;

use crate::config::{FeeSchedule, Permissions};
use crate::multisig::OperationKind;

/// Engine created with its administrator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadInitialized {
    pub admins: Vec<Address>,
    pub min_signatures: u8,
}

/// A governance approval was recorded without reaching the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecorded {
    pub kind: OperationKind,
    pub signed: u8,
    pub required: u8,
}

/// The signature threshold changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSignersUpdated {
    pub min_signatures: u8,
}

/// The global fee schedule changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesUpdated {
    pub fees: FeeSchedule,
}

/// The global permission block changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsUpdated {
    pub permissions: Permissions,
}

/// A custody's oracle configuration changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfigUpdated {
    pub custody: Address,
}

/// A quote was published to an oracle account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePricePublished {
    pub oracle: Address,
    pub price: u64,
    pub expo: i32,
}

/// A custody record was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyCreated {
    pub custody: Address,
    pub asset: Address,
    pub decimals: u8,
}

/// Collected fees were paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesWithdrawn {
    pub custody: Address,
    pub amount: u64,
    pub destination: Address,
}

/// An auction record was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionCreated {
    pub auction: Address,
    pub owner: Address,
    pub name: String,
}

/// An auction's parameters were updated by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionUpdated {
    pub auction: Address,
    /// Total update fee collected across dispensing custodies.
    pub update_fee: u64,
}

/// An auction was switched on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionEnabled {
    pub auction: Address,
}

/// An auction was switched off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionDisabled {
    pub auction: Address,
}

/// An auction record was destroyed by governance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionDeleted {
    pub auction: Address,
}

/// The owner funded dispensable inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensAdded {
    pub auction: Address,
    pub asset: Address,
    pub amount: u64,
    /// Creation fee collected out of this funding, if any.
    pub fee: u64,
}

/// The owner withdrew undispensed inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensRemoved {
    pub auction: Address,
    pub asset: Address,
    pub amount: u64,
}

/// Whitelist membership entries were created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistAdded {
    pub auction: Address,
    pub addresses: Vec<Address>,
}

/// Whitelist membership entries were revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistRemoved {
    pub auction: Address,
    pub addresses: Vec<Address>,
}

/// A bid settled (fully or partially).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidPlaced {
    pub auction: Address,
    pub bidder: Address,
    pub fill_amount: u64,
    pub payment: u64,
    pub fee: u64,
    /// Payment escrowed for the unfilled remainder of a dynamic bid.
    pub escrowed: u64,
}

/// A bid was rejected for a client-attributable reason and charged the
/// invalid-bid fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRejected {
    pub auction: Address,
    pub bidder: Address,
    pub reason: String,
    pub fee: u64,
}

/// A bid was cancelled and its escrow refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidCancelled {
    pub auction: Address,
    pub bidder: Address,
    pub refunded: u64,
}

/// A seller withdrew accumulated proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsWithdrawn {
    pub seller: Address,
    pub custody: Address,
    pub amount: u64,
    pub destination: Address,
}

/// Enum wrapper for all engine events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchpadEvent {
    LaunchpadInitialized(LaunchpadInitialized),
    ApprovalRecorded(ApprovalRecorded),
    AdminSignersUpdated(AdminSignersUpdated),
    FeesUpdated(FeesUpdated),
    PermissionsUpdated(PermissionsUpdated),
    OracleConfigUpdated(OracleConfigUpdated),
    OraclePricePublished(OraclePricePublished),
    CustodyCreated(CustodyCreated),
    FeesWithdrawn(FeesWithdrawn),
    AuctionCreated(AuctionCreated),
    AuctionUpdated(AuctionUpdated),
    AuctionEnabled(AuctionEnabled),
    AuctionDisabled(AuctionDisabled),
    AuctionDeleted(AuctionDeleted),
    TokensAdded(TokensAdded),
    TokensRemoved(TokensRemoved),
    WhitelistAdded(WhitelistAdded),
    WhitelistRemoved(WhitelistRemoved),
    BidPlaced(BidPlaced),
    BidRejected(BidRejected),
    BidCancelled(BidCancelled),
    FundsWithdrawn(FundsWithdrawn),
}
