//! Auction state machine
//!
//! One record per auction: lifecycle state, timing window, pricing
//! parameters, per-asset dispensing inventory, and the fee schedule
//! snapshotted at creation. Lifecycle is
//! `Created → Enabled ⇄ Disabled → deleted`, where deletion removes the
//! record from the ledger entirely (terminal and unreachable).
//!
//! The price curve quotes in pricing-asset base units per `unit_size` of
//! dispensed tokens; the engine converts that to payment units through the
//! oracle pair. The quote helpers here are pure and read no other auction's
//! state, so they can be evaluated concurrently by any caller.

use serde::{Deserialize, Serialize};
use types::fee::Fraction;
use types::ids::Address;
use types::numeric::{mul_div_ceil, mul_div_floor};

use crate::config::FeeSchedule;
use crate::errors::AuctionError;

/// Lifecycle state. There is no stored `Deleted` state: deletion removes
/// the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionState {
    /// Created with a future start time; bids follow the timing window.
    Created,
    /// Open for bids within the timing window.
    Enabled,
    /// Bids blocked; owner inventory management still allowed.
    Disabled,
}

impl AuctionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionState::Created => "created",
            AuctionState::Enabled => "enabled",
            AuctionState::Disabled => "disabled",
        }
    }
}

/// How the unit price evolves over the auction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingModel {
    /// Constant `start_price` for the whole window.
    FixedPrice,
    /// Linear decay from `start_price` at the window start down to
    /// `end_price` at the window end.
    LinearDecay,
}

/// Pricing parameters, all in pricing-asset base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingParams {
    /// Governance custody of the asset the curve is denominated in.
    pub pricing_custody: Address,
    /// Governance custody of the asset buyers pay with.
    pub payment_custody: Address,
    pub model: PricingModel,
    /// Price per `unit_size` dispensed base units at the window start.
    pub start_price: u64,
    /// Price floor reached at the window end (`LinearDecay` only).
    pub end_price: u64,
    /// Dispensed base units covered by one quoted price.
    pub unit_size: u64,
    /// Accepted deviation between a submitted bid price and the curve.
    pub price_tolerance: Fraction,
}

impl PricingParams {
    pub fn validate(&self) -> Result<(), AuctionError> {
        if self.unit_size == 0 {
            return Err(AuctionError::InvalidParams("unit_size must be non-zero".into()));
        }
        if self.start_price == 0 || self.end_price == 0 {
            return Err(AuctionError::InvalidParams("prices must be non-zero".into()));
        }
        if self.model == PricingModel::LinearDecay && self.end_price > self.start_price {
            return Err(AuctionError::InvalidParams(
                "decay end_price above start_price".into(),
            ));
        }
        self.price_tolerance
            .validate()
            .map_err(|e| AuctionError::InvalidParams(e.to_string()))?;
        Ok(())
    }
}

/// Remaining stock of one dispensable asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispensingInventory {
    pub asset: Address,
    pub decimals: u8,
    /// Address of the per-auction dispensing custody holding the stock.
    pub custody: Address,
    /// Total ever funded, net of creation fees.
    pub deposited: u64,
    /// Undispensed stock.
    pub remaining: u64,
}

/// Parameters for creating an auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    pub name: String,
    pub start_time: i64,
    pub end_time: i64,
    pub pricing: PricingParams,
    /// Dispensable assets, parallel to `dispensing_decimals`.
    pub dispensing_assets: Vec<Address>,
    pub dispensing_decimals: Vec<u8>,
    pub whitelist_required: bool,
}

/// Parameters for updating an auction. The name, owner, and dispensing
/// asset set are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAuctionParams {
    pub start_time: i64,
    pub end_time: i64,
    pub pricing: PricingParams,
    pub whitelist_required: bool,
}

/// One auction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub owner: Address,
    pub name: String,
    pub state: AuctionState,
    pub start_time: i64,
    pub end_time: i64,
    pub pricing: PricingParams,
    pub inventories: Vec<DispensingInventory>,
    /// Fee schedule snapshotted at creation; later global fee changes do
    /// not affect a live auction.
    pub fees: FeeSchedule,
    pub whitelist_required: bool,
    /// Whether the one-time creation fee has been collected from the
    /// owner's first funding.
    pub creation_fee_paid: bool,
    pub update_count: u64,
    pub created_at: i64,
}

impl Auction {
    /// Ledger address for an auction, derived from its key tuple.
    pub fn address_of(owner: &Address, name: &str) -> Address {
        Address::derive("auction", &[owner.as_ref(), name.as_bytes()])
    }

    /// Validate params and build the record. Starts `Enabled`, or `Created`
    /// when the start time lies in the future.
    pub fn new(
        owner: Address,
        params: AuctionParams,
        fees: FeeSchedule,
        now: i64,
    ) -> Result<Self, AuctionError> {
        if params.name.is_empty() {
            return Err(AuctionError::InvalidParams("empty auction name".into()));
        }
        if params.end_time <= params.start_time {
            return Err(AuctionError::InvalidParams(
                "end_time must follow start_time".into(),
            ));
        }
        if params.dispensing_assets.is_empty() {
            return Err(AuctionError::InvalidParams("no dispensable assets".into()));
        }
        if params.dispensing_assets.len() != params.dispensing_decimals.len() {
            return Err(AuctionError::InvalidParams(
                "dispensing asset and decimals lists differ in length".into(),
            ));
        }
        for (i, asset) in params.dispensing_assets.iter().enumerate() {
            if params.dispensing_assets[..i].contains(asset) {
                return Err(AuctionError::InvalidParams(
                    "duplicate dispensable asset".into(),
                ));
            }
        }
        params.pricing.validate()?;
        fees.validate()
            .map_err(|e| AuctionError::InvalidParams(e.to_string()))?;

        let address = Self::address_of(&owner, &params.name);
        let inventories = params
            .dispensing_assets
            .iter()
            .zip(&params.dispensing_decimals)
            .map(|(asset, decimals)| DispensingInventory {
                asset: *asset,
                decimals: *decimals,
                custody: crate::custody::Custody::dispensing_address(asset, &address),
                deposited: 0,
                remaining: 0,
            })
            .collect();

        let state = if params.start_time > now {
            AuctionState::Created
        } else {
            AuctionState::Enabled
        };

        Ok(Self {
            owner,
            name: params.name,
            state,
            start_time: params.start_time,
            end_time: params.end_time,
            pricing: params.pricing,
            inventories,
            fees,
            whitelist_required: params.whitelist_required,
            creation_fee_paid: false,
            update_count: 0,
            created_at: now,
        })
    }

    pub fn require_owner(&self, who: &Address) -> Result<(), AuctionError> {
        if &self.owner != who {
            return Err(AuctionError::Unauthorized);
        }
        Ok(())
    }

    /// `Created | Disabled → Enabled`. Enabling an enabled auction is an
    /// error so client bugs surface early.
    pub fn enable(&mut self) -> Result<(), AuctionError> {
        if self.state == AuctionState::Enabled {
            return Err(AuctionError::InvalidState {
                state: self.state.as_str(),
            });
        }
        self.state = AuctionState::Enabled;
        Ok(())
    }

    /// `Created | Enabled → Disabled`.
    pub fn disable(&mut self) -> Result<(), AuctionError> {
        if self.state == AuctionState::Disabled {
            return Err(AuctionError::InvalidState {
                state: self.state.as_str(),
            });
        }
        self.state = AuctionState::Disabled;
        Ok(())
    }

    /// Whether bids may be placed right now.
    pub fn is_open_for_bids(&self, now: i64) -> bool {
        self.state != AuctionState::Disabled && now >= self.start_time && now <= self.end_time
    }

    pub fn inventory(&self, asset: &Address) -> Option<&DispensingInventory> {
        self.inventories.iter().find(|i| &i.asset == asset)
    }

    pub fn inventory_mut(&mut self, asset: &Address) -> Option<&mut DispensingInventory> {
        self.inventories.iter_mut().find(|i| &i.asset == asset)
    }

    /// Largest amount currently coverable by every dispensing inventory.
    pub fn available_stock(&self) -> u64 {
        self.inventories
            .iter()
            .map(|i| i.remaining)
            .min()
            .unwrap_or(0)
    }

    /// Deletion precondition: every inventory fully withdrawn or swept.
    pub fn require_empty(&self) -> Result<(), AuctionError> {
        for inv in &self.inventories {
            if inv.remaining > 0 {
                return Err(AuctionError::InventoryNotEmpty {
                    asset: inv.asset,
                    remaining: inv.remaining,
                });
            }
        }
        Ok(())
    }

    /// Curve unit price at `now`, in pricing-asset base units per
    /// `unit_size` dispensed units. Pure; clamps outside the window.
    pub fn unit_price(&self, now: i64) -> u64 {
        match self.pricing.model {
            PricingModel::FixedPrice => self.pricing.start_price,
            PricingModel::LinearDecay => {
                if now <= self.start_time {
                    self.pricing.start_price
                } else if now >= self.end_time {
                    self.pricing.end_price
                } else {
                    let elapsed = (now - self.start_time) as u128;
                    let window = (self.end_time - self.start_time) as u128;
                    let span = (self.pricing.start_price - self.pricing.end_price) as u128;
                    // window > 0 and elapsed < window here
                    self.pricing.start_price - (span * elapsed / window) as u64
                }
            }
        }
    }
}

/// Total price for `amount` dispensed units at a unit price, rounded up so
/// a buyer can never underpay through rounding.
pub fn price_for_amount(unit_price: u64, unit_size: u64, amount: u64) -> Option<u64> {
    mul_div_ceil(amount, unit_price, unit_size)
}

/// Dispensed units purchasable for `price` at a unit price, rounded down.
/// Mutual inverse of [`price_for_amount`] up to one rounding unit.
pub fn amount_for_price(unit_price: u64, unit_size: u64, price: u64) -> Option<u64> {
    if unit_price == 0 {
        return None;
    }
    mul_div_floor(price, unit_size, unit_price)
}
