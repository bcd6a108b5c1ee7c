//! The settlement engine — one operation per public verb
//!
//! `Launchpad` wires the governance ledger, custody ledger, oracle book,
//! auction records, bid registry, seller balances, and the external
//! token-account ledger into a single state machine. Every operation
//! validates completely before mutating anything, so a failure of any kind
//! leaves the ledger untouched; the execution environment supplies total
//! ordering and all-or-nothing application per operation.
//!
//! Privileged operations hash their typed parameter record and route the
//! hash through the multisig; the call whose approval reaches the threshold
//! applies the effect atomically.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use types::ids::Address;

use crate::auction::{
    amount_for_price, price_for_amount, Auction, AuctionParams, UpdateAuctionParams,
};
use crate::bank::TokenBank;
use crate::bid::{Bid, BidBook, BidType};
use crate::config::{FeeSchedule, LaunchpadConfig, Permissions};
use crate::custody::{Custody, CustodyLedger, OracleConfig};
use crate::errors::{
    AuctionError, BankError, BidError, CustodyError, LaunchpadError, OracleError, SettlementError,
};
use crate::events::*;
use crate::multisig::{ApprovalState, Multisig, OperationKind};
use crate::oracle::{convert_amount_ceil, OracleBook, Quote};
use crate::settlement::SellerBalances;

/// Parameters for engine initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitParams {
    pub min_signatures: u8,
    pub permissions: Permissions,
    pub fees: FeeSchedule,
}

/// Parameters for creating a custody (governance-gated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitCustodyParams {
    pub asset: Address,
    pub decimals: u8,
    pub oracle: OracleConfig,
}

/// Parameters for withdrawing collected fees (governance-gated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawFeesParams {
    /// Custody address, either governance or per-auction dispensing.
    pub custody: Address,
    pub amount: u64,
    pub destination: Address,
}

/// Parameters for a seller withdrawing accumulated proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawFundsParams {
    /// The payment asset to withdraw.
    pub asset: Address,
    pub amount: u64,
    pub destination: Address,
}

/// Parameters for placing a bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBidParams {
    /// Unit price in payment base units per auction `unit_size`.
    pub price: u64,
    /// Dispensed base units requested.
    pub amount: u64,
    pub bid_type: BidType,
}

/// Why a bid was rejected while still consuming a transaction slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidRejectReason {
    /// The submitted price disagrees with the current curve beyond the
    /// auction's tolerance (e.g. the client quoted against a stale price).
    PriceOutOfRange { submitted: u64, current: u64 },
}

/// Result of a successfully processed `place_bid` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidOutcome {
    /// The full requested amount settled.
    Filled { fill_amount: u64, payment: u64, fee: u64 },
    /// A dynamic bid settled partially; the remainder's payment is escrowed
    /// on the bid record.
    PartiallyFilled {
        fill_amount: u64,
        payment: u64,
        fee: u64,
        escrowed: u64,
    },
    /// The bid was rejected for a client-attributable reason and charged
    /// the invalid-bid fee instead of the trade fee.
    Rejected { reason: BidRejectReason, fee: u64 },
}

/// The governed token-auction settlement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launchpad {
    config: LaunchpadConfig,
    multisig: Multisig,
    custodies: CustodyLedger,
    oracles: OracleBook,
    auctions: HashMap<Address, Auction>,
    bids: BidBook,
    seller_balances: SellerBalances,
    bank: TokenBank,
    events: Vec<LaunchpadEvent>,
}

impl Launchpad {
    // ───────────────────────── Initialization ─────────────────────────

    /// Create the engine with its administrator set and global config.
    pub fn init(admins: Vec<Address>, params: InitParams) -> Result<Self, LaunchpadError> {
        params
            .fees
            .validate()
            .map_err(|e| LaunchpadError::InvalidParams(e.to_string()))?;
        let multisig = Multisig::new(admins.clone(), params.min_signatures)?;

        let mut engine = Self {
            config: LaunchpadConfig {
                permissions: params.permissions,
                fees: params.fees,
            },
            multisig,
            custodies: CustodyLedger::new(),
            oracles: OracleBook::new(),
            auctions: HashMap::new(),
            bids: BidBook::new(),
            seller_balances: SellerBalances::new(),
            bank: TokenBank::new(),
            events: Vec::new(),
        };
        engine
            .events
            .push(LaunchpadEvent::LaunchpadInitialized(LaunchpadInitialized {
                admins,
                min_signatures: params.min_signatures,
            }));
        info!(min_signatures = params.min_signatures, "launchpad initialized");
        Ok(engine)
    }

    // ───────────────────────── Governance operations ─────────────────────────

    /// Approve (and at threshold, apply) a change of the signature threshold.
    pub fn set_admin_signers(
        &mut self,
        admin: &Address,
        min_signatures: u8,
    ) -> Result<ApprovalState, LaunchpadError> {
        if min_signatures == 0 || usize::from(min_signatures) > self.multisig.admins().len() {
            return Err(LaunchpadError::InvalidParams(format!(
                "threshold {min_signatures} invalid for {} administrators",
                self.multisig.admins().len()
            )));
        }
        let hash = payload_hash(OperationKind::SetAdminSigners, &min_signatures)?;
        match self
            .multisig
            .sign(admin, OperationKind::SetAdminSigners, hash)?
        {
            ApprovalState::Executed => {
                self.multisig.set_min_signatures(min_signatures)?;
                self.events
                    .push(LaunchpadEvent::AdminSignersUpdated(AdminSignersUpdated {
                        min_signatures,
                    }));
                info!(min_signatures, "signature threshold updated");
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::SetAdminSigners, pending)),
        }
    }

    /// Approve (and at threshold, apply) a new global fee schedule.
    pub fn set_fees(
        &mut self,
        admin: &Address,
        fees: FeeSchedule,
    ) -> Result<ApprovalState, LaunchpadError> {
        fees.validate()
            .map_err(|e| LaunchpadError::InvalidParams(e.to_string()))?;
        let hash = payload_hash(OperationKind::SetFees, &fees)?;
        match self.multisig.sign(admin, OperationKind::SetFees, hash)? {
            ApprovalState::Executed => {
                self.config.fees = fees;
                self.events
                    .push(LaunchpadEvent::FeesUpdated(FeesUpdated { fees }));
                info!("global fee schedule updated");
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::SetFees, pending)),
        }
    }

    /// Approve (and at threshold, apply) a new global permission block.
    pub fn set_permissions(
        &mut self,
        admin: &Address,
        permissions: Permissions,
    ) -> Result<ApprovalState, LaunchpadError> {
        let hash = payload_hash(OperationKind::SetPermissions, &permissions)?;
        match self
            .multisig
            .sign(admin, OperationKind::SetPermissions, hash)?
        {
            ApprovalState::Executed => {
                self.config.permissions = permissions;
                self.events
                    .push(LaunchpadEvent::PermissionsUpdated(PermissionsUpdated {
                        permissions,
                    }));
                info!("global permissions updated");
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::SetPermissions, pending)),
        }
    }

    /// Approve (and at threshold, apply) a custody's oracle configuration.
    pub fn set_oracle_config(
        &mut self,
        admin: &Address,
        custody: Address,
        oracle: OracleConfig,
    ) -> Result<ApprovalState, LaunchpadError> {
        self.custodies.get(&custody)?;
        oracle
            .max_price_error
            .validate()
            .map_err(|e| LaunchpadError::InvalidParams(e.to_string()))?;
        let hash = payload_hash(OperationKind::SetOracleConfig, &(custody, oracle))?;
        match self
            .multisig
            .sign(admin, OperationKind::SetOracleConfig, hash)?
        {
            ApprovalState::Executed => {
                self.custodies.get_mut(&custody)?.oracle = Some(oracle);
                self.events
                    .push(LaunchpadEvent::OracleConfigUpdated(OracleConfigUpdated {
                        custody,
                    }));
                info!(custody = %custody, "oracle config updated");
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::SetOracleConfig, pending)),
        }
    }

    /// Approve (and at threshold, apply) publication of an oracle quote.
    ///
    /// Production price feeds write the oracle book directly; this gated
    /// path exists for administered/test oracles.
    pub fn set_oracle_price(
        &mut self,
        admin: &Address,
        oracle: Address,
        quote: Quote,
    ) -> Result<ApprovalState, LaunchpadError> {
        let hash = payload_hash(OperationKind::SetOraclePrice, &(oracle, quote))?;
        match self
            .multisig
            .sign(admin, OperationKind::SetOraclePrice, hash)?
        {
            ApprovalState::Executed => {
                self.oracles.publish(oracle, quote);
                self.events
                    .push(LaunchpadEvent::OraclePricePublished(OraclePricePublished {
                        oracle,
                        price: quote.price,
                        expo: quote.expo,
                    }));
                debug!(oracle = %oracle, price = quote.price, "oracle quote published");
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::SetOraclePrice, pending)),
        }
    }

    /// Approve (and at threshold, apply) creation of a custody record.
    pub fn init_custody(
        &mut self,
        admin: &Address,
        params: InitCustodyParams,
    ) -> Result<ApprovalState, LaunchpadError> {
        let address = Custody::address_of(&params.asset);
        if self.custodies.contains(&address) {
            return Err(CustodyError::AlreadyExists {
                asset: params.asset,
            }
            .into());
        }
        params
            .oracle
            .max_price_error
            .validate()
            .map_err(|e| LaunchpadError::InvalidParams(e.to_string()))?;
        let hash = payload_hash(OperationKind::InitCustody, &params)?;
        match self.multisig.sign(admin, OperationKind::InitCustody, hash)? {
            ApprovalState::Executed => {
                self.custodies
                    .init_custody(params.asset, params.decimals, params.oracle)?;
                self.events
                    .push(LaunchpadEvent::CustodyCreated(CustodyCreated {
                        custody: address,
                        asset: params.asset,
                        decimals: params.decimals,
                    }));
                info!(custody = %address, decimals = params.decimals, "custody created");
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::InitCustody, pending)),
        }
    }

    /// Approve (and at threshold, apply) a fee payout. Draws from the fee
    /// accumulator only, never principal.
    pub fn withdraw_fees(
        &mut self,
        admin: &Address,
        params: WithdrawFeesParams,
    ) -> Result<ApprovalState, LaunchpadError> {
        if params.amount == 0 {
            return Err(LaunchpadError::InvalidParams("zero fee withdrawal".into()));
        }
        let custody = self.custodies.get(&params.custody)?;
        if custody.collected_fees < params.amount {
            return Err(CustodyError::InsufficientFees {
                required: params.amount,
                available: custody.collected_fees,
            }
            .into());
        }
        let asset = custody.asset;
        self.check_bank_credit(&params.destination, &asset, params.amount)?;

        let hash = payload_hash(OperationKind::WithdrawFees, &params)?;
        match self.multisig.sign(admin, OperationKind::WithdrawFees, hash)? {
            ApprovalState::Executed => {
                self.custodies
                    .get_mut(&params.custody)?
                    .withdraw_fees(params.amount)?;
                self.bank
                    .credit(&params.destination, &asset, params.amount)?;
                self.events
                    .push(LaunchpadEvent::FeesWithdrawn(FeesWithdrawn {
                        custody: params.custody,
                        amount: params.amount,
                        destination: params.destination,
                    }));
                info!(custody = %params.custody, amount = params.amount, "fees withdrawn");
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::WithdrawFees, pending)),
        }
    }

    /// Approve (and at threshold, apply) deletion of an auction. Requires
    /// every dispensing inventory to be zero; open bid escrows are refunded
    /// and any residual dispensing-custody fees are swept back to the owner.
    pub fn delete_auction(
        &mut self,
        admin: &Address,
        auction_address: Address,
    ) -> Result<ApprovalState, LaunchpadError> {
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        auction.require_empty()?;

        let hash = payload_hash(OperationKind::DeleteAuction, &auction_address)?;
        match self
            .multisig
            .sign(admin, OperationKind::DeleteAuction, hash)?
        {
            ApprovalState::Executed => {
                self.apply_delete_auction(auction_address)?;
                Ok(ApprovalState::Executed)
            }
            pending => Ok(self.record_pending(OperationKind::DeleteAuction, pending)),
        }
    }

    fn apply_delete_auction(&mut self, auction_address: Address) -> Result<(), LaunchpadError> {
        // Validate every refund and sweep before touching anything.
        {
            let auction = self
                .auctions
                .get(&auction_address)
                .ok_or(AuctionError::NotFound {
                    auction: auction_address,
                })?;
            let payment_custody = self.custodies.get(&auction.pricing.payment_custody)?;
            let payment_asset = payment_custody.asset;
            let mut total_locked = 0u64;
            for bid in self.bids.for_auction(&auction_address) {
                self.check_bank_credit(&bid.owner, &payment_asset, bid.locked_funds)?;
                total_locked = total_locked
                    .checked_add(bid.locked_funds)
                    .ok_or(CustodyError::Overflow)?;
            }
            if payment_custody.balance < total_locked {
                return Err(CustodyError::InsufficientFunds {
                    required: total_locked,
                    available: payment_custody.balance,
                }
                .into());
            }
            for inv in &auction.inventories {
                if let Ok(custody) = self.custodies.get(&inv.custody) {
                    self.check_bank_credit(&auction.owner, &inv.asset, custody.collected_fees)?;
                }
            }
        }

        let auction = self
            .auctions
            .remove(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;

        // Refund open bid escrows out of the payment custody.
        let payment_asset = self.custodies.get(&auction.pricing.payment_custody)?.asset;
        for bid in self.bids.drain_auction(&auction_address) {
            if bid.locked_funds > 0 {
                self.custodies
                    .get_mut(&auction.pricing.payment_custody)?
                    .debit(bid.locked_funds)?;
                self.bank
                    .credit(&bid.owner, &payment_asset, bid.locked_funds)?;
            }
        }

        // Sweep residual dispensing-custody fees back to the owner and drop
        // the per-auction custody records.
        for inv in &auction.inventories {
            if let Some(custody) = self.custodies.remove(&inv.custody) {
                if custody.collected_fees > 0 {
                    self.bank
                        .credit(&auction.owner, &inv.asset, custody.collected_fees)?;
                }
            }
        }

        self.events
            .push(LaunchpadEvent::AuctionDeleted(AuctionDeleted {
                auction: auction_address,
            }));
        info!(auction = %auction_address, "auction deleted");
        Ok(())
    }

    /// Clear the pending governance operation without executing it.
    pub fn cancel_pending(&mut self, admin: &Address) -> Result<(), LaunchpadError> {
        self.multisig.cancel(admin)?;
        Ok(())
    }

    fn record_pending(&mut self, kind: OperationKind, state: ApprovalState) -> ApprovalState {
        if let ApprovalState::Pending { signed, required } = state {
            self.events
                .push(LaunchpadEvent::ApprovalRecorded(ApprovalRecorded {
                    kind,
                    signed,
                    required,
                }));
        }
        state
    }

    // ───────────────────────── Auction operations ─────────────────────────

    /// Create an auction. Starts `Enabled`, or `Created` for a future start
    /// time. Returns the derived auction address.
    pub fn init_auction(
        &mut self,
        owner: &Address,
        params: AuctionParams,
        now: i64,
    ) -> Result<Address, LaunchpadError> {
        if !self.config.permissions.allow_new_auctions {
            return Err(LaunchpadError::OperationDisabled {
                operation: "init_auction",
            });
        }
        // Pricing and payment assets must be under governance custody with
        // oracles before anything can be quoted against them.
        for custody_address in [
            &params.pricing.pricing_custody,
            &params.pricing.payment_custody,
        ] {
            let custody = self.custodies.get(custody_address)?;
            if custody.oracle.is_none() {
                return Err(OracleError::Unconfigured {
                    custody: *custody_address,
                }
                .into());
            }
        }

        let address = Auction::address_of(owner, &params.name);
        if self.auctions.contains_key(&address) {
            return Err(AuctionError::AlreadyExists { auction: address }.into());
        }

        let auction = Auction::new(*owner, params, self.config.fees, now)?;
        for inv in &auction.inventories {
            self.custodies.create_at(
                inv.custody,
                Custody::new(inv.asset, inv.decimals, None),
            )?;
        }
        let name = auction.name.clone();
        self.auctions.insert(address, auction);

        self.events
            .push(LaunchpadEvent::AuctionCreated(AuctionCreated {
                auction: address,
                owner: *owner,
                name,
            }));
        info!(auction = %address, owner = %owner, "auction created");
        Ok(address)
    }

    /// Update an auction's window, pricing, and whitelist flag. Charges the
    /// update fee pro-rata against remaining inventory.
    pub fn update_auction(
        &mut self,
        owner: &Address,
        auction_address: Address,
        params: UpdateAuctionParams,
    ) -> Result<(), LaunchpadError> {
        if !self.config.permissions.allow_auction_updates {
            return Err(LaunchpadError::OperationDisabled {
                operation: "update_auction",
            });
        }
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        auction.require_owner(owner)?;
        if params.end_time <= params.start_time {
            return Err(AuctionError::InvalidParams("end_time must follow start_time".into()).into());
        }
        params.pricing.validate()?;
        if params.pricing.pricing_custody != auction.pricing.pricing_custody
            || params.pricing.payment_custody != auction.pricing.payment_custody
        {
            return Err(AuctionError::InvalidParams(
                "pricing and payment custodies are fixed at creation".into(),
            )
            .into());
        }

        // Update fee per dispensing inventory, validated before mutating.
        let mut fee_plan: Vec<(Address, u64)> = Vec::with_capacity(auction.inventories.len());
        let mut update_fee_total = 0u64;
        for inv in &auction.inventories {
            let fee = auction
                .fees
                .auction_update
                .apply(inv.remaining)
                .ok_or(CustodyError::Overflow)?;
            fee_plan.push((inv.asset, fee));
            update_fee_total = update_fee_total
                .checked_add(fee)
                .ok_or(CustodyError::Overflow)?;
        }

        let auction = self
            .auctions
            .get_mut(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        for (asset, fee) in &fee_plan {
            if *fee == 0 {
                continue;
            }
            let custody_address = match auction.inventory(asset) {
                Some(inv) => inv.custody,
                None => continue,
            };
            if let Some(inv) = auction.inventory_mut(asset) {
                inv.remaining -= fee;
            }
            self.custodies.get_mut(&custody_address)?.move_to_fees(*fee)?;
        }
        auction.start_time = params.start_time;
        auction.end_time = params.end_time;
        auction.pricing = params.pricing;
        auction.whitelist_required = params.whitelist_required;
        auction.update_count += 1;

        self.events
            .push(LaunchpadEvent::AuctionUpdated(AuctionUpdated {
                auction: auction_address,
                update_fee: update_fee_total,
            }));
        info!(auction = %auction_address, update_fee_total, "auction updated");
        Ok(())
    }

    /// Owner toggle: open the auction for bids.
    pub fn enable_auction(
        &mut self,
        owner: &Address,
        auction_address: Address,
    ) -> Result<(), LaunchpadError> {
        let auction = self.owned_auction_mut(owner, &auction_address)?;
        auction.enable()?;
        self.events
            .push(LaunchpadEvent::AuctionEnabled(AuctionEnabled {
                auction: auction_address,
            }));
        Ok(())
    }

    /// Owner toggle: block new bids.
    pub fn disable_auction(
        &mut self,
        owner: &Address,
        auction_address: Address,
    ) -> Result<(), LaunchpadError> {
        let auction = self.owned_auction_mut(owner, &auction_address)?;
        auction.disable()?;
        self.events
            .push(LaunchpadEvent::AuctionDisabled(AuctionDisabled {
                auction: auction_address,
            }));
        Ok(())
    }

    /// Fund dispensable inventory from the owner's token account. The
    /// inventory and the dispensing custody move in the same atomic step;
    /// the creation fee is collected out of the first funding.
    pub fn add_tokens(
        &mut self,
        owner: &Address,
        auction_address: Address,
        asset: Address,
        amount: u64,
    ) -> Result<(), LaunchpadError> {
        if !self.config.permissions.allow_auction_refills {
            return Err(LaunchpadError::OperationDisabled {
                operation: "add_tokens",
            });
        }
        if amount == 0 {
            return Err(AuctionError::InvalidParams("zero funding amount".into()).into());
        }
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        auction.require_owner(owner)?;
        let inv = auction
            .inventory(&asset)
            .ok_or_else(|| AuctionError::InvalidParams("asset not dispensable here".into()))?;
        let custody_address = inv.custody;

        let fee = if auction.creation_fee_paid {
            0
        } else {
            auction
                .fees
                .new_auction
                .apply(amount)
                .ok_or(CustodyError::Overflow)?
        };
        let net = amount - fee; // fee <= amount by construction

        // Validate every mutation up front.
        let bank_balance = self.bank.balance(owner, &asset);
        if bank_balance < amount {
            return Err(BankError::InsufficientFunds {
                required: amount,
                available: bank_balance,
            }
            .into());
        }
        let custody = self.custodies.get(&custody_address)?;
        custody
            .balance
            .checked_add(net)
            .ok_or(CustodyError::Overflow)?;
        custody
            .collected_fees
            .checked_add(fee)
            .ok_or(CustodyError::Overflow)?;
        inv.remaining.checked_add(net).ok_or(CustodyError::Overflow)?;
        inv.deposited.checked_add(net).ok_or(CustodyError::Overflow)?;

        // Apply.
        self.bank.debit(owner, &asset, amount)?;
        let custody = self.custodies.get_mut(&custody_address)?;
        custody.credit(net)?;
        custody.add_fees(fee)?;
        let auction = self
            .auctions
            .get_mut(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        if let Some(inv) = auction.inventory_mut(&asset) {
            inv.remaining += net;
            inv.deposited += net;
        }
        auction.creation_fee_paid = true;

        self.events.push(LaunchpadEvent::TokensAdded(TokensAdded {
            auction: auction_address,
            asset,
            amount,
            fee,
        }));
        info!(auction = %auction_address, asset = %asset, amount, fee, "inventory funded");
        Ok(())
    }

    /// Withdraw undispensed inventory back to the owner's token account.
    pub fn remove_tokens(
        &mut self,
        owner: &Address,
        auction_address: Address,
        asset: Address,
        amount: u64,
    ) -> Result<(), LaunchpadError> {
        if !self.config.permissions.allow_auction_pullouts {
            return Err(LaunchpadError::OperationDisabled {
                operation: "remove_tokens",
            });
        }
        if amount == 0 {
            return Err(AuctionError::InvalidParams("zero withdrawal amount".into()).into());
        }
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        auction.require_owner(owner)?;
        let inv = auction
            .inventory(&asset)
            .ok_or_else(|| AuctionError::InvalidParams("asset not dispensable here".into()))?;
        if inv.remaining < amount {
            return Err(AuctionError::InsufficientInventory {
                asset,
                required: amount,
                available: inv.remaining,
            }
            .into());
        }
        let custody_address = inv.custody;
        self.check_bank_credit(owner, &asset, amount)?;

        self.custodies.get_mut(&custody_address)?.debit(amount)?;
        self.bank.credit(owner, &asset, amount)?;
        let auction = self
            .auctions
            .get_mut(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        if let Some(inv) = auction.inventory_mut(&asset) {
            inv.remaining -= amount;
        }

        self.events
            .push(LaunchpadEvent::TokensRemoved(TokensRemoved {
                auction: auction_address,
                asset,
                amount,
            }));
        info!(auction = %auction_address, asset = %asset, amount, "inventory withdrawn");
        Ok(())
    }

    // ───────────────────────── Whitelist ─────────────────────────

    /// Create whitelist membership entries for bidders (owner-only).
    pub fn whitelist_add(
        &mut self,
        owner: &Address,
        auction_address: Address,
        addresses: &[Address],
    ) -> Result<(), LaunchpadError> {
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        auction.require_owner(owner)?;
        for address in addresses {
            self.bids.whitelist_add(*address, auction_address);
        }
        self.events
            .push(LaunchpadEvent::WhitelistAdded(WhitelistAdded {
                auction: auction_address,
                addresses: addresses.to_vec(),
            }));
        Ok(())
    }

    /// Revoke whitelist membership entries (owner-only). A member's live
    /// bid keeps its escrow and stays refundable.
    pub fn whitelist_remove(
        &mut self,
        owner: &Address,
        auction_address: Address,
        addresses: &[Address],
    ) -> Result<(), LaunchpadError> {
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        auction.require_owner(owner)?;
        for address in addresses {
            self.bids.whitelist_remove(address, &auction_address);
        }
        self.events
            .push(LaunchpadEvent::WhitelistRemoved(WhitelistRemoved {
                auction: auction_address,
                addresses: addresses.to_vec(),
            }));
        Ok(())
    }

    // ───────────────────────── Bidding ─────────────────────────

    /// Place (or replace) a bid against an auction.
    ///
    /// On acceptance the payment for the filled amount moves from the
    /// bidder's token account into the payment custody, the seller balance
    /// is credited net of the trade fee, and every dispensing custody
    /// delivers the filled amount to the bidder, all in one atomic step.
    /// Placing a second bid for the same auction replaces the first
    /// (last-committed-wins; concurrent same-bidder calls are serialized by
    /// the environment).
    pub fn place_bid(
        &mut self,
        bidder: &Address,
        auction_address: Address,
        params: PlaceBidParams,
        now: i64,
    ) -> Result<BidOutcome, LaunchpadError> {
        if !self.config.permissions.allow_new_bids {
            return Err(LaunchpadError::OperationDisabled {
                operation: "place_bid",
            });
        }
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;

        if auction.whitelist_required && !self.bids.is_whitelisted(bidder, &auction_address) {
            return Err(BidError::NotWhitelisted.into());
        }
        if !auction.is_open_for_bids(now) {
            return Err(BidError::AuctionNotOpen.into());
        }
        if params.amount == 0 || params.price == 0 {
            return Err(BidError::InvalidParams("zero bid price or amount".into()).into());
        }

        let payment_custody_address = auction.pricing.payment_custody;
        let payment_asset = self.custodies.get(&payment_custody_address)?.asset;
        let seller = auction.owner;
        let unit_size = auction.pricing.unit_size;
        let current_price = self.payment_unit_price(auction, now)?;

        // Price agreement with the curve, within the configured tolerance.
        let tolerance = auction
            .pricing
            .price_tolerance
            .apply(current_price)
            .ok_or(OracleError::PriceOverflow)?;
        let deviation = params.price.abs_diff(current_price);
        if deviation > tolerance {
            return self.reject_bid(bidder, auction_address, params, current_price);
        }

        // Fill plan.
        let stock = auction.available_stock();
        let fill = params.amount.min(stock);
        if params.bid_type == BidType::Fixed && fill < params.amount {
            return Err(AuctionError::InsufficientInventory {
                asset: auction
                    .inventories
                    .iter()
                    .min_by_key(|i| i.remaining)
                    .map(|i| i.asset)
                    .unwrap_or(payment_asset),
                required: params.amount,
                available: stock,
            }
            .into());
        }
        let payment = price_for_amount(current_price, unit_size, fill)
            .ok_or(OracleError::PriceOverflow)?;
        let escrowed = if params.bid_type == BidType::Dynamic {
            price_for_amount(params.price, unit_size, params.amount - fill)
                .ok_or(OracleError::PriceOverflow)?
        } else {
            0
        };
        let trade_fee = auction
            .fees
            .trade
            .apply(payment)
            .ok_or(CustodyError::Overflow)?;
        let seller_credit = payment - trade_fee; // trade_fee <= payment

        // Replacement: an existing live bid's escrow is refunded first.
        let existing = self.bids.get(bidder, &auction_address);
        let prior_locked = existing.map(|b| b.locked_funds).unwrap_or(0);
        let whitelisted = existing.map(|b| b.whitelisted).unwrap_or(false);

        // Validate every balance movement before mutating.
        let total_debit = payment
            .checked_add(escrowed)
            .ok_or(CustodyError::Overflow)?;
        let funding = self
            .bank
            .balance(bidder, &payment_asset)
            .checked_add(prior_locked)
            .ok_or(CustodyError::Overflow)?;
        if funding < total_debit {
            return Err(BankError::InsufficientFunds {
                required: total_debit,
                available: funding,
            }
            .into());
        }
        let payment_custody = self.custodies.get(&payment_custody_address)?;
        payment_custody
            .balance
            .checked_add(total_debit)
            .ok_or(CustodyError::Overflow)?;
        payment_custody
            .collected_fees
            .checked_add(trade_fee)
            .ok_or(CustodyError::Overflow)?;
        self.seller_balances
            .balance(&seller, &payment_custody_address)
            .checked_add(seller_credit)
            .ok_or(SettlementError::Overflow)?;
        for inv in &auction.inventories {
            self.check_bank_credit(bidder, &inv.asset, fill)?;
        }
        let inventory_custodies: Vec<(Address, Address)> = auction
            .inventories
            .iter()
            .map(|inv| (inv.asset, inv.custody))
            .collect();

        // Apply.
        if prior_locked > 0 {
            self.custodies
                .get_mut(&payment_custody_address)?
                .debit(prior_locked)?;
            self.bank.credit(bidder, &payment_asset, prior_locked)?;
        }
        self.bank.debit(bidder, &payment_asset, total_debit)?;
        let payment_custody = self.custodies.get_mut(&payment_custody_address)?;
        payment_custody.credit(seller_credit + escrowed)?;
        payment_custody.add_fees(trade_fee)?;
        self.seller_balances
            .credit(&seller, &payment_custody_address, seller_credit)?;
        for (asset, custody_address) in &inventory_custodies {
            if fill > 0 {
                self.custodies.get_mut(custody_address)?.debit(fill)?;
                self.bank.credit(bidder, asset, fill)?;
            }
        }
        let auction = self
            .auctions
            .get_mut(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        for inv in auction.inventories.iter_mut() {
            inv.remaining -= fill;
        }

        // Record: fully settled bids are destroyed; membership survives as
        // a placeholder; a dynamic remainder stays open with its escrow.
        if fill == params.amount {
            self.bids.remove(bidder, &auction_address);
            if whitelisted {
                self.bids.whitelist_add(*bidder, auction_address);
            }
        } else {
            self.bids.insert(Bid {
                owner: *bidder,
                auction: auction_address,
                whitelisted,
                bid_type: params.bid_type,
                price: params.price,
                amount: params.amount,
                filled: fill,
                locked_funds: escrowed,
                placed_at: now,
            });
        }

        self.events.push(LaunchpadEvent::BidPlaced(BidPlaced {
            auction: auction_address,
            bidder: *bidder,
            fill_amount: fill,
            payment,
            fee: trade_fee,
            escrowed,
        }));
        info!(auction = %auction_address, bidder = %bidder, fill, payment, "bid settled");

        if fill == params.amount {
            Ok(BidOutcome::Filled {
                fill_amount: fill,
                payment,
                fee: trade_fee,
            })
        } else {
            Ok(BidOutcome::PartiallyFilled {
                fill_amount: fill,
                payment,
                fee: trade_fee,
                escrowed,
            })
        }
    }

    /// The invalid-bid path: charge the spam fee and report rejection.
    /// When no invalid-bid fee is configured this is instead a hard
    /// failure with no side effects.
    fn reject_bid(
        &mut self,
        bidder: &Address,
        auction_address: Address,
        params: PlaceBidParams,
        current_price: u64,
    ) -> Result<BidOutcome, LaunchpadError> {
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        let would_pay = price_for_amount(current_price, auction.pricing.unit_size, params.amount)
            .ok_or(OracleError::PriceOverflow)?;
        let fee = auction
            .fees
            .invalid_bid
            .apply(would_pay)
            .ok_or(CustodyError::Overflow)?;

        if fee == 0 {
            return Err(BidError::PriceOutOfRange {
                submitted: params.price,
                current: current_price,
            }
            .into());
        }

        let payment_custody_address = auction.pricing.payment_custody;
        let payment_asset = self.custodies.get(&payment_custody_address)?.asset;
        let available = self.bank.balance(bidder, &payment_asset);
        if available < fee {
            return Err(BankError::InsufficientFunds {
                required: fee,
                available,
            }
            .into());
        }
        self.custodies
            .get(&payment_custody_address)?
            .collected_fees
            .checked_add(fee)
            .ok_or(CustodyError::Overflow)?;

        self.bank.debit(bidder, &payment_asset, fee)?;
        self.custodies
            .get_mut(&payment_custody_address)?
            .add_fees(fee)?;

        let reason = BidRejectReason::PriceOutOfRange {
            submitted: params.price,
            current: current_price,
        };
        warn!(auction = %auction_address, bidder = %bidder, submitted = params.price, current = current_price, fee, "bid rejected, invalid-bid fee charged");
        self.events.push(LaunchpadEvent::BidRejected(BidRejected {
            auction: auction_address,
            bidder: *bidder,
            reason: format!("price {} out of range of {}", params.price, current_price),
            fee,
        }));
        Ok(BidOutcome::Rejected { reason, fee })
    }

    /// Cancel the caller's bid: refund the escrowed-but-unsettled payment
    /// and destroy the record (whitelist membership survives).
    pub fn cancel_bid(
        &mut self,
        bidder: &Address,
        auction_address: Address,
    ) -> Result<u64, LaunchpadError> {
        let bid = match self.bids.get(bidder, &auction_address) {
            Some(bid) if !bid.is_placeholder() => bid.clone(),
            _ => return Err(BidError::NoSuchBid.into()),
        };
        let auction = self
            .auctions
            .get(&auction_address)
            .ok_or(AuctionError::NotFound {
                auction: auction_address,
            })?;
        let payment_custody_address = auction.pricing.payment_custody;
        let payment_asset = self.custodies.get(&payment_custody_address)?.asset;
        let refund = bid.locked_funds;
        if refund > 0 {
            self.check_bank_credit(bidder, &payment_asset, refund)?;
            self.custodies
                .get_mut(&payment_custody_address)?
                .debit(refund)?;
            self.bank.credit(bidder, &payment_asset, refund)?;
        }

        self.bids.remove(bidder, &auction_address);
        if bid.whitelisted {
            self.bids.whitelist_add(*bidder, auction_address);
        }

        self.events
            .push(LaunchpadEvent::BidCancelled(BidCancelled {
                auction: auction_address,
                bidder: *bidder,
                refunded: refund,
            }));
        info!(auction = %auction_address, bidder = %bidder, refund, "bid cancelled");
        Ok(refund)
    }

    // ───────────────────────── Settlement & withdrawal ─────────────────────────

    /// Withdraw accumulated seller proceeds for a payment asset. Debits the
    /// seller balance and the custody principal and credits the destination
    /// account in one atomic step.
    pub fn withdraw_funds(
        &mut self,
        seller: &Address,
        params: WithdrawFundsParams,
    ) -> Result<(), LaunchpadError> {
        if !self.config.permissions.allow_withdrawals {
            return Err(LaunchpadError::OperationDisabled {
                operation: "withdraw_funds",
            });
        }
        if params.amount == 0 {
            return Err(LaunchpadError::InvalidParams("zero withdrawal".into()));
        }
        let custody_address = Custody::address_of(&params.asset);
        let custody = self.custodies.get(&custody_address)?;

        let available = self.seller_balances.balance(seller, &custody_address);
        if available < params.amount {
            return Err(SettlementError::InsufficientFunds {
                required: params.amount,
                available,
            }
            .into());
        }
        if custody.balance < params.amount {
            return Err(CustodyError::InsufficientFunds {
                required: params.amount,
                available: custody.balance,
            }
            .into());
        }
        self.check_bank_credit(&params.destination, &params.asset, params.amount)?;

        self.seller_balances
            .debit(seller, &custody_address, params.amount)?;
        self.custodies
            .get_mut(&custody_address)?
            .debit(params.amount)?;
        self.bank
            .credit(&params.destination, &params.asset, params.amount)?;

        self.events
            .push(LaunchpadEvent::FundsWithdrawn(FundsWithdrawn {
                seller: *seller,
                custody: custody_address,
                amount: params.amount,
                destination: params.destination,
            }));
        info!(seller = %seller, custody = %custody_address, amount = params.amount, "proceeds withdrawn");
        Ok(())
    }

    // ───────────────────────── Quotes ─────────────────────────

    /// Total payment price for `amount` dispensed units at the current
    /// oracle-fed curve. Pure; reads no other auction's state.
    pub fn get_auction_price(
        &self,
        auction_address: &Address,
        amount: u64,
        now: i64,
    ) -> Result<u64, LaunchpadError> {
        let auction = self
            .auctions
            .get(auction_address)
            .ok_or(AuctionError::NotFound {
                auction: *auction_address,
            })?;
        let unit_price = self.payment_unit_price(auction, now)?;
        price_for_amount(unit_price, auction.pricing.unit_size, amount)
            .ok_or_else(|| OracleError::PriceOverflow.into())
    }

    /// Dispensed units purchasable for `price` at the current oracle-fed
    /// curve. Mutual inverse of [`Self::get_auction_price`] up to rounding.
    pub fn get_auction_amount(
        &self,
        auction_address: &Address,
        price: u64,
        now: i64,
    ) -> Result<u64, LaunchpadError> {
        let auction = self
            .auctions
            .get(auction_address)
            .ok_or(AuctionError::NotFound {
                auction: *auction_address,
            })?;
        let unit_price = self.payment_unit_price(auction, now)?;
        amount_for_price(unit_price, auction.pricing.unit_size, price)
            .ok_or_else(|| OracleError::PriceOverflow.into())
    }

    /// Curve unit price converted into payment base units through the
    /// oracle pair (pricing price divided by payment price).
    fn payment_unit_price(&self, auction: &Auction, now: i64) -> Result<u64, LaunchpadError> {
        let pricing_custody = self.custodies.get(&auction.pricing.pricing_custody)?;
        let payment_custody = self.custodies.get(&auction.pricing.payment_custody)?;
        let pricing_oracle = pricing_custody
            .oracle
            .as_ref()
            .ok_or(OracleError::Unconfigured {
                custody: auction.pricing.pricing_custody,
            })?;
        let payment_oracle = payment_custody
            .oracle
            .as_ref()
            .ok_or(OracleError::Unconfigured {
                custody: auction.pricing.payment_custody,
            })?;
        let pricing_price = self.oracles.get_price(pricing_oracle, now)?;
        let payment_price = self.oracles.get_price(payment_oracle, now)?;
        let converted = convert_amount_ceil(
            auction.unit_price(now),
            pricing_price,
            pricing_custody.decimals,
            payment_price,
            payment_custody.decimals,
        )?;
        Ok(converted)
    }

    // ───────────────────────── Accessors ─────────────────────────

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    pub fn multisig(&self) -> &Multisig {
        &self.multisig
    }

    pub fn custody(&self, address: &Address) -> Option<&Custody> {
        self.custodies.get(address).ok()
    }

    /// Governance custody record for an asset.
    pub fn custody_by_asset(&self, asset: &Address) -> Option<&Custody> {
        self.custody(&Custody::address_of(asset))
    }

    pub fn auction(&self, address: &Address) -> Option<&Auction> {
        self.auctions.get(address)
    }

    pub fn bid(&self, bidder: &Address, auction: &Address) -> Option<&Bid> {
        self.bids.get(bidder, auction)
    }

    /// Seller proceeds for a payment asset.
    pub fn seller_balance(&self, seller: &Address, asset: &Address) -> u64 {
        self.seller_balances
            .balance(seller, &Custody::address_of(asset))
    }

    /// The external token-account ledger (the transfer primitive).
    pub fn bank(&self) -> &TokenBank {
        &self.bank
    }

    /// Mutable access for host-side funding (mints, airdrops).
    pub fn bank_mut(&mut self) -> &mut TokenBank {
        &mut self.bank
    }

    /// Publish a quote directly, as a production price feed would.
    pub fn publish_quote(&mut self, oracle: Address, quote: Quote) {
        self.oracles.publish(oracle, quote);
    }

    pub fn events(&self) -> &[LaunchpadEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<LaunchpadEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal helpers ─────────────────────────

    fn owned_auction_mut(
        &mut self,
        owner: &Address,
        auction_address: &Address,
    ) -> Result<&mut Auction, LaunchpadError> {
        let auction = self
            .auctions
            .get_mut(auction_address)
            .ok_or(AuctionError::NotFound {
                auction: *auction_address,
            })?;
        auction.require_owner(owner)?;
        Ok(auction)
    }

    /// Overflow pre-check for a bank credit, so the apply phase cannot fail
    /// halfway through a multi-ledger mutation.
    fn check_bank_credit(
        &self,
        owner: &Address,
        asset: &Address,
        amount: u64,
    ) -> Result<(), LaunchpadError> {
        self.bank
            .balance(owner, asset)
            .checked_add(amount)
            .ok_or_else(|| BankError::Overflow.into())
            .map(|_| ())
    }
}

/// Hash a governance payload: the operation kind plus its typed parameter
/// record, canonically serialized.
fn payload_hash<T: Serialize>(kind: OperationKind, payload: &T) -> Result<[u8; 32], LaunchpadError> {
    let bytes = serde_json::to_vec(&(kind, payload)).map_err(|e| LaunchpadError::PayloadEncoding {
        message: e.to_string(),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hasher.finalize().into())
}
