//! Custody ledger — per-asset escrow records
//!
//! One record per managed asset: the escrowed principal balance, a disjoint
//! fee-accumulator balance, the asset's decimal scale, and (for priced
//! assets) its oracle configuration. All balances are integer base units;
//! every mutation is checked so principal can never underflow and fees can
//! never be paid out of principal.

use serde::{Deserialize, Serialize};
use types::fee::Fraction;
use types::ids::Address;

use crate::errors::CustodyError;
use std::collections::HashMap;

/// Default staleness bound for oracle quotes, in seconds.
pub const DEFAULT_MAX_PRICE_AGE_SEC: u32 = 60;

/// Default confidence bound: a quote's confidence interval may not exceed
/// this fraction of its price.
pub const DEFAULT_MAX_PRICE_ERROR: Fraction = Fraction {
    numerator: 1,
    denominator: 100,
};

/// Per-custody oracle configuration. Bounds are configuration, not logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Address of the oracle account quoting this asset.
    pub oracle_account: Address,
    /// Reject quotes older than this many seconds.
    pub max_price_age_sec: u32,
    /// Reject quotes whose confidence exceeds this fraction of the price.
    pub max_price_error: Fraction,
}

impl OracleConfig {
    /// Configuration with the documented default bounds.
    pub fn new(oracle_account: Address) -> Self {
        Self {
            oracle_account,
            max_price_age_sec: DEFAULT_MAX_PRICE_AGE_SEC,
            max_price_error: DEFAULT_MAX_PRICE_ERROR,
        }
    }
}

/// Escrow record for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custody {
    /// The managed asset (token mint).
    pub asset: Address,
    /// Decimal scale of the asset's base units.
    pub decimals: u8,
    /// Escrowed principal, in base units.
    pub balance: u64,
    /// Accumulated fees, disjoint from principal.
    pub collected_fees: u64,
    /// Oracle configuration; dispensing custodies carry none.
    pub oracle: Option<OracleConfig>,
}

impl Custody {
    pub fn new(asset: Address, decimals: u8, oracle: Option<OracleConfig>) -> Self {
        Self {
            asset,
            decimals,
            balance: 0,
            collected_fees: 0,
            oracle,
        }
    }

    /// Ledger address of the governance-initialized custody for an asset.
    pub fn address_of(asset: &Address) -> Address {
        Address::derive("custody", &[asset.as_ref()])
    }

    /// Ledger address of a per-auction dispensing custody.
    pub fn dispensing_address(asset: &Address, auction: &Address) -> Address {
        Address::derive("dispense", &[asset.as_ref(), auction.as_ref()])
    }

    /// Add to principal.
    pub fn credit(&mut self, amount: u64) -> Result<(), CustodyError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(CustodyError::Overflow)?;
        Ok(())
    }

    /// Remove from principal.
    pub fn debit(&mut self, amount: u64) -> Result<(), CustodyError> {
        if self.balance < amount {
            return Err(CustodyError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add to the fee accumulator.
    pub fn add_fees(&mut self, amount: u64) -> Result<(), CustodyError> {
        self.collected_fees = self
            .collected_fees
            .checked_add(amount)
            .ok_or(CustodyError::Overflow)?;
        Ok(())
    }

    /// Move value from principal into the fee accumulator.
    pub fn move_to_fees(&mut self, amount: u64) -> Result<(), CustodyError> {
        self.debit(amount)?;
        self.add_fees(amount)
    }

    /// Remove from the fee accumulator only. Never touches principal.
    pub fn withdraw_fees(&mut self, amount: u64) -> Result<(), CustodyError> {
        if self.collected_fees < amount {
            return Err(CustodyError::InsufficientFees {
                required: amount,
                available: self.collected_fees,
            });
        }
        self.collected_fees -= amount;
        Ok(())
    }
}

/// The custody ledger, keyed by derived custody address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyLedger {
    custodies: HashMap<Address, Custody>,
}

impl CustodyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the governance custody for `asset`.
    pub fn init_custody(
        &mut self,
        asset: Address,
        decimals: u8,
        oracle: OracleConfig,
    ) -> Result<Address, CustodyError> {
        self.create_at(
            Custody::address_of(&asset),
            Custody::new(asset, decimals, Some(oracle)),
        )
    }

    /// Insert a custody at an explicit derived address.
    pub fn create_at(&mut self, address: Address, custody: Custody) -> Result<Address, CustodyError> {
        if self.custodies.contains_key(&address) {
            return Err(CustodyError::AlreadyExists {
                asset: custody.asset,
            });
        }
        self.custodies.insert(address, custody);
        Ok(address)
    }

    pub fn get(&self, address: &Address) -> Result<&Custody, CustodyError> {
        self.custodies
            .get(address)
            .ok_or(CustodyError::NotFound { custody: *address })
    }

    pub fn get_mut(&mut self, address: &Address) -> Result<&mut Custody, CustodyError> {
        self.custodies
            .get_mut(address)
            .ok_or(CustodyError::NotFound { custody: *address })
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.custodies.contains_key(address)
    }

    /// Remove a custody record (auction deletion sweeps its dispensers).
    pub fn remove(&mut self, address: &Address) -> Option<Custody> {
        self.custodies.remove(address)
    }
}
