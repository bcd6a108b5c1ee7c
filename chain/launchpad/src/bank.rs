//! External token-account ledger
//!
//! The engine's funds-transfer primitive: plain (owner, asset) → amount
//! accounts standing in for the token program on the host chain. The engine
//! only ever moves value between these accounts and custody entries; `mint`
//! exists for hosts and tests to fund accounts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::Address;

use crate::errors::BankError;

/// Token accounts held outside the engine's custody.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBank {
    accounts: HashMap<(Address, Address), u64>,
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, owner: &Address, asset: &Address) -> u64 {
        self.accounts.get(&(*owner, *asset)).copied().unwrap_or(0)
    }

    /// Host-side funding (the mint authority lives outside the engine).
    pub fn mint(&mut self, owner: &Address, asset: &Address, amount: u64) -> Result<(), BankError> {
        self.credit(owner, asset, amount)
    }

    pub fn credit(
        &mut self,
        owner: &Address,
        asset: &Address,
        amount: u64,
    ) -> Result<(), BankError> {
        let entry = self.accounts.entry((*owner, *asset)).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(BankError::Overflow)?;
        Ok(())
    }

    pub fn debit(
        &mut self,
        owner: &Address,
        asset: &Address,
        amount: u64,
    ) -> Result<(), BankError> {
        let key = (*owner, *asset);
        let available = self.accounts.get(&key).copied().unwrap_or(0);
        if available < amount {
            return Err(BankError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        self.accounts.insert(key, available - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_transfer() {
        let alice = Address::from_seed("alice");
        let usdc = Address::from_seed("usdc");
        let mut bank = TokenBank::new();

        bank.mint(&alice, &usdc, 1_000).unwrap();
        bank.debit(&alice, &usdc, 400).unwrap();
        assert_eq!(bank.balance(&alice, &usdc), 600);
    }

    #[test]
    fn test_debit_insufficient() {
        let alice = Address::from_seed("alice");
        let usdc = Address::from_seed("usdc");
        let mut bank = TokenBank::new();
        assert_eq!(
            bank.debit(&alice, &usdc, 1),
            Err(BankError::InsufficientFunds {
                required: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_accounts_keyed_per_asset() {
        let alice = Address::from_seed("alice");
        let usdc = Address::from_seed("usdc");
        let sol = Address::from_seed("sol");
        let mut bank = TokenBank::new();
        bank.mint(&alice, &usdc, 5).unwrap();
        assert_eq!(bank.balance(&alice, &sol), 0);
    }
}
