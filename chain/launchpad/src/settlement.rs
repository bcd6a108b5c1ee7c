//! Seller proceeds ledger
//!
//! Accumulated, unwithdrawn proceeds owed to each auction owner per payment
//! custody. Strictly additive until a withdrawal subtracts; never negative.
//! The balance is bookkeeping over value already escrowed in the payment
//! custody's principal; withdrawal debits both in one step.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::Address;

use crate::errors::SettlementError;

/// Proceeds owed per (seller, payment custody).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerBalances {
    balances: HashMap<Address, u64>,
}

impl SellerBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic entry address for a seller's balance on one custody.
    pub fn address_of(seller: &Address, payment_custody: &Address) -> Address {
        Address::derive("seller_balance", &[seller.as_ref(), payment_custody.as_ref()])
    }

    pub fn balance(&self, seller: &Address, payment_custody: &Address) -> u64 {
        self.balances
            .get(&Self::address_of(seller, payment_custody))
            .copied()
            .unwrap_or(0)
    }

    pub fn credit(
        &mut self,
        seller: &Address,
        payment_custody: &Address,
        amount: u64,
    ) -> Result<(), SettlementError> {
        let entry = self
            .balances
            .entry(Self::address_of(seller, payment_custody))
            .or_insert(0);
        *entry = entry.checked_add(amount).ok_or(SettlementError::Overflow)?;
        Ok(())
    }

    pub fn debit(
        &mut self,
        seller: &Address,
        payment_custody: &Address,
        amount: u64,
    ) -> Result<(), SettlementError> {
        let key = Self::address_of(seller, payment_custody);
        let available = self.balances.get(&key).copied().unwrap_or(0);
        if available < amount {
            return Err(SettlementError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        if available == amount {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, available - amount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (Address, Address) {
        (Address::from_seed("seller"), Address::from_seed("payment-custody"))
    }

    #[test]
    fn test_credit_accumulates() {
        let (seller, custody) = keys();
        let mut balances = SellerBalances::new();
        balances.credit(&seller, &custody, 100).unwrap();
        balances.credit(&seller, &custody, 50).unwrap();
        assert_eq!(balances.balance(&seller, &custody), 150);
    }

    #[test]
    fn test_debit_to_zero_removes_entry() {
        let (seller, custody) = keys();
        let mut balances = SellerBalances::new();
        balances.credit(&seller, &custody, 100).unwrap();
        balances.debit(&seller, &custody, 100).unwrap();
        assert_eq!(balances.balance(&seller, &custody), 0);
    }

    #[test]
    fn test_debit_over_balance_fails() {
        let (seller, custody) = keys();
        let mut balances = SellerBalances::new();
        balances.credit(&seller, &custody, 10).unwrap();
        assert_eq!(
            balances.debit(&seller, &custody, 11),
            Err(SettlementError::InsufficientFunds {
                required: 11,
                available: 10
            })
        );
        assert_eq!(balances.balance(&seller, &custody), 10);
    }

    #[test]
    fn test_balances_are_per_custody() {
        let (seller, custody) = keys();
        let other = Address::from_seed("other-custody");
        let mut balances = SellerBalances::new();
        balances.credit(&seller, &custody, 10).unwrap();
        assert_eq!(balances.balance(&seller, &other), 0);
    }
}
