//! Bid registry and whitelist
//!
//! One record per (bidder, auction) pair at a deterministic address.
//! Whitelist membership is a placeholder record (a zero-value bid slot)
//! whose mere existence authorizes a bidder, so membership checks are a
//! single lookup rather than a list scan. A live bid and the membership flag
//! share the record; re-placing a bid replaces it, never duplicates it.
//!
//! A record is destroyed on cancellation and on final settlement (reverting
//! to a bare placeholder when the membership flag must survive), so every
//! record present either authorizes or commits something.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::Address;

/// Bid classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidType {
    /// All-or-nothing at the current curve price.
    Fixed,
    /// Fills to available stock; the unfilled remainder's payment stays
    /// escrowed on the record until cancelled or replaced.
    Dynamic,
}

/// A bid slot: whitelist membership and/or a standing bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub owner: Address,
    pub auction: Address,
    /// Membership flag for whitelisted auctions.
    pub whitelisted: bool,
    pub bid_type: BidType,
    /// Committed unit price, in payment base units per auction unit_size.
    pub price: u64,
    /// Committed amount of dispensed base units.
    pub amount: u64,
    /// Cumulative dispensed units settled.
    pub filled: u64,
    /// Escrowed-but-unsettled payment, refunded on cancellation.
    pub locked_funds: u64,
    pub placed_at: i64,
}

impl Bid {
    /// Deterministic record address for a (bidder, auction) pair.
    pub fn address_of(owner: &Address, auction: &Address) -> Address {
        Address::derive("bid", &[owner.as_ref(), auction.as_ref()])
    }

    /// A zero-value whitelist membership entry.
    pub fn placeholder(owner: Address, auction: Address) -> Self {
        Self {
            owner,
            auction,
            whitelisted: true,
            bid_type: BidType::Fixed,
            price: 0,
            amount: 0,
            filled: 0,
            locked_funds: 0,
            placed_at: 0,
        }
    }

    /// Whether this record is only a membership placeholder, not a live bid.
    pub fn is_placeholder(&self) -> bool {
        self.amount == 0 && self.filled == 0 && self.locked_funds == 0
    }
}

/// All bid records, keyed by derived (bidder, auction) address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidBook {
    bids: HashMap<Address, Bid>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &Address, auction: &Address) -> Option<&Bid> {
        self.bids.get(&Bid::address_of(owner, auction))
    }

    pub fn insert(&mut self, bid: Bid) {
        self.bids.insert(Bid::address_of(&bid.owner, &bid.auction), bid);
    }

    pub fn remove(&mut self, owner: &Address, auction: &Address) -> Option<Bid> {
        self.bids.remove(&Bid::address_of(owner, auction))
    }

    /// Membership check by record presence.
    pub fn is_whitelisted(&self, owner: &Address, auction: &Address) -> bool {
        self.get(owner, auction).map_or(false, |b| b.whitelisted)
    }

    /// Create (or mark) the membership entry for a bidder.
    pub fn whitelist_add(&mut self, owner: Address, auction: Address) {
        let key = Bid::address_of(&owner, &auction);
        match self.bids.get_mut(&key) {
            Some(bid) => bid.whitelisted = true,
            None => {
                self.bids.insert(key, Bid::placeholder(owner, auction));
            }
        }
    }

    /// Revoke membership. A bare placeholder is destroyed; a live bid keeps
    /// its funds and merely loses the flag.
    pub fn whitelist_remove(&mut self, owner: &Address, auction: &Address) {
        let key = Bid::address_of(owner, auction);
        if let Some(bid) = self.bids.get_mut(&key) {
            if bid.is_placeholder() {
                self.bids.remove(&key);
            } else {
                bid.whitelisted = false;
            }
        }
    }

    /// All records for an auction, read-only.
    pub fn for_auction(&self, auction: &Address) -> Vec<&Bid> {
        self.bids.values().filter(|b| &b.auction == auction).collect()
    }

    /// Remove and return every record for an auction (deletion sweep).
    pub fn drain_auction(&mut self, auction: &Address) -> Vec<Bid> {
        let keys: Vec<Address> = self
            .bids
            .iter()
            .filter(|(_, b)| &b.auction == auction)
            .map(|(k, _)| *k)
            .collect();
        keys.iter().filter_map(|k| self.bids.remove(k)).collect()
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Address, Address) {
        (Address::from_seed("bidder"), Address::from_seed("auction"))
    }

    #[test]
    fn test_whitelist_add_creates_placeholder() {
        let (owner, auction) = pair();
        let mut book = BidBook::new();
        assert!(!book.is_whitelisted(&owner, &auction));

        book.whitelist_add(owner, auction);
        assert!(book.is_whitelisted(&owner, &auction));
        assert!(book.get(&owner, &auction).unwrap().is_placeholder());
    }

    #[test]
    fn test_whitelist_remove_destroys_placeholder() {
        let (owner, auction) = pair();
        let mut book = BidBook::new();
        book.whitelist_add(owner, auction);
        book.whitelist_remove(&owner, &auction);
        assert!(book.get(&owner, &auction).is_none());
    }

    #[test]
    fn test_whitelist_remove_keeps_live_bid() {
        let (owner, auction) = pair();
        let mut book = BidBook::new();
        book.whitelist_add(owner, auction);

        let mut bid = book.get(&owner, &auction).unwrap().clone();
        bid.amount = 100;
        bid.locked_funds = 50;
        book.insert(bid);

        book.whitelist_remove(&owner, &auction);
        let survivor = book.get(&owner, &auction).unwrap();
        assert!(!survivor.whitelisted);
        assert_eq!(survivor.locked_funds, 50);
    }

    #[test]
    fn test_insert_replaces_not_duplicates() {
        let (owner, auction) = pair();
        let mut book = BidBook::new();

        let mut bid = Bid::placeholder(owner, auction);
        bid.whitelisted = false;
        bid.amount = 100;
        book.insert(bid.clone());
        bid.amount = 200;
        book.insert(bid);

        assert_eq!(book.len(), 1);
        assert_eq!(book.get(&owner, &auction).unwrap().amount, 200);
    }

    #[test]
    fn test_drain_auction_scopes_to_auction() {
        let (owner, auction) = pair();
        let other_auction = Address::from_seed("other-auction");
        let mut book = BidBook::new();
        book.whitelist_add(owner, auction);
        book.whitelist_add(owner, other_auction);

        let drained = book.drain_auction(&auction);
        assert_eq!(drained.len(), 1);
        assert!(book.get(&owner, &other_auction).is_some());
    }
}
