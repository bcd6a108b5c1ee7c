//! Settlement engine for governed token auctions
//!
//! This crate implements the on-chain contract layer of the launchpad: a
//! seller escrows dispensable tokens, buyers bid against an oracle-fed price
//! curve, and a multisig administration layer governs global parameters,
//! custody creation, fee collection, and emergency deletion.
//!
//! # Modules
//! - `errors`: per-domain error taxonomy
//! - `events`: append-only event records for every state mutation
//! - `config`: global fee schedule and permission block
//! - `multisig`: governance ledger and approval protocol
//! - `custody`: per-asset escrow records with disjoint fee sub-balances
//! - `oracle`: quote validation and cross-asset price normalization
//! - `auction`: auction lifecycle, inventory, and the price curve
//! - `bid`: bid registry and placeholder-based whitelist
//! - `settlement`: seller proceeds ledger
//! - `bank`: external token-account ledger (the transfer primitive)
//! - `engine`: the `Launchpad` operation surface
//!
//! # Version
//! v0.1.0 — initial implementation

pub mod auction;
pub mod bank;
pub mod bid;
pub mod config;
pub mod custody;
pub mod engine;
pub mod errors;
pub mod events;
pub mod multisig;
pub mod oracle;
pub mod settlement;

/// Engine ABI version — frozen after release
pub const ENGINE_ABI_VERSION: &str = "1.0.0";
