//! Auction Lifecycle Tests
//!
//! End-to-end scenarios through the public operation surface:
//! - custody + oracle + auction setup under multisig governance
//! - bid settlement accounting (principal / seller balance / fee split)
//! - whitelist gating
//! - partial fills, replacement, cancellation refunds
//! - inventory management and governed deletion

use launchpad::auction::{AuctionParams, PricingModel, PricingParams, UpdateAuctionParams};
use launchpad::bid::BidType;
use launchpad::config::{FeeSchedule, Permissions};
use launchpad::custody::{Custody, OracleConfig};
use launchpad::engine::{
    BidOutcome, InitCustodyParams, InitParams, Launchpad, PlaceBidParams, WithdrawFeesParams,
    WithdrawFundsParams,
};
use launchpad::errors::{
    AuctionError, BidError, CustodyError, LaunchpadError, OracleError, SettlementError,
};
use launchpad::multisig::ApprovalState;
use launchpad::oracle::Quote;
use rust_decimal::Decimal;
use types::fee::Fraction;
use types::ids::Address;
use types::numeric::to_token_amount;

const NOW: i64 = 1_000;
const WINDOW_END: i64 = 101_000;

const PRICING_DECIMALS: u8 = 9;
const PAYMENT_DECIMALS: u8 = 6;
const DISPENSE_DECIMALS: u8 = 8;

/// One dispensed token in base units.
const ONE_TOKEN: u64 = 100_000_000;
/// Curve: one pricing token per dispensed token.
const UNIT_PRICE_PRICING: u64 = 1_000_000_000;
/// Pricing asset $20, payment asset $2 → 10 payment tokens per dispensed
/// token = 10_000_000 payment base units.
const UNIT_PRICE_PAYMENT: u64 = 10_000_000;

struct Fixture {
    engine: Launchpad,
    admins: Vec<Address>,
    seller: Address,
    buyer: Address,
    pricing_asset: Address,
    payment_asset: Address,
    token_a: Address,
    auction: Address,
}

fn addr(label: &str) -> Address {
    Address::from_seed(label)
}

/// Run a governance operation through a full approval round.
fn gov<F>(engine: &mut Launchpad, admins: &[Address], mut op: F)
where
    F: FnMut(&mut Launchpad, &Address) -> Result<ApprovalState, LaunchpadError>,
{
    for admin in admins {
        if op(engine, admin).unwrap() == ApprovalState::Executed {
            return;
        }
    }
    panic!("governance operation never reached its threshold");
}

fn fees_for_tests() -> FeeSchedule {
    FeeSchedule {
        new_auction: Fraction::ZERO,
        auction_update: Fraction::ZERO,
        invalid_bid: Fraction::new(1, 100).unwrap(),
        trade: Fraction::new(1, 100).unwrap(),
    }
}

fn auction_params(name: &str, pricing_asset: &Address, payment_asset: &Address, token_a: &Address, whitelist: bool) -> AuctionParams {
    AuctionParams {
        name: name.into(),
        start_time: NOW,
        end_time: WINDOW_END,
        pricing: PricingParams {
            pricing_custody: Custody::address_of(pricing_asset),
            payment_custody: Custody::address_of(payment_asset),
            model: PricingModel::FixedPrice,
            start_price: UNIT_PRICE_PRICING,
            end_price: UNIT_PRICE_PRICING,
            unit_size: ONE_TOKEN,
            price_tolerance: Fraction::new(1, 100).unwrap(),
        },
        dispensing_assets: vec![*token_a],
        dispensing_decimals: vec![DISPENSE_DECIMALS],
        whitelist_required: whitelist,
    }
}

fn setup() -> Fixture {
    setup_with_fees(fees_for_tests())
}

fn setup_with_fees(fees: FeeSchedule) -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let admins = vec![addr("admin-0"), addr("admin-1")];
    let seller = addr("seller");
    let buyer = addr("buyer");
    let pricing_asset = addr("pricing-asset");
    let payment_asset = addr("payment-asset");
    let token_a = addr("token-a");

    let mut engine = Launchpad::init(
        admins.clone(),
        InitParams {
            min_signatures: 2,
            permissions: Permissions::default(),
            fees,
        },
    )
    .unwrap();

    // Governance: custodies for the priced assets.
    gov(&mut engine, &admins, |e, a| {
        e.init_custody(
            a,
            InitCustodyParams {
                asset: pricing_asset,
                decimals: PRICING_DECIMALS,
                oracle: OracleConfig::new(addr("oracle-pricing")),
            },
        )
    });
    gov(&mut engine, &admins, |e, a| {
        e.init_custody(
            a,
            InitCustodyParams {
                asset: payment_asset,
                decimals: PAYMENT_DECIMALS,
                oracle: OracleConfig::new(addr("oracle-payment")),
            },
        )
    });

    // Governance: administered oracle quotes ($20 pricing, $2 payment).
    gov(&mut engine, &admins, |e, a| {
        e.set_oracle_price(
            a,
            addr("oracle-pricing"),
            Quote {
                price: 20_000,
                expo: -3,
                conf: 0,
                publish_time: NOW,
            },
        )
    });
    gov(&mut engine, &admins, |e, a| {
        e.set_oracle_price(
            a,
            addr("oracle-payment"),
            Quote {
                price: 2_000,
                expo: -3,
                conf: 0,
                publish_time: NOW,
            },
        )
    });

    // Seller opens the auction and funds 1000 tokens of inventory.
    let auction = engine
        .init_auction(
            &seller,
            auction_params("test auction", &pricing_asset, &payment_asset, &token_a, false),
            NOW,
        )
        .unwrap();
    engine
        .bank_mut()
        .mint(
            &seller,
            &token_a,
            to_token_amount(Decimal::from(2_000), DISPENSE_DECIMALS).unwrap(),
        )
        .unwrap();
    engine
        .add_tokens(&seller, auction, token_a, 1_000 * ONE_TOKEN)
        .unwrap();

    // Buyer funded with 1000 payment tokens.
    engine
        .bank_mut()
        .mint(
            &buyer,
            &payment_asset,
            to_token_amount(Decimal::from(1_000), PAYMENT_DECIMALS).unwrap(),
        )
        .unwrap();

    Fixture {
        engine,
        admins,
        seller,
        buyer,
        pricing_asset,
        payment_asset,
        token_a,
        auction,
    }
}

fn fixed_bid(price: u64, amount: u64) -> PlaceBidParams {
    PlaceBidParams {
        price,
        amount,
        bid_type: BidType::Fixed,
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settlement accounting
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_full_sale_accounting() {
    let mut f = setup();
    let payment_custody = Custody::address_of(&f.payment_asset);

    // Buy 5 tokens at the current price.
    let outcome = f
        .engine
        .place_bid(
            &f.buyer,
            f.auction,
            fixed_bid(UNIT_PRICE_PAYMENT, 5 * ONE_TOKEN),
            NOW,
        )
        .unwrap();

    // payment = 5 * 10 payment tokens = 50_000_000; 1% trade fee.
    assert_eq!(
        outcome,
        BidOutcome::Filled {
            fill_amount: 5 * ONE_TOKEN,
            payment: 50_000_000,
            fee: 500_000,
        }
    );

    // Custody principal and seller balance rise by the net amount, the fee
    // accumulator by the fee, and the buyer got the tokens.
    let custody = f.engine.custody(&payment_custody).unwrap();
    assert_eq!(custody.balance, 49_500_000);
    assert_eq!(custody.collected_fees, 500_000);
    assert_eq!(
        f.engine.seller_balance(&f.seller, &f.payment_asset),
        49_500_000
    );
    assert_eq!(
        f.engine.bank().balance(&f.buyer, &f.payment_asset),
        1_000_000_000 - 50_000_000
    );
    assert_eq!(f.engine.bank().balance(&f.buyer, &f.token_a), 5 * ONE_TOKEN);
    assert_eq!(
        f.engine
            .auction(&f.auction)
            .unwrap()
            .inventory(&f.token_a)
            .unwrap()
            .remaining,
        995 * ONE_TOKEN
    );

    // A fully settled bid leaves no record behind.
    assert!(f.engine.bid(&f.buyer, &f.auction).is_none());

    // Seller withdraws everything.
    f.engine
        .withdraw_funds(
            &f.seller,
            WithdrawFundsParams {
                asset: f.payment_asset,
                amount: 49_500_000,
                destination: f.seller,
            },
        )
        .unwrap();
    assert_eq!(f.engine.seller_balance(&f.seller, &f.payment_asset), 0);
    assert_eq!(f.engine.custody(&payment_custody).unwrap().balance, 0);
    assert_eq!(
        f.engine.bank().balance(&f.seller, &f.payment_asset),
        49_500_000
    );
}

#[test]
fn test_withdraw_funds_over_balance_fails() {
    let mut f = setup();
    f.engine
        .place_bid(
            &f.buyer,
            f.auction,
            fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN),
            NOW,
        )
        .unwrap();

    let result = f.engine.withdraw_funds(
        &f.seller,
        WithdrawFundsParams {
            asset: f.payment_asset,
            amount: 10_000_000, // earned only 9_900_000 net
            destination: f.seller,
        },
    );
    assert!(matches!(
        result,
        Err(LaunchpadError::Settlement(
            SettlementError::InsufficientFunds { .. }
        ))
    ));
}

#[test]
fn test_quote_round_trip() {
    let f = setup();
    let price = f
        .engine
        .get_auction_price(&f.auction, 5 * ONE_TOKEN, NOW)
        .unwrap();
    assert_eq!(price, 50_000_000);

    let amount = f.engine.get_auction_amount(&f.auction, price, NOW).unwrap();
    assert_eq!(amount, 5 * ONE_TOKEN);
}

// ═══════════════════════════════════════════════════════════════════
// Whitelist gating
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_whitelist_gating() {
    let mut f = setup();
    let wl_auction = f
        .engine
        .init_auction(
            &f.seller,
            auction_params(
                "wl auction",
                &f.pricing_asset,
                &f.payment_asset,
                &f.token_a,
                true,
            ),
            NOW,
        )
        .unwrap();
    f.engine
        .add_tokens(&f.seller, wl_auction, f.token_a, 100 * ONE_TOKEN)
        .unwrap();

    // No membership entry: rejected before any accounting happens.
    let before = f.engine.bank().balance(&f.buyer, &f.payment_asset);
    let result = f.engine.place_bid(
        &f.buyer,
        wl_auction,
        fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN),
        NOW,
    );
    assert!(matches!(
        result,
        Err(LaunchpadError::Bid(BidError::NotWhitelisted))
    ));
    assert_eq!(f.engine.bank().balance(&f.buyer, &f.payment_asset), before);

    // Owner whitelists the buyer: the same call now succeeds.
    f.engine
        .whitelist_add(&f.seller, wl_auction, &[f.buyer])
        .unwrap();
    assert!(f
        .engine
        .place_bid(
            &f.buyer,
            wl_auction,
            fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN),
            NOW,
        )
        .is_ok());

    // Membership survives settlement as a placeholder entry.
    let record = f.engine.bid(&f.buyer, &wl_auction).unwrap();
    assert!(record.whitelisted);
    assert!(record.is_placeholder());

    // Revoking destroys the placeholder and gates the next bid again.
    f.engine
        .whitelist_remove(&f.seller, wl_auction, &[f.buyer])
        .unwrap();
    assert!(f.engine.bid(&f.buyer, &wl_auction).is_none());
    assert!(matches!(
        f.engine.place_bid(
            &f.buyer,
            wl_auction,
            fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN),
            NOW,
        ),
        Err(LaunchpadError::Bid(BidError::NotWhitelisted))
    ));
}

#[test]
fn test_whitelist_ops_are_owner_only() {
    let mut f = setup();
    assert!(matches!(
        f.engine.whitelist_add(&f.buyer, f.auction, &[f.buyer]),
        Err(LaunchpadError::Auction(AuctionError::Unauthorized))
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Partial fills, replacement, cancellation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_dynamic_bid_partial_fill_and_cancel() {
    let mut f = setup();
    let payment_custody = Custody::address_of(&f.payment_asset);

    // Fresh auction with only 10 tokens of stock.
    let small = f
        .engine
        .init_auction(
            &f.seller,
            auction_params(
                "small auction",
                &f.pricing_asset,
                &f.payment_asset,
                &f.token_a,
                false,
            ),
            NOW,
        )
        .unwrap();
    f.engine
        .add_tokens(&f.seller, small, f.token_a, 10 * ONE_TOKEN)
        .unwrap();

    // Ask for 15: 10 fill now, 5 escrow at the committed price.
    let outcome = f
        .engine
        .place_bid(
            &f.buyer,
            small,
            PlaceBidParams {
                price: UNIT_PRICE_PAYMENT,
                amount: 15 * ONE_TOKEN,
                bid_type: BidType::Dynamic,
            },
            NOW,
        )
        .unwrap();
    assert_eq!(
        outcome,
        BidOutcome::PartiallyFilled {
            fill_amount: 10 * ONE_TOKEN,
            payment: 100_000_000,
            fee: 1_000_000,
            escrowed: 50_000_000,
        }
    );

    let bid = f.engine.bid(&f.buyer, &small).unwrap();
    assert_eq!(bid.filled, 10 * ONE_TOKEN);
    assert_eq!(bid.locked_funds, 50_000_000);

    // Custody holds the seller's net proceeds plus the escrow.
    let custody = f.engine.custody(&payment_custody).unwrap();
    assert_eq!(custody.balance, 99_000_000 + 50_000_000);

    // Cancelling refunds exactly the escrowed remainder.
    let before = f.engine.bank().balance(&f.buyer, &f.payment_asset);
    let refunded = f.engine.cancel_bid(&f.buyer, small).unwrap();
    assert_eq!(refunded, 50_000_000);
    assert_eq!(
        f.engine.bank().balance(&f.buyer, &f.payment_asset),
        before + 50_000_000
    );
    assert!(f.engine.bid(&f.buyer, &small).is_none());
    assert_eq!(
        f.engine.custody(&payment_custody).unwrap().balance,
        99_000_000
    );
}

#[test]
fn test_replacing_bid_refunds_prior_escrow() {
    let mut f = setup();
    let small = f
        .engine
        .init_auction(
            &f.seller,
            auction_params(
                "small auction",
                &f.pricing_asset,
                &f.payment_asset,
                &f.token_a,
                false,
            ),
            NOW,
        )
        .unwrap();
    f.engine
        .add_tokens(&f.seller, small, f.token_a, 5 * ONE_TOKEN)
        .unwrap();

    // First dynamic bid: fills 5, escrows 5 more.
    f.engine
        .place_bid(
            &f.buyer,
            small,
            PlaceBidParams {
                price: UNIT_PRICE_PAYMENT,
                amount: 10 * ONE_TOKEN,
                bid_type: BidType::Dynamic,
            },
            NOW,
        )
        .unwrap();
    let first = f.engine.bid(&f.buyer, &small).unwrap().clone();
    assert_eq!(first.locked_funds, 50_000_000);

    // Replacement: one record, last commitment wins, old escrow returned.
    f.engine
        .place_bid(
            &f.buyer,
            small,
            PlaceBidParams {
                price: UNIT_PRICE_PAYMENT,
                amount: 2 * ONE_TOKEN,
                bid_type: BidType::Dynamic,
            },
            NOW,
        )
        .unwrap();
    let second = f.engine.bid(&f.buyer, &small).unwrap();
    assert_eq!(second.amount, 2 * ONE_TOKEN);
    // Stock was exhausted by the first fill, so the whole replacement
    // amount is escrowed at the committed price.
    assert_eq!(second.filled, 0);
    assert_eq!(second.locked_funds, 20_000_000);
}

#[test]
fn test_cancel_without_bid_fails() {
    let mut f = setup();
    assert!(matches!(
        f.engine.cancel_bid(&f.buyer, f.auction),
        Err(LaunchpadError::Bid(BidError::NoSuchBid))
    ));

    // A bare whitelist placeholder is not a cancellable bid either.
    f.engine
        .whitelist_add(&f.seller, f.auction, &[f.buyer])
        .unwrap();
    assert!(matches!(
        f.engine.cancel_bid(&f.buyer, f.auction),
        Err(LaunchpadError::Bid(BidError::NoSuchBid))
    ));
}

#[test]
fn test_fixed_bid_insufficient_inventory() {
    let mut f = setup();
    let result = f.engine.place_bid(
        &f.buyer,
        f.auction,
        fixed_bid(UNIT_PRICE_PAYMENT, 2_000 * ONE_TOKEN),
        NOW,
    );
    assert!(matches!(
        result,
        Err(LaunchpadError::Auction(
            AuctionError::InsufficientInventory { .. }
        ))
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Price tolerance and the invalid-bid fee
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_stale_client_price_charged_invalid_bid_fee() {
    let mut f = setup();
    let payment_custody = Custody::address_of(&f.payment_asset);
    let before = f.engine.bank().balance(&f.buyer, &f.payment_asset);

    // 5% off against a 1% tolerance: rejected, 1% of the would-be payment
    // charged as the invalid-bid fee.
    let stale_price = UNIT_PRICE_PAYMENT * 95 / 100;
    let outcome = f
        .engine
        .place_bid(&f.buyer, f.auction, fixed_bid(stale_price, 5 * ONE_TOKEN), NOW)
        .unwrap();
    match outcome {
        BidOutcome::Rejected { fee, .. } => assert_eq!(fee, 500_000),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(
        f.engine.bank().balance(&f.buyer, &f.payment_asset),
        before - 500_000
    );
    assert_eq!(
        f.engine.custody(&payment_custody).unwrap().collected_fees,
        500_000
    );
    // No settlement happened.
    assert_eq!(f.engine.seller_balance(&f.seller, &f.payment_asset), 0);
    assert!(f.engine.bid(&f.buyer, &f.auction).is_none());
}

#[test]
fn test_price_out_of_range_without_invalid_bid_fee() {
    let mut f = setup_with_fees(FeeSchedule::FREE);
    let before = f.engine.bank().balance(&f.buyer, &f.payment_asset);

    let result = f.engine.place_bid(
        &f.buyer,
        f.auction,
        fixed_bid(UNIT_PRICE_PAYMENT / 2, ONE_TOKEN),
        NOW,
    );
    assert!(matches!(
        result,
        Err(LaunchpadError::Bid(BidError::PriceOutOfRange { .. }))
    ));
    // Hard failure: nothing moved.
    assert_eq!(f.engine.bank().balance(&f.buyer, &f.payment_asset), before);
}

#[test]
fn test_oracle_staleness_blocks_quotes_and_bids() {
    let mut f = setup();
    let later = NOW + 3_600;

    assert!(matches!(
        f.engine.get_auction_price(&f.auction, ONE_TOKEN, later),
        Err(LaunchpadError::Oracle(OracleError::Stale { .. }))
    ));
    assert!(matches!(
        f.engine
            .place_bid(&f.buyer, f.auction, fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN), later),
        Err(LaunchpadError::Oracle(OracleError::Stale { .. }))
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Lifecycle: enable/disable, update, fees, deletion
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_disable_blocks_bids_and_enable_restores() {
    let mut f = setup();
    f.engine.disable_auction(&f.seller, f.auction).unwrap();
    assert!(matches!(
        f.engine
            .place_bid(&f.buyer, f.auction, fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN), NOW),
        Err(LaunchpadError::Bid(BidError::AuctionNotOpen))
    ));

    // Inventory management stays open while disabled.
    f.engine
        .remove_tokens(&f.seller, f.auction, f.token_a, ONE_TOKEN)
        .unwrap();

    // Double toggles are client bugs, not no-ops.
    assert!(matches!(
        f.engine.disable_auction(&f.seller, f.auction),
        Err(LaunchpadError::Auction(AuctionError::InvalidState { .. }))
    ));
    f.engine.enable_auction(&f.seller, f.auction).unwrap();
    assert!(matches!(
        f.engine.enable_auction(&f.seller, f.auction),
        Err(LaunchpadError::Auction(AuctionError::InvalidState { .. }))
    ));
    assert!(f
        .engine
        .place_bid(&f.buyer, f.auction, fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN), NOW)
        .is_ok());
}

#[test]
fn test_creation_fee_charged_on_first_funding_only() {
    let mut fees = fees_for_tests();
    fees.new_auction = Fraction::new(1, 100).unwrap();
    let mut f = setup_with_fees(fees);

    let auction = f
        .engine
        .init_auction(
            &f.seller,
            auction_params(
                "fee auction",
                &f.pricing_asset,
                &f.payment_asset,
                &f.token_a,
                false,
            ),
            NOW,
        )
        .unwrap();

    f.engine
        .add_tokens(&f.seller, auction, f.token_a, 100 * ONE_TOKEN)
        .unwrap();
    let inv = f
        .engine
        .auction(&auction)
        .unwrap()
        .inventory(&f.token_a)
        .unwrap()
        .clone();
    assert_eq!(inv.remaining, 99 * ONE_TOKEN);
    let dispensing = f.engine.custody(&inv.custody).unwrap();
    assert_eq!(dispensing.balance, 99 * ONE_TOKEN);
    assert_eq!(dispensing.collected_fees, ONE_TOKEN);

    // Second funding: no further creation fee.
    f.engine
        .add_tokens(&f.seller, auction, f.token_a, 100 * ONE_TOKEN)
        .unwrap();
    assert_eq!(
        f.engine
            .auction(&auction)
            .unwrap()
            .inventory(&f.token_a)
            .unwrap()
            .remaining,
        199 * ONE_TOKEN
    );
}

#[test]
fn test_update_auction_applies_params_and_fee() {
    let mut fees = fees_for_tests();
    fees.auction_update = Fraction::new(1, 100).unwrap();
    let mut f = setup_with_fees(fees);

    let mut pricing = f.engine.auction(&f.auction).unwrap().pricing.clone();
    pricing.model = PricingModel::LinearDecay;
    pricing.end_price = UNIT_PRICE_PRICING / 2;
    f.engine
        .update_auction(
            &f.seller,
            f.auction,
            UpdateAuctionParams {
                start_time: NOW,
                end_time: WINDOW_END + 1_000,
                pricing,
                whitelist_required: false,
            },
        )
        .unwrap();

    let auction = f.engine.auction(&f.auction).unwrap();
    assert_eq!(auction.end_time, WINDOW_END + 1_000);
    assert_eq!(auction.pricing.model, PricingModel::LinearDecay);
    assert_eq!(auction.update_count, 1);
    // 1% of the 1000-token inventory moved into the dispensing custody's
    // fee accumulator.
    assert_eq!(
        auction.inventory(&f.token_a).unwrap().remaining,
        990 * ONE_TOKEN
    );
    let dispensing = f
        .engine
        .custody(&auction.inventory(&f.token_a).unwrap().custody)
        .unwrap();
    assert_eq!(dispensing.collected_fees, 10 * ONE_TOKEN);
}

#[test]
fn test_update_auction_owner_only() {
    let mut f = setup();
    let pricing = f.engine.auction(&f.auction).unwrap().pricing.clone();
    assert!(matches!(
        f.engine.update_auction(
            &f.buyer,
            f.auction,
            UpdateAuctionParams {
                start_time: NOW,
                end_time: WINDOW_END,
                pricing,
                whitelist_required: true,
            },
        ),
        Err(LaunchpadError::Auction(AuctionError::Unauthorized))
    ));
}

#[test]
fn test_remove_tokens_bounds() {
    let mut f = setup();
    assert!(matches!(
        f.engine
            .remove_tokens(&f.seller, f.auction, f.token_a, 1_001 * ONE_TOKEN),
        Err(LaunchpadError::Auction(
            AuctionError::InsufficientInventory { .. }
        ))
    ));
    f.engine
        .remove_tokens(&f.seller, f.auction, f.token_a, 1_000 * ONE_TOKEN)
        .unwrap();
    assert_eq!(
        f.engine.bank().balance(&f.seller, &f.token_a),
        2_000 * ONE_TOKEN
    );
}

#[test]
fn test_delete_auction_requires_empty_inventory() {
    let mut f = setup();
    let admins = f.admins.clone();

    // Still stocked: even the first approval call refuses.
    let result = f.engine.delete_auction(&admins[0], f.auction);
    assert!(matches!(
        result,
        Err(LaunchpadError::Auction(AuctionError::InventoryNotEmpty { .. }))
    ));

    f.engine
        .remove_tokens(&f.seller, f.auction, f.token_a, 1_000 * ONE_TOKEN)
        .unwrap();
    gov(&mut f.engine, &admins, |e, a| {
        e.delete_auction(a, f.auction)
    });

    // The auction is unreachable afterwards.
    assert!(f.engine.auction(&f.auction).is_none());
    assert!(matches!(
        f.engine
            .place_bid(&f.buyer, f.auction, fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN), NOW),
        Err(LaunchpadError::Auction(AuctionError::NotFound { .. }))
    ));
    assert!(matches!(
        f.engine.get_auction_price(&f.auction, ONE_TOKEN, NOW),
        Err(LaunchpadError::Auction(AuctionError::NotFound { .. }))
    ));
}

#[test]
fn test_delete_auction_refunds_open_escrow() {
    let mut f = setup();
    let admins = f.admins.clone();
    let payment_custody = Custody::address_of(&f.payment_asset);

    // Drain stock so a dynamic bid escrows everything.
    f.engine
        .remove_tokens(&f.seller, f.auction, f.token_a, 1_000 * ONE_TOKEN)
        .unwrap();
    f.engine
        .place_bid(
            &f.buyer,
            f.auction,
            PlaceBidParams {
                price: UNIT_PRICE_PAYMENT,
                amount: 3 * ONE_TOKEN,
                bid_type: BidType::Dynamic,
            },
            NOW,
        )
        .unwrap();
    assert_eq!(
        f.engine.custody(&payment_custody).unwrap().balance,
        30_000_000
    );

    let before = f.engine.bank().balance(&f.buyer, &f.payment_asset);
    gov(&mut f.engine, &admins, |e, a| {
        e.delete_auction(a, f.auction)
    });
    assert_eq!(
        f.engine.bank().balance(&f.buyer, &f.payment_asset),
        before + 30_000_000
    );
    assert_eq!(f.engine.custody(&payment_custody).unwrap().balance, 0);
    assert!(f.engine.bid(&f.buyer, &f.auction).is_none());
}

// ═══════════════════════════════════════════════════════════════════
// Event log
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_event_log_records_operations() {
    use launchpad::events::LaunchpadEvent;

    let mut f = setup();
    f.engine.drain_events();

    f.engine
        .place_bid(
            &f.buyer,
            f.auction,
            fixed_bid(UNIT_PRICE_PAYMENT, ONE_TOKEN),
            NOW,
        )
        .unwrap();
    f.engine
        .withdraw_funds(
            &f.seller,
            WithdrawFundsParams {
                asset: f.payment_asset,
                amount: 9_900_000,
                destination: f.seller,
            },
        )
        .unwrap();

    let events = f.engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, LaunchpadEvent::BidPlaced(b) if b.fill_amount == ONE_TOKEN)));
    assert!(events
        .iter()
        .any(|e| matches!(e, LaunchpadEvent::FundsWithdrawn(w) if w.amount == 9_900_000)));
    assert!(f.engine.events().is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Fee withdrawal
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_withdraw_fees_from_accumulator_only() {
    let mut f = setup();
    let admins = f.admins.clone();
    let treasury = addr("treasury");
    let payment_custody = Custody::address_of(&f.payment_asset);

    f.engine
        .place_bid(
            &f.buyer,
            f.auction,
            fixed_bid(UNIT_PRICE_PAYMENT, 5 * ONE_TOKEN),
            NOW,
        )
        .unwrap();
    assert_eq!(
        f.engine.custody(&payment_custody).unwrap().collected_fees,
        500_000
    );

    // More than collected: refused even though principal could cover it.
    assert!(matches!(
        f.engine.withdraw_fees(
            &admins[0],
            WithdrawFeesParams {
                custody: payment_custody,
                amount: 600_000,
                destination: treasury,
            },
        ),
        Err(LaunchpadError::Custody(CustodyError::InsufficientFees { .. }))
    ));

    gov(&mut f.engine, &admins, |e, a| {
        e.withdraw_fees(
            a,
            WithdrawFeesParams {
                custody: payment_custody,
                amount: 500_000,
                destination: treasury,
            },
        )
    });
    let custody = f.engine.custody(&payment_custody).unwrap();
    assert_eq!(custody.collected_fees, 0);
    assert_eq!(custody.balance, 49_500_000, "principal untouched");
    assert_eq!(f.engine.bank().balance(&treasury, &f.payment_asset), 500_000);
}
