//! Checkout Resolution Example
//!
//! This example walks a cart through the full discount decision: the
//! promotion engine resolves stacking, the campaign manager weighs the
//! result against the automatic first-order campaign, and a coupon code is
//! validated against the same cart.
//!
//! Run with: `cargo run --example checkout`

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};
use rusty_money::{Money, iso::USD};

use rialto::{
    campaigns::{CampaignManager, Customer},
    cart::{Cart, CartLine},
    catalog::{CategoryId, CustomerId, ProductId},
    config::{CampaignConfig, FIRST_ORDER_MAX_DISCOUNT},
    coupons::{Coupon, CouponCode, CouponScope, validate_for_cart},
    placements::PlacementSet,
    promotions::{Intent, Promotion, PromotionId, StackingRule, ValueKind, engine::PromotionEngine},
    repository::InMemoryPromotions,
    targets::TargetSet,
};

/// Checkout Resolution Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let now = Utc::now();

    let headphones = ProductId(101);
    let audio = CategoryId(7);
    let accessories = CategoryId(9);

    // A cart with one marked-down audio item and two accessories.
    let cart = Cart::with_lines(
        [
            CartLine::with_compare_at(
                headphones,
                audio,
                Money::from_minor(59_99, USD),
                Money::from_minor(79_99, USD),
                1,
            ),
            CartLine::new(ProductId(202), accessories, Money::from_minor(12_50, USD), 2),
        ],
        USD,
    )?;

    // Two promotions from the store: a combinable 10% on audio and a
    // sitewide 5% flash sale.
    let promotions = vec![
        Promotion {
            id: PromotionId(1),
            name: "Audio week".to_string(),
            kind: "auto_discount".to_string(),
            value_type: "percentage".to_string(),
            value: Decimal::from(10),
            stacking: StackingRule::Combinable,
            intent: Intent::new("clearance"),
            priority: 5,
            is_active: true,
            starts_at: None,
            ends_at: None,
            placements: PlacementSet::from_strs(&["home", "product"]),
            targets: TargetSet::new([], [audio]),
        },
        Promotion {
            id: PromotionId(2),
            name: "Flash five".to_string(),
            kind: "flash_sale".to_string(),
            value_type: "percentage".to_string(),
            value: Decimal::from(5),
            stacking: StackingRule::Combinable,
            intent: Intent::new("cart_growth"),
            priority: 1,
            is_active: true,
            starts_at: None,
            ends_at: None,
            placements: PlacementSet::from_strs(&["home", "cart"]),
            targets: TargetSet::sitewide(),
        },
    ];

    let caps: FxHashMap<String, Decimal> =
        [(FIRST_ORDER_MAX_DISCOUNT.to_string(), Decimal::new(500, 2))]
            .into_iter()
            .collect();

    let protected: FxHashSet<Intent> = [Intent::new("shipping_support")].into_iter().collect();

    let config = CampaignConfig::new(caps, protected, Decimal::from(10))?;

    let engine = PromotionEngine::new(InMemoryPromotions::new(promotions));
    let manager = CampaignManager::new(engine, config);

    let customer = Customer::new(CustomerId(42), 0);
    let outcome = manager.best_for_cart(&cart, &customer, now);

    println!("subtotal:  {}", cart.subtotal()?);
    println!("discount:  {} (source: {})", outcome.amount, outcome.source);

    if let Some(id) = outcome.promotion_id {
        println!("promotion: #{}", id.0);
    }

    // Validate a coupon the shopper typed in.
    let coupon = Coupon {
        code: CouponCode::new("AUDIO5"),
        kind: ValueKind::Fixed,
        amount: Decimal::from(5),
        is_active: true,
        starts_at: None,
        ends_at: None,
        scope: CouponScope::Categories([audio].into_iter().collect()),
        exclude_on_sale: true,
        min_cart_total: None,
        usage_limit: None,
        times_used: 0,
    };

    match validate_for_cart(&coupon, &cart, now) {
        Ok(()) => println!("coupon {}: ok", coupon.code.as_str()),
        Err(rejection) => println!("coupon {}: {rejection}", coupon.code.as_str()),
    }

    Ok(())
}
