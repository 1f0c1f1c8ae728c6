//! Campaign orchestration
//!
//! Picks the single discount applied at checkout: the rule-based promotion
//! result from the engine against the automatic first-order campaign.
//! Protected intents always win selection; otherwise the larger amount
//! does, with ties going to the promotion side. Every failure degrades to
//! zero discount rather than failing checkout.

use std::fmt;

use chrono::{DateTime, Utc};
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tracing::warn;

use crate::{
    amounts::{decimal_to_minor, percent_of_minor},
    cart::Cart,
    catalog::CustomerId,
    config::{CampaignConfig, FIRST_ORDER_MAX_DISCOUNT, HIGH_VALUE_MAX_DISCOUNT},
    promotions::{PromotionId, engine::PromotionEngine},
    repository::PromotionRepository,
};

/// The shopper at checkout, as far as discounts care: who they are and how
/// many completed orders they have.
#[derive(Debug, Clone, Default)]
pub struct Customer {
    /// Customer id; `None` for an anonymous shopper.
    pub id: Option<CustomerId>,

    /// Number of prior completed orders.
    pub completed_orders: u32,
}

impl Customer {
    /// A known customer with the given order history.
    #[must_use]
    pub fn new(id: CustomerId, completed_orders: u32) -> Self {
        Self {
            id: Some(id),
            completed_orders,
        }
    }

    /// An anonymous shopper.
    #[must_use]
    pub fn guest() -> Self {
        Self::default()
    }

    /// Whether the automatic first-order campaign applies: a known
    /// customer with zero completed orders. Guests never qualify.
    #[must_use]
    pub fn is_first_order(&self) -> bool {
        self.id.is_some() && self.completed_orders == 0
    }
}

/// Where the winning checkout discount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountSource {
    /// The automatic first-order campaign.
    FirstOrder,

    /// A rule-based promotion.
    Promotion,

    /// No discount applies.
    None,
}

impl fmt::Display for DiscountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscountSource::FirstOrder => "first_order",
            DiscountSource::Promotion => "promotion",
            DiscountSource::None => "none",
        })
    }
}

/// The winning discount for a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignOutcome<'a> {
    /// Winning amount, clamped to the source's cap and the cart subtotal.
    pub amount: Money<'a, Currency>,

    /// Where the amount came from.
    pub source: DiscountSource,

    /// Winning promotion id when `source` is [`DiscountSource::Promotion`].
    pub promotion_id: Option<PromotionId>,
}

/// Selects the one discount applied at checkout.
#[derive(Debug)]
pub struct CampaignManager<R> {
    engine: PromotionEngine<R>,
    config: CampaignConfig,
}

impl<R: PromotionRepository> CampaignManager<R> {
    /// Create a manager over a promotion engine and campaign configuration.
    pub fn new(engine: PromotionEngine<R>, config: CampaignConfig) -> Self {
        Self { engine, config }
    }

    /// Resolve the winning discount for a cart and customer.
    ///
    /// Never fails: a repository outage or arithmetic problem is logged and
    /// degrades to `source = none` with a zero amount, so checkout itself
    /// is never blocked by the discount step.
    pub fn best_for_cart<'a>(
        &self,
        cart: &Cart<'a>,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> CampaignOutcome<'a> {
        let currency = cart.currency();

        let none = CampaignOutcome {
            amount: Money::from_minor(0, currency),
            source: DiscountSource::None,
            promotion_id: None,
        };

        let subtotal_minor = match cart.subtotal_minor() {
            Ok(subtotal) => subtotal,
            Err(error) => {
                warn!(%error, "cart subtotal failed; skipping discounts");
                return none;
            }
        };

        let promo = match self.engine.apply(cart, now) {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "promotion resolution failed; no discount applied");
                return none;
            }
        };

        let promo_cap_minor = self.cap_minor(HIGH_VALUE_MAX_DISCOUNT, currency);

        // Protected intents are never outcompeted by the generic automatic
        // amount, even when numerically smaller.
        let protected = promo
            .discounts
            .iter()
            .find(|entry| self.config.is_protected(&entry.intent));

        if let Some(entry) = protected {
            let amount = clamp(entry.amount.to_minor_units(), promo_cap_minor, subtotal_minor);

            return CampaignOutcome {
                amount: Money::from_minor(amount, currency),
                source: DiscountSource::Promotion,
                promotion_id: Some(entry.promotion_id),
            };
        }

        let promo_minor = clamp(promo.total.to_minor_units(), promo_cap_minor, subtotal_minor);
        let automatic_minor = self.first_order_minor(customer, subtotal_minor, currency);

        // On an exact tie the promotion wins: targeted offers over the
        // generic automatic campaign.
        if promo_minor > 0 && promo_minor >= automatic_minor {
            return CampaignOutcome {
                amount: Money::from_minor(promo_minor, currency),
                source: DiscountSource::Promotion,
                promotion_id: promo.discounts.first().map(|entry| entry.promotion_id),
            };
        }

        if automatic_minor > 0 {
            return CampaignOutcome {
                amount: Money::from_minor(automatic_minor, currency),
                source: DiscountSource::FirstOrder,
                promotion_id: None,
            };
        }

        none
    }

    /// The automatic first-order amount in minor units, after its cap and
    /// the subtotal clamp. Zero when the customer does not qualify.
    fn first_order_minor(
        &self,
        customer: &Customer,
        subtotal_minor: i64,
        currency: &Currency,
    ) -> i64 {
        if !customer.is_first_order() {
            return 0;
        }

        let percent = Percentage::from(self.config.first_order_percent() / Decimal::ONE_HUNDRED);

        let base = match percent_of_minor(&percent, subtotal_minor) {
            Ok(amount) => amount,
            Err(error) => {
                warn!(%error, "first-order amount failed; skipping automatic campaign");
                return 0;
            }
        };

        clamp(base, self.cap_minor(FIRST_ORDER_MAX_DISCOUNT, currency), subtotal_minor)
    }

    /// A named cap in minor units, if configured and convertible.
    fn cap_minor(&self, name: &str, currency: &Currency) -> Option<i64> {
        let cap = self.config.cap(name)?;

        match decimal_to_minor(cap, currency) {
            Ok(minor) => Some(minor),
            Err(error) => {
                warn!(cap = name, %error, "cap conversion failed; treating as zero");
                Some(0)
            }
        }
    }
}

/// Clamp an amount to an optional cap and the cart subtotal, never
/// negative.
fn clamp(amount_minor: i64, cap_minor: Option<i64>, subtotal_minor: i64) -> i64 {
    let capped = cap_minor.map_or(amount_minor, |cap| amount_minor.min(cap));

    capped.min(subtotal_minor).max(0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rustc_hash::{FxHashMap, FxHashSet};
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        cart::CartLine,
        catalog::{CategoryId, ProductId},
        config::ConfigError,
        placements::PlacementSet,
        promotions::{Intent, Promotion, StackingRule},
        repository::{InMemoryPromotions, PromotionRepository, RepositoryError},
        targets::TargetSet,
    };

    use super::*;

    struct UnavailablePromotions;

    impl PromotionRepository for UnavailablePromotions {
        fn candidates(&self) -> Result<Vec<Promotion>, RepositoryError> {
            Err(RepositoryError::Unavailable("store offline".to_string()))
        }
    }

    fn now() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).single() {
            Some(instant) => instant,
            None => panic!("invalid test timestamp"),
        }
    }

    fn config(
        caps: &[(&str, Decimal)],
        protected: &[&str],
        first_order_percent: Decimal,
    ) -> Result<CampaignConfig, ConfigError> {
        let caps: FxHashMap<String, Decimal> = caps
            .iter()
            .map(|(name, cap)| ((*name).to_string(), *cap))
            .collect();

        let protected: FxHashSet<Intent> = protected.iter().map(|tag| Intent::new(*tag)).collect();

        CampaignConfig::new(caps, protected, first_order_percent)
    }

    fn promotion(id: u64, value: Decimal, intent: &str) -> Promotion {
        Promotion {
            id: PromotionId(id),
            name: format!("Promotion {id}"),
            kind: "auto_discount".to_string(),
            value_type: "percentage".to_string(),
            value,
            stacking: StackingRule::Combinable,
            intent: Intent::new(intent),
            priority: 0,
            is_active: true,
            starts_at: None,
            ends_at: None,
            placements: PlacementSet::empty(),
            targets: TargetSet::sitewide(),
        }
    }

    fn cart(subtotal_minor: i64) -> Result<Cart<'static>, crate::cart::CartError> {
        Cart::with_lines(
            [CartLine::new(
                ProductId(1),
                CategoryId(10),
                Money::from_minor(subtotal_minor, USD),
                1,
            )],
            USD,
        )
    }

    fn manager<R: PromotionRepository>(
        repository: R,
        config: CampaignConfig,
    ) -> CampaignManager<R> {
        CampaignManager::new(PromotionEngine::new(repository), config)
    }

    #[test]
    fn first_order_discount_is_capped() -> TestResult {
        // 10% of 200.00 would be 20.00; the cap holds it at 5.00.
        let config = config(
            &[(FIRST_ORDER_MAX_DISCOUNT, Decimal::new(500, 2))],
            &[],
            Decimal::from(10),
        )?;

        let manager = manager(InMemoryPromotions::default(), config);
        let cart = cart(20000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::new(CustomerId(1), 0), now());

        assert_eq!(outcome.amount, Money::from_minor(500, USD));
        assert_eq!(outcome.source, DiscountSource::FirstOrder);
        assert_eq!(outcome.promotion_id, None);

        Ok(())
    }

    #[test]
    fn returning_customer_gets_no_automatic_discount() -> TestResult {
        let config = config(
            &[(FIRST_ORDER_MAX_DISCOUNT, Decimal::new(500, 2))],
            &[],
            Decimal::from(10),
        )?;

        let manager = manager(InMemoryPromotions::default(), config);
        let cart = cart(20000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::new(CustomerId(1), 3), now());

        assert_eq!(outcome.source, DiscountSource::None);
        assert_eq!(outcome.amount, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn guest_never_qualifies_for_first_order() -> TestResult {
        let config = config(
            &[(FIRST_ORDER_MAX_DISCOUNT, Decimal::new(500, 2))],
            &[],
            Decimal::from(10),
        )?;

        let manager = manager(InMemoryPromotions::default(), config);
        let cart = cart(20000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::guest(), now());

        assert_eq!(outcome.source, DiscountSource::None);

        Ok(())
    }

    #[test]
    fn larger_promotion_beats_automatic_campaign() -> TestResult {
        let config = config(
            &[(FIRST_ORDER_MAX_DISCOUNT, Decimal::new(500, 2))],
            &[],
            Decimal::from(10),
        )?;

        let repository = InMemoryPromotions::new(vec![promotion(
            7,
            Decimal::from(20),
            "cart_growth",
        )]);

        let manager = manager(repository, config);
        let cart = cart(10000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::new(CustomerId(1), 0), now());

        assert_eq!(outcome.source, DiscountSource::Promotion);
        assert_eq!(outcome.amount, Money::from_minor(2000, USD));
        assert_eq!(outcome.promotion_id, Some(PromotionId(7)));

        Ok(())
    }

    #[test]
    fn exact_tie_goes_to_the_promotion() -> TestResult {
        // Both sides compute 10.00 on a 100.00 cart.
        let config = config(&[], &[], Decimal::from(10))?;

        let repository = InMemoryPromotions::new(vec![promotion(
            7,
            Decimal::from(10),
            "cart_growth",
        )]);

        let manager = manager(repository, config);
        let cart = cart(10000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::new(CustomerId(1), 0), now());

        assert_eq!(outcome.source, DiscountSource::Promotion);
        assert_eq!(outcome.promotion_id, Some(PromotionId(7)));

        Ok(())
    }

    #[test]
    fn protected_intent_wins_even_when_smaller() -> TestResult {
        // The automatic campaign would compute 20.00; the protected 5%
        // promotion still wins selection.
        let config = config(
            &[(FIRST_ORDER_MAX_DISCOUNT, Decimal::from(20))],
            &["shipping_support"],
            Decimal::from(20),
        )?;

        let repository = InMemoryPromotions::new(vec![promotion(
            3,
            Decimal::from(5),
            "shipping_support",
        )]);

        let manager = manager(repository, config);
        let cart = cart(10000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::new(CustomerId(1), 0), now());

        assert_eq!(outcome.source, DiscountSource::Promotion);
        assert_eq!(outcome.promotion_id, Some(PromotionId(3)));
        assert_eq!(outcome.amount, Money::from_minor(500, USD));

        Ok(())
    }

    #[test]
    fn promotion_total_is_capped_by_high_value_cap() -> TestResult {
        let config = config(
            &[(HIGH_VALUE_MAX_DISCOUNT, Decimal::from(15))],
            &[],
            Decimal::ZERO,
        )?;

        let repository = InMemoryPromotions::new(vec![promotion(
            7,
            Decimal::from(25),
            "cart_growth",
        )]);

        let manager = manager(repository, config);
        let cart = cart(10000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::guest(), now());

        assert_eq!(outcome.source, DiscountSource::Promotion);
        assert_eq!(outcome.amount, Money::from_minor(1500, USD));

        Ok(())
    }

    #[test]
    fn repository_outage_degrades_to_no_discount() -> TestResult {
        let config = config(
            &[(FIRST_ORDER_MAX_DISCOUNT, Decimal::new(500, 2))],
            &[],
            Decimal::from(10),
        )?;

        let manager = manager(UnavailablePromotions, config);
        let cart = cart(10000)?;

        let outcome = manager.best_for_cart(&cart, &Customer::new(CustomerId(1), 0), now());

        assert_eq!(outcome.source, DiscountSource::None);
        assert_eq!(outcome.amount, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn amount_never_exceeds_subtotal() -> TestResult {
        let config = config(&[], &[], Decimal::from(100))?;

        let manager = manager(InMemoryPromotions::default(), config);
        let cart = cart(300)?;

        let outcome = manager.best_for_cart(&cart, &Customer::new(CustomerId(1), 0), now());

        assert_eq!(outcome.source, DiscountSource::FirstOrder);
        assert_eq!(outcome.amount, Money::from_minor(300, USD));

        Ok(())
    }
}
