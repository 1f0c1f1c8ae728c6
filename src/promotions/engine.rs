//! Promotion resolution engine
//!
//! Matches candidate promotions against a cart snapshot, computes each
//! match's discount amount against original pre-discount line prices, and
//! resolves stacking: one applicable exclusive promotion suppresses every
//! other discount cart-wide, otherwise all combinable matches sum, clamped
//! to the cart subtotal.

use chrono::{DateTime, Utc};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::warn;

use crate::{
    amounts::{AmountError, decimal_to_minor, percent_of_minor},
    cart::{Cart, CartError},
    promotions::{DiscountValue, Intent, Promotion, PromotionId, StackingRule},
    repository::{PromotionRepository, RepositoryError},
};

/// Errors that abort discount resolution for the whole cart.
///
/// Per-promotion structural problems are not in here; those rows are
/// excluded and logged instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The promotion repository could not be read.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Cart subtotal arithmetic failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Cart line arithmetic failed.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// A promotion that matched the cart, with its computed amount.
#[derive(Debug, Clone)]
pub struct PromotionMatch<'a> {
    /// The matched promotion row.
    pub promotion: Promotion,

    /// Discount amount against original line prices.
    pub amount: Money<'a, Currency>,
}

/// One discount entry in the resolved result.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount<'a> {
    /// Id of the promotion the entry came from.
    pub promotion_id: PromotionId,

    /// Intent tag of the promotion, surfaced for precedence decisions.
    pub intent: Intent,

    /// Discount amount.
    pub amount: Money<'a, Currency>,
}

/// The resolved discounts for a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscounts<'a> {
    /// Discount entries in resolution order.
    pub discounts: Vec<AppliedDiscount<'a>>,

    /// Total discount, clamped to the cart subtotal.
    pub total: Money<'a, Currency>,
}

impl AppliedDiscounts<'_> {
    /// Whether no discount applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.discounts.is_empty()
    }
}

/// Promotion matching and stacking resolution over a repository of
/// candidate rows.
#[derive(Debug)]
pub struct PromotionEngine<R> {
    repository: R,
}

impl<R: PromotionRepository> PromotionEngine<R> {
    /// Create an engine over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Return every live promotion matching the cart, with its amount,
    /// ordered by priority descending, amount descending, id ascending.
    ///
    /// Structurally invalid rows (negative value, unknown value type) and
    /// rows whose amount cannot be computed are excluded and logged, never
    /// letting one corrupt row block the cart.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Repository`]: the candidate read failed.
    /// - [`EngineError::Amount`]: cart line arithmetic overflowed.
    pub fn applicable<'a>(
        &self,
        cart: &Cart<'a>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PromotionMatch<'a>>, EngineError> {
        let mut matches = Vec::new();

        for promotion in self.repository.candidates()? {
            if !promotion.is_live(now) {
                continue;
            }

            let value = match promotion.discount_value() {
                Ok(value) => value,
                Err(error) => {
                    warn!(promotion = promotion.id.0, %error, "excluding malformed promotion");
                    continue;
                }
            };

            let Some(matched_minor) = matched_subtotal_minor(&promotion, cart)? else {
                continue;
            };

            let amount_minor = match amount_minor(&value, matched_minor, cart.currency()) {
                Ok(amount) => amount,
                Err(error) => {
                    warn!(
                        promotion = promotion.id.0,
                        %error,
                        "excluding promotion with uncomputable amount"
                    );
                    continue;
                }
            };

            matches.push(PromotionMatch {
                promotion,
                amount: Money::from_minor(amount_minor, cart.currency()),
            });
        }

        matches.sort_by(|a, b| {
            b.promotion
                .priority
                .cmp(&a.promotion.priority)
                .then_with(|| {
                    b.amount
                        .to_minor_units()
                        .cmp(&a.amount.to_minor_units())
                })
                .then_with(|| a.promotion.id.cmp(&b.promotion.id))
        });

        Ok(matches)
    }

    /// Resolve the discounts that apply to the cart.
    ///
    /// If any exclusive promotion matches, the best one under the
    /// [`applicable`](Self::applicable) ordering is the only discount and
    /// every combinable match is discarded cart-wide. Otherwise all
    /// combinable matches apply, each computed against original prices,
    /// and the total is clamped to the cart subtotal.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Repository`]: the candidate read failed.
    /// - [`EngineError::Cart`] / [`EngineError::Amount`]: cart arithmetic
    ///   overflowed.
    pub fn apply<'a>(
        &self,
        cart: &Cart<'a>,
        now: DateTime<Utc>,
    ) -> Result<AppliedDiscounts<'a>, EngineError> {
        let matches = self.applicable(cart, now)?;
        let subtotal_minor = cart.subtotal_minor()?;
        let currency = cart.currency();

        // Suppression is cart-wide: the partition point to change if it is
        // ever scoped to the exclusive promotion's matched lines instead.
        let winner = matches
            .iter()
            .find(|m| m.promotion.stacking == StackingRule::Exclusive);

        if let Some(winner) = winner {
            let amount = winner.amount.to_minor_units().min(subtotal_minor);

            return Ok(AppliedDiscounts {
                discounts: vec![AppliedDiscount {
                    promotion_id: winner.promotion.id,
                    intent: winner.promotion.intent.clone(),
                    amount: Money::from_minor(amount, currency),
                }],
                total: Money::from_minor(amount, currency),
            });
        }

        let mut total_minor = 0i64;
        let discounts: Vec<AppliedDiscount<'a>> = matches
            .into_iter()
            .map(|m| {
                total_minor = total_minor.saturating_add(m.amount.to_minor_units());

                AppliedDiscount {
                    promotion_id: m.promotion.id,
                    intent: m.promotion.intent,
                    amount: m.amount,
                }
            })
            .collect();

        Ok(AppliedDiscounts {
            discounts,
            total: Money::from_minor(total_minor.min(subtotal_minor), currency),
        })
    }
}

/// Sum of `price × quantity` over the lines the promotion matches, or
/// `None` when a targeted promotion matches no line.
///
/// A sitewide promotion matches unconditionally, including the empty cart.
fn matched_subtotal_minor(
    promotion: &Promotion,
    cart: &Cart<'_>,
) -> Result<Option<i64>, AmountError> {
    let mut matched_minor = 0i64;
    let mut any_line = false;

    for line in cart.iter() {
        if promotion.targets.matches_line(line) {
            any_line = true;
            matched_minor = matched_minor
                .checked_add(line.subtotal_minor()?)
                .ok_or(AmountError::Overflow)?;
        }
    }

    if any_line || promotion.is_sitewide() {
        Ok(Some(matched_minor))
    } else {
        Ok(None)
    }
}

/// Discount amount in minor units for a matched subtotal.
fn amount_minor(
    value: &DiscountValue,
    matched_minor: i64,
    currency: &Currency,
) -> Result<i64, AmountError> {
    match value {
        DiscountValue::Percent(percent) => percent_of_minor(percent, matched_minor),
        DiscountValue::Fixed(amount) => {
            Ok(decimal_to_minor(*amount, currency)?.min(matched_minor))
        }
    }
}
