//! Promotions
//!
//! The promotion record as the promotions store supplies it, plus the
//! validated discount value the engine computes with. `kind`, `value_type`
//! and `intent` are open-set tags in the store, so the raw record keeps
//! them loosely typed and [`Promotion::discount_value`] is the single place
//! a row is structurally validated.

use std::fmt;

use chrono::{DateTime, Utc};
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{placements::PlacementSet, targets::TargetSet};

pub mod engine;

/// Promotion identifier assigned by the promotions store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PromotionId(pub u64);

/// Business-meaning tag carried by a promotion (`cart_growth`,
/// `shipping_support`, `clearance`, ...). Open set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Intent(String);

impl Intent {
    /// Create an intent tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a promotion combines with other applicable promotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingRule {
    /// May sum with other combinable promotions.
    Combinable,

    /// Suppresses every other discount cart-wide when applicable.
    Exclusive,
}

/// Validated discount value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Percentage of the matched-line subtotal.
    Percentage,

    /// Fixed amount, clamped to the matched-line subtotal.
    Fixed,
}

/// A structurally valid discount value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountValue {
    /// Percentage of the matched-line subtotal.
    Percent(Percentage),

    /// Fixed major-unit amount.
    Fixed(Decimal),
}

impl DiscountValue {
    /// The value kind of this discount.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            DiscountValue::Percent(_) => ValueKind::Percentage,
            DiscountValue::Fixed(_) => ValueKind::Fixed,
        }
    }
}

/// Errors raised when a promotion row is structurally invalid.
///
/// These never abort a cart computation; the offending promotion is
/// excluded and logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromotionError {
    /// The promotion value is negative.
    #[error("promotion value is negative")]
    NegativeValue,

    /// The promotion's value type is not recognised.
    #[error("unknown promotion value type {0:?}")]
    UnknownValueType(String),
}

/// A promotion row as supplied by the promotions store.
#[derive(Debug, Clone)]
pub struct Promotion {
    /// Promotion id.
    pub id: PromotionId,

    /// Promotion name, shown on storefront surfaces.
    pub name: String,

    /// Promotion kind tag (`auto_discount`, `flash_sale`, `coupon_linked`,
    /// ...). Open set; not interpreted by the engine.
    pub kind: String,

    /// Raw value type tag; `percentage` and `fixed` are understood.
    pub value_type: String,

    /// Discount value in percent units or major currency units.
    pub value: Decimal,

    /// Stacking behaviour against other promotions.
    pub stacking: StackingRule,

    /// Business-meaning tag, checked against the configured protected set.
    pub intent: Intent,

    /// Resolution priority; higher wins.
    pub priority: i32,

    /// Whether the promotion is enabled at all.
    pub is_active: bool,

    /// Optional start of the validity window (inclusive).
    pub starts_at: Option<DateTime<Utc>>,

    /// Optional end of the validity window (inclusive).
    pub ends_at: Option<DateTime<Utc>>,

    /// Storefront surfaces the promotion may be displayed on.
    pub placements: PlacementSet,

    /// Target rows; empty means sitewide.
    pub targets: TargetSet,
}

impl Promotion {
    /// Whether the promotion has no target rows and so matches every cart.
    #[must_use]
    pub fn is_sitewide(&self) -> bool {
        self.targets.is_sitewide()
    }

    /// Whether the promotion is active and inside its validity window.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.is_none_or(|starts| starts <= now)
            && self.ends_at.is_none_or(|ends| now <= ends)
    }

    /// Validate the raw value fields into a typed discount value.
    ///
    /// # Errors
    ///
    /// - [`PromotionError::NegativeValue`]: the value is negative.
    /// - [`PromotionError::UnknownValueType`]: the value type tag is not
    ///   recognised.
    pub fn discount_value(&self) -> Result<DiscountValue, PromotionError> {
        if self.value.is_sign_negative() {
            return Err(PromotionError::NegativeValue);
        }

        match self.value_type.as_str() {
            "percentage" => Ok(DiscountValue::Percent(Percentage::from(
                self.value / Decimal::ONE_HUNDRED,
            ))),
            "fixed" => Ok(DiscountValue::Fixed(self.value)),
            other => Err(PromotionError::UnknownValueType(other.to_string())),
        }
    }
}
