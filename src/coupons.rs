//! Coupon validation
//!
//! Validates a user-supplied coupon against the current cart. Checks run in
//! a fixed order and short-circuit on the first failure; the rejection
//! messages are the strings surfaced in the checkout UI. The validator
//! never computes a discount amount; applying the coupon's value stays
//! with the caller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{
    amounts::decimal_to_minor,
    cart::{Cart, CartLine},
    catalog::{CategoryId, ProductId},
    promotions::ValueKind,
};

/// A coupon code, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CouponCode(String);

impl CouponCode {
    /// Create a code; input is trimmed and lowercased so lookups and
    /// comparisons ignore case.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_lowercase())
    }

    /// The normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which cart lines a coupon applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponScope {
    /// Every line.
    All,

    /// Lines in any of the given categories.
    Categories(FxHashSet<CategoryId>),

    /// Lines for any of the given products.
    Products(FxHashSet<ProductId>),
}

impl CouponScope {
    /// Whether a cart line falls inside the scope.
    #[must_use]
    pub fn covers(&self, line: &CartLine<'_>) -> bool {
        match self {
            CouponScope::All => true,
            CouponScope::Categories(categories) => categories.contains(&line.category()),
            CouponScope::Products(products) => products.contains(&line.product()),
        }
    }
}

/// A coupon record, read-only to this crate; authored by the admin panel.
#[derive(Debug, Clone)]
pub struct Coupon {
    /// Normalized coupon code.
    pub code: CouponCode,

    /// Whether the amount is a percentage or a fixed sum.
    pub kind: ValueKind,

    /// Discount amount in percent units or major currency units.
    pub amount: Decimal,

    /// Whether the coupon is enabled.
    pub is_active: bool,

    /// Optional start of the validity window (inclusive).
    pub starts_at: Option<DateTime<Utc>>,

    /// Optional end of the validity window (inclusive).
    pub ends_at: Option<DateTime<Utc>>,

    /// Which lines the coupon applies to.
    pub scope: CouponScope,

    /// Whether marked-down lines are ineligible.
    pub exclude_on_sale: bool,

    /// Minimum cart subtotal, when configured.
    pub min_cart_total: Option<Decimal>,

    /// Total number of redemptions allowed, when configured.
    pub usage_limit: Option<u32>,

    /// Redemptions recorded so far.
    pub times_used: u32,
}

/// Why a coupon cannot be used, with the user-facing message as the
/// display string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    /// Disabled, or its window has not started.
    #[error("Coupon is not active.")]
    Inactive,

    /// Past the end of its validity window.
    #[error("Coupon has expired.")]
    Expired,

    /// Restricted scope matching nothing in the cart.
    #[error("Coupon is not valid for items in your cart.")]
    NotValidForCart,

    /// Every eligible line is on sale and the coupon excludes sale items.
    #[error("Coupon cannot be used on sale items.")]
    OnlySaleItems,

    /// Cart subtotal below the configured minimum.
    #[error("Cart total does not meet the coupon minimum.")]
    BelowMinimum,

    /// All permitted redemptions are used up.
    #[error("Coupon usage limit has been reached.")]
    UsageLimitReached,
}

/// Validate a coupon against a cart at a point in time.
///
/// Checks run in order and stop at the first failure: active/window,
/// scope, sale exclusion, minimum subtotal, usage limit.
///
/// # Errors
///
/// Returns the first applicable [`CouponRejection`].
pub fn validate_for_cart(
    coupon: &Coupon,
    cart: &Cart<'_>,
    now: DateTime<Utc>,
) -> Result<(), CouponRejection> {
    if !coupon.is_active || coupon.starts_at.is_some_and(|starts| now < starts) {
        return Err(CouponRejection::Inactive);
    }

    if coupon.ends_at.is_some_and(|ends| now > ends) {
        return Err(CouponRejection::Expired);
    }

    let scoped: Vec<&CartLine<'_>> = cart
        .iter()
        .filter(|line| coupon.scope.covers(line))
        .collect();

    if coupon.scope != CouponScope::All && scoped.is_empty() {
        return Err(CouponRejection::NotValidForCart);
    }

    if coupon.exclude_on_sale
        && !scoped.is_empty()
        && scoped.iter().all(|line| line.is_on_sale())
    {
        return Err(CouponRejection::OnlySaleItems);
    }

    if let Some(minimum) = coupon.min_cart_total {
        let minimum_minor = decimal_to_minor(minimum, cart.currency()).unwrap_or(i64::MAX);
        let subtotal_minor = cart.subtotal_minor().unwrap_or(0);

        if subtotal_minor < minimum_minor {
            return Err(CouponRejection::BelowMinimum);
        }
    }

    if coupon
        .usage_limit
        .is_some_and(|limit| coupon.times_used >= limit)
    {
        return Err(CouponRejection::UsageLimitReached);
    }

    Ok(())
}
