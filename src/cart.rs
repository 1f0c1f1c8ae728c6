//! Cart snapshot
//!
//! The cart is an input value owned by the caller: an ordered list of line
//! items plus the currency everything is priced in. Nothing here is
//! persisted or mutated by the engine.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    amounts::{AmountError, times_quantity},
    catalog::{CategoryId, ProductId},
};

/// Errors related to cart construction or totals.
#[derive(Debug, Error)]
pub enum CartError {
    /// A line's currency differs from the cart currency (index, line currency, cart currency).
    #[error("Line {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// Line or subtotal arithmetic overflowed.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// A single cart line: one product at one unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    product: ProductId,
    category: CategoryId,
    price: Money<'a, Currency>,
    compare_at_price: Option<Money<'a, Currency>>,
    quantity: u32,
}

impl<'a> CartLine<'a> {
    /// Creates a new line at full price.
    #[must_use]
    pub fn new(
        product: ProductId,
        category: CategoryId,
        price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            product,
            category,
            price,
            compare_at_price: None,
            quantity,
        }
    }

    /// Creates a new line carrying the pre-markdown price.
    #[must_use]
    pub fn with_compare_at(
        product: ProductId,
        category: CategoryId,
        price: Money<'a, Currency>,
        compare_at_price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            product,
            category,
            price,
            compare_at_price: Some(compare_at_price),
            quantity,
        }
    }

    /// Returns the product of the line.
    pub fn product(&self) -> ProductId {
        self.product
    }

    /// Returns the category of the line.
    pub fn category(&self) -> CategoryId {
        self.category
    }

    /// Returns the unit price of the line.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Returns the pre-markdown price, if one was recorded.
    pub fn compare_at_price(&self) -> Option<&Money<'a, Currency>> {
        self.compare_at_price.as_ref()
    }

    /// Returns the quantity of the line.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Whether the line is currently marked down: a `compare_at_price` is
    /// recorded and is strictly greater than the unit price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price
            .as_ref()
            .is_some_and(|compare_at| compare_at.to_minor_units() > self.price.to_minor_units())
    }

    /// The line subtotal (`price × quantity`) in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if the product does not fit in `i64`.
    pub fn subtotal_minor(&self) -> Result<i64, AmountError> {
        times_quantity(self.price.to_minor_units(), self.quantity)
    }
}

/// Cart snapshot: ordered lines in a single currency.
#[derive(Debug)]
pub struct Cart<'a> {
    lines: Vec<CartLine<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Create a cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if any line is priced in a
    /// different currency than the cart.
    pub fn with_lines(
        lines: impl Into<Vec<CartLine<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let lines = lines.into();

        lines.iter().enumerate().try_for_each(|(i, line)| {
            let line_currency = line.price().currency();

            if line_currency == currency {
                Ok(())
            } else {
                Err(CartError::CurrencyMismatch(
                    i,
                    line_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ))
            }
        })?;

        Ok(Cart { lines, currency })
    }

    /// Calculate the cart subtotal in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Amount`] if line or subtotal arithmetic
    /// overflows.
    pub fn subtotal_minor(&self) -> Result<i64, CartError> {
        self.lines.iter().try_fold(0i64, |acc, line| {
            let line_minor = line.subtotal_minor()?;

            acc.checked_add(line_minor)
                .ok_or(CartError::Amount(AmountError::Overflow))
        })
    }

    /// Calculate the cart subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Amount`] if line or subtotal arithmetic
    /// overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        Ok(Money::from_minor(self.subtotal_minor()?, self.currency))
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine<'a>> {
        self.lines.iter()
    }

    /// Get the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{GBP, USD},
    };
    use testresult::TestResult;

    use super::*;

    fn line(product: u64, category: u64, minor: i64, quantity: u32) -> CartLine<'static> {
        CartLine::new(
            ProductId(product),
            CategoryId(category),
            Money::from_minor(minor, USD),
            quantity,
        )
    }

    #[test]
    fn with_lines_currency_mismatch_errors() {
        let lines = [
            line(1, 10, 100, 1),
            CartLine::new(
                ProductId(2),
                CategoryId(10),
                Money::from_minor(100, GBP),
                1,
            ),
        ];

        let result = Cart::with_lines(lines, USD);

        match result {
            Err(CartError::CurrencyMismatch(idx, line_currency, cart_currency)) => {
                assert_eq!(idx, 1);
                assert_eq!(line_currency, GBP.iso_alpha_code);
                assert_eq!(cart_currency, USD.iso_alpha_code);
            }
            other => panic!("expected CurrencyMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn subtotal_multiplies_quantities() -> TestResult {
        let cart = Cart::with_lines([line(1, 10, 250, 2), line(2, 10, 100, 3)], USD)?;

        assert_eq!(cart.subtotal()?, Money::from_minor(800, USD));

        Ok(())
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() -> TestResult {
        let cart = Cart::new(USD);

        assert!(cart.is_empty());
        assert_eq!(cart.subtotal()?, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn on_sale_requires_strictly_greater_compare_at() {
        let marked_down = CartLine::with_compare_at(
            ProductId(1),
            CategoryId(10),
            Money::from_minor(80, USD),
            Money::from_minor(100, USD),
            1,
        );

        let same_price = CartLine::with_compare_at(
            ProductId(2),
            CategoryId(10),
            Money::from_minor(100, USD),
            Money::from_minor(100, USD),
            1,
        );

        assert!(marked_down.is_on_sale());
        assert!(!same_price.is_on_sale());
        assert!(!line(3, 10, 100, 1).is_on_sale());
    }

    #[test]
    fn iter_returns_lines_in_order() -> TestResult {
        let cart = Cart::with_lines([line(1, 10, 100, 1), line(2, 10, 200, 1)], USD)?;

        let products: Vec<ProductId> = cart.iter().map(CartLine::product).collect();

        assert_eq!(products, vec![ProductId(1), ProductId(2)]);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.currency(), USD);

        Ok(())
    }
}
