//! Promotion targets
//!
//! A promotion either carries no targets (sitewide) or a set of product and
//! category rows. Matching is OR across rows and OR across cart lines: a
//! single line satisfying a single row is enough.

use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::{
    cart::CartLine,
    catalog::{CategoryId, ProductId},
};

/// What a target row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A single product.
    Product,

    /// Every product in a category.
    Category,
}

/// A raw promotion-target row as supplied by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TargetRow {
    /// Row kind.
    pub kind: TargetKind,

    /// Id of the product or category the row points at.
    pub id: u64,
}

/// Materialized target rows with O(1) membership per id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    products: FxHashSet<ProductId>,
    categories: FxHashSet<CategoryId>,
}

impl TargetSet {
    /// A target set with no rows: the promotion is sitewide.
    #[must_use]
    pub fn sitewide() -> Self {
        Self::default()
    }

    /// Build a target set from raw rows.
    pub fn from_rows(rows: impl IntoIterator<Item = TargetRow>) -> Self {
        let mut products = FxHashSet::default();
        let mut categories = FxHashSet::default();

        for row in rows {
            match row.kind {
                TargetKind::Product => {
                    products.insert(ProductId(row.id));
                }
                TargetKind::Category => {
                    categories.insert(CategoryId(row.id));
                }
            }
        }

        Self {
            products,
            categories,
        }
    }

    /// Build a target set from product and category ids.
    pub fn new(
        products: impl IntoIterator<Item = ProductId>,
        categories: impl IntoIterator<Item = CategoryId>,
    ) -> Self {
        Self {
            products: products.into_iter().collect(),
            categories: categories.into_iter().collect(),
        }
    }

    /// Whether the set has no rows, i.e. matches every cart.
    #[must_use]
    pub fn is_sitewide(&self) -> bool {
        self.products.is_empty() && self.categories.is_empty()
    }

    /// Whether a cart line satisfies any target row.
    ///
    /// A sitewide set matches every line.
    #[must_use]
    pub fn matches_line(&self, line: &CartLine<'_>) -> bool {
        self.is_sitewide()
            || self.products.contains(&line.product())
            || self.categories.contains(&line.category())
    }

    /// Whether any of the given ids satisfies any target row.
    ///
    /// Used by display queries; a sitewide set intersects everything.
    #[must_use]
    pub fn intersects(&self, products: &[ProductId], categories: &[CategoryId]) -> bool {
        self.is_sitewide()
            || products.iter().any(|id| self.products.contains(id))
            || categories.iter().any(|id| self.categories.contains(id))
    }
}
