//! Promotion display surfacing
//!
//! Read-only view of live promotions for a storefront placement, ordered
//! deterministically so the same query always renders the same rail.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    catalog::{CategoryId, ProductId},
    promotions::{Intent, PromotionId, ValueKind},
    repository::{PromotionRepository, RepositoryError},
};

/// What a storefront surface is asking for.
#[derive(Debug, Clone, Copy)]
pub struct PlacementQuery<'a> {
    /// Placement tag (`home`, `category`, `product`, `cart`, `checkout`, ...).
    pub placement: &'a str,

    /// Products visible on the surface.
    pub product_ids: &'a [ProductId],

    /// Categories visible on the surface.
    pub category_ids: &'a [CategoryId],

    /// Maximum number of rows returned.
    pub limit: usize,
}

/// One promotion row ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionTile {
    /// Promotion id.
    pub id: PromotionId,

    /// Promotion name.
    pub name: String,

    /// Business-meaning tag, for badge styling and copy.
    pub intent: Intent,

    /// Whether the promotion applies sitewide.
    pub is_sitewide: bool,

    /// Discount value in percent units or major currency units.
    pub value: Decimal,

    /// Whether `value` is a percentage or a fixed amount.
    pub value_kind: ValueKind,

    /// End of the validity window, when one is set.
    pub ends_at: Option<DateTime<Utc>>,
}

/// Read-only surfacing of promotions for UI placements.
#[derive(Debug)]
pub struct PromotionDisplay<R> {
    repository: R,
}

impl<R: PromotionRepository> PromotionDisplay<R> {
    /// Create a display service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Return the promotions to show for a placement, ordered by priority
    /// descending, value descending, soonest end first with open-ended
    /// windows last, id ascending, truncated to the query limit.
    ///
    /// Structurally invalid rows are excluded and logged, matching the
    /// engine's fail-closed policy.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if the candidate read fails.
    pub fn for_placement(
        &self,
        query: &PlacementQuery<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PromotionTile>, RepositoryError> {
        let mut rows: Vec<(i32, PromotionTile)> = Vec::new();

        for promotion in self.repository.candidates()? {
            if !promotion.is_live(now) || !promotion.placements.contains(query.placement) {
                continue;
            }

            if !promotion
                .targets
                .intersects(query.product_ids, query.category_ids)
            {
                continue;
            }

            let value_kind = match promotion.discount_value() {
                Ok(value) => value.kind(),
                Err(error) => {
                    warn!(promotion = promotion.id.0, %error, "excluding malformed promotion");
                    continue;
                }
            };

            rows.push((
                promotion.priority,
                PromotionTile {
                    id: promotion.id,
                    name: promotion.name,
                    intent: promotion.intent,
                    is_sitewide: promotion.targets.is_sitewide(),
                    value: promotion.value,
                    value_kind,
                    ends_at: promotion.ends_at,
                },
            ));
        }

        rows.sort_by(|(a_priority, a), (b_priority, b)| {
            b_priority
                .cmp(a_priority)
                .then_with(|| b.value.cmp(&a.value))
                .then_with(|| ends_at_soonest_first(a.ends_at, b.ends_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut tiles: Vec<PromotionTile> = rows.into_iter().map(|(_, tile)| tile).collect();
        tiles.truncate(query.limit);

        Ok(tiles)
    }
}

/// Soonest `ends_at` first; promotions without an end sort last.
fn ends_at_soonest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
