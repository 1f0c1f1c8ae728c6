//! Display placements
//!
//! Placement tags name the storefront surfaces a promotion may be shown on
//! (`home`, `category`, `product`, `cart`, `checkout`, ...). The vocabulary
//! is an open set of tags, kept as a small sorted collection.

use smallvec::SmallVec;

/// A sorted, deduplicated set of placement tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementSet {
    tags: SmallVec<[String; 5]>,
}

impl PlacementSet {
    /// Create an empty placement set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tags: SmallVec::with_capacity(0),
        }
    }

    /// Create a placement set from a vector of tags.
    #[must_use]
    pub fn new(tags: SmallVec<[String; 5]>) -> Self {
        let mut set = Self { tags };

        set.tags.sort();
        set.tags.dedup();

        set
    }

    /// Create a placement set from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        Self::new(
            tags.iter()
                .map(ToString::to_string)
                .collect::<SmallVec<[String; 5]>>(),
        )
    }

    /// Whether the set contains a placement tag.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of tags in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_strs_sorts_and_deduplicates() {
        let set = PlacementSet::from_strs(&["home", "cart", "home", "checkout"]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.tags, ["cart", "checkout", "home"].into());
    }

    #[test]
    fn contains_finds_tags() {
        let set = PlacementSet::from_strs(&["home", "product"]);

        assert!(set.contains("home"));
        assert!(set.contains("product"));
        assert!(!set.contains("cart"));
    }

    #[test]
    fn empty_set_contains_nothing() {
        let set = PlacementSet::empty();

        assert!(set.is_empty());
        assert!(!set.contains("home"));
    }
}
