//! Promotion repository boundary
//!
//! The store that owns promotion rows is an external collaborator. The
//! engine only needs a synchronous, per-request read of the candidate set;
//! callers materialize rows however they like and hand them over through
//! this trait.

use thiserror::Error;

use crate::promotions::Promotion;

/// Errors surfaced by a promotion repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The promotion store could not be reached.
    #[error("promotion store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the candidate promotions for the current request.
///
/// Implementations must not filter by liveness or structure; the engine
/// re-checks both so that a stale cache never resurrects an expired row.
pub trait PromotionRepository {
    /// Return the candidate promotions.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if the store cannot be read. The
    /// engine propagates this to its caller; no retries happen here.
    fn candidates(&self) -> Result<Vec<Promotion>, RepositoryError>;
}

impl<T: PromotionRepository> PromotionRepository for &T {
    fn candidates(&self) -> Result<Vec<Promotion>, RepositoryError> {
        (*self).candidates()
    }
}

/// A `Vec`-backed repository for callers that materialize candidates per
/// request, and for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPromotions {
    promotions: Vec<Promotion>,
}

impl InMemoryPromotions {
    /// Create a repository over the given promotions.
    #[must_use]
    pub fn new(promotions: Vec<Promotion>) -> Self {
        Self { promotions }
    }
}

impl PromotionRepository for InMemoryPromotions {
    fn candidates(&self) -> Result<Vec<Promotion>, RepositoryError> {
        Ok(self.promotions.clone())
    }
}
