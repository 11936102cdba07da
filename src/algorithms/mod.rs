pub mod apriori;
pub mod association_rules;
pub mod matrix;
pub mod random;

pub use apriori::{Apriori, AssociationRule, FrequentItemset};
pub use association_rules::AssociationRuleRanker;
pub use matrix::UserMovieMatrix;
pub use random::RandomRanker;

use crate::error::Result;
use crate::models::{Rating, Recommendations};

/// A strategy that turns a train/test partition into per-user rankings.
///
/// Implementations must emit an entry for every user in `train`, possibly an
/// empty list, and must never recommend a movie the user rated in `train`.
pub trait Recommender {
    fn name(&self) -> &'static str;

    fn recommend(&mut self, train: &[Rating], test: &[Rating]) -> Result<Recommendations>;
}
