use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub type UserId = u32;
pub type MovieId = u32;

/// Ranked movie ids per user, best first.
pub type RecommendationMap = BTreeMap<UserId, Vec<MovieId>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub ratings: Vec<Rating>,
}

/// Whether the ratings returned by a recommender carry any signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSignal {
    Predicted,
    /// The test ratings were handed back unchanged; RMSE against them is always zero.
    EchoedGroundTruth,
}

#[derive(Debug, Clone)]
pub struct Recommendations {
    /// One value per test row, in test order.
    pub predicted_ratings: Vec<f64>,
    pub rating_signal: RatingSignal,
    pub by_user: RecommendationMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub ranker: String,
    pub k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,
    pub recall_at_k: f64,
    pub precision_at_k: f64,
    pub users_evaluated: usize,
    pub evaluated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f64, timestamp: i64) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
            timestamp,
        }
    }

    pub fn is_liked(&self, threshold: f64) -> bool {
        self.rating >= threshold
    }
}

impl Movie {
    pub fn new(movie_id: MovieId, title: String, genres: Vec<String>) -> Self {
        Self {
            movie_id,
            title,
            genres,
            tags: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

impl Recommendations {
    pub fn predicted(predicted_ratings: Vec<f64>, by_user: RecommendationMap) -> Self {
        Self {
            predicted_ratings,
            rating_signal: RatingSignal::Predicted,
            by_user,
        }
    }

    pub fn echoed(test: &[Rating], by_user: RecommendationMap) -> Self {
        Self {
            predicted_ratings: test.iter().map(|r| r.rating).collect(),
            rating_signal: RatingSignal::EchoedGroundTruth,
            by_user,
        }
    }
}

impl EvaluationReport {
    /// Named scalars in the order they are printed.
    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        let mut metrics = Vec::with_capacity(3);
        if let Some(rmse) = self.rmse {
            metrics.push(("rmse", rmse));
        }
        metrics.push(("recall_at_k", self.recall_at_k));
        metrics.push(("precision_at_k", self.precision_at_k));
        metrics
    }
}

/// Movies each user rated, keyed by user.
pub fn rated_movies_by_user(ratings: &[Rating]) -> HashMap<UserId, HashSet<MovieId>> {
    let mut rated: HashMap<UserId, HashSet<MovieId>> = HashMap::new();
    for r in ratings {
        rated.entry(r.user_id).or_default().insert(r.movie_id);
    }
    rated
}

/// Movie ids of ratings at or above `threshold`, grouped by user in input order.
pub fn liked_movies_by_user(ratings: &[Rating], threshold: f64) -> BTreeMap<UserId, Vec<MovieId>> {
    let mut liked: BTreeMap<UserId, Vec<MovieId>> = BTreeMap::new();
    for r in ratings.iter().filter(|r| r.is_liked(threshold)) {
        liked.entry(r.user_id).or_default().push(r.movie_id);
    }
    liked
}
