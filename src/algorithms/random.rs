use super::{Recommender, UserMovieMatrix};
use crate::config::RandomConfig;
use crate::error::Result;
use crate::models::{rated_movies_by_user, Rating, RecommendationMap, Recommendations};
use crate::utils::{argsort_descending, take_unseen, validation::validate_rating_range};
use ndarray::Array2;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

/// Baseline that scores every (user, movie) pair with uniform noise.
pub struct RandomRanker<R: Rng = StdRng> {
    rng: R,
    min_rating: f64,
    max_rating: f64,
    top_k: usize,
}

impl RandomRanker<StdRng> {
    /// Seeded rankers reproduce the same score matrix for the same train set.
    pub fn from_seed(config: &RandomConfig, top_k: usize, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng, config, top_k)
    }
}

impl<R: Rng> RandomRanker<R> {
    pub fn new(rng: R, config: &RandomConfig, top_k: usize) -> Result<Self> {
        validate_rating_range(config.min_rating, config.max_rating)?;
        Ok(Self {
            rng,
            min_rating: config.min_rating,
            max_rating: config.max_rating,
            top_k,
        })
    }

    fn score_matrix(&mut self, rows: usize, cols: usize) -> Array2<f64> {
        let uniform = Uniform::new_inclusive(self.min_rating, self.max_rating);
        // row-major draw order keeps a seeded run reproducible
        Array2::from_shape_simple_fn((rows, cols), || uniform.sample(&mut self.rng))
    }
}

impl<R: Rng> Recommender for RandomRanker<R> {
    fn name(&self) -> &'static str {
        "random"
    }

    fn recommend(&mut self, train: &[Rating], test: &[Rating]) -> Result<Recommendations> {
        let matrix = UserMovieMatrix::from_ratings(train);
        let (rows, cols) = matrix.shape();
        info!("Drawing a {}x{} random score matrix", rows, cols);
        let scores = self.score_matrix(rows, cols);

        let uniform = Uniform::new_inclusive(self.min_rating, self.max_rating);
        let mut cold = 0usize;
        let predicted_ratings: Vec<f64> = test
            .iter()
            .map(|r| match (matrix.user_index(r.user_id), matrix.movie_index(r.movie_id)) {
                (Some(row), Some(col)) => scores[[row, col]],
                _ => {
                    cold += 1;
                    uniform.sample(&mut self.rng)
                }
            })
            .collect();
        if cold > 0 {
            debug!("{} test rows had no train index and got a fresh draw", cold);
        }

        let rated = rated_movies_by_user(train);
        let movie_ids = matrix.movie_ids();
        let top_k = self.top_k;
        let by_user: RecommendationMap = matrix
            .user_ids()
            .par_iter()
            .enumerate()
            .map(|(row, &user_id)| {
                let row_scores = scores.row(row).to_vec();
                let ranked = argsort_descending(&row_scores).into_iter().map(|col| movie_ids[col]);
                (user_id, take_unseen(ranked, rated.get(&user_id), top_k))
            })
            .collect();

        Ok(Recommendations::predicted(predicted_ratings, by_user))
    }
}
