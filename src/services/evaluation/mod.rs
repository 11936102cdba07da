use crate::algorithms::Recommender;
use crate::config::Config;
use crate::error::Result;
use crate::models::{liked_movies_by_user, EvaluationReport, Rating, RatingSignal, Recommendations};
use crate::services::dataset::{split_ratings, DatasetLoader};
use crate::utils::metrics::{precision_at_k, recall_at_k, rmse};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// Runs one recommender end to end and scores it.
pub struct Evaluator {
    config: Config,
}

impl Evaluator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Loads and splits the configured dataset, then evaluates `ranker` on it.
    pub fn run<R: Recommender + ?Sized>(&self, ranker: &mut R) -> Result<EvaluationReport> {
        let dataset =
            DatasetLoader::new(self.config.dataset.dir.clone(), self.config.dataset.user_limit)
                .load()?;

        let mut rng = match self.config.dataset.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (train, test) =
            split_ratings(&dataset.ratings, self.config.dataset.test_size, &mut rng)?;
        info!("Split into {} train and {} test ratings", train.len(), test.len());

        self.evaluate(ranker, &train, &test)
    }

    /// Evaluates `ranker` on an existing partition.
    pub fn evaluate<R: Recommender + ?Sized>(
        &self,
        ranker: &mut R,
        train: &[Rating],
        test: &[Rating],
    ) -> Result<EvaluationReport> {
        info!("Running {} recommender", ranker.name());
        let recommendations = ranker.recommend(train, test)?;
        self.score(ranker.name(), test, &recommendations)
    }

    /// Scores recommendations produced for `test`.
    pub fn score(
        &self,
        ranker: &str,
        test: &[Rating],
        recommendations: &Recommendations,
    ) -> Result<EvaluationReport> {
        let k = self.config.evaluation.top_k;
        let mut truth = liked_movies_by_user(test, self.config.evaluation.liked_threshold);

        // users seen only in test have nothing to be ranked against
        let before = truth.len();
        truth.retain(|user_id, _| recommendations.by_user.contains_key(user_id));
        if truth.len() < before {
            debug!(
                "Dropped {} test users without a recommendation entry",
                before - truth.len()
            );
        }

        let recall = recall_at_k(&truth, &recommendations.by_user, k)?;
        let precision = precision_at_k(&truth, &recommendations.by_user, k)?;

        let rmse_score = match recommendations.rating_signal {
            RatingSignal::Predicted => {
                let true_ratings: Vec<f64> = test.iter().map(|r| r.rating).collect();
                Some(rmse(&true_ratings, &recommendations.predicted_ratings)?)
            }
            RatingSignal::EchoedGroundTruth => {
                warn!("{} does not predict ratings; RMSE is not reported", ranker);
                None
            }
        };

        let report = EvaluationReport {
            ranker: ranker.to_string(),
            k,
            rmse: rmse_score,
            recall_at_k: recall,
            precision_at_k: precision,
            users_evaluated: truth.len(),
            evaluated_at: Utc::now(),
        };
        info!(
            "{}: recall@{}={:.4} precision@{}={:.4} rmse={:?}",
            report.ranker, k, report.recall_at_k, k, report.precision_at_k, report.rmse
        );
        Ok(report)
    }
}
