use super::{Apriori, AssociationRule, Recommender, UserMovieMatrix};
use crate::config::AssociationRulesConfig;
use crate::error::{EvalError, Result};
use crate::models::{
    rated_movies_by_user, MovieId, Rating, RecommendationMap, Recommendations, UserId,
};
use crate::utils::take_unseen;
use crate::utils::validation::validate_liked_threshold;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

/// Recommends movies that co-occur in association rules with a user's most
/// recent favourites.
///
/// It does not predict ratings: the test ratings are echoed back and flagged
/// as [`RatingSignal::EchoedGroundTruth`](crate::models::RatingSignal).
#[derive(Debug, Clone)]
pub struct AssociationRuleRanker {
    config: AssociationRulesConfig,
    top_k: usize,
    rules: Vec<AssociationRule>,
}

impl AssociationRuleRanker {
    pub fn new(config: AssociationRulesConfig, top_k: usize) -> Result<Self> {
        // validates thresholds up front
        Apriori::from_config(&config)?;
        validate_liked_threshold("liked_threshold", config.liked_threshold)?;
        if config.recent_likes == 0 {
            return Err(EvalError::invalid("recent_likes must be at least 1"));
        }
        Ok(Self {
            config,
            top_k,
            rules: Vec::new(),
        })
    }

    /// Rules mined by the last call to [`Recommender::recommend`].
    pub fn rules(&self) -> &[AssociationRule] {
        &self.rules
    }

    pub fn mine_rules(&self, train: &[Rating]) -> Result<Vec<AssociationRule>> {
        let matrix = UserMovieMatrix::from_ratings(train);
        let liked = matrix.binarize(self.config.liked_threshold);

        let mut apriori = Apriori::from_config(&self.config)?;
        apriori.fit(&liked, matrix.movie_ids())?;
        Ok(apriori.into_rules())
    }

    /// The newest `recent_likes` liked movies of every user who liked anything.
    pub fn recent_likes(&self, train: &[Rating]) -> BTreeMap<UserId, Vec<MovieId>> {
        let mut liked: BTreeMap<UserId, Vec<&Rating>> = BTreeMap::new();
        for r in train.iter().filter(|r| r.is_liked(self.config.liked_threshold)) {
            liked.entry(r.user_id).or_default().push(r);
        }

        liked
            .into_iter()
            .map(|(user_id, mut ratings)| {
                ratings.sort_by_key(|r| r.timestamp);
                let skip = ratings.len().saturating_sub(self.config.recent_likes);
                (user_id, ratings[skip..].iter().map(|r| r.movie_id).collect())
            })
            .collect()
    }

    /// Ranks consequents of the rules triggered by `recent`.
    ///
    /// Triggered rules are visited by lift descending, ties by rule index. Each
    /// consequent movie counts once per rule it appears in; movies are ranked by
    /// that count, ties by the position where they were first seen.
    pub fn rank_candidates(rules: &[AssociationRule], recent: &[MovieId]) -> Vec<MovieId> {
        let recent: HashSet<MovieId> = recent.iter().copied().collect();
        let mut matched: Vec<(usize, &AssociationRule)> = rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.antecedent.iter().any(|m| recent.contains(m)))
            .collect();
        matched.sort_by(|(ia, a), (ib, b)| {
            b.lift
                .partial_cmp(&a.lift)
                .unwrap_or(Ordering::Equal)
                .then(ia.cmp(ib))
        });

        let mut counts: HashMap<MovieId, (usize, usize)> = HashMap::new();
        let mut position = 0;
        for (_, rule) in &matched {
            for &movie_id in &rule.consequent {
                counts.entry(movie_id).or_insert((0, position)).0 += 1;
                position += 1;
            }
        }

        let mut ranked: Vec<(MovieId, usize, usize)> = counts
            .into_iter()
            .map(|(movie_id, (count, first_seen))| (movie_id, count, first_seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.into_iter().map(|(movie_id, _, _)| movie_id).collect()
    }
}

impl Recommender for AssociationRuleRanker {
    fn name(&self) -> &'static str {
        "association_rules"
    }

    fn recommend(&mut self, train: &[Rating], test: &[Rating]) -> Result<Recommendations> {
        self.rules = self.mine_rules(train)?;
        if self.rules.is_empty() {
            warn!(
                "No association rules at min_support={} min_lift={}; \
                 every recommendation list will be empty",
                self.config.min_support, self.config.min_lift
            );
        } else {
            info!("Mined {} association rules", self.rules.len());
        }

        let recent = self.recent_likes(train);
        let rated = rated_movies_by_user(train);
        let rules = &self.rules;
        let top_k = self.top_k;

        let mut by_user: RecommendationMap = recent
            .par_iter()
            .map(|(&user_id, movies)| {
                let candidates = Self::rank_candidates(rules, movies);
                (user_id, take_unseen(candidates, rated.get(&user_id), top_k))
            })
            .collect();

        // users without recent likes still get an (empty) entry
        for user_id in rated.keys() {
            by_user.entry(*user_id).or_default();
        }

        Ok(Recommendations::echoed(test, by_user))
    }
}
