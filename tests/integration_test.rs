use movierec::algorithms::{AssociationRuleRanker, RandomRanker, Recommender};
use movierec::config::{AssociationRulesConfig, RandomConfig};
use movierec::services::dataset::{split_ratings, DatasetLoader};
use movierec::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Users 1..=10 love movies 1-3, users 11..=20 love movies 4-6; everyone
/// rates a few of movies 7-12 poorly.
fn two_taste_groups() -> Vec<Rating> {
    let mut ratings = Vec::new();
    let mut ts = 0i64;
    for user_id in 1..=20u32 {
        let favourites = if user_id <= 10 { 1..=3u32 } else { 4..=6u32 };
        for movie_id in favourites {
            ts += 1;
            ratings.push(Rating::new(user_id, movie_id, 4.5, ts));
        }
        for movie_id in 7..=12u32 {
            if (user_id + movie_id) % 3 == 0 {
                ts += 1;
                ratings.push(Rating::new(user_id, movie_id, 2.0, ts));
            }
        }
    }
    ratings
}

fn write_dataset(dir: &Path, ratings: &[Rating]) {
    let mut movies = String::new();
    for movie_id in 1..=12 {
        writeln!(movies, "{}::Movie {} (2000)::Drama|Comedy", movie_id, movie_id).unwrap();
    }
    fs::write(dir.join("movies.dat"), movies).unwrap();

    let mut lines = String::new();
    for r in ratings {
        writeln!(lines, "{}::{}::{}::{}", r.user_id, r.movie_id, r.rating, r.timestamp).unwrap();
    }
    fs::write(dir.join("ratings.dat"), lines).unwrap();
    fs::write(dir.join("tags.dat"), "1::1::Classic::1\n2::1::classic::2\n").unwrap();
}

fn assert_list_invariants(train: &[Rating], recs: &RecommendationMap, k: usize) {
    let rated = rated_movies_by_user(train);
    for user_id in rated.keys() {
        assert!(recs.contains_key(user_id), "user {} has no entry", user_id);
    }
    for (user_id, list) in recs {
        assert!(list.len() <= k);
        let unique: HashSet<_> = list.iter().collect();
        assert_eq!(unique.len(), list.len());
        let seen = &rated[user_id];
        assert!(list.iter().all(|m| !seen.contains(m)));
    }
}

#[test]
fn test_random_pipeline_from_files() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &two_taste_groups());

    let mut config = Config::default();
    config.dataset.dir = dir.path().to_path_buf();
    config.dataset.user_limit = None;
    config.dataset.seed = Some(17);
    config.evaluation.top_k = 3;

    let mut ranker = RandomRanker::from_seed(&config.random, 3, Some(17)).unwrap();
    let evaluator = Evaluator::new(config).unwrap();
    let report = evaluator.run(&mut ranker).unwrap();

    assert_eq!(report.ranker, "random");
    let rmse = report.rmse.unwrap();
    assert!(rmse > 0.0 && rmse <= 4.5);
    assert!((0.0..=1.0).contains(&report.recall_at_k));
    assert!((0.0..=1.0).contains(&report.precision_at_k));
    let names: Vec<_> = report.metrics().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["rmse", "recall_at_k", "precision_at_k"]);
}

#[test]
fn test_association_rules_pipeline_from_files() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &two_taste_groups());

    let mut config = Config::default();
    config.dataset.dir = dir.path().to_path_buf();
    config.dataset.user_limit = Some(15);
    config.dataset.seed = Some(5);
    config.association_rules.min_support = 0.2;

    let mut ranker = AssociationRuleRanker::new(config.association_rules.clone(), 10).unwrap();
    let evaluator = Evaluator::new(config).unwrap();
    let report = evaluator.run(&mut ranker).unwrap();

    assert_eq!(report.ranker, "association_rules");
    assert_eq!(report.rmse, None);
    assert!(!ranker.rules().is_empty());
    let names: Vec<_> = report.metrics().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["recall_at_k", "precision_at_k"]);
}

#[test]
fn test_association_rules_find_held_out_favourite() {
    let ratings = two_taste_groups();
    // hold out user 1's rating of movie 2 and evaluate on it alone
    let (test, train): (Vec<Rating>, Vec<Rating>) =
        ratings.into_iter().partition(|r| r.user_id == 1 && r.movie_id == 2);
    assert_eq!(test.len(), 1);

    let config = AssociationRulesConfig {
        min_support: 0.2,
        ..AssociationRulesConfig::default()
    };
    let mut ranker = AssociationRuleRanker::new(config, 10).unwrap();
    let evaluator = Evaluator::new(Config::default()).unwrap();
    let report = evaluator.evaluate(&mut ranker, &train, &test).unwrap();

    assert_eq!(report.users_evaluated, 1);
    assert_eq!(report.recall_at_k, 1.0);
    assert!((report.precision_at_k - 0.1).abs() < 1e-9);
}

#[test]
fn test_zero_co_occurrence_never_fails() {
    let train: Vec<Rating> = (1..=30u32).map(|u| Rating::new(u, 100 + u, 5.0, u as i64)).collect();
    let test: Vec<Rating> = (1..=30u32).map(|u| Rating::new(u, 1, 5.0, 0)).collect();

    let mut ranker = AssociationRuleRanker::new(AssociationRulesConfig::default(), 10).unwrap();
    let evaluator = Evaluator::new(Config::default()).unwrap();
    let report = evaluator.evaluate(&mut ranker, &train, &test).unwrap();

    assert!(ranker.rules().is_empty());
    assert_eq!(report.recall_at_k, 0.0);
    assert_eq!(report.precision_at_k, 0.0);
    assert_eq!(report.users_evaluated, 30);
}

#[test]
fn test_negative_cutoff_is_rejected() {
    let err = utils::validation::validate_top_k(-3).unwrap_err();
    assert!(matches!(err, EvalError::InvalidArgument(_)));
}

#[test]
fn test_loader_and_split_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ratings = two_taste_groups();
    write_dataset(dir.path(), &ratings);

    let dataset = DatasetLoader::new(dir.path(), None).load().unwrap();
    assert_eq!(dataset.ratings, ratings);
    assert_eq!(dataset.movies[0].tags, Some(vec!["classic".to_string(), "classic".to_string()]));

    let (train, test) =
        split_ratings(&dataset.ratings, 0.25, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(train.len() + test.len(), ratings.len());
}

fn ratings_strategy() -> impl Strategy<Value = Vec<Rating>> {
    proptest::collection::hash_map((1u32..15, 1u32..25), (1u32..=10, 0i64..1000), 1..150).prop_map(
        |cells: HashMap<(u32, u32), (u32, i64)>| {
            let mut ratings: Vec<Rating> = cells
                .into_iter()
                .map(|((user_id, movie_id), (half_stars, ts))| {
                    Rating::new(user_id, movie_id, half_stars as f64 * 0.5, ts)
                })
                .collect();
            ratings.sort_by_key(|r| (r.user_id, r.movie_id));
            ratings
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_lists_hold_invariants(
        ratings in ratings_strategy(),
        seed in any::<u64>(),
        k in 1usize..12,
    ) {
        let (train, test) = split_ratings(&ratings, 0.3, &mut StdRng::seed_from_u64(seed)).unwrap();
        let mut ranker = RandomRanker::from_seed(&RandomConfig::default(), k, Some(seed)).unwrap();
        let out = ranker.recommend(&train, &test).unwrap();

        prop_assert_eq!(out.predicted_ratings.len(), test.len());
        prop_assert!(out.predicted_ratings.iter().all(|p| (0.5..=5.0).contains(p)));
        assert_list_invariants(&train, &out.by_user, k);
    }

    #[test]
    fn association_rule_lists_hold_invariants(
        ratings in ratings_strategy(),
        seed in any::<u64>(),
        k in 1usize..12,
        min_support in 0.05f64..0.6,
    ) {
        let (train, test) = split_ratings(&ratings, 0.3, &mut StdRng::seed_from_u64(seed)).unwrap();
        let config = AssociationRulesConfig {
            min_support,
            max_len: Some(3),
            ..AssociationRulesConfig::default()
        };
        let mut ranker = AssociationRuleRanker::new(config, k).unwrap();
        let out = ranker.recommend(&train, &test).unwrap();

        prop_assert_eq!(out.rating_signal, RatingSignal::EchoedGroundTruth);
        prop_assert!(ranker.rules().iter().all(|r| r.lift >= 1.0));
        assert_list_invariants(&train, &out.by_user, k);
    }
}
