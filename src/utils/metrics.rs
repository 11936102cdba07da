//! Ranking and regression metrics.
//!
//! Everything here is a pure function: ground truth and predictions go in,
//! a scalar comes out. Per-user scores are averaged over the users present
//! in the ground truth.

use crate::error::{EvalError, Result};
use crate::models::{MovieId, UserId};
use std::collections::{BTreeMap, HashSet};

/// Mean Recall@k over the users in `truth`.
///
/// A user's score is `|set(truth) ∩ set(predicted[..k])| / truth.len()`, or
/// 0.0 when the truth list is empty or `k == 0`. The denominator counts truth
/// entries as given, so repeated test rows for one movie lower the score.
pub fn recall_at_k(
    truth: &BTreeMap<UserId, Vec<MovieId>>,
    predicted: &BTreeMap<UserId, Vec<MovieId>>,
    k: usize,
) -> Result<f64> {
    mean_over_users(truth, predicted, |true_movies, predicted_movies| {
        if true_movies.is_empty() || k == 0 {
            return 0.0;
        }
        let relevant: HashSet<MovieId> = true_movies.iter().copied().collect();
        hits(&relevant, predicted_movies, k) as f64 / true_movies.len() as f64
    })
}

/// Mean Precision@k over the users in `truth`.
///
/// A user's score is `|truth ∩ predicted[..k]| / k`, or 0.0 when `k == 0`.
/// Short recommendation lists are still divided by `k`.
pub fn precision_at_k(
    truth: &BTreeMap<UserId, Vec<MovieId>>,
    predicted: &BTreeMap<UserId, Vec<MovieId>>,
    k: usize,
) -> Result<f64> {
    mean_over_users(truth, predicted, |true_movies, predicted_movies| {
        if k == 0 {
            return 0.0;
        }
        let relevant: HashSet<MovieId> = true_movies.iter().copied().collect();
        hits(&relevant, predicted_movies, k) as f64 / k as f64
    })
}

/// Root mean squared error between positionally aligned ratings.
pub fn rmse(true_ratings: &[f64], predicted_ratings: &[f64]) -> Result<f64> {
    if true_ratings.len() != predicted_ratings.len() {
        return Err(EvalError::invalid(format!(
            "rmse needs equally long inputs, got {} true and {} predicted ratings",
            true_ratings.len(),
            predicted_ratings.len()
        )));
    }
    if true_ratings.is_empty() {
        return Err(EvalError::invalid("rmse of an empty rating set is undefined"));
    }

    let squared_error: f64 = true_ratings
        .iter()
        .zip(predicted_ratings.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    Ok((squared_error / true_ratings.len() as f64).sqrt())
}

fn hits(relevant: &HashSet<MovieId>, predicted: &[MovieId], k: usize) -> usize {
    let top: HashSet<MovieId> = predicted.iter().take(k).copied().collect();
    top.intersection(relevant).count()
}

fn mean_over_users<F>(
    truth: &BTreeMap<UserId, Vec<MovieId>>,
    predicted: &BTreeMap<UserId, Vec<MovieId>>,
    score: F,
) -> Result<f64>
where
    F: Fn(&[MovieId], &[MovieId]) -> f64,
{
    if truth.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for (&user_id, true_movies) in truth {
        let predicted_movies = predicted
            .get(&user_id)
            .ok_or(EvalError::MissingGroundTruth { user_id })?;
        total += score(true_movies, predicted_movies);
    }

    Ok(total / truth.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(lists: &[(UserId, &[MovieId])]) -> BTreeMap<UserId, Vec<MovieId>> {
        lists.iter().map(|(u, m)| (*u, m.to_vec())).collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = users(&[(1, &[1, 2, 3]), (2, &[1, 2, 3]), (3, &[1, 2, 3])]);
        let predicted = truth.clone();
        assert!((recall_at_k(&truth, &predicted, 3).unwrap() - 1.0).abs() < 1e-9);
        assert!((precision_at_k(&truth, &predicted, 3).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_longer_predictions_cut_at_k() {
        let truth = users(&[(1, &[1, 2, 3]), (2, &[1, 2, 3]), (3, &[1, 2, 3])]);
        let predicted = users(&[(1, &[1, 2, 3, 4]), (2, &[1, 2, 3]), (3, &[1, 2, 3, 4, 5])]);
        assert!((recall_at_k(&truth, &predicted, 3).unwrap() - 1.0).abs() < 1e-9);
        assert!((precision_at_k(&truth, &predicted, 3).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap() {
        let truth = users(&[(1, &[1, 2, 3, 4]), (2, &[1, 2, 3, 4]), (3, &[1, 2, 3, 4])]);
        let predicted = users(&[(1, &[1, 2, 3, 4]), (2, &[1, 2, 3, 4]), (3, &[1, 2, 4, 5])]);
        let recall = recall_at_k(&truth, &predicted, 4).unwrap();
        let precision = precision_at_k(&truth, &predicted, 4).unwrap();
        assert!((recall - 11.0 / 12.0).abs() < 1e-9);
        assert!((precision - 11.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_k_scores_zero() {
        let truth = users(&[(1, &[1, 2]), (2, &[3])]);
        let predicted = users(&[(1, &[1, 2]), (2, &[3])]);
        assert_eq!(recall_at_k(&truth, &predicted, 0).unwrap(), 0.0);
        assert_eq!(precision_at_k(&truth, &predicted, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_k_beyond_candidates() {
        let truth = users(&[(1, &[1, 2])]);
        let predicted = users(&[(1, &[2])]);
        assert!((recall_at_k(&truth, &predicted, 10).unwrap() - 0.5).abs() < 1e-9);
        assert!((precision_at_k(&truth, &predicted, 10).unwrap() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_truth_set_scores_zero_recall() {
        let truth = users(&[(1, &[]), (2, &[5])]);
        let predicted = users(&[(1, &[5]), (2, &[5])]);
        assert!((recall_at_k(&truth, &predicted, 1).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_recall_divides_by_truth_list_length() {
        // movie 1 appears twice in the test rows of user 1
        let truth = users(&[(1, &[1, 1, 2])]);
        let predicted = users(&[(1, &[1, 2])]);
        assert!((recall_at_k(&truth, &predicted, 2).unwrap() - 2.0 / 3.0).abs() < 1e-9);
        assert!((precision_at_k(&truth, &predicted, 2).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_user_is_an_error() {
        let truth = users(&[(1, &[1]), (2, &[2])]);
        let predicted = users(&[(1, &[1])]);
        assert!(matches!(
            recall_at_k(&truth, &predicted, 1),
            Err(EvalError::MissingGroundTruth { user_id: 2 })
        ));
        assert!(matches!(
            precision_at_k(&truth, &predicted, 1),
            Err(EvalError::MissingGroundTruth { user_id: 2 })
        ));
    }

    #[test]
    fn test_extra_predicted_users_are_ignored() {
        let truth = users(&[(1, &[1])]);
        let predicted = users(&[(1, &[1]), (9, &[4, 5])]);
        assert_eq!(recall_at_k(&truth, &predicted, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_rmse() {
        let same = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(rmse(&same, &same).unwrap(), 0.0);

        let t = [1.1, 1.2, 1.3, 1.4, 1.5];
        let p = [1.6, 1.7, 1.8, 1.9, 2.0];
        assert!((rmse(&t, &p).unwrap() - 0.5).abs() < 1e-9);

        let t = [0.5, 1.5, 2.5, 3.5];
        let p = [1.5, 2.5, 3.5, 4.5];
        assert!((rmse(&t, &p).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rmse_rejects_misaligned_input() {
        assert!(matches!(rmse(&[1.0, 2.0], &[1.0]), Err(EvalError::InvalidArgument(_))));
        assert!(matches!(rmse(&[], &[]), Err(EvalError::InvalidArgument(_))));
    }
}
