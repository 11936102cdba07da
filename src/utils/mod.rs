use crate::models::MovieId;
use std::cmp::Ordering;
use std::collections::HashSet;

pub mod metrics;
pub mod validation;

/// Indices of `scores` ordered by score descending; equal scores keep index order.
pub fn argsort_descending(scores: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    indices
}

/// Walks ranked candidates and keeps the first `k` distinct movies not in `seen`.
pub fn take_unseen<I>(candidates: I, seen: Option<&HashSet<MovieId>>, k: usize) -> Vec<MovieId>
where
    I: IntoIterator<Item = MovieId>,
{
    let mut picked = Vec::with_capacity(k);
    if k == 0 {
        return picked;
    }

    let mut taken = HashSet::new();
    for movie_id in candidates {
        if seen.is_some_and(|s| s.contains(&movie_id)) || !taken.insert(movie_id) {
            continue;
        }
        picked.push(movie_id);
        if picked.len() == k {
            break;
        }
    }
    picked
}
