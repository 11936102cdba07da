use crate::models::{MovieId, Rating, UserId};
use ndarray::Array2;
use std::collections::HashMap;

/// Dense user × movie pivot of a ratings relation.
///
/// Rows and columns follow the ascending order of the distinct user and movie
/// ids, so the same ratings always produce the same layout.
#[derive(Debug, Clone)]
pub struct UserMovieMatrix {
    user_ids: Vec<UserId>,
    movie_ids: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    ratings: Array2<Option<f64>>,
}

impl UserMovieMatrix {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let user_ids = sorted_unique(ratings.iter().map(|r| r.user_id));
        let movie_ids = sorted_unique(ratings.iter().map(|r| r.movie_id));
        let user_index = index_of(&user_ids);
        let movie_index = index_of(&movie_ids);

        let mut cells = Array2::from_elem((user_ids.len(), movie_ids.len()), None);
        for r in ratings {
            // a repeated (user, movie) pair keeps the later rating
            cells[[user_index[&r.user_id], movie_index[&r.movie_id]]] = Some(r.rating);
        }

        Self {
            user_ids,
            movie_ids,
            user_index,
            movie_index,
            ratings: cells,
        }
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn movie_index(&self, movie_id: MovieId) -> Option<usize> {
        self.movie_index.get(&movie_id).copied()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.ratings.dim()
    }

    /// `true` where the rating is at least `threshold`; missing cells are `false`.
    pub fn binarize(&self, threshold: f64) -> Array2<bool> {
        self.ratings.mapv(|cell| cell.is_some_and(|rating| rating >= threshold))
    }
}

fn sorted_unique<I: Iterator<Item = u32>>(ids: I) -> Vec<u32> {
    let mut ids: Vec<u32> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn index_of(ids: &[u32]) -> HashMap<u32, usize> {
    ids.iter().enumerate().map(|(i, &id)| (id, i)).collect()
}
