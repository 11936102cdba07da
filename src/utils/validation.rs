use crate::error::{EvalError, Result};
use crate::models::Rating;

/// Converts a signed cutoff coming from the command line into a usable `k`.
pub fn validate_top_k(k: i64) -> Result<usize> {
    if k < 0 {
        return Err(EvalError::invalid(format!("k must be non-negative, got {}", k)));
    }
    usize::try_from(k).map_err(|_| EvalError::invalid(format!("k is too large: {}", k)))
}

/// Split fractions live in the open interval (0, 1).
pub fn validate_fraction(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(EvalError::invalid(format!(
            "{} must be in (0.0, 1.0), got {}",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EvalError::invalid(format!(
            "{} must be in [0.0, 1.0], got {}",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_rating_range(min_rating: f64, max_rating: f64) -> Result<()> {
    if !min_rating.is_finite() || !max_rating.is_finite() {
        return Err(EvalError::invalid("rating bounds must be finite"));
    }
    if min_rating > max_rating {
        return Err(EvalError::invalid(format!(
            "min_rating {} is greater than max_rating {}",
            min_rating, max_rating
        )));
    }
    Ok(())
}

/// "Liked" cutoffs must lie on the rating scale.
pub fn validate_liked_threshold(name: &str, threshold: f64) -> Result<()> {
    if !threshold.is_finite() || !(0.5..=5.0).contains(&threshold) {
        return Err(EvalError::invalid(format!(
            "{} must be a rating in [0.5, 5.0], got {}",
            name, threshold
        )));
    }
    Ok(())
}

pub fn validate_rating(rating: &Rating) -> Result<()> {
    if !rating.rating.is_finite() {
        return Err(EvalError::invalid(format!(
            "rating of user {} for movie {} is not a number",
            rating.user_id, rating.movie_id
        )));
    }
    if !(0.5..=5.0).contains(&rating.rating) {
        return Err(EvalError::invalid(format!(
            "rating {} of user {} for movie {} is outside [0.5, 5.0]",
            rating.rating, rating.user_id, rating.movie_id
        )));
    }
    Ok(())
}
