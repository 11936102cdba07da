use crate::error::{EvalError, Result};
use crate::models::{Dataset, Movie, MovieId, Rating};
use crate::utils::validation::{validate_fraction, validate_rating};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SEPARATOR: &str = "::";

/// Reads a MovieLens 10M style directory (`movies.dat`, `ratings.dat`, `tags.dat`).
pub struct DatasetLoader {
    dir: PathBuf,
    user_limit: Option<usize>,
}

impl DatasetLoader {
    pub fn new(dir: impl Into<PathBuf>, user_limit: Option<usize>) -> Self {
        Self {
            dir: dir.into(),
            user_limit,
        }
    }

    pub fn load(&self) -> Result<Dataset> {
        info!("Loading dataset from {}", self.dir.display());

        let tags = self.load_tags()?;
        let movies: Vec<Movie> = self
            .load_movies()?
            .into_iter()
            .map(|movie| match tags.get(&movie.movie_id) {
                Some(movie_tags) => movie.with_tags(movie_tags.clone()),
                None => movie,
            })
            .collect();
        let ratings = self.load_ratings()?;
        let ratings = match self.user_limit {
            Some(limit) => limit_users(ratings, limit),
            None => ratings,
        };

        info!("Loaded {} movies and {} ratings", movies.len(), ratings.len());
        Ok(Dataset { movies, ratings })
    }

    fn load_movies(&self) -> Result<Vec<Movie>> {
        read_records(&self.dir.join("movies.dat"), 3, |fields| {
            let movie_id = parse_field::<MovieId>(fields[0], "movie_id")?;
            let genres = fields[2].split('|').map(str::to_string).collect();
            Ok(Movie::new(movie_id, fields[1].to_string(), genres))
        })
    }

    fn load_ratings(&self) -> Result<Vec<Rating>> {
        read_records(&self.dir.join("ratings.dat"), 4, |fields| {
            let rating = Rating::new(
                parse_field(fields[0], "user_id")?,
                parse_field(fields[1], "movie_id")?,
                parse_field(fields[2], "rating")?,
                parse_field(fields[3], "timestamp")?,
            );
            validate_rating(&rating).map_err(|e| e.to_string())?;
            Ok(rating)
        })
    }

    /// Lowercased tags per movie, in file order.
    fn load_tags(&self) -> Result<HashMap<MovieId, Vec<String>>> {
        let rows = read_records(&self.dir.join("tags.dat"), 4, |fields| {
            let movie_id = parse_field::<MovieId>(fields[1], "movie_id")?;
            Ok((movie_id, fields[2].to_lowercase()))
        })?;

        let mut tags: HashMap<MovieId, Vec<String>> = HashMap::new();
        for (movie_id, tag) in rows {
            tags.entry(movie_id).or_default().push(tag);
        }
        debug!("Aggregated tags for {} movies", tags.len());
        Ok(tags)
    }
}

/// Keeps ratings of users whose id is at most the `limit`-th smallest distinct id.
pub fn limit_users(ratings: Vec<Rating>, limit: usize) -> Vec<Rating> {
    let mut user_ids: Vec<u32> = ratings.iter().map(|r| r.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let Some(&max_user_id) = user_ids.get(limit.saturating_sub(1)).or(user_ids.last()) else {
        return ratings;
    };
    ratings.into_iter().filter(|r| r.user_id <= max_user_id).collect()
}

/// Random train/test partition; `test_size` of the rows (rounded up) go to test.
///
/// Both halves keep the relative order of `ratings`.
pub fn split_ratings<R: Rng + ?Sized>(
    ratings: &[Rating],
    test_size: f64,
    rng: &mut R,
) -> Result<(Vec<Rating>, Vec<Rating>)> {
    validate_fraction("test_size", test_size)?;

    let n_test = (ratings.len() as f64 * test_size).ceil() as usize;
    let mut indices: Vec<usize> = (0..ratings.len()).collect();
    indices.shuffle(rng);

    let mut is_test = vec![false; ratings.len()];
    for &i in &indices[..n_test] {
        is_test[i] = true;
    }

    let mut train = Vec::with_capacity(ratings.len() - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (rating, &in_test) in ratings.iter().zip(is_test.iter()) {
        if in_test {
            test.push(*rating);
        } else {
            train.push(*rating);
        }
    }

    debug!("Split {} ratings into {} train / {} test", ratings.len(), train.len(), test.len());
    Ok((train, test))
}

/// Decodes a Latin-1 file and parses every non-empty line with `parse`.
fn read_records<T, F>(path: &Path, n_fields: usize, mut parse: F) -> Result<Vec<T>>
where
    F: FnMut(&[&str]) -> std::result::Result<T, String>,
{
    let bytes = std::fs::read(path).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text: String = bytes.iter().map(|&b| b as char).collect();
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.splitn(n_fields, SEPARATOR).collect();
        if fields.len() != n_fields {
            return Err(EvalError::Parse {
                file,
                line: i + 1,
                reason: format!("expected {} fields, found {}", n_fields, fields.len()),
            });
        }
        let record = parse(&fields).map_err(|reason| EvalError::Parse {
            file: file.clone(),
            line: i + 1,
            reason,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> std::result::Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid {}: {:?}", name, raw))
}
