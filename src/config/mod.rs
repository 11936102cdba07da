use crate::error::Result;
use crate::utils::validation::{
    validate_fraction, validate_liked_threshold, validate_rating_range, validate_top_k,
    validate_unit_interval,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub evaluation: EvaluationConfig,
    pub random: RandomConfig,
    pub association_rules: AssociationRulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub dir: PathBuf,
    pub user_limit: Option<usize>,
    pub test_size: f64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub top_k: usize,
    pub liked_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomConfig {
    pub min_rating: f64,
    pub max_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationRulesConfig {
    pub liked_threshold: f64,
    pub min_support: f64,
    pub min_lift: f64,
    pub recent_likes: usize,
    pub max_len: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig {
                dir: PathBuf::from("dataset/movielens-10m"),
                user_limit: Some(1000),
                test_size: 0.2,
                seed: None,
            },
            evaluation: EvaluationConfig {
                top_k: 10,
                liked_threshold: 4.0,
            },
            random: RandomConfig::default(),
            association_rules: AssociationRulesConfig::default(),
        }
    }
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            min_rating: 0.5,
            max_rating: 5.0,
        }
    }
}

impl Default for AssociationRulesConfig {
    fn default() -> Self {
        Self {
            liked_threshold: 4.0,
            min_support: 0.05,
            min_lift: 1.0,
            recent_likes: 5,
            max_len: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MOVIEREC").separator("__"))
            .build()?;

        // signed check before the field is read as a usize
        if let Ok(top_k) = settings.get_int("evaluation.top_k") {
            validate_top_k(top_k)?;
        }

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fraction("dataset.test_size", self.dataset.test_size)?;
        validate_rating_range(self.random.min_rating, self.random.max_rating)?;
        validate_liked_threshold("evaluation.liked_threshold", self.evaluation.liked_threshold)?;
        validate_liked_threshold(
            "association_rules.liked_threshold",
            self.association_rules.liked_threshold,
        )?;
        validate_unit_interval(
            "association_rules.min_support",
            self.association_rules.min_support,
        )?;

        if !self.association_rules.min_lift.is_finite() || self.association_rules.min_lift < 0.0 {
            return Err(crate::EvalError::invalid(format!(
                "association_rules.min_lift must be a non-negative number, got {}",
                self.association_rules.min_lift
            )));
        }
        if self.association_rules.recent_likes == 0 {
            return Err(crate::EvalError::invalid(
                "association_rules.recent_likes must be at least 1",
            ));
        }
        if self.association_rules.max_len == Some(0) {
            return Err(crate::EvalError::invalid(
                "association_rules.max_len must be at least 1 when set",
            ));
        }
        if self.dataset.user_limit == Some(0) {
            return Err(crate::EvalError::invalid("dataset.user_limit must be at least 1 when set"));
        }
        Ok(())
    }
}
