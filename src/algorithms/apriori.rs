//! Frequent itemset mining and association rule generation.
//!
//! Transactions are the rows of a boolean user × movie matrix and items are
//! its columns. Mining is level-wise: frequent 1-itemsets are found first,
//! then frequent (k-1)-itemsets that share a (k-2)-prefix are joined into
//! k-item candidates, candidates with an infrequent subset are pruned, and the
//! survivors are counted. Support counting works on per-item user bitsets.
//!
//! Rules are every non-trivial antecedent/consequent split of a frequent
//! itemset whose lift reaches the configured minimum:
//!
//! ```text
//! confidence(X => Y) = support(X ∪ Y) / support(X)
//! lift(X => Y)       = support(X ∪ Y) / (support(X) * support(Y))
//! ```

use crate::config::AssociationRulesConfig;
use crate::error::{EvalError, Result};
use crate::models::MovieId;
use crate::utils::validation::validate_unit_interval;
use ndarray::Array2;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemset {
    /// Movie ids in ascending order.
    pub items: Vec<MovieId>,
    pub support: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    pub antecedent: Vec<MovieId>,
    pub consequent: Vec<MovieId>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

#[derive(Debug, Clone)]
pub struct Apriori {
    min_support: f64,
    min_lift: f64,
    max_len: Option<usize>,
    frequent_itemsets: Vec<FrequentItemset>,
    rules: Vec<AssociationRule>,
}

/// Set of transaction (row) indices packed into 64-bit words.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowSet(Vec<u64>);

impl RowSet {
    fn from_column(matrix: &Array2<bool>, col: usize) -> Self {
        let rows = matrix.nrows();
        let mut words = vec![0u64; (rows + 63) / 64];
        for (row, &liked) in matrix.column(col).iter().enumerate() {
            if liked {
                words[row / 64] |= 1u64 << (row % 64);
            }
        }
        RowSet(words)
    }

    fn intersect(&self, other: &RowSet) -> RowSet {
        RowSet(self.0.iter().zip(other.0.iter()).map(|(a, b)| a & b).collect())
    }

    fn count(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl Apriori {
    pub fn new() -> Self {
        Self {
            min_support: 0.05,
            min_lift: 1.0,
            max_len: None,
            frequent_itemsets: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn from_config(config: &AssociationRulesConfig) -> Result<Self> {
        let apriori = Self::new()
            .with_min_support(config.min_support)
            .with_min_lift(config.min_lift)
            .with_max_len(config.max_len);
        apriori.validate()?;
        Ok(apriori)
    }

    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.min_support = min_support;
        self
    }

    pub fn with_min_lift(mut self, min_lift: f64) -> Self {
        self.min_lift = min_lift;
        self
    }

    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_unit_interval("min_support", self.min_support)?;
        if !self.min_lift.is_finite() || self.min_lift < 0.0 {
            return Err(EvalError::invalid(format!(
                "min_lift must be a non-negative number, got {}",
                self.min_lift
            )));
        }
        if self.max_len == Some(0) {
            return Err(EvalError::invalid("max_len must be at least 1"));
        }
        Ok(())
    }

    /// Mines `liked` (rows = users, columns = `items`) and derives the rules.
    pub fn fit(&mut self, liked: &Array2<bool>, items: &[MovieId]) -> Result<()> {
        self.validate()?;
        if liked.ncols() != items.len() {
            return Err(EvalError::invalid(format!(
                "matrix has {} columns but {} item ids were given",
                liked.ncols(),
                items.len()
            )));
        }

        let mined = self.mine(liked);
        self.rules = self.derive_rules(&mined, items);
        self.frequent_itemsets = mined
            .order
            .iter()
            .map(|cols| FrequentItemset {
                items: cols.iter().map(|&c| items[c]).collect(),
                support: mined.support[cols],
            })
            .collect();

        debug!(
            "Mined {} frequent itemsets and {} rules",
            self.frequent_itemsets.len(),
            self.rules.len()
        );
        Ok(())
    }

    /// Frequent itemsets in mining order: by length, then lexicographically.
    pub fn frequent_itemsets(&self) -> &[FrequentItemset] {
        &self.frequent_itemsets
    }

    /// Rules in generation order.
    pub fn rules(&self) -> &[AssociationRule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<AssociationRule> {
        self.rules
    }

    /// Frequent itemsets over column indices with their support.
    fn mine(&self, liked: &Array2<bool>) -> MiningResult {
        let mut result = MiningResult::default();
        let n_rows = liked.nrows();
        if n_rows == 0 || liked.ncols() == 0 {
            return result;
        }
        let n = n_rows as f64;

        let item_rows: Vec<RowSet> = (0..liked.ncols())
            .map(|col| RowSet::from_column(liked, col))
            .collect();

        let mut level: Vec<(Vec<usize>, RowSet)> = Vec::new();
        for (col, rows) in item_rows.iter().enumerate() {
            let support = rows.count() as f64 / n;
            if support >= self.min_support {
                result.push(vec![col], support);
                level.push((vec![col], rows.clone()));
            }
        }

        let mut size = 1;
        while !level.is_empty() && self.max_len.map_or(true, |max| size < max) {
            let frequent: HashSet<&[usize]> =
                level.iter().map(|(items, _)| items.as_slice()).collect();
            let mut next = Vec::new();

            for i in 0..level.len() {
                let (left, left_rows) = &level[i];
                for (right, _) in &level[i + 1..] {
                    if left[..size - 1] != right[..size - 1] {
                        break;
                    }
                    let mut candidate = left.clone();
                    candidate.push(right[size - 1]);

                    if has_infrequent_subset(&candidate, &frequent) {
                        continue;
                    }

                    let rows = left_rows.intersect(&item_rows[right[size - 1]]);
                    let support = rows.count() as f64 / n;
                    if support >= self.min_support {
                        next.push((candidate, rows));
                    }
                }
            }

            for (items, rows) in &next {
                result.push(items.clone(), rows.count() as f64 / n);
            }
            level = next;
            size += 1;
        }

        result
    }

    fn derive_rules(&self, supports: &MiningResult, items: &[MovieId]) -> Vec<AssociationRule> {
        let mut rules = Vec::new();

        for itemset in &supports.order {
            if itemset.len() < 2 {
                continue;
            }
            let support = supports.support[itemset];

            for mask in 1..(1u64 << itemset.len()) - 1 {
                let (antecedent, consequent): (Vec<usize>, Vec<usize>) = {
                    let mut a = Vec::new();
                    let mut c = Vec::new();
                    for (bit, &item) in itemset.iter().enumerate() {
                        if mask & (1u64 << bit) != 0 {
                            a.push(item);
                        } else {
                            c.push(item);
                        }
                    }
                    (a, c)
                };

                // subsets of a frequent itemset are frequent, so both lookups succeed
                let (Some(&antecedent_support), Some(&consequent_support)) =
                    (supports.support.get(&antecedent), supports.support.get(&consequent))
                else {
                    continue;
                };

                let lift = support / (antecedent_support * consequent_support);
                if lift >= self.min_lift {
                    rules.push(AssociationRule {
                        antecedent: antecedent.iter().map(|&c| items[c]).collect(),
                        consequent: consequent.iter().map(|&c| items[c]).collect(),
                        antecedent_support,
                        consequent_support,
                        support,
                        confidence: support / antecedent_support,
                        lift,
                    });
                }
            }
        }

        rules
    }
}

impl Default for Apriori {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct MiningResult {
    order: Vec<Vec<usize>>,
    support: HashMap<Vec<usize>, f64>,
}

impl MiningResult {
    fn push(&mut self, items: Vec<usize>, support: f64) {
        self.support.insert(items.clone(), support);
        self.order.push(items);
    }
}

fn has_infrequent_subset(candidate: &[usize], frequent: &HashSet<&[usize]>) -> bool {
    // the two subsets dropping one of the last two items are the join parents
    (0..candidate.len().saturating_sub(2)).any(|skip| {
        let subset: Vec<usize> = candidate
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, &item)| item)
            .collect();
        !frequent.contains(subset.as_slice())
    })
}
