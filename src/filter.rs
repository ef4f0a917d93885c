//! Sidebar filters: category, location and behavior membership plus an
//! inclusive amount range, combined with logical AND.

use crate::types::transaction::{ScoredTransaction, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Values offered by the sidebar for a given dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Distinct merchant categories in first-appearance order
    pub merchant_categories: Vec<String>,
    /// Distinct locations in first-appearance order
    pub locations: Vec<String>,
    /// Distinct behavior labels in first-appearance order
    pub behaviors: Vec<String>,
    /// Whole-number bounds that cover every amount
    pub amount_range: AmountRange,
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

impl FilterOptions {
    pub fn from_transactions<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut merchant_categories = Vec::new();
        let mut locations = Vec::new();
        let mut behaviors = Vec::new();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;

        for tx in rows {
            push_unique(&mut merchant_categories, &tx.merchant_category);
            push_unique(&mut locations, &tx.location);
            push_unique(&mut behaviors, &tx.user_behavior);
            lo = lo.min(tx.amount);
            hi = hi.max(tx.amount);
        }

        let amount_range = if lo <= hi {
            AmountRange::new(lo.floor(), hi.ceil())
        } else {
            AmountRange::new(0.0, 0.0)
        };

        Self {
            merchant_categories,
            locations,
            behaviors,
            amount_range,
        }
    }

    pub fn from_scored(rows: &[ScoredTransaction]) -> Self {
        Self::from_transactions(rows.iter().map(|r| &r.transaction))
    }
}

/// Inclusive amount interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    /// Build a range, swapping inverted bounds
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// What the user picked. `None` means "no choice made yet", which selects
/// every available value; `Some(vec![])` selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub merchant_categories: Option<Vec<String>>,
    pub locations: Option<Vec<String>>,
    pub behaviors: Option<Vec<String>>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
}

impl FilterSelection {
    /// Fill unset choices from the dataset's options
    pub fn resolve(&self, options: &FilterOptions) -> FilterCriteria {
        let pick = |chosen: &Option<Vec<String>>, all: &[String]| -> BTreeSet<String> {
            chosen.as_deref().unwrap_or(all).iter().cloned().collect()
        };

        FilterCriteria {
            merchant_categories: pick(&self.merchant_categories, &options.merchant_categories),
            locations: pick(&self.locations, &options.locations),
            behaviors: pick(&self.behaviors, &options.behaviors),
            amount_range: AmountRange::new(
                self.amount_min.unwrap_or(options.amount_range.min),
                self.amount_max.unwrap_or(options.amount_range.max),
            ),
        }
    }
}

/// Fully resolved predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub merchant_categories: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub behaviors: BTreeSet<String>,
    pub amount_range: AmountRange,
}

impl FilterCriteria {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.merchant_categories.contains(&tx.merchant_category)
            && self.locations.contains(&tx.location)
            && self.behaviors.contains(&tx.user_behavior)
            && self.amount_range.contains(tx.amount)
    }

    /// Rows passing every predicate, in input order
    pub fn apply(&self, rows: &[ScoredTransaction]) -> Vec<ScoredTransaction> {
        rows.iter()
            .filter(|r| self.matches(&r.transaction))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<ScoredTransaction> {
        vec![
            ScoredTransaction::new(Transaction::new(1, 99.6, "Food", "Store", "Frequent"), 1, 0.1),
            ScoredTransaction::new(Transaction::new(2, 150.0, "Fuel", "Online", "Rare"), 1, 0.1),
            ScoredTransaction::new(Transaction::new(3, 1200.4, "Food", "Online", "Occasional"), -1, -0.1),
            ScoredTransaction::new(Transaction::new(4, 80.0, "Apparel", "Store", "Rare"), 1, 0.2),
        ]
    }

    #[test]
    fn test_options_preserve_first_appearance() {
        let options = FilterOptions::from_scored(&rows());

        assert_eq!(options.merchant_categories, vec!["Food", "Fuel", "Apparel"]);
        assert_eq!(options.locations, vec!["Store", "Online"]);
        assert_eq!(options.behaviors, vec!["Frequent", "Rare", "Occasional"]);
        assert_eq!(options.amount_range, AmountRange::new(80.0, 1201.0));
    }

    #[test]
    fn test_default_selection_keeps_everything() {
        let data = rows();
        let options = FilterOptions::from_scored(&data);
        let criteria = FilterSelection::default().resolve(&options);

        assert_eq!(criteria.apply(&data).len(), data.len());
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let data = rows();
        let options = FilterOptions::from_scored(&data);
        let selection = FilterSelection {
            merchant_categories: Some(vec!["Food".to_string(), "Fuel".to_string()]),
            locations: Some(vec!["Online".to_string()]),
            amount_min: Some(100.0),
            ..FilterSelection::default()
        };
        let criteria = selection.resolve(&options);
        let filtered = criteria.apply(&data);

        let ids: Vec<i64> = filtered.iter().map(|r| r.transaction.transaction_id).collect();
        assert_eq!(ids, vec![2, 3]);
        for row in &filtered {
            assert!(criteria.merchant_categories.contains(&row.transaction.merchant_category));
            assert!(criteria.locations.contains(&row.transaction.location));
            assert!(criteria.behaviors.contains(&row.transaction.user_behavior));
            assert!(criteria.amount_range.contains(row.transaction.amount));
        }
    }

    #[test]
    fn test_empty_selection_matches_nothing() {
        let data = rows();
        let options = FilterOptions::from_scored(&data);
        let selection = FilterSelection {
            behaviors: Some(Vec::new()),
            ..FilterSelection::default()
        };

        assert!(selection.resolve(&options).apply(&data).is_empty());
    }

    #[test]
    fn test_amount_range_is_inclusive_and_normalised() {
        let range = AmountRange::new(150.0, 80.0);
        assert_eq!(range.min, 80.0);
        assert!(range.contains(80.0));
        assert!(range.contains(150.0));
        assert!(!range.contains(150.01));
    }
}
