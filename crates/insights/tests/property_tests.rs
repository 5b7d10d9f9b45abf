//! Property-based tests for ranking and the analyzers.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p insights --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p insights --test property_tests
//! ```

use proptest::prelude::*;

use insights::analysis::{duplicate_groups, PatternAnalyzer, StatisticalAnalyzer};
use insights::{
    rank, AnalysisConfig, Analyzer, Dataset, DatasetConfig, Insight, InsightCategory,
};

// =============================================================================
// Strategies
// =============================================================================

fn category() -> impl Strategy<Value = InsightCategory> {
    prop_oneof![
        Just(InsightCategory::Overview),
        Just(InsightCategory::Statistical),
        Just(InsightCategory::Pattern),
        Just(InsightCategory::Quality),
    ]
}

/// Small title alphabet so duplicates are common.
fn insight() -> impl Strategy<Value = Insight> {
    (category(), "[a-d]", 0.0f64..=1.0).prop_map(|(category, title, confidence)| {
        Insight::new(category, title, "generated", confidence)
    })
}

/// Rows over a tiny alphabet so duplicate rows appear often.
fn rows(width: usize) -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[xyz]|", width), 1..30)
}

fn dataset(headers: &[&str], rows: Vec<Vec<String>>) -> Dataset {
    Dataset::from_records(
        headers.iter().map(|s| s.to_string()).collect(),
        rows,
        &DatasetConfig::default(),
    )
    .unwrap()
}

// =============================================================================
// Ranker
// =============================================================================

proptest! {
    #[test]
    fn rank_respects_bounds(
        insights in prop::collection::vec(insight(), 0..40),
        max_count in 0usize..10,
        min_confidence in 0.0f64..=1.0,
    ) {
        let ranked = rank(insights, max_count, min_confidence);
        prop_assert!(ranked.len() <= max_count);
        prop_assert!(ranked.iter().all(|i| i.confidence >= min_confidence));
    }

    #[test]
    fn rank_is_idempotent(
        insights in prop::collection::vec(insight(), 0..40),
        max_count in 0usize..10,
        min_confidence in 0.0f64..=1.0,
    ) {
        let once = rank(insights, max_count, min_confidence);
        let twice = rank(once.clone(), max_count, min_confidence);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rank_has_unique_keys_and_sorted_confidence(
        insights in prop::collection::vec(insight(), 0..40),
    ) {
        let ranked = rank(insights, 100, 0.0);
        let mut keys: Vec<_> = ranked.iter().map(|i| (i.category, i.title.clone())).collect();
        keys.sort_by(|a, b| (a.0.priority(), &a.1).cmp(&(b.0.priority(), &b.1)));
        keys.dedup();
        prop_assert_eq!(keys.len(), ranked.len());
        prop_assert!(ranked.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn rank_is_deterministic(insights in prop::collection::vec(insight(), 0..40)) {
        prop_assert_eq!(rank(insights.clone(), 5, 0.1), rank(insights, 5, 0.1));
    }
}

// =============================================================================
// Analyzers
// =============================================================================

proptest! {
    #[test]
    fn duplicate_group_count_survives_permutation(
        (rows, shift) in rows(2).prop_flat_map(|rows| {
            let len = rows.len();
            (Just(rows), 0..len)
        })
    ) {
        let mut rotated = rows.clone();
        rotated.rotate_left(shift);
        let mut reversed = rows.clone();
        reversed.reverse();

        let original = duplicate_groups(&dataset(&["a", "b"], rows));
        let count = original.len();
        let sizes = |groups: &Vec<Vec<usize>>| {
            let mut s: Vec<usize> = groups.iter().map(Vec::len).collect();
            s.sort_unstable();
            s
        };

        let after_rotate = duplicate_groups(&dataset(&["a", "b"], rotated));
        let after_reverse = duplicate_groups(&dataset(&["a", "b"], reversed));
        prop_assert_eq!(after_rotate.len(), count);
        prop_assert_eq!(after_reverse.len(), count);
        prop_assert_eq!(sizes(&after_rotate), sizes(&original));
    }

    #[test]
    fn non_numeric_data_has_no_statistical_or_pattern_insights(rows in rows(3)) {
        let dataset = dataset(&["a", "b", "c"], rows);
        prop_assume!(dataset.numeric_columns().next().is_none());

        let config = AnalysisConfig::default();
        prop_assert!(StatisticalAnalyzer::new(&config).analyze(&dataset).unwrap().is_empty());
        prop_assert!(PatternAnalyzer::new(&config).analyze(&dataset).unwrap().is_empty());
    }

    #[test]
    fn numeric_insights_have_valid_confidence(
        values in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 1..40)
    ) {
        let rows: Vec<Vec<String>> = values
            .iter()
            .map(|(a, b)| vec![a.to_string(), b.to_string()])
            .collect();
        let dataset = dataset(&["a", "b"], rows);

        let config = AnalysisConfig::default();
        let mut insights = StatisticalAnalyzer::new(&config).analyze(&dataset).unwrap();
        insights.extend(PatternAnalyzer::new(&config).analyze(&dataset).unwrap());
        for insight in insights {
            prop_assert!(insight.confidence.is_finite());
            prop_assert!((0.0..=1.0).contains(&insight.confidence));
            prop_assert!(insight.affected_rows.iter().all(|&r| r < dataset.row_count()));
        }
    }
}
