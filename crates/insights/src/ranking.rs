//! Insight ranking: filter, deduplicate, order, truncate.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::InsightConfig;
use crate::insight::{Insight, InsightCategory};

/// Turns the analyzers' candidate insights into the final report list.
#[derive(Debug, Clone, Copy)]
pub struct InsightRanker {
    pub max_count: usize,
    pub min_confidence: f64,
}

impl Default for InsightRanker {
    fn default() -> Self {
        Self::from_config(&InsightConfig::default())
    }
}

impl InsightRanker {
    pub fn new(max_count: usize, min_confidence: f64) -> Self {
        Self {
            max_count,
            min_confidence,
        }
    }

    pub fn from_config(config: &InsightConfig) -> Self {
        Self::new(config.max_insights, config.min_confidence_score)
    }

    pub fn rank(&self, insights: Vec<Insight>) -> Vec<Insight> {
        rank(insights, self.max_count, self.min_confidence)
    }
}

/// Rank candidate insights.
///
/// Drops anything below `min_confidence`, keeps the most confident insight per
/// `(category, title)` (the earliest one on ties), then sorts by confidence,
/// category priority and original position before keeping the first `max_count`.
/// The function is deterministic and idempotent.
pub fn rank(insights: Vec<Insight>, max_count: usize, min_confidence: f64) -> Vec<Insight> {
    let mut kept: Vec<(usize, Insight)> = Vec::new();
    let mut slots: HashMap<(InsightCategory, String), usize> = HashMap::new();

    for (position, insight) in insights.into_iter().enumerate() {
        if !(insight.confidence >= min_confidence) {
            continue;
        }
        let key = (insight.category, insight.title.clone());
        match slots.get(&key) {
            Some(&slot) => {
                if insight.confidence > kept[slot].1.confidence {
                    kept[slot] = (position, insight);
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push((position, insight));
            }
        }
    }

    kept.sort_by(|(pos_a, a), (pos_b, b)| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.category.priority().cmp(&a.category.priority()))
            .then_with(|| pos_a.cmp(pos_b))
    });
    kept.truncate(max_count);

    kept.into_iter().map(|(_, insight)| insight).collect()
}
