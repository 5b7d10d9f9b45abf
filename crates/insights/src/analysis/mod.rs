//! Analyzer set: independent routines that turn a dataset into candidate insights.

mod outliers;
mod overview;
mod pattern;
mod quality;
mod statistical;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::config::AnalysisConfig;
use crate::error::{InsightError, Result};
use crate::insight::Insight;
use crate::schema::Dataset;

pub use overview::OverviewAnalyzer;
pub use pattern::PatternAnalyzer;
pub use quality::{duplicate_groups, QualityAnalyzer};
pub use statistical::StatisticalAnalyzer;

/// Trait for analysis routines.
///
/// Implementations read the dataset only and never depend on each other's output,
/// so the set may run them concurrently.
pub trait Analyzer: Send + Sync {
    /// Stable name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Produce zero or more candidate insights.
    fn analyze(&self, dataset: &Dataset) -> Result<Vec<Insight>>;
}

/// Cooperative cancellation flag shared between a run and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the flag is set.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(InsightError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Fixed, ordered list of analyzers.
pub struct AnalyzerSet {
    analyzers: Vec<Arc<dyn Analyzer>>,
    parallel: bool,
}

impl AnalyzerSet {
    /// Create the default set: overview, statistical, pattern, quality.
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            analyzers: vec![
                Arc::new(OverviewAnalyzer),
                Arc::new(StatisticalAnalyzer::new(config)),
                Arc::new(PatternAnalyzer::new(config)),
                Arc::new(QualityAnalyzer::new(config)),
            ],
            parallel: config.parallel,
        }
    }

    /// Create a set from an explicit list.
    pub fn with_analyzers(analyzers: Vec<Arc<dyn Analyzer>>, parallel: bool) -> Self {
        Self {
            analyzers,
            parallel,
        }
    }

    /// Append an analyzer at the end of the list.
    pub fn push(&mut self, analyzer: impl Analyzer + 'static) {
        self.analyzers.push(Arc::new(analyzer));
    }

    /// Registered analyzer names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Run every analyzer in order on the current thread.
    pub fn analyze_all(&self, dataset: &Dataset) -> Result<Vec<Insight>> {
        let mut all_insights = Vec::new();
        for analyzer in &self.analyzers {
            let (insights, _) = run_one(analyzer.as_ref(), dataset)?;
            all_insights.extend(insights);
        }
        Ok(all_insights)
    }

    /// Run the set on the blocking pool and merge results in registration order.
    ///
    /// Waits for every analyzer before returning. The first failure discards all
    /// partial results.
    pub async fn run(&self, dataset: Arc<Dataset>, cancel: &CancelFlag) -> Result<Vec<Insight>> {
        if !self.parallel {
            return self.run_sequential(dataset, cancel).await;
        }

        cancel.check()?;
        let mut tasks = JoinSet::new();
        for (index, analyzer) in self.analyzers.iter().enumerate() {
            let analyzer = Arc::clone(analyzer);
            let dataset = Arc::clone(&dataset);
            tasks.spawn_blocking(move || (index, run_one(analyzer.as_ref(), &dataset)));
        }

        let mut batches: Vec<Vec<Insight>> = vec![Vec::new(); self.analyzers.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined
                .map_err(|e| InsightError::analysis("analyzer set", e.to_string()))?;
            let (insights, _) = outcome?;
            batches[index] = insights;
        }

        cancel.check()?;
        Ok(batches.into_iter().flatten().collect())
    }

    async fn run_sequential(
        &self,
        dataset: Arc<Dataset>,
        cancel: &CancelFlag,
    ) -> Result<Vec<Insight>> {
        let mut all_insights = Vec::new();
        for analyzer in &self.analyzers {
            cancel.check()?;
            let analyzer = Arc::clone(analyzer);
            let dataset = Arc::clone(&dataset);
            let (insights, _) =
                tokio::task::spawn_blocking(move || run_one(analyzer.as_ref(), &dataset))
                    .await
                    .map_err(|e| InsightError::analysis("analyzer set", e.to_string()))??;
            all_insights.extend(insights);
        }
        cancel.check()?;
        Ok(all_insights)
    }
}

/// Run one analyzer, turning panics and malformed output into `AnalysisFailure`.
fn run_one(analyzer: &dyn Analyzer, dataset: &Dataset) -> Result<(Vec<Insight>, Duration)> {
    let started = Instant::now();
    let name = analyzer.name();

    let insights = catch_unwind(AssertUnwindSafe(|| analyzer.analyze(dataset)))
        .map_err(|payload| InsightError::analysis(name, panic_message(payload.as_ref())))??;

    for insight in &insights {
        validate_insight(name, insight, dataset)?;
    }

    let elapsed = started.elapsed();
    tracing::debug!(
        analyzer = name,
        insights = insights.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "analyzer finished"
    );
    Ok((insights, elapsed))
}

/// Reject insights that would poison ranking or refer to unknown data.
fn validate_insight(analyzer: &str, insight: &Insight, dataset: &Dataset) -> Result<()> {
    if !insight.confidence.is_finite() || !(0.0..=1.0).contains(&insight.confidence) {
        return Err(InsightError::analysis(
            analyzer,
            format!(
                "insight '{}' has confidence {} outside [0, 1]",
                insight.title, insight.confidence
            ),
        ));
    }
    if insight.title.trim().is_empty() {
        return Err(InsightError::analysis(analyzer, "insight with empty title"));
    }
    if let Some(unknown) = insight
        .affected_columns
        .iter()
        .find(|c| dataset.column(c).is_none())
    {
        return Err(InsightError::analysis(
            analyzer,
            format!("insight '{}' refers to unknown column '{}'", insight.title, unknown),
        ));
    }
    if let Some(row) = insight
        .affected_rows
        .iter()
        .find(|&&r| r >= dataset.row_count())
    {
        return Err(InsightError::analysis(
            analyzer,
            format!("insight '{}' refers to row {} out of range", insight.title, row),
        ));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("analyzer panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("analyzer panicked: {}", msg)
    } else {
        "analyzer panicked".to_string()
    }
}

/// Confidence that rises from `floor` toward `ceiling` as `ratio` grows past 1.
///
/// Used for "how far above threshold" scaling: `ratio = value / threshold`.
pub(crate) fn scaled_above(ratio: f64, floor: f64, ceiling: f64) -> f64 {
    if ratio <= 1.0 {
        return floor;
    }
    let excess = 1.0 - 1.0 / ratio;
    (floor + (ceiling - floor) * excess).clamp(0.0, 1.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::insight::InsightCategory;

    pub(crate) fn make_dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::from_records(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            &DatasetConfig::default(),
        )
        .unwrap()
    }

    struct Panicky;

    impl Analyzer for Panicky {
        fn name(&self) -> &'static str {
            "panicky"
        }

        fn analyze(&self, _dataset: &Dataset) -> Result<Vec<Insight>> {
            panic!("boom");
        }
    }

    struct OutOfRange;

    impl Analyzer for OutOfRange {
        fn name(&self) -> &'static str {
            "out_of_range"
        }

        fn analyze(&self, _dataset: &Dataset) -> Result<Vec<Insight>> {
            Ok(vec![Insight::new(InsightCategory::Pattern, "bad", "bad", 1.7)])
        }
    }

    #[test]
    fn test_default_set_order() {
        let set = AnalyzerSet::new(&AnalysisConfig::default());
        assert_eq!(set.names(), vec!["overview", "statistical", "pattern", "quality"]);
    }

    #[test]
    fn test_panic_becomes_analysis_failure() {
        let dataset = make_dataset(&["a"], &[&["1"]]);
        let set = AnalyzerSet::with_analyzers(vec![Arc::new(Panicky)], false);
        let err = set.analyze_all(&dataset).unwrap_err();
        match err {
            InsightError::AnalysisFailure { analyzer, reason } => {
                assert_eq!(analyzer, "panicky");
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let dataset = make_dataset(&["a"], &[&["1"]]);
        let set = AnalyzerSet::with_analyzers(vec![Arc::new(OutOfRange)], false);
        assert!(matches!(
            set.analyze_all(&dataset),
            Err(InsightError::AnalysisFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_parallel_run_matches_sequential_order() {
        let dataset = make_dataset(
            &["x", "y", "label"],
            &[
                &["1", "2", "a"],
                &["2", "4", "b"],
                &["3", "6", "a"],
                &["4", "8", "a"],
                &["4", "8", "a"],
            ],
        );
        let config = AnalysisConfig::default();
        let set = AnalyzerSet::new(&config);

        let sequential = set.analyze_all(&dataset).unwrap();
        let parallel = set
            .run(Arc::new(dataset), &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[tokio::test]
    async fn test_failure_discards_partial_results() {
        let dataset = Arc::new(make_dataset(&["a"], &[&["1"], &["2"]]));
        let set = AnalyzerSet::with_analyzers(
            vec![Arc::new(OverviewAnalyzer), Arc::new(Panicky)],
            true,
        );
        assert!(set.run(dataset, &CancelFlag::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dataset = Arc::new(make_dataset(&["a"], &[&["1"]]));
        let set = AnalyzerSet::new(&AnalysisConfig::default());
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(matches!(
            set.run(dataset, &cancel).await,
            Err(InsightError::Cancelled)
        ));
    }

    #[test]
    fn test_scaled_above() {
        assert_eq!(scaled_above(0.5, 0.5, 1.0), 0.5);
        assert_eq!(scaled_above(1.0, 0.5, 1.0), 0.5);
        assert!(scaled_above(2.0, 0.5, 1.0) > scaled_above(1.5, 0.5, 1.0));
        assert!(scaled_above(1000.0, 0.5, 1.0) <= 1.0);
    }
}
