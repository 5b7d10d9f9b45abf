//! Numeric summaries and correlation.

use crate::schema::{Column, NumericSummary};

// =============================================================================
// STREAMING STATISTICS
// =============================================================================
// Welford's online algorithm for computing mean and variance in a single pass.

/// Streaming statistics accumulator using Welford's algorithm.
#[derive(Debug, Clone)]
pub struct StreamingStats {
    count: usize,
    mean: f64,
    m2: f64, // Sum of squared differences from mean
    min: f64,
    max: f64,
}

impl StreamingStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add a value using Welford's online algorithm.
    pub fn add(&mut self, value: f64) {
        self.count += 1;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Get the population variance.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Get the standard deviation.
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl Default for StreamingStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarize the parsed numbers of a column.
///
/// Returns `None` when the column holds no numbers.
pub fn summarize(column: &Column) -> Option<NumericSummary> {
    let values: Vec<f64> = column.numeric_values().map(|(_, v)| v).collect();
    summarize_values(&values)
}

/// Summarize a slice of finite values.
pub fn summarize_values(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }

    let mut stats = StreamingStats::new();
    for &value in values {
        stats.add(value);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    // Welford accumulates rounding noise on constant input; pin it to zero
    let std = if stats.min == stats.max { 0.0 } else { stats.std() };

    Some(NumericSummary {
        count: stats.count,
        min: stats.min,
        max: stats.max,
        mean: stats.mean,
        std,
        median: quantile(&sorted, 0.5),
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
    })
}

/// Linearly interpolated quantile of sorted values, `p` in `[0, 1]`.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let pos = p.clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let weight = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Pearson correlation over rows where both columns have a number.
///
/// `None` when fewer than `min_pairs` rows overlap or either side has zero variance.
pub fn pearson(a: &Column, b: &Column, min_pairs: usize) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = (0..a.len().min(b.len()))
        .filter_map(|row| Some((a.number(row)?, b.number(row)?)))
        .collect();

    if pairs.len() < min_pairs.max(2) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}
