//! Type inference and numeric statistics.

mod statistical;
mod types;

pub use statistical::{pearson, quantile, summarize, summarize_values, StreamingStats};
pub use types::{looks_like_datetime, TypeInferrer};
