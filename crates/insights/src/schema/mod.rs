//! Dataset representation: typed columns with an explicit null marker.

mod column;
mod table;
mod types;

pub use column::{parse_number, Column, NumericSummary};
pub use table::Dataset;
pub use types::ColumnType;
