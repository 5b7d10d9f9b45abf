//! Input parsing: delimited text and spreadsheets into a [`Dataset`](crate::schema::Dataset).

mod parser;
mod source;

pub use parser::{Parser, ParserConfig, SPREADSHEET_EXTENSIONS, TEXT_EXTENSIONS};
pub use source::{extension_of, SourceMetadata};
