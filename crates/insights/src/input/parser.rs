//! Delimited-text and spreadsheet parser.

use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Reader};

use crate::config::DatasetConfig;
use crate::error::{InsightError, Result};
use crate::schema::Dataset;

use super::source::{extension_of, SourceMetadata};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Extensions read as delimited text.
pub const TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Extensions read as spreadsheets (first worksheet only).
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "ods"];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Quote character.
    pub quote: u8,
    /// Missing-value tokens and type inference thresholds.
    pub dataset: DatasetConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            dataset: DatasetConfig::default(),
        }
    }
}

impl From<DatasetConfig> for ParserConfig {
    fn from(dataset: DatasetConfig) -> Self {
        Self {
            dataset,
            ..Self::default()
        }
    }
}

/// Parses uploaded bytes into a typed [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Whether an extension (without dot, any case) can be parsed.
    pub fn supports(extension: &str) -> bool {
        let ext = extension.to_ascii_lowercase();
        TEXT_EXTENSIONS.contains(&ext.as_str()) || SPREADSHEET_EXTENSIONS.contains(&ext.as_str())
    }

    /// Parse raw bytes according to the file extension.
    pub fn parse(&self, bytes: &[u8], extension: &str) -> Result<Dataset> {
        let (headers, rows) = self.read_records(bytes, extension)?;
        Dataset::from_records(headers, rows, &self.config.dataset)
    }

    /// Parse a named upload and describe it.
    pub fn parse_named(&self, filename: &str, bytes: &[u8]) -> Result<(Dataset, SourceMetadata)> {
        let extension = extension_of(filename)
            .ok_or_else(|| InsightError::parse(format!("'{}' has no file extension", filename)))?;
        let dataset = self.parse(bytes, &extension)?;
        let metadata = SourceMetadata::new(
            filename,
            bytes,
            extension,
            dataset.row_count(),
            dataset.column_count(),
        );
        Ok((dataset, metadata))
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| InsightError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.parse_named(&filename, &bytes)
    }

    fn read_records(&self, bytes: &[u8], extension: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let ext = extension.to_ascii_lowercase();
        if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            return read_spreadsheet(bytes);
        }
        if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(InsightError::parse(format!("unsupported file format '{}'", extension)));
        }

        let delimiter = match (self.config.delimiter, ext.as_str()) {
            (Some(d), _) => d,
            (None, "tsv") => b'\t',
            (None, _) => detect_delimiter(bytes)?,
        };
        self.read_delimited(bytes, delimiter)
    }

    fn read_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() {
            return Err(InsightError::parse("no columns found"));
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(fit_width(record.iter().map(|s| s.to_string()).collect(), width));
        }

        Ok((headers, rows))
    }
}

/// First worksheet of an xls/xlsx/xlsm/ods workbook; the first row is the header.
fn read_spreadsheet(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InsightError::parse("workbook has no worksheets"))??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
    let headers = rows
        .next()
        .ok_or_else(|| InsightError::parse("worksheet is empty"))?;

    let width = headers.len();
    let rows = rows
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| fit_width(row, width))
        .collect();

    Ok((headers, rows))
}

/// Pad short rows with blanks and drop cells past the header width.
fn fit_width(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(InsightError::parse("file is empty"));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let variance =
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64;

        // Tab wins ties: it rarely appears inside values
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
