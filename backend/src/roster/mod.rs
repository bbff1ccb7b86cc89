//! Parsing of uploaded CSV rosters.
//!
//! A roster is a header row followed by one row per certificate recipient.
//! Parsing is forgiving about the things spreadsheets get wrong (BOMs, Latin-1
//! exports, ragged rows, stray blank lines) and strict about the header, since
//! header cells are what text boxes get mapped onto.

mod infer;

pub use infer::{detect_delimiter, normalize_key};

use crate::error::{ApiError, Result};
use common::model::csv::{ColumnCheck, CsvStats, PlaceholderType};
use std::collections::{BTreeMap, HashSet};

const NAME_COLUMN_CANDIDATES: [&str; 6] = [
    "name",
    "full_name",
    "fullname",
    "full name",
    "participant",
    "student",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    filename: String,
    delimiter: char,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Decodes bytes as UTF-8, falling back to Latin-1.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

impl Roster {
    pub fn parse(bytes: &[u8], filename: &str) -> Result<Self> {
        let text = decode(bytes);
        let header_line = text.lines().next().unwrap_or("");
        if header_line.trim().is_empty() {
            return Err(ApiError::FileProcessing("CSV file is empty".to_string()));
        }
        let delimiter = detect_delimiter(header_line);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .flexible(true)
            .trim(csv::Trim::All)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ApiError::FileProcessing(format!("invalid CSV header: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut seen = HashSet::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                return Err(ApiError::FileProcessing(format!(
                    "CSV header cell {} must not be empty",
                    i + 1
                )));
            }
            if !seen.insert(header.as_str()) {
                return Err(ApiError::FileProcessing(format!(
                    "duplicate CSV column '{}'",
                    header
                )));
            }
        }

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                ApiError::FileProcessing(format!("invalid CSV row {}: {}", i + 2, e))
            })?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            let mut row: Vec<String> = record
                .iter()
                .take(headers.len())
                .map(|c| c.to_string())
                .collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        log::debug!(
            "Parsed roster {}: {} rows, {} columns, delimiter {:?}",
            filename,
            rows.len(),
            headers.len(),
            delimiter
        );

        Ok(Self {
            filename: filename.to_string(),
            delimiter,
            headers,
            rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Finds a column by exact name, then by normalized name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        if let Some(i) = self.headers.iter().position(|h| h == column) {
            return Some(i);
        }
        let wanted = normalize_key(column);
        if wanted.is_empty() {
            return None;
        }
        self.headers.iter().position(|h| normalize_key(h) == wanted)
    }

    pub fn stats(&self) -> CsvStats {
        CsvStats {
            filename: self.filename.clone(),
            total_rows: self.rows.len(),
            total_columns: self.headers.len(),
            columns: self.headers.clone(),
            delimiter: self.delimiter,
        }
    }

    /// The first `n` rows keyed by column name.
    pub fn sample(&self, n: usize) -> Vec<BTreeMap<String, String>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn column_checks(&self) -> Vec<ColumnCheck> {
        let first = self.rows.first();
        self.headers
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let first_row = first.map(|r| r[i].clone());
                ColumnCheck {
                    title: title.clone(),
                    placeholder_type: first_row
                        .as_deref()
                        .map(PlaceholderType::infer)
                        .unwrap_or(PlaceholderType::Text),
                    first_row,
                }
            })
            .collect()
    }

    pub fn name_column(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| {
                let lower = h.to_lowercase();
                NAME_COLUMN_CANDIDATES.contains(&lower.as_str())
            })
            .or_else(|| self.headers.first())
            .map(|h| h.as_str())
    }
}
