use serde::{Deserialize, Serialize};

/// Data type guessed for a roster column from its first data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderType {
    Text,
    Number,
    Currency,
    Email,
}

impl PlaceholderType {
    const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

    /// Infers the type of a single cell value.
    ///
    /// Order matters: an e-mail wins over a currency symbol, which wins over a
    /// plain number. Everything else is text.
    pub fn infer(value: &str) -> Self {
        let val = value.trim();
        if val.contains('@') && val.contains('.') {
            PlaceholderType::Email
        } else if val.chars().any(|ch| Self::CURRENCY_SYMBOLS.contains(&ch)) {
            PlaceholderType::Currency
        } else if !val.is_empty() && val.parse::<f64>().is_ok() {
            PlaceholderType::Number
        } else {
            PlaceholderType::Text
        }
    }
}

/// Represents the inferred schema of a single CSV column.
///
/// Returned by the roster analysis endpoint so the client can show the user
/// what each column looks like before mapping it onto template text boxes.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ColumnCheck {
    /// The trimmed column header.
    pub title: String,
    /// The data type inferred from the first data row for this column.
    pub placeholder_type: PlaceholderType,
    /// The actual value from the first data row, if there is one.
    pub first_row: Option<String>,
}

/// Summary of an uploaded roster, kept per session.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CsvStats {
    pub filename: String,
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns: Vec<String>,
    pub delimiter: char,
}
