use serde::{Deserialize, Serialize};

/// Pairs a template key with the roster column that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvMapping {
    pub template_key: String,
    pub csv_column: String,
}

/// How a template key was bound to a roster column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// An explicit `CsvMapping` named the column.
    Explicit,
    /// The column name matched the key after normalization.
    Automatic,
    /// Nothing matched; the text box default (if any) is used.
    Unresolved,
}

/// Outcome of resolving one template key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub template_key: String,
    pub csv_column: Option<String>,
    pub source: ResolutionSource,
    pub valid: bool,
    pub error: Option<String>,
}
