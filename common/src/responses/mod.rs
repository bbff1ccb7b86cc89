use crate::jobs::{GenerationStatus, JobItemError};
use crate::model::csv::{ColumnCheck, CsvStats};
use crate::model::mapping::{CsvMapping, FieldValidation};
use crate::model::upload::UploadedFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tokens returned by the Google token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: String,
    pub last_access: String,
    pub template: Option<UploadedFile>,
    pub csv: Option<UploadedFile>,
    pub csv_stats: Option<CsvStats>,
    pub mappings: Vec<CsvMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub session_id: String,
    pub deleted: bool,
    pub removed_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateUploadResponse {
    pub message: String,
    pub filename: String,
    pub file_path: String,
    pub file_size: u64,
    pub file_type: String,
    pub md5: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvUploadResponse {
    pub message: String,
    pub filename: String,
    pub file_path: String,
    pub file_size: u64,
    pub csv_stats: CsvStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestUploads {
    pub template: Option<UploadedFile>,
    pub csv: Option<UploadedFile>,
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvContent {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingReport {
    pub success: bool,
    pub message: String,
    pub valid: bool,
    pub validation: Vec<FieldValidation>,
    pub unresolved_keys: Vec<String>,
    /// Resolved values of the first roster row, keyed by template key.
    pub preview_data: BTreeMap<String, String>,
    pub csv_stats: CsvStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub message: String,
    pub preview_image: String,
    pub preview_data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvAnalysis {
    pub success: bool,
    pub csv_stats: CsvStats,
    pub column_checks: Vec<ColumnCheck>,
    pub sample_data: Vec<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationAccepted {
    pub job_id: String,
    pub status: GenerationStatus,
    pub total_items: usize,
    pub status_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobErrors {
    pub job_id: String,
    pub errors: Vec<JobItemError>,
}

/// Result of delivering one certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientResult {
    pub success: bool,
    pub recipient_email: String,
    pub recipient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReport {
    pub message: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Recipients beyond the batch limit that were not attempted.
    pub skipped: usize,
    pub success_rate: f64,
    pub details: Vec<RecipientResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPreview {
    pub subject: String,
    pub body: String,
    pub recipient_name: String,
    pub event_name: String,
}
