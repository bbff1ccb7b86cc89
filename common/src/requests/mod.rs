use crate::jobs::OutputFormat;
use crate::model::mapping::CsvMapping;
use crate::model::template::TextBox;
use serde::{Deserialize, Serialize};

/// Authorization code returned by the Google consent screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchangeRequest {
    pub code: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// Query string carrying the session the request belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

/// Creates or updates a certificate template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveTemplateRequest {
    /// Existing template id to update; a new id is assigned when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub session_id: String,
    /// Stored background file name; the session's latest upload when absent.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub text_boxes: Vec<TextBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateMappingRequest {
    pub session_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub mappings: Vec<CsvMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub session_id: String,
    pub template_id: String,
    /// Falls back to the mappings stored on the session.
    #[serde(default)]
    pub mappings: Option<Vec<CsvMapping>>,
    #[serde(default)]
    pub row_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGenerationRequest {
    pub session_id: String,
    pub template_id: String,
    #[serde(default)]
    pub mappings: Option<Vec<CsvMapping>>,
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Template key whose value names each output file.
    #[serde(default)]
    pub name_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub certificate_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSendRequest {
    pub access_token: String,
    pub session_id: String,
    pub job_id: String,
    #[serde(default)]
    pub recipients: Vec<EmailRecipient>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body_template: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPreviewRequest {
    pub subject: String,
    pub body_template: String,
    #[serde(default = "default_recipient_name")]
    pub recipient_name: String,
    #[serde(default)]
    pub event_name: Option<String>,
}

fn default_recipient_name() -> String {
    "John Doe".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTestRequest {
    pub access_token: String,
}
