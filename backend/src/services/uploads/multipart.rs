use crate::error::{ApiError, Result};
use actix_multipart::Multipart;
use futures_util::StreamExt;

/// Name of the multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// The uploaded file's client-side name and contents.
pub struct FilePart {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Reads the `file` field, failing once more than `limit` bytes arrive.
/// Other fields are drained and ignored.
pub async fn read_file_field(mut payload: Multipart, limit: usize) -> Result<FilePart> {
    let mut found: Option<FilePart> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::validation(format!("invalid multipart body: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        let is_file = name.as_deref() == Some(FILE_FIELD) && found.is_none();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::validation(format!("upload interrupted: {}", e)))?;
            if !is_file {
                continue;
            }
            if bytes.len() + chunk.len() > limit {
                return Err(ApiError::PayloadTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        if is_file {
            if filename.trim().is_empty() {
                return Err(ApiError::validation("uploaded file has no name"));
            }
            found = Some(FilePart { filename, bytes });
        }
    }

    let part = found.ok_or_else(|| ApiError::validation("missing multipart field 'file'"))?;
    if part.bytes.is_empty() {
        return Err(ApiError::validation(format!("'{}' is empty", part.filename)));
    }
    Ok(part)
}
