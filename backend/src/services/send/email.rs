//! # Certificate Delivery
//!
//! `POST /api/send/email` e-mails each recipient their certificate from a
//! finished generation job.
//!
//! 1.  The token, the recipient list and every address are checked before
//!     anything is sent.
//! 2.  At most `email.batch_limit` recipients are attempted (0 means no
//!     limit); the rest are reported as skipped.
//! 3.  Each certificate is taken from `certificates/{job_id}`: by the given
//!     file name, or else the first non-ZIP file whose name contains the
//!     recipient's name.
//! 4.  Recipients are processed one after another. A failure is recorded in
//!     the report and does not stop the batch.

use super::mime::{build_message, encode_raw, Attachment};
use super::personalize::{personalize, DEFAULT_EVENT};
use crate::app::AppContext;
use crate::error::{ApiError, Result};
use crate::storage::{extension_of, sanitize_filename, validate_job_id, validate_session_id};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::{EmailRecipient, EmailSendRequest};
use common::responses::{RecipientResult, SendReport};
use regex::Regex;
use secrecy::SecretString;
use std::fs;
use std::path::{Path, PathBuf};

const AUDIT_TARGET: &str = "certimate::audit";

pub async fn process(
    ctx: web::Data<AppContext>,
    payload: web::Json<EmailSendRequest>,
) -> impl Responder {
    match send_certificates(&ctx, payload.into_inner()).await {
        Ok(report) => {
            let status = if report.failed > 0 {
                StatusCode::MULTI_STATUS
            } else {
                StatusCode::OK
            };
            HttpResponse::build(status).json(report)
        }
        Err(e) => e.error_response(),
    }
}

fn validate_recipients(recipients: &[EmailRecipient]) -> Result<()> {
    if recipients.is_empty() {
        return Err(ApiError::validation("recipients must not be empty"));
    }
    let email_re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map_err(|e| ApiError::internal(e.to_string()))?;
    for (i, r) in recipients.iter().enumerate() {
        if !email_re.is_match(r.email.trim()) {
            return Err(ApiError::Unprocessable(format!(
                "recipient {} has an invalid e-mail address '{}'",
                i + 1,
                r.email
            )));
        }
        if r.name.trim().is_empty() {
            return Err(ApiError::Unprocessable(format!(
                "recipient {} has an empty name",
                i + 1
            )));
        }
    }
    Ok(())
}

/// Locates the certificate of `recipient` inside `dir`.
pub fn find_certificate(dir: &Path, recipient: &EmailRecipient) -> std::result::Result<PathBuf, String> {
    if let Some(filename) = recipient
        .certificate_filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            return Err(format!("invalid certificate file name '{}'", filename));
        }
        let path = dir.join(filename);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(format!("certificate '{}' not found", filename))
        };
    }

    let name = recipient.name.trim().to_lowercase();
    let needles = [
        name.replace(' ', "_"),
        sanitize_filename(&recipient.name).to_lowercase(),
    ];
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| format!("cannot list certificates: {}", e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    entries.sort();
    entries
        .into_iter()
        .find(|p| {
            let Some(file) = p.file_name().and_then(|f| f.to_str()) else {
                return false;
            };
            let file = file.to_lowercase();
            extension_of(&file) != "zip" && needles.iter().any(|n| file.contains(n.as_str()))
        })
        .ok_or_else(|| format!("no certificate found for '{}'", recipient.name.trim()))
}

pub(crate) async fn send_certificates(ctx: &AppContext, req: EmailSendRequest) -> Result<SendReport> {
    if req.access_token.trim().is_empty() {
        return Err(ApiError::Unprocessable("access_token must not be empty".to_string()));
    }
    validate_session_id(&req.session_id)?;
    validate_job_id(&req.job_id)?;
    validate_recipients(&req.recipients)?;

    let dir = ctx.storage.job_dir(&req.session_id, &req.job_id)?;
    if !dir.is_dir() {
        return Err(ApiError::not_found(format!(
            "no certificates found for job '{}'",
            req.job_id
        )));
    }

    let email = &ctx.settings.email;
    let subject_template = req
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| email.default_subject.clone());
    let body_template = req
        .body_template
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| email.default_body.clone());
    let event = req
        .event_name
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EVENT.to_string());
    let token = SecretString::from(req.access_token);

    let total = req.recipients.len();
    let attempt = match email.batch_limit {
        0 => total,
        limit => total.min(limit),
    };
    let skipped = total - attempt;
    if skipped > 0 {
        log::warn!(
            "Batch limit {} reached, skipping {} of {} recipients",
            email.batch_limit,
            skipped,
            total
        );
    }

    let mut details = Vec::with_capacity(attempt);
    for recipient in req.recipients.iter().take(attempt) {
        let result = match deliver(ctx, &token, &dir, recipient, &subject_template, &body_template, &event).await {
            Ok((message_id, path)) => {
                log::info!(
                    target: AUDIT_TARGET,
                    "job={} sent certificate {} to {} (message {})",
                    req.job_id,
                    path.display(),
                    recipient.email,
                    message_id
                );
                RecipientResult {
                    success: true,
                    recipient_email: recipient.email.clone(),
                    recipient_name: recipient.name.clone(),
                    message_id: Some(message_id),
                    certificate_path: Some(path.to_string_lossy().into_owned()),
                    error: None,
                }
            }
            Err(error) => {
                log::error!(
                    target: AUDIT_TARGET,
                    "job={} failed to send to {}: {}",
                    req.job_id,
                    recipient.email,
                    error
                );
                RecipientResult {
                    success: false,
                    recipient_email: recipient.email.clone(),
                    recipient_name: recipient.name.clone(),
                    message_id: None,
                    certificate_path: None,
                    error: Some(error),
                }
            }
        };
        details.push(result);
    }

    let successful = details.iter().filter(|d| d.success).count();
    let failed = details.len() - successful;
    let success_rate = if attempt == 0 {
        0.0
    } else {
        (successful as f64 / attempt as f64 * 10_000.0).round() / 100.0
    };
    Ok(SendReport {
        message: format!("Sent {} of {} certificates", successful, attempt),
        total,
        successful,
        failed,
        skipped,
        success_rate,
        details,
    })
}

/// Finds and reads the recipient's certificate and assembles the encoded
/// message. Runs on the blocking pool.
fn prepare_message(
    dir: &Path,
    recipient: &EmailRecipient,
    subject_template: &str,
    body_template: &str,
    event: &str,
) -> std::result::Result<(String, PathBuf), String> {
    let path = find_certificate(dir, recipient)?;
    let bytes = fs::read(&path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let name = recipient.name.trim();
    let subject = personalize(subject_template, name, event).map_err(|e| e.to_string())?;
    let body = personalize(body_template, name, event).map_err(|e| e.to_string())?;
    let attachment = Attachment {
        filename: path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "certificate".to_string()),
        bytes,
    };
    let raw = encode_raw(&build_message(recipient.email.trim(), &subject, &body, &attachment));
    Ok((raw, path))
}

async fn deliver(
    ctx: &AppContext,
    token: &SecretString,
    dir: &Path,
    recipient: &EmailRecipient,
    subject_template: &str,
    body_template: &str,
    event: &str,
) -> std::result::Result<(String, PathBuf), String> {
    let (raw, path) = {
        let dir = dir.to_path_buf();
        let recipient = recipient.clone();
        let subject_template = subject_template.to_string();
        let body_template = body_template.to_string();
        let event = event.to_string();
        web::block(move || {
            prepare_message(&dir, &recipient, &subject_template, &body_template, &event)
        })
        .await
        .map_err(|e| e.to_string())??
    };
    let message_id = ctx
        .mailer
        .send_raw(token, raw)
        .await
        .map_err(|e| e.to_string())?;
    Ok((message_id, path))
}
