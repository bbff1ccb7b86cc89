//! Roster upload: `POST /api/upload/csv?session_id=`.
//!
//! The roster is parsed before anything is written, so a malformed file never
//! replaces a good one. A new roster resets the session's mappings.

use super::multipart::read_file_field;
use crate::app::AppContext;
use crate::error::{ApiError, Result};
use crate::roster::Roster;
use crate::storage::{extension_of, sanitize_filename};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::upload::FileKind;
use common::requests::SessionQuery;
use common::responses::{CsvContent, CsvUploadResponse};

pub(super) const ALLOWED: &[&str] = &["csv"];

pub async fn process(
    ctx: web::Data<AppContext>,
    query: web::Query<SessionQuery>,
    payload: Multipart,
) -> impl Responder {
    match upload_csv(&ctx, &query.session_id, payload).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

async fn upload_csv(
    ctx: &AppContext,
    session_id: &str,
    payload: Multipart,
) -> Result<CsvUploadResponse> {
    ctx.sessions.get(session_id).await?;
    let part = read_file_field(payload, ctx.settings.storage.max_upload_size).await?;
    if !ALLOWED.contains(&extension_of(&part.filename).as_str()) {
        return Err(ApiError::UnsupportedFileType {
            filename: part.filename,
            allowed: ALLOWED,
        });
    }

    let roster = Roster::parse(&part.bytes, &sanitize_filename(&part.filename))?;
    let stats = roster.stats();
    let stored = ctx
        .storage
        .save(session_id, FileKind::Csv, &part.filename, &part.bytes)?;
    ctx.db.record_upload(session_id, &stored)?;
    ctx.sessions
        .set_csv(session_id, stored.clone(), stats.clone())
        .await?;
    log::info!(
        "Roster {} ({} rows, {} columns) uploaded to session {}",
        stored.filename,
        stats.total_rows,
        stats.total_columns,
        session_id
    );

    Ok(CsvUploadResponse {
        message: "CSV uploaded successfully".to_string(),
        filename: stored.filename,
        file_path: stored.file_path,
        file_size: stored.file_size,
        csv_stats: stats,
    })
}

/// `GET /api/upload/csv/content?session_id=`: raw text of the latest roster.
pub async fn content(ctx: web::Data<AppContext>, query: web::Query<SessionQuery>) -> impl Responder {
    match csv_content(&ctx, &query.session_id) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

fn csv_content(ctx: &AppContext, session_id: &str) -> Result<CsvContent> {
    let latest = ctx
        .db
        .latest_upload(session_id, FileKind::Csv)?
        .ok_or_else(|| ApiError::not_found("no CSV uploaded for this session"))?;
    let bytes = ctx.storage.read(session_id, FileKind::Csv, &latest.filename)?;
    Ok(CsvContent {
        filename: latest.filename,
        content: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
