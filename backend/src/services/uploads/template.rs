//! Template background upload: `POST /api/upload/template?session_id=`.
//!
//! The file must be a PNG or JPEG that decodes; its pixel size is returned so
//! the client can lay out text boxes. The stored file becomes the session's
//! current template and is recorded in the upload history.

use super::multipart::read_file_field;
use crate::app::AppContext;
use crate::error::{ApiError, Result};
use crate::render::load_background;
use crate::storage::extension_of;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::upload::FileKind;
use common::requests::SessionQuery;
use common::responses::TemplateUploadResponse;

pub(super) const ALLOWED: &[&str] = &["png", "jpg", "jpeg"];

pub async fn process(
    ctx: web::Data<AppContext>,
    query: web::Query<SessionQuery>,
    payload: Multipart,
) -> impl Responder {
    match upload_template(&ctx, &query.session_id, payload).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

async fn upload_template(
    ctx: &AppContext,
    session_id: &str,
    payload: Multipart,
) -> Result<TemplateUploadResponse> {
    ctx.sessions.get(session_id).await?;
    let part = read_file_field(payload, ctx.settings.storage.max_upload_size).await?;
    if !ALLOWED.contains(&extension_of(&part.filename).as_str()) {
        return Err(ApiError::UnsupportedFileType {
            filename: part.filename,
            allowed: ALLOWED,
        });
    }

    let bytes = part.bytes;
    let (bytes, width, height) = web::block(move || {
        let image = load_background(&bytes)?;
        Ok::<_, ApiError>((bytes, image.width(), image.height()))
    })
    .await??;

    let stored = ctx
        .storage
        .save(session_id, FileKind::Template, &part.filename, &bytes)?;
    ctx.db.record_upload(session_id, &stored)?;
    ctx.sessions.set_template(session_id, stored.clone()).await?;
    log::info!(
        "Template {} ({}x{}, {} bytes) uploaded to session {}",
        stored.filename,
        width,
        height,
        stored.file_size,
        session_id
    );

    Ok(TemplateUploadResponse {
        message: "Template uploaded successfully".to_string(),
        filename: stored.filename,
        file_path: stored.file_path,
        file_size: stored.file_size,
        file_type: stored.file_type,
        md5: stored.md5,
        width,
        height,
    })
}
