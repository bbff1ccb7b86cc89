//! # Template Save Service
//!
//! `POST /api/templates` creates or updates a template.
//!
//! 1.  The background is the `image` named in the body, or the session's most
//!     recent template upload when absent. It must exist in the session's
//!     `templates/` folder.
//! 2.  The image is decoded to learn its size, and the text boxes are validated
//!     against it (`CertificateTemplate::validate`). Failures answer 422.
//! 3.  The template is upserted. An update keeps `created_at`.

use crate::app::AppContext;
use crate::error::{ApiError, Result};
use crate::storage::validate_session_id;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use common::model::template::CertificateTemplate;
use common::model::upload::FileKind;
use common::requests::SaveTemplateRequest;

pub async fn process(
    ctx: web::Data<AppContext>,
    payload: web::Json<SaveTemplateRequest>,
) -> impl Responder {
    match save_template(&ctx, payload.into_inner()).await {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => e.error_response(),
    }
}

fn image_name(ctx: &AppContext, req: &SaveTemplateRequest) -> Result<String> {
    if let Some(image) = req.image.as_deref().filter(|i| !i.trim().is_empty()) {
        return Ok(image.to_string());
    }
    ctx.db
        .latest_upload(&req.session_id, FileKind::Template)?
        .map(|f| f.filename)
        .ok_or_else(|| ApiError::validation("no template image uploaded for this session"))
}

pub async fn save_template(
    ctx: &AppContext,
    req: SaveTemplateRequest,
) -> Result<CertificateTemplate> {
    validate_session_id(&req.session_id)?;
    let image = image_name(ctx, &req)?;
    let path = ctx
        .storage
        .resolve(&req.session_id, FileKind::Template, &image)?;
    if !path.is_file() {
        return Err(ApiError::not_found(format!("template image '{}' not found", image)));
    }

    let (width, height) = web::block(move || image::image_dimensions(&path))
        .await?
        .map_err(|e| ApiError::FileProcessing(format!("cannot read template image: {}", e)))?;

    let now = Utc::now().to_rfc3339();
    let id = req
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    match ctx.db.get_template(&id) {
        Ok(existing) if existing.session_id != req.session_id => {
            return Err(ApiError::validation(format!(
                "template '{}' belongs to another session",
                id
            )));
        }
        Ok(_) | Err(ApiError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let template = CertificateTemplate {
        id,
        session_id: req.session_id,
        image,
        image_width: width,
        image_height: height,
        text_boxes: req.text_boxes,
        created_at: now.clone(),
        updated_at: now,
    };
    template.validate().map_err(ApiError::Unprocessable)?;

    let saved = ctx.db.save_template(&template)?;
    log::info!(
        "Saved template {} ({} text boxes) for session {}",
        saved.id,
        saved.text_boxes.len(),
        saved.session_id
    );
    Ok(saved)
}
