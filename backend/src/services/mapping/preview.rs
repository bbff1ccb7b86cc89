//! # Mapping Preview
//!
//! `POST /api/mapping/preview` renders a single roster row so the user can
//! check placement and sizing before generating the whole batch.
//!
//! Mappings default to the ones last validated for the session. The rendered
//! PNG is kept as `preview/preview.png` and returned inline as a data URL.

use super::resolve::{display_values, resolve, row_values};
use crate::app::AppContext;
use crate::error::{ApiError, Result};
use crate::render::{encode_png, load_background};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::model::upload::FileKind;
use common::requests::PreviewRequest;
use common::responses::PreviewResponse;

const PREVIEW_FILE: &str = "preview.png";

pub async fn process(
    ctx: web::Data<AppContext>,
    payload: web::Json<PreviewRequest>,
) -> impl Responder {
    match render_preview(&ctx, payload.into_inner()).await {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => e.error_response(),
    }
}

async fn render_preview(ctx: &AppContext, req: PreviewRequest) -> Result<PreviewResponse> {
    let session = ctx.sessions.get(&req.session_id).await?;
    let roster = ctx.session_roster(&session)?;
    let template = ctx.db.get_template(&req.template_id)?;
    if template.session_id != session.id {
        return Err(ApiError::validation(format!(
            "template '{}' does not belong to session '{}'",
            template.id, session.id
        )));
    }
    if roster.is_empty() {
        return Err(ApiError::validation("CSV has no data rows"));
    }
    let row = roster.row(req.row_index).ok_or_else(|| {
        ApiError::validation(format!(
            "row_index {} is out of range, the CSV has {} rows",
            req.row_index,
            roster.len()
        ))
    })?;

    let mappings = req.mappings.unwrap_or(session.mappings);
    let bindings = resolve(&template.keys(), &mappings, &roster)?;
    let values = row_values(&bindings, row);
    let preview_data = display_values(&template.text_boxes, &values);

    let background = ctx
        .storage
        .read(&session.id, FileKind::Template, &template.image)?;
    let renderer = ctx.renderer.clone();
    let boxes = template.text_boxes;
    let png = web::block(move || -> Result<Vec<u8>> {
        let background = load_background(&background)?;
        let image = renderer.render(&background, &boxes, &values)?;
        encode_png(&image)
    })
    .await??;

    ctx.storage
        .save(&session.id, FileKind::Preview, PREVIEW_FILE, &png)?;
    log::debug!(
        "Rendered preview of row {} for session {}",
        req.row_index,
        session.id
    );

    Ok(PreviewResponse {
        success: true,
        message: format!("Preview of row {}", req.row_index),
        preview_image: format!("data:image/png;base64,{}", STANDARD.encode(&png)),
        preview_data,
    })
}
