use super::personalize::{personalize, DEFAULT_EVENT};
use crate::error::Result;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::EmailPreviewRequest;
use common::responses::EmailPreview;

/// `POST /api/send/email/preview`.
pub async fn process(payload: web::Json<EmailPreviewRequest>) -> impl Responder {
    match preview(payload.into_inner()) {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => e.error_response(),
    }
}

fn preview(req: EmailPreviewRequest) -> Result<EmailPreview> {
    let event = req
        .event_name
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EVENT.to_string());
    Ok(EmailPreview {
        subject: personalize(&req.subject, &req.recipient_name, &event)?,
        body: personalize(&req.body_template, &req.recipient_name, &event)?,
        recipient_name: req.recipient_name,
        event_name: event,
    })
}
