use crate::app::AppContext;
use crate::error::Result;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::responses::SessionCreated;

pub async fn process(ctx: web::Data<AppContext>) -> impl Responder {
    match create_session(&ctx).await {
        Ok(created) => HttpResponse::Created().json(created),
        Err(e) => e.error_response(),
    }
}

async fn create_session(ctx: &AppContext) -> Result<SessionCreated> {
    let session = ctx.sessions.create().await;
    ctx.storage.ensure_session_dirs(&session.id)?;
    Ok(SessionCreated {
        session_id: session.id,
        created_at: session.created_at.to_rfc3339(),
    })
}
