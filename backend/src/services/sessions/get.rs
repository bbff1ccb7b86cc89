use crate::app::AppContext;
use actix_web::{web, HttpResponse, Responder, ResponseError};

pub async fn process(ctx: web::Data<AppContext>, session_id: web::Path<String>) -> impl Responder {
    match ctx.sessions.get(&session_id).await {
        Ok(session) => HttpResponse::Ok().json(session.summary()),
        Err(e) => e.error_response(),
    }
}
