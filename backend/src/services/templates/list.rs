use crate::app::AppContext;
use crate::storage::validate_session_id;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::SessionQuery;

/// `GET /api/templates?session_id=`.
pub async fn process(ctx: web::Data<AppContext>, query: web::Query<SessionQuery>) -> impl Responder {
    let listed = validate_session_id(&query.session_id)
        .and_then(|_| ctx.db.list_templates(&query.session_id));
    match listed {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => e.error_response(),
    }
}
