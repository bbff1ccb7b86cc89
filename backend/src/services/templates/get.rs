use crate::app::AppContext;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// `GET /api/templates/{template_id}`.
pub async fn process(ctx: web::Data<AppContext>, template_id: web::Path<String>) -> impl Responder {
    match ctx.db.get_template(&template_id) {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => e.error_response(),
    }
}
