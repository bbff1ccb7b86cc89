use crate::app::AppContext;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde_json::json;

/// `DELETE /api/templates/{template_id}`. Deleting a missing template reports
/// `deleted: false`.
pub async fn process(ctx: web::Data<AppContext>, template_id: web::Path<String>) -> impl Responder {
    match ctx.db.delete_template(&template_id) {
        Ok(deleted) => {
            if deleted {
                log::info!("Deleted template {}", template_id);
            }
            HttpResponse::Ok().json(json!({ "deleted": deleted }))
        }
        Err(e) => e.error_response(),
    }
}
