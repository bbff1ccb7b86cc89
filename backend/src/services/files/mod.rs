//! # File Serving
//!
//! `GET /api/files/{session_id}/{kind}/{filename}` returns a stored file with a
//! `Content-Type` guessed from its extension. `kind` is one of `templates`,
//! `csv`, `certificates` or `preview`. Names that try to leave the session
//! folder are rejected with 400; missing files answer 404.

use crate::app::AppContext;
use crate::error::{ApiError, Result};
use actix_web::web::{get, scope};
use actix_web::{web, HttpResponse, Responder, ResponseError, Scope};
use common::model::upload::FileKind;
use mime_guess::from_path;

const API_PATH: &str = "/api/files";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{session_id}/{kind}/{filename}", get().to(process))
}

async fn process(
    ctx: web::Data<AppContext>,
    path: web::Path<(String, String, String)>,
) -> impl Responder {
    let (session_id, kind, filename) = path.into_inner();
    match read_file(&ctx, &session_id, &kind, &filename) {
        Ok((bytes, mime)) => HttpResponse::Ok().content_type(mime).body(bytes),
        Err(e) => e.error_response(),
    }
}

fn read_file(
    ctx: &AppContext,
    session_id: &str,
    kind: &str,
    filename: &str,
) -> Result<(Vec<u8>, String)> {
    let kind: FileKind = kind.parse().map_err(ApiError::validation)?;
    let bytes = ctx.storage.read(session_id, kind, filename)?;
    let mime = from_path(filename).first_or_octet_stream();
    Ok((bytes, mime.to_string()))
}
