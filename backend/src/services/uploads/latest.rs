use crate::app::AppContext;
use crate::error::Result;
use crate::storage::validate_session_id;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::upload::{FileKind, UploadedFile};
use common::requests::SessionQuery;
use common::responses::LatestUploads;

/// `GET /api/upload/latest?session_id=`: newest template and roster still on disk.
pub async fn process(ctx: web::Data<AppContext>, query: web::Query<SessionQuery>) -> impl Responder {
    match latest_uploads(&ctx, &query.session_id) {
        Ok(latest) => HttpResponse::Ok().json(latest),
        Err(e) => e.error_response(),
    }
}

/// Newest recorded upload of `kind` whose file was not removed since.
fn on_disk(ctx: &AppContext, session_id: &str, kind: FileKind) -> Result<Option<UploadedFile>> {
    Ok(ctx
        .db
        .upload_history(session_id, kind)?
        .into_iter()
        .find(|f| ctx.storage.exists(session_id, kind, &f.filename)))
}

fn latest_uploads(ctx: &AppContext, session_id: &str) -> Result<LatestUploads> {
    validate_session_id(session_id)?;
    let template = on_disk(ctx, session_id, FileKind::Template)?;
    let csv = on_disk(ctx, session_id, FileKind::Csv)?;
    Ok(LatestUploads {
        ready: template.is_some() && csv.is_some(),
        template,
        csv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::context;

    #[test]
    fn test_falls_back_to_older_upload_still_on_disk() {
        let (_dir, ctx) = context();
        let older = ctx
            .storage
            .save("s1", FileKind::Csv, "first.csv", b"Name\nAda\n")
            .unwrap();
        ctx.db.record_upload("s1", &older).unwrap();
        let newer = ctx
            .storage
            .save("s1", FileKind::Csv, "second.csv", b"Name\nAlan\n")
            .unwrap();
        ctx.db.record_upload("s1", &newer).unwrap();
        std::fs::remove_file(&newer.file_path).unwrap();

        let latest = latest_uploads(&ctx, "s1").unwrap();
        assert_eq!(latest.csv.unwrap().filename, "first.csv");
        assert!(latest.template.is_none());
        assert!(!latest.ready);
    }
}
