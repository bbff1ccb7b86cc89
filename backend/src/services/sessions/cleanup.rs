//! Session cleanup: `DELETE /api/sessions/{session_id}`.
//!
//! Removes, in order, the session directory with every upload and generated
//! certificate, the templates and upload history stored in SQLite, the
//! session's generation jobs, and the in-memory session. `deleted` reports whether the in-memory session existed;
//! files left behind by a session lost on restart are removed either way.

use crate::app::AppContext;
use crate::error::Result;
use crate::job_controller::state::JobsState;
use crate::storage::validate_session_id;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::responses::CleanupResponse;

pub async fn process(
    ctx: web::Data<AppContext>,
    jobs: web::Data<JobsState>,
    session_id: web::Path<String>,
) -> impl Responder {
    match cleanup_session(&ctx, &jobs, &session_id).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => e.error_response(),
    }
}

pub async fn cleanup_session(
    ctx: &AppContext,
    jobs: &JobsState,
    session_id: &str,
) -> Result<CleanupResponse> {
    validate_session_id(session_id)?;
    let removed_files = ctx.storage.remove_session(session_id)?;
    let templates = ctx.db.delete_session_templates(session_id)?;
    let uploads = ctx.db.delete_session_uploads(session_id)?;
    let removed_jobs = jobs.remove_session(session_id).await;
    let deleted = ctx.sessions.remove(session_id).await.is_some();
    log::info!(
        "Cleaned up session {}: {} files, {} templates, {} upload records, {} jobs",
        session_id,
        removed_files,
        templates,
        uploads,
        removed_jobs
    );
    Ok(CleanupResponse {
        session_id: session_id.to_string(),
        deleted,
        removed_files,
    })
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::{context, jobs};
    use crate::services::sessions::configure_routes;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use chrono::Utc;
    use common::jobs::{GenerationJob, OutputFormat};
    use common::model::upload::FileKind;
    use common::responses::{CleanupResponse, SessionCreated};

    #[actix_web::test]
    async fn test_create_get_and_cleanup() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let (state, _rx) = jobs();
        let app = test::init_service(
            App::new()
                .app_data(ctx.clone())
                .app_data(web::Data::new(state.clone()))
                .service(configure_routes()),
        )
        .await;

        let created: SessionCreated = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/api/sessions").to_request(),
        )
        .await;
        ctx.storage
            .save(&created.session_id, FileKind::Csv, "r.csv", b"Name\nAda\n")
            .unwrap();
        state
            .register(GenerationJob::new(
                "job-1".into(),
                created.session_id.clone(),
                "t1".into(),
                OutputFormat::Png,
                1,
                Utc::now().to_rfc3339(),
            ))
            .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/sessions/{}", created.session_id))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let report: CleanupResponse = test::call_and_read_body_json(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/sessions/{}", created.session_id))
                .to_request(),
        )
        .await;
        assert!(report.deleted);
        assert_eq!(report.removed_files, 1);
        assert!(state.get("job-1").await.is_none());

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/sessions/{}", created.session_id))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_cleanup_unknown_session_is_not_an_error() {
        let (_dir, ctx) = context();
        let (state, _rx) = jobs();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::new(state))
                .service(configure_routes()),
        )
        .await;
        let report: CleanupResponse = test::call_and_read_body_json(
            &app,
            test::TestRequest::delete()
                .uri("/api/sessions/never-existed")
                .to_request(),
        )
        .await;
        assert!(!report.deleted);
        assert_eq!(report.removed_files, 0);
    }

    #[actix_web::test]
    async fn test_cleanup_rejects_bad_id() {
        let (_dir, ctx) = context();
        let (state, _rx) = jobs();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::new(state))
                .service(configure_routes()),
        )
        .await;
        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/sessions/bad%20id")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
