//! # Generation Start Service
//!
//! `POST /api/generate` kicks off a certificate batch.
//!
//! ## Workflow:
//!
//! 1.  **Validation**: the session, its roster and the template must exist,
//!     the roster must have rows and every explicit mapping must name an
//!     existing column. Failures answer immediately with 4xx.
//! 2.  **Planning**: template keys are bound to columns and the column naming
//!     each output file is chosen: `name_key` if given, else the first text
//!     box key, falling back to the roster's name column when that key is
//!     unbound.
//! 3.  **Registration**: a `queued` job is stored in `JobsState` and the
//!     handler answers `202 Accepted` with the job id and status URL.
//! 4.  **Background Processing**: a Tokio task runs `worker::run` through
//!     `spawn_blocking`. An error or panic there marks the job `failed`.

use super::worker::{self, GenerationPlan};
use super::{download_url, status_url};
use crate::app::AppContext;
use crate::error::{ApiError, Result};
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::mapping::resolve::resolve;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use common::jobs::GenerationJob;
use common::model::upload::FileKind;
use common::requests::StartGenerationRequest;
use common::responses::GenerationAccepted;
use std::sync::Arc;
use uuid::Uuid;

pub async fn process(
    ctx: web::Data<AppContext>,
    jobs: web::Data<JobsState>,
    payload: web::Json<StartGenerationRequest>,
) -> impl Responder {
    match schedule_generation(&ctx, &jobs, payload.into_inner()).await {
        Ok(accepted) => HttpResponse::Accepted().json(accepted),
        Err(e) => e.error_response(),
    }
}

async fn plan_job(ctx: &AppContext, job_id: &str, req: StartGenerationRequest) -> Result<GenerationPlan> {
    let session = ctx.sessions.get(&req.session_id).await?;
    let template = ctx.db.get_template(&req.template_id)?;
    if template.session_id != session.id {
        return Err(ApiError::validation(format!(
            "template '{}' does not belong to session '{}'",
            template.id, session.id
        )));
    }
    let roster = ctx.session_roster(&session)?;
    if roster.is_empty() {
        return Err(ApiError::validation("CSV has no data rows"));
    }

    let mappings = req.mappings.unwrap_or_else(|| session.mappings.clone());
    let bindings = resolve(&template.keys(), &mappings, &roster)?;

    let name_key = req
        .name_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| template.text_boxes.first().map(|tb| tb.key.clone()));
    let name_column = name_key
        .as_deref()
        .and_then(|key| {
            bindings
                .iter()
                .find(|b| b.key.eq_ignore_ascii_case(key))
                .and_then(|b| b.column)
                .or_else(|| roster.column_index(key))
        })
        .or_else(|| roster.name_column().and_then(|c| roster.column_index(c)));

    let background = ctx
        .storage
        .read(&session.id, FileKind::Template, &template.image)?;

    Ok(GenerationPlan {
        job_id: job_id.to_string(),
        job_dir: ctx.storage.job_dir(&session.id, job_id)?,
        archive_path: ctx.storage.job_archive(&session.id, job_id)?,
        download_url: download_url(job_id),
        session_id: session.id,
        background,
        text_boxes: template.text_boxes,
        roster,
        bindings,
        name_column,
        output_format: req.output_format,
        chunk_size: ctx.settings.render.chunk_size,
        renderer: Arc::clone(&ctx.renderer),
    })
}

async fn schedule_generation(
    ctx: &AppContext,
    jobs: &JobsState,
    req: StartGenerationRequest,
) -> Result<GenerationAccepted> {
    let job_id = Uuid::new_v4().to_string();
    let template_id = req.template_id.clone();
    let output_format = req.output_format;
    let plan = plan_job(ctx, &job_id, req).await?;
    let total = plan.roster.len();

    let job = GenerationJob::new(
        job_id.clone(),
        plan.session_id.clone(),
        template_id,
        output_format,
        total,
        Utc::now().to_rfc3339(),
    );
    let status = job.status;
    jobs.register(job).await;
    log::info!(
        "Queued job {} for session {}: {} rows as {}",
        job_id,
        plan.session_id,
        total,
        output_format.extension()
    );

    let tx = jobs.tx.clone();
    let spawned_id = job_id.clone();
    tokio::spawn(async move {
        let worker_tx = tx.clone();
        let handle = tokio::task::spawn_blocking(move || worker::run(&plan, &worker_tx));
        let error = match handle.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("worker task failed: {}", e)),
        };
        if let Some(error) = error {
            log::error!("Job {} failed: {}", spawned_id, error);
            let _ = tx
                .send(JobUpdate::Failed {
                    job_id: spawned_id,
                    error,
                })
                .await;
        }
    });

    Ok(GenerationAccepted {
        status_url: status_url(&job_id),
        job_id,
        status,
        total_items: total,
    })
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::{context, jobs};
    use crate::app::json_config;
    use crate::job_controller::state::start_job_updater;
    use crate::services::generate::configure_routes;
    use crate::services::mapping::test_support::{seeded_session, text_box};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::jobs::{GenerationJob, GenerationStatus};
    use common::responses::{GenerationAccepted, JobErrors};
    use serde_json::json;
    use std::time::Duration;

    #[actix_web::test]
    async fn test_generation_runs_to_completion() {
        let (_dir, ctx) = context();
        let csv = b"Name,Course\nAda Lovelace,Engines\n,Nothing\nAlan Turing,Machines\n";
        let (sid, tid) = seeded_session(&ctx, csv, vec![]).await;
        let (state, rx) = jobs();
        actix_web::rt::spawn(start_job_updater(state.clone(), rx));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::new(state))
                .app_data(json_config(1 << 20))
                .service(configure_routes()),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/generate")
                .set_json(json!({"session_id": sid, "template_id": tid}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let accepted: GenerationAccepted = test::read_body_json(resp).await;
        assert_eq!(accepted.total_items, 3);
        assert_eq!(accepted.status_url, format!("/api/generate/status/{}", accepted.job_id));

        let mut job: Option<GenerationJob> = None;
        for _ in 0..200 {
            let current: GenerationJob = test::call_and_read_body_json(
                &app,
                test::TestRequest::get().uri(&accepted.status_url).to_request(),
            )
            .await;
            if current.status.is_terminal() {
                job = Some(current);
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(25)).await;
        }
        let job = job.expect("job did not finish");
        assert_eq!(job.status, GenerationStatus::CompletedWithErrors);
        assert_eq!(job.successful_items, 2);
        assert_eq!(job.failed_items, 1);
        assert_eq!(job.processed_items, job.total_items);

        let errors: JobErrors = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/generate/errors/{}", accepted.job_id))
                .to_request(),
        )
        .await;
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].item_id, "row_2");

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(job.download_url.as_deref().unwrap())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));
    }

    #[actix_web::test]
    async fn test_missing_column_rejected_before_queueing() {
        let (_dir, ctx) = context();
        let (sid, tid) = seeded_session(&ctx, b"Name\nAda\n", vec![text_box("NAME", 10)]).await;
        let (state, _rx) = jobs();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::new(state.clone()))
                .app_data(json_config(1 << 20))
                .service(configure_routes()),
        )
        .await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/generate")
                .set_json(json!({
                    "session_id": sid,
                    "template_id": tid,
                    "mappings": [{"template_key": "NAME", "csv_column": "Surname"}]
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.jobs.read().await.is_empty());
    }

    #[actix_web::test]
    async fn test_unknown_template_is_404() {
        let (_dir, ctx) = context();
        let (sid, _tid) = seeded_session(&ctx, b"Name\nAda\n", vec![]).await;
        let (state, _rx) = jobs();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::new(state))
                .app_data(json_config(1 << 20))
                .service(configure_routes()),
        )
        .await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/generate")
                .set_json(json!({"session_id": sid, "template_id": "missing"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
