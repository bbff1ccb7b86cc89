use crate::error::{ApiError, Result};
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::jobs::GenerationJob;
use common::responses::JobErrors;

pub(super) async fn find_job(jobs: &JobsState, job_id: &str) -> Result<GenerationJob> {
    jobs.get(job_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("job '{}' not found", job_id)))
}

/// `GET /api/generate/status/{job_id}`.
pub async fn process(jobs: web::Data<JobsState>, job_id: web::Path<String>) -> impl Responder {
    match find_job(&jobs, &job_id).await {
        Ok(job) => HttpResponse::Ok().json(job),
        Err(e) => e.error_response(),
    }
}

/// `GET /api/generate/errors/{job_id}`.
pub async fn errors(jobs: web::Data<JobsState>, job_id: web::Path<String>) -> impl Responder {
    match find_job(&jobs, &job_id).await {
        Ok(job) => HttpResponse::Ok().json(JobErrors {
            job_id: job.job_id,
            errors: job.errors,
        }),
        Err(e) => e.error_response(),
    }
}
