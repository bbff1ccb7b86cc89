//! `GET /api/generate/download/{job_id}`: the job's ZIP archive as an
//! attachment. Answers 404 until the archive has been written.

use super::status::find_job;
use crate::error::{ApiError, Result};
use crate::job_controller::state::JobsState;
use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

pub async fn process(
    req: HttpRequest,
    jobs: web::Data<JobsState>,
    job_id: web::Path<String>,
) -> HttpResponse {
    match archive(&jobs, &job_id).await {
        Ok(file) => file.into_response(&req),
        Err(e) => e.error_response(),
    }
}

async fn archive(jobs: &JobsState, job_id: &str) -> Result<NamedFile> {
    let job = find_job(jobs, job_id).await?;
    let path = job
        .output_path
        .ok_or_else(|| ApiError::not_found(format!("archive of job '{}' is not ready", job_id)))?;
    let file = NamedFile::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            ApiError::not_found(format!("archive of job '{}' is missing", job_id))
        }
        _ => ApiError::Io(e),
    })?;
    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(format!(
            "certificates_{}.zip",
            job_id
        ))],
    }))
}
