//! # Generation Service Module
//!
//! Renders one certificate per roster row in the background and packages them
//! into a ZIP archive.
//!
//! ## Registered Routes (under `/api/generate`)
//!
//! *   **`POST /`** (`start::process`): validates the request, registers a
//!     queued job and answers `202 Accepted` with the job id.
//! *   **`GET /status/{job_id}`** (`status::process`): the job record.
//! *   **`GET /errors/{job_id}`** (`status::errors`): rows that failed.
//! *   **`GET /download/{job_id}`** (`download::process`): the ZIP archive.
//!
//! Job progress flows through the job controller: the worker only sends
//! `JobUpdate` messages, see `job_controller::state`.

mod archive;
mod download;
mod start;
mod status;
mod worker;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/generate";

pub fn status_url(job_id: &str) -> String {
    format!("{}/status/{}", API_PATH, job_id)
}

pub fn download_url(job_id: &str) -> String {
    format!("{}/download/{}", API_PATH, job_id)
}

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(start::process))
        .route("/status/{job_id}", get().to(status::process))
        .route("/errors/{job_id}", get().to(status::errors))
        .route("/download/{job_id}", get().to(download::process))
}
