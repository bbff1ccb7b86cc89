//! # Session Service Module
//!
//! A session groups everything one user works on: the uploaded template and
//! roster, the mappings between them and the generated certificates.
//!
//! ## Registered Routes (under `/api/sessions`)
//!
//! *   **`POST /`** (`create::process`): opens a session and returns its id.
//! *   **`GET /{session_id}`** (`get::process`): uploads, roster stats and
//!     mappings of the session.
//! *   **`DELETE /{session_id}`** (`cleanup::process`): deletes the session's
//!     files, saved templates and upload history. Cleaning up an unknown id is
//!     not an error.

mod cleanup;
mod create;
mod get;

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/sessions";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("/{session_id}", get().to(get::process))
        .route("/{session_id}", delete().to(cleanup::process))
}
