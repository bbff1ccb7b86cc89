//! # Template Service Module
//!
//! Certificate templates: a stored background image plus the text boxes laid
//! out on it. Templates are persisted in SQLite and scoped to a session.
//!
//! ## Registered Routes (under `/api/templates`)
//!
//! *   **`POST /`** (`save::process`): creates a template, or updates it when
//!     the body carries an existing `id`. The background defaults to the
//!     session's latest template upload. Every text box is validated against
//!     the image size read from disk.
//! *   **`GET /?session_id=`** (`list::process`): templates of a session,
//!     most recently updated first.
//! *   **`GET /{template_id}`** (`get::process`): one template.
//! *   **`DELETE /{template_id}`** (`delete::process`): removes a template.

mod delete;
mod get;
mod list;
mod save;

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/templates";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(save::process))
        .route("", get().to(list::process))
        .route("/{template_id}", get().to(get::process))
        .route("/{template_id}", delete().to(delete::process))
}
