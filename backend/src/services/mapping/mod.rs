//! # Mapping Service Module
//!
//! Binds template keys to roster columns and lets the user check the result
//! before starting a batch.
//!
//! ## Registered Routes (under `/api/mapping`)
//!
//! *   **`POST /validate`** (`validate::process`): resolves every required key,
//!     stores the mappings on the session and reports what is still unbound.
//! *   **`POST /preview`** (`preview::process`): renders one roster row onto the
//!     template and returns it as a PNG data URL.
//! *   **`GET /analyze-csv?session_id=`** (`analyze::process`): roster stats,
//!     inferred column types and the first rows.

mod analyze;
mod preview;
pub(crate) mod resolve;
mod validate;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/mapping";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/validate", post().to(validate::process))
        .route("/preview", post().to(preview::process))
        .route("/analyze-csv", get().to(analyze::process))
}
