//! # Auth Service Module
//!
//! *   **`POST /api/auth/google/token`** (`token::process`): exchanges an
//!     authorization code from the Google consent screen for an access token.
//!     The client secret never leaves the server.

mod token;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/google/token", post().to(token::process))
}
