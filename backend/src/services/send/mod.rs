//! # Send Service Module
//!
//! Delivers generated certificates by e-mail through the Gmail API, using an
//! access token obtained from the OAuth exchange in `services::auth`.
//!
//! ## Registered Routes (under `/api/send`)
//!
//! *   **`POST /email`** (`email::process`): sends one message per recipient
//!     with their certificate attached. Answers 207 when some sends failed.
//! *   **`POST /email/preview`** (`preview::process`): the personalised
//!     subject and body, without sending anything.
//! *   **`POST /email/test`** (`probe::test_token`): checks a token by reading
//!     the Gmail profile.
//! *   **`GET /health`** (`probe::health`): whether Gmail sending is usable.

mod email;
mod mime;
mod personalize;
mod preview;
mod probe;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/send";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/email", post().to(email::process))
        .route("/email/preview", post().to(preview::process))
        .route("/email/test", post().to(probe::test_token))
        .route("/health", get().to(probe::health))
}
