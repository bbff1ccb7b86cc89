//! Clients for the Google endpoints the service talks to: the OAuth token
//! endpoint and the Gmail REST API.

mod gmail;
mod oauth;

pub use gmail::{GmailClient, Mailer};
pub use oauth::OAuthClient;

use crate::config::GoogleConfig;
use crate::error::{ApiError, Result};
use std::time::Duration;

/// Shared HTTP client with the configured timeout.
pub fn http_client(config: &GoogleConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ApiError::internal(format!("cannot build HTTP client: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::dev::ServerHandle;
    use actix_web::{web, App, HttpServer};

    /// Runs a local HTTP server with the given routes and returns its base URL.
    pub fn serve(configure: fn(&mut web::ServiceConfig)) -> (String, ServerHandle) {
        let server = HttpServer::new(move || App::new().configure(configure))
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{}", addr), handle)
    }
}
