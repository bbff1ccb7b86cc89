use crate::error::{ApiError, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

const SERVICE: &str = "gmail";

/// Sends prepared messages on behalf of the signed-in user.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends a base64url-encoded RFC 822 message and returns its message id.
    async fn send_raw(&self, access_token: &SecretString, raw: String) -> Result<String>;

    /// E-mail address of the token's owner.
    async fn profile_email(&self, access_token: &SecretString) -> Result<String>;
}

pub struct GmailClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/gmail/v1/users/me/{}", self.api_base, path)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::ExternalService {
            service: SERVICE,
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        if !status.is_success() {
            let message = serde_json::from_str::<GoogleErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("Gmail API returned {}", status));
            return Err(ApiError::ExternalService {
                service: SERVICE,
                status: Some(status.as_u16()),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| ApiError::ExternalService {
            service: SERVICE,
            status: Some(status.as_u16()),
            message: format!("unexpected response: {}", e),
        })
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::ExternalService {
        service: SERVICE,
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

#[async_trait]
impl Mailer for GmailClient {
    async fn send_raw(&self, access_token: &SecretString, raw: String) -> Result<String> {
        let response = self
            .http
            .post(self.url("messages/send"))
            .bearer_auth(access_token.expose_secret())
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .map_err(transport_error)?;
        let sent: SentMessage = Self::read_json(response).await?;
        Ok(sent.id)
    }

    async fn profile_email(&self, access_token: &SecretString) -> Result<String> {
        let response = self
            .http
            .get(self.url("profile"))
            .bearer_auth(access_token.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;
        let profile: Profile = Self::read_json(response).await?;
        Ok(profile.email_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::test_support::serve;
    use actix_web::{web, HttpRequest, HttpResponse};

    fn bearer(req: &HttpRequest) -> Option<&str> {
        req.headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    fn unauthenticated() -> HttpResponse {
        HttpResponse::Unauthorized().json(json!({
            "error": {
                "code": 401,
                "message": "Request had invalid authentication credentials.",
                "status": "UNAUTHENTICATED",
            }
        }))
    }

    async fn send_endpoint(req: HttpRequest, body: web::Json<serde_json::Value>) -> HttpResponse {
        if bearer(&req) != Some("good-token") {
            return unauthenticated();
        }
        match body["raw"].as_str() {
            Some("") | None => HttpResponse::BadRequest().body("<html>missing raw</html>"),
            Some(_) => HttpResponse::Ok().json(json!({ "id": "18c0ffee", "threadId": "18c0ffee" })),
        }
    }

    async fn profile_endpoint(req: HttpRequest) -> HttpResponse {
        if bearer(&req) != Some("good-token") {
            return unauthenticated();
        }
        HttpResponse::Ok().json(json!({
            "emailAddress": "organiser@example.org",
            "messagesTotal": 12,
        }))
    }

    fn gmail_routes(cfg: &mut web::ServiceConfig) {
        cfg.route(
            "/gmail/v1/users/me/messages/send",
            web::post().to(send_endpoint),
        )
        .route("/gmail/v1/users/me/profile", web::get().to(profile_endpoint));
    }

    fn token(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let client = GmailClient::new(reqwest::Client::new(), "https://gmail.googleapis.com/");
        assert_eq!(
            client.url("messages/send"),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
        );
    }

    #[test]
    fn test_google_error_body_parses() {
        let body: GoogleErrorBody = serde_json::from_str(
            r#"{"error":{"code":401,"message":"Invalid Credentials","status":"UNAUTHENTICATED"}}"#,
        )
        .unwrap();
        assert_eq!(body.error.message, "Invalid Credentials");
    }

    #[actix_web::test]
    async fn test_send_and_profile_against_gmail_api() {
        let (base, server) = serve(gmail_routes);
        let client = GmailClient::new(reqwest::Client::new(), format!("{}/", base));

        let id = client
            .send_raw(&token("good-token"), "UmF3IG1lc3NhZ2U".into())
            .await
            .unwrap();
        assert_eq!(id, "18c0ffee");

        let email = client.profile_email(&token("good-token")).await.unwrap();
        assert_eq!(email, "organiser@example.org");
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn test_gmail_errors_keep_upstream_status() {
        let (base, server) = serve(gmail_routes);
        let client = GmailClient::new(reqwest::Client::new(), base);

        match client
            .send_raw(&token("expired"), "UmF3".into())
            .await
            .unwrap_err()
        {
            ApiError::ExternalService {
                service,
                status,
                message,
            } => {
                assert_eq!(service, SERVICE);
                assert_eq!(status, Some(401));
                assert_eq!(message, "Request had invalid authentication credentials.");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        match client
            .send_raw(&token("good-token"), String::new())
            .await
            .unwrap_err()
        {
            ApiError::ExternalService {
                status, message, ..
            } => {
                assert_eq!(status, Some(400));
                assert!(message.contains("400"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.stop(false).await;
    }
}
