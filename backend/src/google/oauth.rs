use crate::config::GoogleConfig;
use crate::error::{ApiError, Result};
use common::responses::TokenResponse;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const SERVICE: &str = "google_oauth";

/// Exchanges authorization codes from the Google consent screen for tokens.
pub struct OAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    token_url: String,
    redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

impl OAuthClient {
    /// `None` when the client id or secret is missing.
    pub fn from_config(config: &GoogleConfig, http: reqwest::Client) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        Some(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: SecretString::from(config.client_secret.clone()),
            token_url: config.token_url.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    /// Form fields posted to the token endpoint.
    fn token_form(&self, code: &str, redirect_uri: Option<&str>) -> Vec<(&'static str, String)> {
        let redirect_uri = redirect_uri
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.redirect_uri);
        vec![
            ("code", code.to_string()),
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.expose_secret().to_string()),
            ("redirect_uri", redirect_uri.to_string()),
            ("grant_type", "authorization_code".to_string()),
        ]
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&self.token_form(code, redirect_uri))
            .send()
            .await
            .map_err(|e| ApiError::ExternalService {
                service: SERVICE,
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::ExternalService {
            service: SERVICE,
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<OAuthErrorBody>(&body)
                .ok()
                .and_then(|b| b.error_description.or(b.error))
                .unwrap_or_else(|| format!("token endpoint returned {}", status));
            return Err(ApiError::ExternalService {
                service: SERVICE,
                status: Some(status.as_u16()),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::ExternalService {
            service: SERVICE,
            status: Some(status.as_u16()),
            message: format!("unexpected token response: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::test_support::serve;
    use actix_web::{web, HttpResponse};
    use serde_json::json;

    #[derive(Deserialize)]
    struct TokenForm {
        code: String,
        client_secret: String,
        grant_type: String,
    }

    async fn token_endpoint(form: web::Form<TokenForm>) -> HttpResponse {
        if form.grant_type != "authorization_code" || form.client_secret != "s3cret" {
            return HttpResponse::Unauthorized().json(json!({ "error": "invalid_client" }));
        }
        match form.code.as_str() {
            "good-code" => HttpResponse::Ok().json(json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "token_type": "Bearer",
                "scope": "https://www.googleapis.com/auth/gmail.send",
            })),
            "garbled" => HttpResponse::Ok().body("not json"),
            _ => HttpResponse::BadRequest().json(json!({
                "error": "invalid_grant",
                "error_description": "Malformed auth code.",
            })),
        }
    }

    fn token_routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/token", web::post().to(token_endpoint));
    }

    fn client_for(base: &str) -> OAuthClient {
        let config = GoogleConfig {
            token_url: format!("{}/token", base),
            ..config()
        };
        OAuthClient::from_config(&config, reqwest::Client::new()).unwrap()
    }

    fn config() -> GoogleConfig {
        GoogleConfig {
            client_id: "client-123".into(),
            client_secret: "s3cret".into(),
            ..GoogleConfig::default()
        }
    }

    #[test]
    fn test_unconfigured_yields_none() {
        assert!(OAuthClient::from_config(&GoogleConfig::default(), reqwest::Client::new()).is_none());
    }

    #[test]
    fn test_token_form_defaults_redirect_uri() {
        let client = OAuthClient::from_config(&config(), reqwest::Client::new()).unwrap();
        let form = client.token_form("abc", None);
        assert!(form.contains(&("redirect_uri", "postmessage".to_string())));
        assert!(form.contains(&("grant_type", "authorization_code".to_string())));
        assert!(form.contains(&("client_secret", "s3cret".to_string())));

        let form = client.token_form("abc", Some("https://app.example/cb"));
        assert!(form.contains(&("redirect_uri", "https://app.example/cb".to_string())));
    }

    #[actix_web::test]
    async fn test_exchange_code_parses_token() {
        let (base, server) = serve(token_routes);
        let token = client_for(&base).exchange_code("good-code", None).await.unwrap();
        assert_eq!(token.access_token, "ya29.fresh");
        assert_eq!(token.expires_in, Some(3599));
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
        assert!(token.refresh_token.is_none());
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn test_exchange_code_maps_upstream_errors() {
        let (base, server) = serve(token_routes);
        let client = client_for(&base);

        match client.exchange_code("expired", None).await.unwrap_err() {
            ApiError::ExternalService {
                service,
                status,
                message,
            } => {
                assert_eq!(service, SERVICE);
                assert_eq!(status, Some(400));
                assert_eq!(message, "Malformed auth code.");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = client.exchange_code("garbled", None).await.unwrap_err();
        assert_eq!(err.code(), "EXTERNAL_SERVICE_ERROR");
        assert!(err.to_string().contains("unexpected token response"));
        server.stop(false).await;
    }
}
