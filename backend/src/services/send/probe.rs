use crate::app::AppContext;
use crate::error::{ApiError, Result};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use common::requests::EmailTestRequest;
use secrecy::SecretString;
use serde_json::{json, Value};

/// `POST /api/send/email/test`: resolves the address behind a token.
pub async fn test_token(
    ctx: web::Data<AppContext>,
    payload: web::Json<EmailTestRequest>,
) -> impl Responder {
    match authenticated_email(&ctx, payload.into_inner()).await {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => e.error_response(),
    }
}

async fn authenticated_email(ctx: &AppContext, req: EmailTestRequest) -> Result<Value> {
    if req.access_token.trim().is_empty() {
        return Err(ApiError::Unprocessable("access_token must not be empty".to_string()));
    }
    let token = SecretString::from(req.access_token);
    let email = ctx.mailer.profile_email(&token).await?;
    log::info!("Gmail token check succeeded for {}", email);
    Ok(json!({
        "success": true,
        "authenticated_email": email,
    }))
}

/// `GET /api/send/health`.
pub async fn health(ctx: web::Data<AppContext>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "email",
        "oauth_configured": ctx.oauth.is_some(),
        "batch_limit": ctx.settings.email.batch_limit,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::context;
    use crate::app::json_config;
    use crate::error::Result;
    use crate::google::Mailer;
    use crate::services::send::configure_routes;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;
    use std::sync::Arc;

    struct ProfileOnly;

    #[async_trait]
    impl Mailer for ProfileOnly {
        async fn send_raw(&self, _access_token: &SecretString, _raw: String) -> Result<String> {
            unreachable!("sending is not exercised here")
        }

        async fn profile_email(&self, _access_token: &SecretString) -> Result<String> {
            Ok("owner@example.org".to_string())
        }
    }

    #[actix_web::test]
    async fn test_token_check_and_health() {
        let (_dir, ctx) = context();
        let ctx = ctx.with_mailer(Arc::new(ProfileOnly));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(json_config(1 << 20))
                .service(configure_routes()),
        )
        .await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/send/email/test")
                .set_json(json!({"access_token": "tok"}))
                .to_request(),
        )
        .await;
        assert_eq!(body["authenticated_email"], "owner@example.org");

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/send/email/test")
                .set_json(json!({"access_token": ""}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let health: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/send/health").to_request(),
        )
        .await;
        assert_eq!(health["oauth_configured"], false);
    }
}
