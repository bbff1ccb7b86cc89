use crate::app::AppContext;
use crate::error::{ApiError, Result};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::TokenExchangeRequest;
use common::responses::TokenResponse;

pub async fn process(
    ctx: web::Data<AppContext>,
    payload: web::Json<TokenExchangeRequest>,
) -> impl Responder {
    match exchange(&ctx, payload.into_inner()).await {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(e) => e.error_response(),
    }
}

async fn exchange(ctx: &AppContext, req: TokenExchangeRequest) -> Result<TokenResponse> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(ApiError::validation("authorization code must not be empty"));
    }
    let oauth = ctx
        .oauth
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("Google OAuth".to_string()))?;
    let tokens = oauth.exchange_code(code, req.redirect_uri.as_deref()).await?;
    log::info!(
        "Exchanged Google authorization code (expires in {:?}s)",
        tokens.expires_in
    );
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::context;
    use crate::app::json_config;
    use crate::services::auth::configure_routes;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_blank_code_and_missing_config() {
        let (_dir, ctx) = context();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(json_config(1 << 20))
                .service(configure_routes()),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/google/token")
                .set_json(json!({"code": "  "}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/google/token")
                .set_json(json!({"code": "4/abc"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "NOT_CONFIGURED");
    }
}
