//! # Upload Service Module
//!
//! Receives the two inputs of a certificate batch as `multipart/form-data`
//! (field `file`) and remembers them per session.
//!
//! ## Registered Routes (under `/api/upload`)
//!
//! *   **`POST /template?session_id=`** (`template::process`): PNG or JPEG
//!     background. Returns its size in pixels.
//! *   **`POST /csv?session_id=`** (`csv::process`): CSV roster. Returns the
//!     roster statistics.
//! *   **`GET /latest?session_id=`** (`latest::process`): most recent template
//!     and roster still present on disk.
//! *   **`GET /csv/content?session_id=`** (`csv::content`): raw roster text.

mod csv;
mod latest;
pub(crate) mod multipart;
mod template;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/upload";

/// Every file extension the upload routes accept.
pub(crate) fn allowed_extensions() -> Vec<&'static str> {
    template::ALLOWED.iter().chain(csv::ALLOWED).copied().collect()
}

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/template", post().to(template::process))
        .route("/csv", post().to(csv::process))
        .route("/csv/content", get().to(csv::content))
        .route("/latest", get().to(latest::process))
}

#[cfg(test)]
mod tests {
    use super::multipart::test_support::file_request;
    use super::*;
    use crate::app::test_support::context;
    use crate::app::{json_config, query_config, AppContext};
    use crate::render::test_support::png_bytes;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::responses::{CsvContent, CsvUploadResponse, LatestUploads, TemplateUploadResponse};

    async fn session(ctx: &AppContext) -> String {
        ctx.sessions.create().await.id
    }

    macro_rules! app {
        ($ctx:expr) => {
            test::init_service(
                App::new()
                    .app_data($ctx.clone())
                    .app_data(json_config(1024 * 1024))
                    .app_data(query_config())
                    .service(configure_routes()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_template_upload_reports_dimensions() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let sid = session(&ctx).await;
        let app = app!(ctx);

        let req = file_request(
            &format!("/api/upload/template?session_id={}", sid),
            "My Template.png",
            &png_bytes(64, 48),
        )
        .to_request();
        let resp: TemplateUploadResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!((resp.width, resp.height), (64, 48));
        assert_eq!(resp.filename, "My_Template.png");
        assert_eq!(resp.file_type, "png");
        assert!(ctx.sessions.get(&sid).await.unwrap().template.is_some());
    }

    #[actix_web::test]
    async fn test_template_upload_rejects_other_types() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let sid = session(&ctx).await;
        let app = app!(ctx);

        let req = file_request(
            &format!("/api/upload/template?session_id={}", sid),
            "anim.gif",
            b"GIF89a",
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FILE_TYPE");
    }

    #[actix_web::test]
    async fn test_template_upload_rejects_undecodable_image() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let sid = session(&ctx).await;
        let app = app!(ctx);

        let req = file_request(
            &format!("/api/upload/template?session_id={}", sid),
            "broken.png",
            b"not really a png",
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(ctx.sessions.get(&sid).await.unwrap().template.is_none());
    }

    #[actix_web::test]
    async fn test_upload_over_limit_is_413() {
        let (_dir, mut ctx) = context();
        ctx.settings.storage.max_upload_size = 16;
        let ctx = web::Data::new(ctx);
        let sid = session(&ctx).await;
        let app = app!(ctx);

        let req = file_request(
            &format!("/api/upload/csv?session_id={}", sid),
            "big.csv",
            &[b'a'; 64],
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_csv_upload_latest_and_content() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let sid = session(&ctx).await;
        let app = app!(ctx);

        let csv = b"Name;Email\nAda;ada@example.org\nAlan;alan@example.org\n";
        let req = file_request(&format!("/api/upload/csv?session_id={}", sid), "people.csv", csv)
            .to_request();
        let resp: CsvUploadResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.csv_stats.total_rows, 2);
        assert_eq!(resp.csv_stats.delimiter, ';');

        let latest: LatestUploads = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/upload/latest?session_id={}", sid))
                .to_request(),
        )
        .await;
        assert!(latest.csv.is_some());
        assert!(latest.template.is_none());
        assert!(!latest.ready);

        let content: CsvContent = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/upload/csv/content?session_id={}", sid))
                .to_request(),
        )
        .await;
        assert_eq!(content.filename, "people.csv");
        assert!(content.content.starts_with("Name;Email"));
    }

    #[actix_web::test]
    async fn test_csv_upload_requires_session() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let app = app!(ctx);
        let req = file_request("/api/upload/csv?session_id=nope", "r.csv", b"Name\nAda\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_malformed_csv_rejected() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let sid = session(&ctx).await;
        let app = app!(ctx);
        let req = file_request(
            &format!("/api/upload/csv?session_id={}", sid),
            "r.csv",
            b"Name,Name\na,b\n",
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "FILE_PROCESSING_ERROR");
    }

    #[actix_web::test]
    async fn test_csv_content_without_upload_is_404() {
        let (_dir, ctx) = context();
        let ctx = web::Data::new(ctx);
        let sid = session(&ctx).await;
        let app = app!(ctx);
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/upload/csv/content?session_id={}", sid))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
