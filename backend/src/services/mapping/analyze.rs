use crate::app::AppContext;
use crate::error::Result;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::SessionQuery;
use common::responses::CsvAnalysis;

const SAMPLE_ROWS: usize = 3;

/// `GET /api/mapping/analyze-csv?session_id=`.
pub async fn process(ctx: web::Data<AppContext>, query: web::Query<SessionQuery>) -> impl Responder {
    match analyze(&ctx, &query.session_id).await {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(e) => e.error_response(),
    }
}

async fn analyze(ctx: &AppContext, session_id: &str) -> Result<CsvAnalysis> {
    let session = ctx.sessions.get(session_id).await?;
    let roster = ctx.session_roster(&session)?;
    Ok(CsvAnalysis {
        success: true,
        csv_stats: roster.stats(),
        column_checks: roster.column_checks(),
        sample_data: roster.sample(SAMPLE_ROWS),
    })
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::context;
    use crate::app::query_config;
    use crate::services::mapping::configure_routes;
    use crate::services::mapping::test_support::seeded_session;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::model::csv::PlaceholderType;
    use common::responses::CsvAnalysis;

    #[actix_web::test]
    async fn test_analyze_samples_three_rows() {
        let (_dir, ctx) = context();
        let csv = b"Name,Email,Fee\nA,a@x.org,$5\nB,b@x.org,$6\nC,c@x.org,$7\nD,d@x.org,$8\n";
        let (sid, _) = seeded_session(&ctx, csv, vec![]).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(query_config())
                .service(configure_routes()),
        )
        .await;

        let analysis: CsvAnalysis = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/mapping/analyze-csv?session_id={}", sid))
                .to_request(),
        )
        .await;
        assert_eq!(analysis.sample_data.len(), 3);
        assert_eq!(analysis.csv_stats.total_rows, 4);
        assert_eq!(analysis.column_checks[1].placeholder_type, PlaceholderType::Email);
        assert_eq!(analysis.column_checks[2].placeholder_type, PlaceholderType::Currency);
    }

    #[actix_web::test]
    async fn test_analyze_without_csv_is_400() {
        let (_dir, ctx) = context();
        let sid = ctx.sessions.create().await.id;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .app_data(query_config())
                .service(configure_routes()),
        )
        .await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/mapping/analyze-csv?session_id={}", sid))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
