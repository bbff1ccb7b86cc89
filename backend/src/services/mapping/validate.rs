//! `POST /api/mapping/validate`.

use super::resolve::{display_values, required_keys, resolve, row_values};
use crate::app::AppContext;
use crate::error::{ApiError, Result};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::mapping::{FieldValidation, ResolutionSource};
use common::model::template::CertificateTemplate;
use common::requests::ValidateMappingRequest;
use common::responses::MappingReport;
use std::collections::BTreeMap;

pub async fn process(
    ctx: web::Data<AppContext>,
    payload: web::Json<ValidateMappingRequest>,
) -> impl Responder {
    match validate_mapping(&ctx, payload.into_inner()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => e.error_response(),
    }
}

fn session_template(ctx: &AppContext, session_id: &str, template_id: Option<&str>) -> Result<Option<CertificateTemplate>> {
    let Some(id) = template_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(None);
    };
    let template = ctx.db.get_template(id)?;
    if template.session_id != session_id {
        return Err(ApiError::validation(format!(
            "template '{}' does not belong to session '{}'",
            id, session_id
        )));
    }
    Ok(Some(template))
}

async fn validate_mapping(ctx: &AppContext, req: ValidateMappingRequest) -> Result<MappingReport> {
    let session = ctx.sessions.get(&req.session_id).await?;
    let roster = ctx.session_roster(&session)?;
    let template = session_template(ctx, &session.id, req.template_id.as_deref())?;

    let keys = required_keys(template.as_ref(), &req.mappings);
    if keys.is_empty() {
        return Err(ApiError::validation("no template keys to map"));
    }
    let bindings = resolve(&keys, &req.mappings, &roster)?;

    let has_default = |key: &str| {
        template
            .as_ref()
            .and_then(|t| t.text_boxes.iter().find(|tb| tb.key == key))
            .and_then(|tb| tb.default_text.as_deref())
            .is_some_and(|d| !d.trim().is_empty())
    };

    let validation: Vec<FieldValidation> = bindings
        .iter()
        .map(|b| {
            let csv_column = b.column.map(|c| roster.headers()[c].clone());
            let valid = csv_column.is_some() || has_default(&b.key);
            FieldValidation {
                template_key: b.key.clone(),
                csv_column,
                source: b.source,
                valid,
                error: (!valid).then(|| format!("no CSV column matches key '{}'", b.key)),
            }
        })
        .collect();
    let unresolved_keys: Vec<String> = bindings
        .iter()
        .filter(|b| b.source == ResolutionSource::Unresolved)
        .map(|b| b.key.clone())
        .collect();
    let valid = validation.iter().all(|v| v.valid);

    let preview_data: BTreeMap<String, String> = match roster.row(0) {
        Some(row) => {
            let values = row_values(&bindings, row);
            match &template {
                Some(t) => display_values(&t.text_boxes, &values),
                None => values.into_iter().collect(),
            }
        }
        None => BTreeMap::new(),
    };

    ctx.sessions.set_mappings(&session.id, req.mappings).await?;
    log::info!(
        "Validated mapping for session {}: {} keys, {} unresolved",
        session.id,
        bindings.len(),
        unresolved_keys.len()
    );

    let message = if valid {
        "Mapping is valid".to_string()
    } else {
        format!(
            "{} template key(s) have no CSV column or default text",
            validation.iter().filter(|v| !v.valid).count()
        )
    };
    Ok(MappingReport {
        success: true,
        message,
        valid,
        validation,
        unresolved_keys,
        preview_data,
        csv_stats: roster.stats(),
    })
}
