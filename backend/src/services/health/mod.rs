//! # Health Endpoints
//!
//! Liveness and readiness probes, mounted outside `/api`:
//!
//! * **`GET /`**: service banner with the crate version.
//! * **`GET /health`**: always `healthy` while the process serves requests.
//! * **`GET /health/ready`**: checks the upload directory is writable, the
//!   database opens and the default font loads. Answers 503 when any check fails.
//! * **`GET /health/live`**: always `alive`.
//! * **`GET /health/metrics`**: uptime, resident memory of the process (Linux
//!   only, `null` elsewhere) and the configured upload limits.
//! * **`GET /health/version`**: crate name and version.

use crate::app::AppContext;
use crate::services::uploads::allowed_extensions;
use actix_web::web::{get, scope, Data};
use actix_web::{HttpResponse, Responder, Scope};
use chrono::Utc;
use serde_json::json;

const API_PATH: &str = "/health";
const SERVICE_NAME: &str = "CertiMate API";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(health))
        .route("/ready", get().to(ready))
        .route("/live", get().to(live))
        .route("/metrics", get().to(metrics))
        .route("/version", get().to(version))
}

pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "CertiMate API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    }))
}

fn storage_writable(ctx: &AppContext) -> bool {
    ctx.storage.ensure_root_dirs().is_ok()
        && tempfile::NamedTempFile::new_in(ctx.storage.root()).is_ok()
}

async fn ready(ctx: Data<AppContext>) -> impl Responder {
    let storage = storage_writable(&ctx);
    let database = ctx.db.ping().is_ok();
    let fonts = match ctx.renderer.fonts().font(None, false) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Readiness: {}", e);
            false
        }
    };
    let all_ready = storage && database && fonts;
    let body = json!({
        "status": if all_ready { "ready" } else { "not_ready" },
        "timestamp": Utc::now().to_rfc3339(),
        "checks": {
            "storage": storage,
            "database": database,
            "fonts": fonts,
        },
    });
    if all_ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

async fn live() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "alive",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Resident set size in KiB, read from `/proc/self/status`.
fn process_rss_kib() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|value| value.split_whitespace().next())
        .and_then(|kib| kib.parse().ok())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

async fn metrics(ctx: Data<AppContext>) -> impl Responder {
    let uptime = Utc::now()
        .signed_duration_since(ctx.started_at)
        .num_seconds()
        .max(0);
    let max_upload = ctx.settings.storage.max_upload_size as f64;
    HttpResponse::Ok().json(json!({
        "timestamp": Utc::now().to_rfc3339(),
        "process": {
            "memory_mb": process_rss_kib().map(|kib| round2(kib as f64 / 1024.0)),
            "uptime_seconds": uptime,
        },
        "limits": {
            "max_upload_size_mb": round2(max_upload / (1024.0 * 1024.0)),
            "json_limit_bytes": ctx.settings.server.json_limit,
            "email_batch_limit": ctx.settings.email.batch_limit,
            "allowed_extensions": allowed_extensions(),
        },
    }))
}

async fn version() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
