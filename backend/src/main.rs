mod app;
mod config;
mod error;
mod google;
mod job_controller;
mod render;
mod roster;
mod services;
mod sessions;
mod storage;
mod store;

use crate::app::{json_config, query_config, AppContext};
use crate::config::Settings;
use crate::job_controller::state::JobsState;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = Settings::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    env_logger::init_from_env(Env::default().default_filter_or(settings.log_level.0.as_str()));
    info!("Loaded configuration: {:?}", settings);

    let (host, port) = settings.bind_address();
    let json_limit = settings.server.json_limit;
    let session_ttl = Duration::from_secs(settings.sessions.ttl_secs);
    let sweep_interval = Duration::from_secs(settings.sessions.sweep_interval_secs);

    let ctx = web::Data::new(
        AppContext::new(settings).map_err(|e| std::io::Error::other(e.to_string()))?,
    );

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new();

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    // Expire idle sessions
    tokio::spawn(sessions::start_session_sweeper(
        ctx.sessions.clone(),
        ctx.storage.clone(),
        jobs_state.clone(),
        session_ttl,
        sweep_interval,
    ));

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(json_config(json_limit))
            .app_data(query_config())
            .app_data(ctx.clone())
            .app_data(web::Data::new(jobs_state.clone()))
            .route("/", web::get().to(services::health::root))
            .service(services::health::configure_routes())
            .service(services::auth::configure_routes())
            .service(services::sessions::configure_routes())
            .service(services::uploads::configure_routes())
            .service(services::files::configure_routes())
            .service(services::templates::configure_routes())
            .service(services::mapping::configure_routes())
            .service(services::generate::configure_routes())
            .service(services::send::configure_routes())
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
