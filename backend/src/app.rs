//! Shared application context injected into every handler as `web::Data`.

use crate::config::Settings;
use crate::error::{ApiError, Result};
use crate::google::{self, GmailClient, Mailer, OAuthClient};
use crate::render::Renderer;
use crate::roster::Roster;
use crate::sessions::{Session, SessionStore};
use crate::storage::FileStorage;
use crate::store::Db;
use actix_web::web;
use chrono::{DateTime, Utc};
use common::model::upload::FileKind;
use std::sync::Arc;

pub struct AppContext {
    pub settings: Settings,
    pub storage: FileStorage,
    pub db: Db,
    pub sessions: SessionStore,
    pub renderer: Arc<Renderer>,
    pub mailer: Arc<dyn Mailer>,
    pub oauth: Option<OAuthClient>,
    /// When the context was built, reported as uptime by `/health/metrics`.
    pub started_at: DateTime<Utc>,
}

impl AppContext {
    /// Builds the context, creating the upload root and migrating the database.
    pub fn new(settings: Settings) -> Result<Self> {
        let storage = FileStorage::new(&settings.storage.upload_dir);
        storage.ensure_root_dirs()?;
        let db = Db::new(
            &settings.storage.database_path,
            settings.storage.upload_history_limit,
        );
        db.migrate()?;

        let http = google::http_client(&settings.google)?;
        let mailer: Arc<dyn Mailer> = Arc::new(GmailClient::new(
            http.clone(),
            &settings.google.gmail_api_base,
        ));
        let oauth = OAuthClient::from_config(&settings.google, http);
        if oauth.is_none() {
            log::warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set, token exchange disabled");
        }

        Ok(Self {
            renderer: Arc::new(Renderer::new(&settings.render)),
            storage,
            db,
            sessions: SessionStore::new(),
            mailer,
            oauth,
            settings,
            started_at: Utc::now(),
        })
    }

    #[cfg(test)]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Parses the roster most recently uploaded to `session`.
    pub fn session_roster(&self, session: &Session) -> Result<Roster> {
        let csv = session.csv.as_ref().ok_or_else(|| {
            ApiError::validation(format!("no CSV uploaded for session '{}'", session.id))
        })?;
        let bytes = self.storage.read(&session.id, FileKind::Csv, &csv.filename)?;
        Roster::parse(&bytes, &csv.filename)
    }
}

/// Turns JSON body errors into the API error envelope.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| ApiError::validation(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::validation(err.to_string()).into())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::job_controller::state::{JobUpdate, JobsState};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    /// A context rooted in a fresh temporary directory.
    pub fn context() -> (TempDir, AppContext) {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.storage.upload_dir = dir.path().join("uploads");
        settings.storage.database_path = dir.path().join("certimate.sqlite");
        settings.render.fonts_dir = dir.path().join("fonts");
        let ctx = AppContext::new(settings).unwrap();
        (dir, ctx)
    }

    pub fn jobs() -> (JobsState, mpsc::Receiver<JobUpdate>) {
        JobsState::new()
    }
}
