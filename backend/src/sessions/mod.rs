//! In-memory state of user sessions.
//!
//! A session ties together the latest template and roster a user uploaded, the
//! roster statistics, and the column mappings they last validated. Sessions
//! live in a shared `RwLock<HashMap>` and are dropped by [`start_session_sweeper`]
//! once idle for longer than the configured TTL.

use crate::error::{ApiError, Result};
use crate::job_controller::state::JobsState;
use crate::storage::FileStorage;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use common::model::csv::CsvStats;
use common::model::mapping::CsvMapping;
use common::model::upload::UploadedFile;
use common::responses::SessionSummary;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub template: Option<UploadedFile>,
    pub csv: Option<UploadedFile>,
    pub csv_stats: Option<CsvStats>,
    pub mappings: Vec<CsvMapping>,
}

impl Session {
    fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            last_access: now,
            template: None,
            csv: None,
            csv_stats: None,
            mappings: Vec::new(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            created_at: self.created_at.to_rfc3339(),
            last_access: self.last_access.to_rfc3339(),
            template: self.template.clone(),
            csv: self.csv.clone(),
            csv_stats: self.csv_stats.clone(),
            mappings: self.mappings.clone(),
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Session {
        let session = Session::new(uuid::Uuid::new_v4().to_string(), Utc::now());
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        log::info!("Created session {}", session.id);
        session
    }

    /// Returns a snapshot of the session and refreshes its last access time.
    pub async fn get(&self, id: &str) -> Result<Session> {
        self.update(id, |_| ()).await
    }

    pub async fn set_template(&self, id: &str, file: UploadedFile) -> Result<Session> {
        self.update(id, |s| s.template = Some(file)).await
    }

    /// Replaces the roster. Mappings made against the previous roster are cleared.
    pub async fn set_csv(&self, id: &str, file: UploadedFile, stats: CsvStats) -> Result<Session> {
        self.update(id, |s| {
            s.csv = Some(file);
            s.csv_stats = Some(stats);
            s.mappings.clear();
        })
        .await
    }

    pub async fn set_mappings(&self, id: &str, mappings: Vec<CsvMapping>) -> Result<Session> {
        self.update(id, |s| s.mappings = mappings).await
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Ids of sessions idle for longer than `ttl` at `now`.
    pub async fn expired(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<String> {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX);
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| now.signed_duration_since(s.last_access) > ttl)
            .map(|s| s.id.clone())
            .collect()
    }

    async fn update<F>(&self, id: &str, apply: F) -> Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(format!("session '{}' not found", id)))?;
        apply(session);
        session.last_access = Utc::now();
        Ok(session.clone())
    }
}

/// Drops sessions idle for longer than `ttl` at `now`, together with their
/// files and generation jobs. Returns the ids that were expired.
pub async fn sweep_expired(
    store: &SessionStore,
    storage: &FileStorage,
    jobs: &JobsState,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Vec<String> {
    let expired = store.expired(now, ttl).await;
    for id in &expired {
        store.remove(id).await;
        let removed_jobs = jobs.remove_session(id).await;
        match storage.remove_session(id) {
            Ok(removed) => log::info!(
                "Expired session {} ({} files, {} jobs removed)",
                id,
                removed,
                removed_jobs
            ),
            Err(e) => log::warn!("Failed to remove files of expired session {}: {}", id, e),
        }
    }
    expired
}

/// Periodically runs [`sweep_expired`]. `interval` must be non-zero.
pub async fn start_session_sweeper(
    store: SessionStore,
    storage: FileStorage,
    jobs: JobsState,
    ttl: Duration,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        sweep_expired(&store, &storage, &jobs, Utc::now(), ttl).await;
    }
}
