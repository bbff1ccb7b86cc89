//! Manages the state of background certificate generation jobs.
//!
//! Generation runs outside the request/response cycle on a blocking thread.
//! Workers never touch the job map directly: they push [`JobUpdate`] messages
//! into an mpsc channel, and a single [`start_job_updater`] task applies them
//! to the shared [`JobsState`]. The transitions themselves live on
//! `GenerationJob`, so an update that arrives after a job reached a terminal
//! state is ignored there.
//!
//! The main components are:
//! - `JobsState`: clonable, shared map of jobs plus the sender used by workers.
//!   It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: one message per state change reported by a worker.
//! - `start_job_updater`: the long-running task that applies updates.

use chrono::Utc;
use common::jobs::{GenerationJob, JobItemError};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Capacity of the update channel created by [`JobsState::new`].
pub const UPDATE_CHANNEL_CAPACITY: usize = 1024;

/// A thread-safe, shareable container for every generation job.
#[derive(Clone)]
pub struct JobsState {
    /// Job id to its current state. Read by the status endpoints, written by
    /// `start_job_updater` and by `register` when a job is accepted.
    pub jobs: Arc<RwLock<HashMap<String, GenerationJob>>>,

    /// Sender cloned into each worker.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// A state change reported by a generation worker.
#[derive(Debug)]
pub enum JobUpdate {
    /// The worker picked the job up and knows how many rows it will render.
    Started { job_id: String, total: usize },
    /// One row finished, successfully or not.
    Item {
        job_id: String,
        outcome: Result<(), JobItemError>,
    },
    /// All rows were processed; carries the archive path and download URL if one was written.
    Finished {
        job_id: String,
        output: Option<(String, String)>,
    },
    /// The job aborted.
    Failed { job_id: String, error: String },
}

impl JobUpdate {
    pub fn job_id(&self) -> &str {
        match self {
            JobUpdate::Started { job_id, .. }
            | JobUpdate::Item { job_id, .. }
            | JobUpdate::Finished { job_id, .. }
            | JobUpdate::Failed { job_id, .. } => job_id,
        }
    }

    /// Applies the update to `job`.
    pub fn apply(self, job: &mut GenerationJob) {
        let now = Utc::now().to_rfc3339();
        match self {
            JobUpdate::Started { total, .. } => job.start(total, now),
            JobUpdate::Item { outcome, .. } => job.record_item(outcome, now),
            JobUpdate::Finished { output, .. } => job.finish(output, now),
            JobUpdate::Failed { error, .. } => job.fail(error, now),
        }
    }
}

impl JobsState {
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn register(&self, job: GenerationJob) {
        self.jobs.write().await.insert(job.job_id.clone(), job);
    }

    pub async fn get(&self, job_id: &str) -> Option<GenerationJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Drops every job of `session_id` and returns how many were removed.
    ///
    /// Called when a session's files are deleted, so no status is left
    /// pointing at a removed archive. Updates still in flight for a removed
    /// job are logged and discarded by [`apply_update`].
    pub async fn remove_session(&self, session_id: &str) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| job.session_id != session_id);
        before - jobs.len()
    }
}

/// Applies one update to the job it names.
pub async fn apply_update(state: &JobsState, update: JobUpdate) {
    let mut jobs = state.jobs.write().await;
    match jobs.get_mut(update.job_id()) {
        Some(job) => {
            update.apply(job);
            if job.status.is_terminal() {
                log::info!(
                    "Job {} finished as {:?}: {}/{} succeeded",
                    job.job_id,
                    job.status,
                    job.successful_items,
                    job.total_items
                );
            }
        }
        None => log::warn!("Update for unknown job {}", update.job_id()),
    }
}

/// Starts the central job state updater task.
///
/// Spawned once from `main.rs` and runs for the lifetime of the server.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        apply_update(&state, update).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::jobs::{GenerationStatus, OutputFormat};

    fn job(id: &str) -> GenerationJob {
        job_in(id, "s1")
    }

    fn job_in(id: &str, session_id: &str) -> GenerationJob {
        GenerationJob::new(
            id.into(),
            session_id.into(),
            "t1".into(),
            OutputFormat::Png,
            0,
            Utc::now().to_rfc3339(),
        )
    }

    #[tokio::test]
    async fn test_updates_drive_job_to_completion() {
        let (state, mut rx) = JobsState::new();
        state.register(job("j1")).await;

        let updates = vec![
            JobUpdate::Started {
                job_id: "j1".into(),
                total: 2,
            },
            JobUpdate::Item {
                job_id: "j1".into(),
                outcome: Ok(()),
            },
            JobUpdate::Item {
                job_id: "j1".into(),
                outcome: Err(JobItemError {
                    item_id: "row_2".into(),
                    error: "Empty name".into(),
                    timestamp: Utc::now().to_rfc3339(),
                }),
            },
            JobUpdate::Finished {
                job_id: "j1".into(),
                output: Some(("j1.zip".into(), "/api/generate/download/j1".into())),
            },
            JobUpdate::Failed {
                job_id: "unknown".into(),
                error: "ignored".into(),
            },
        ];
        for update in updates {
            state.tx.send(update).await.unwrap();
        }
        while let Ok(update) = rx.try_recv() {
            apply_update(&state, update).await;
        }

        let job = state.get("j1").await.unwrap();
        assert_eq!(job.status, GenerationStatus::CompletedWithErrors);
        assert_eq!(job.processed_items, 2);
        assert_eq!(job.failed_items, 1);
        assert_eq!(job.download_url.as_deref(), Some("/api/generate/download/j1"));
        assert!(state.get("unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_spawned_updater_applies_failure() {
        let (state, rx) = JobsState::new();
        state.register(job("j2")).await;
        tokio::spawn(start_job_updater(state.clone(), rx));
        state
            .tx
            .send(JobUpdate::Failed {
                job_id: "j2".into(),
                error: "template missing".into(),
            })
            .await
            .unwrap();

        let mut job = state.get("j2").await.unwrap();
        for _ in 0..200 {
            if job.status.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            job = state.get("j2").await.unwrap();
        }
        assert_eq!(job.status, GenerationStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("template missing"));
    }

    #[tokio::test]
    async fn test_remove_session_drops_only_its_jobs() {
        let (state, _rx) = JobsState::new();
        state.register(job_in("a1", "alice")).await;
        state.register(job_in("a2", "alice")).await;
        state.register(job_in("b1", "bob")).await;

        assert_eq!(state.remove_session("alice").await, 2);
        assert!(state.get("a1").await.is_none());
        assert!(state.get("a2").await.is_none());
        assert!(state.get("b1").await.is_some());
        assert_eq!(state.remove_session("alice").await, 0);

        // A late update for an evicted job is discarded.
        apply_update(
            &state,
            JobUpdate::Started {
                job_id: "a1".into(),
                total: 1,
            },
        )
        .await;
        assert!(state.get("a1").await.is_none());
    }
}
