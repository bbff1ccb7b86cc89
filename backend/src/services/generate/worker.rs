//! # Generation Worker
//!
//! The blocking half of a generation job. Runs on a `spawn_blocking` thread
//! and reports through `JobUpdate` messages only:
//!
//! 1.  `Started` with the number of rows.
//! 2.  One `Item` per row, in row order. Rows are rendered in chunks of
//!     `chunk_size`, each chunk in parallel on the rayon pool.
//! 3.  `Finished` with the archive once every row has been reported.
//!
//! A row fails on its own (empty name, render or write error). Anything that
//! prevents the job as a whole from running is returned as an error and
//! turned into `Failed` by the caller.

use crate::error::Result;
use crate::job_controller::state::JobUpdate;
use crate::render::{load_background, Renderer};
use crate::roster::Roster;
use crate::services::mapping::resolve::{row_values, Binding};
use crate::storage::sanitize_filename;
use chrono::Utc;
use common::jobs::{JobItemError, OutputFormat};
use common::model::template::TextBox;
use image::RgbaImage;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::archive::write_zip;

const AUDIT_TARGET: &str = "certimate::audit";

/// Everything a worker needs, resolved up front by the request handler.
pub struct GenerationPlan {
    pub job_id: String,
    pub session_id: String,
    pub background: Vec<u8>,
    pub text_boxes: Vec<TextBox>,
    pub roster: Roster,
    pub bindings: Vec<Binding>,
    /// Column whose value names each output file.
    pub name_column: Option<usize>,
    pub output_format: OutputFormat,
    pub job_dir: PathBuf,
    pub archive_path: PathBuf,
    pub download_url: String,
    pub chunk_size: usize,
    pub renderer: Arc<Renderer>,
}

fn send(tx: &mpsc::Sender<JobUpdate>, update: JobUpdate) {
    if tx.blocking_send(update).is_err() {
        log::warn!("Job update channel closed");
    }
}

/// Runs the whole job. Returns an error only for job-level failures; per-row
/// failures have already been reported as `Item` updates.
pub fn run(plan: &GenerationPlan, tx: &mpsc::Sender<JobUpdate>) -> Result<()> {
    send(
        tx,
        JobUpdate::Started {
            job_id: plan.job_id.clone(),
            total: plan.roster.len(),
        },
    );

    fs::create_dir_all(&plan.job_dir)?;
    let background = load_background(&plan.background)?;
    let chunk_size = plan.chunk_size.max(1);

    let mut produced = Vec::new();
    for (chunk_index, chunk) in plan.roster.rows().chunks(chunk_size).enumerate() {
        let offset = chunk_index * chunk_size;
        let outcomes: Vec<std::result::Result<PathBuf, String>> = chunk
            .par_iter()
            .enumerate()
            .map(|(i, row)| render_row(plan, &background, offset + i, row))
            .collect();

        for (i, outcome) in outcomes.into_iter().enumerate() {
            let index = offset + i;
            let outcome = match outcome {
                Ok(path) => {
                    produced.push(path);
                    Ok(())
                }
                Err(error) => {
                    log::error!(
                        target: AUDIT_TARGET,
                        "job={} session={} row={} failed: {}",
                        plan.job_id,
                        plan.session_id,
                        index + 1,
                        error
                    );
                    Err(JobItemError {
                        item_id: format!("row_{}", index + 1),
                        error,
                        timestamp: Utc::now().to_rfc3339(),
                    })
                }
            };
            send(
                tx,
                JobUpdate::Item {
                    job_id: plan.job_id.clone(),
                    outcome,
                },
            );
        }
    }

    let output = if produced.is_empty() {
        None
    } else {
        write_zip(&plan.archive_path, &produced)?;
        Some((
            plan.archive_path.to_string_lossy().into_owned(),
            plan.download_url.clone(),
        ))
    };
    log::info!(
        target: AUDIT_TARGET,
        "job={} session={} produced {} of {} certificates",
        plan.job_id,
        plan.session_id,
        produced.len(),
        plan.roster.len()
    );
    send(
        tx,
        JobUpdate::Finished {
            job_id: plan.job_id.clone(),
            output,
        },
    );
    Ok(())
}

/// File name of the certificate for row `index` (0-based).
pub fn certificate_filename(index: usize, name: &str, format: OutputFormat) -> String {
    format!(
        "certificate_{:04}_{}.{}",
        index + 1,
        sanitize_filename(name),
        format.extension()
    )
}

fn render_row(
    plan: &GenerationPlan,
    background: &RgbaImage,
    index: usize,
    row: &[String],
) -> std::result::Result<PathBuf, String> {
    let name = plan
        .name_column
        .and_then(|c| row.get(c))
        .map(|v| v.trim())
        .unwrap_or("");
    if name.is_empty() {
        return Err("Empty name".to_string());
    }

    let values = row_values(&plan.bindings, row);
    let encoded = plan
        .renderer
        .render(background, &plan.text_boxes, &values)
        .and_then(|image| plan.renderer.encode(&image, plan.output_format, name))
        .map_err(|e| e.to_string())?;

    let path = plan
        .job_dir
        .join(certificate_filename(index, name, plan.output_format));
    fs::write(&path, encoded).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    log::info!(
        target: AUDIT_TARGET,
        "job={} row={} name={:?} file={}",
        plan.job_id,
        index + 1,
        name,
        path.display()
    );
    Ok(path)
}
