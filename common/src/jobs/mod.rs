use serde::{Deserialize, Serialize};

/// Lifecycle of a generation job.
///
/// `Queued -> Processing -> Completed | CompletedWithErrors | Failed`.
/// The last three are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Queued,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationStatus::Completed
                | GenerationStatus::CompletedWithErrors
                | GenerationStatus::Failed
        )
    }
}

/// Encoding of the generated certificates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// A single roster row that could not be turned into a certificate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobItemError {
    pub item_id: String,
    pub error: String,
    pub timestamp: String,
}

/// Tracks one batch of certificates rendered from a template and a roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub job_id: String,
    pub session_id: String,
    pub template_id: String,
    pub status: GenerationStatus,
    pub output_format: OutputFormat,
    pub total_items: usize,
    pub processed_items: usize,
    pub successful_items: usize,
    pub failed_items: usize,
    /// Path of the ZIP archive once the job has produced one.
    pub output_path: Option<String>,
    pub download_url: Option<String>,
    /// Fatal error that aborted the job.
    pub error: Option<String>,
    pub errors: Vec<JobItemError>,
    pub created_at: String,
    pub updated_at: String,
}

impl GenerationJob {
    pub fn new(
        job_id: String,
        session_id: String,
        template_id: String,
        output_format: OutputFormat,
        total_items: usize,
        now: String,
    ) -> Self {
        Self {
            job_id,
            session_id,
            template_id,
            status: GenerationStatus::Queued,
            output_format,
            total_items,
            processed_items: 0,
            successful_items: 0,
            failed_items: 0,
            output_path: None,
            download_url: None,
            error: None,
            errors: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Moves a queued job to `Processing`, fixing the number of rows.
    pub fn start(&mut self, total_items: usize, now: String) {
        if self.status != GenerationStatus::Queued {
            return;
        }
        self.status = GenerationStatus::Processing;
        self.total_items = total_items;
        self.updated_at = now;
    }

    /// Records the outcome of one row. Updates past `total_items` are ignored.
    pub fn record_item(&mut self, outcome: Result<(), JobItemError>, now: String) {
        if self.status.is_terminal() || self.processed_items >= self.total_items {
            return;
        }
        if self.status == GenerationStatus::Queued {
            self.status = GenerationStatus::Processing;
        }
        self.processed_items += 1;
        match outcome {
            Ok(()) => self.successful_items += 1,
            Err(item_error) => {
                self.failed_items += 1;
                self.errors.push(item_error);
            }
        }
        self.updated_at = now;
    }

    /// Closes the job after all rows were processed.
    ///
    /// A job that produced nothing is `Failed` even if no fatal error occurred.
    pub fn finish(&mut self, output: Option<(String, String)>, now: String) {
        if self.status.is_terminal() {
            return;
        }
        match output {
            Some((output_path, download_url)) if self.successful_items > 0 => {
                self.output_path = Some(output_path);
                self.download_url = Some(download_url);
                self.status = if self.failed_items == 0 {
                    GenerationStatus::Completed
                } else {
                    GenerationStatus::CompletedWithErrors
                };
            }
            _ => {
                self.status = GenerationStatus::Failed;
                if self.error.is_none() {
                    self.error = Some("no certificates were generated".to_string());
                }
            }
        }
        self.updated_at = now;
    }

    /// Aborts the job with a fatal error.
    pub fn fail(&mut self, error: String, now: String) {
        if self.status.is_terminal() {
            return;
        }
        self.status = GenerationStatus::Failed;
        self.error = Some(error);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(total: usize) -> GenerationJob {
        GenerationJob::new(
            "j".into(),
            "s".into(),
            "t".into(),
            OutputFormat::Png,
            total,
            "t0".into(),
        )
    }

    fn item_err(id: &str) -> JobItemError {
        JobItemError {
            item_id: id.into(),
            error: "Empty name".into(),
            timestamp: "t".into(),
        }
    }

    #[test]
    fn test_all_rows_succeed() {
        let mut j = job(2);
        j.start(2, "t1".into());
        j.record_item(Ok(()), "t2".into());
        j.record_item(Ok(()), "t3".into());
        j.finish(Some(("a.zip".into(), "/dl".into())), "t4".into());
        assert_eq!(j.status, GenerationStatus::Completed);
        assert_eq!(j.processed_items, 2);
        assert_eq!(j.output_path.as_deref(), Some("a.zip"));
    }

    #[test]
    fn test_partial_failure() {
        let mut j = job(2);
        j.start(2, "t1".into());
        j.record_item(Ok(()), "t2".into());
        j.record_item(Err(item_err("row_2")), "t3".into());
        j.finish(Some(("a.zip".into(), "/dl".into())), "t4".into());
        assert_eq!(j.status, GenerationStatus::CompletedWithErrors);
        assert_eq!(j.errors.len(), 1);
        assert_eq!(j.processed_items, j.successful_items + j.failed_items);
    }

    #[test]
    fn test_nothing_generated_is_failed() {
        let mut j = job(1);
        j.start(1, "t1".into());
        j.record_item(Err(item_err("row_1")), "t2".into());
        j.finish(None, "t3".into());
        assert_eq!(j.status, GenerationStatus::Failed);
        assert!(j.error.is_some());
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut j = job(3);
        j.fail("boom".into(), "t1".into());
        j.record_item(Ok(()), "t2".into());
        j.start(3, "t3".into());
        j.finish(Some(("a.zip".into(), "/dl".into())), "t4".into());
        assert_eq!(j.status, GenerationStatus::Failed);
        assert_eq!(j.processed_items, 0);
        assert_eq!(j.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_extra_items_ignored() {
        let mut j = job(1);
        j.start(1, "t1".into());
        j.record_item(Ok(()), "t2".into());
        j.record_item(Ok(()), "t3".into());
        assert_eq!(j.processed_items, 1);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let s = serde_json::to_string(&GenerationStatus::CompletedWithErrors).unwrap();
        assert_eq!(s, "\"completed_with_errors\"");
    }
}
