//! On-disk layout of uploaded and generated files.
//!
//! Every session owns one directory under the configured upload root:
//!
//! ```text
//! uploads/
//!   {session_id}/
//!     templates/     background images
//!     csv/           rosters
//!     certificates/  generated output, one folder and one ZIP per job
//!     preview/       last rendered preview
//! ```
//!
//! File names coming from clients are sanitised before they touch the disk, and
//! every lookup rejects names that could escape the session directory.

use crate::error::{ApiError, Result};
use common::model::upload::{FileKind, UploadedFile};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const MAX_ID_LEN: usize = 64;

#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    // Only the final path component counts.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub fn validate_session_id(session_id: &str) -> Result<()> {
    if is_safe_id(session_id) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "invalid session id '{}'",
            session_id
        )))
    }
}

pub fn validate_job_id(job_id: &str) -> Result<()> {
    if is_safe_id(job_id) {
        Ok(())
    } else {
        Err(ApiError::validation(format!("invalid job id '{}'", job_id)))
    }
}

fn check_filename(filename: &str) -> Result<()> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(ApiError::validation(format!(
            "invalid file name '{}'",
            filename
        )));
    }
    Ok(())
}

/// Lower-cased extension without the dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn count_files(dir: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            count += count_files(&entry.path())?;
        } else {
            count += 1;
        }
    }
    Ok(count)
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn session_dir(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.root.join(session_id))
    }

    pub fn kind_dir(&self, session_id: &str, kind: FileKind) -> Result<PathBuf> {
        Ok(self.session_dir(session_id)?.join(kind.dir_name()))
    }

    pub fn ensure_session_dirs(&self, session_id: &str) -> Result<PathBuf> {
        let dir = self.session_dir(session_id)?;
        for kind in FileKind::ALL {
            fs::create_dir_all(dir.join(kind.dir_name()))?;
        }
        Ok(dir)
    }

    /// Writes `bytes` under the session's `kind` folder.
    ///
    /// The content lands in a temporary file first and is renamed into place,
    /// so readers never observe a partial file.
    pub fn save(
        &self,
        session_id: &str,
        kind: FileKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadedFile> {
        self.ensure_session_dirs(session_id)?;
        let dir = self.kind_dir(session_id, kind)?;
        let safe_name = sanitize_filename(filename);
        let target = dir.join(&safe_name);

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| ApiError::Io(e.error))?;

        let digest = md5::compute(bytes);
        Ok(UploadedFile {
            kind,
            file_type: extension_of(&safe_name),
            filename: safe_name,
            file_path: target.to_string_lossy().into_owned(),
            file_size: bytes.len() as u64,
            md5: format!("{:x}", digest),
            uploaded_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Folder holding the certificates of one generation job.
    pub fn job_dir(&self, session_id: &str, job_id: &str) -> Result<PathBuf> {
        validate_job_id(job_id)?;
        Ok(self.kind_dir(session_id, FileKind::Certificate)?.join(job_id))
    }

    pub fn job_archive(&self, session_id: &str, job_id: &str) -> Result<PathBuf> {
        validate_job_id(job_id)?;
        Ok(self
            .kind_dir(session_id, FileKind::Certificate)?
            .join(format!("{}.zip", job_id)))
    }

    /// Path of a stored file. The file itself may not exist.
    pub fn resolve(&self, session_id: &str, kind: FileKind, filename: &str) -> Result<PathBuf> {
        check_filename(filename)?;
        Ok(self.kind_dir(session_id, kind)?.join(filename))
    }

    pub fn read(&self, session_id: &str, kind: FileKind, filename: &str) -> Result<Vec<u8>> {
        let path = self.resolve(session_id, kind, filename)?;
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ApiError::not_found(format!("{} '{}' not found", kind, filename))
            }
            _ => ApiError::Io(e),
        })
    }

    pub fn exists(&self, session_id: &str, kind: FileKind, filename: &str) -> bool {
        self.resolve(session_id, kind, filename)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Deletes the whole session directory, returning how many files it held.
    pub fn remove_session(&self, session_id: &str) -> Result<usize> {
        let dir = self.session_dir(session_id)?;
        if !dir.exists() {
            return Ok(0);
        }
        let removed = count_files(&dir)?;
        fs::remove_dir_all(&dir)?;
        log::info!("Removed {} files for session {}", removed, session_id);
        Ok(removed)
    }
}
