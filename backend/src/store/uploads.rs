use super::Db;
use crate::error::{ApiError, Result};
use common::model::upload::{FileKind, UploadedFile};
use rusqlite::{params, OptionalExtension, Row};

fn upload_from_row(row: &Row<'_>) -> rusqlite::Result<(String, UploadedFile)> {
    let kind: String = row.get(0)?;
    let size: i64 = row.get(3)?;
    Ok((
        kind,
        UploadedFile {
            kind: FileKind::Template,
            filename: row.get(1)?,
            file_path: row.get(2)?,
            file_size: size.max(0) as u64,
            file_type: row.get(4)?,
            md5: row.get(5)?,
            uploaded_at: row.get(6)?,
        },
    ))
}

fn with_kind((kind, mut file): (String, UploadedFile)) -> Result<UploadedFile> {
    file.kind = kind.parse().map_err(ApiError::internal)?;
    Ok(file)
}

impl Db {
    /// Stores an upload and trims the session's history for that kind.
    pub fn record_upload(&self, session_id: &str, file: &UploadedFile) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO uploads
                 (session_id, kind, filename, file_path, file_size, file_type, md5, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session_id,
                file.kind.as_str(),
                file.filename,
                file.file_path,
                file.file_size as i64,
                file.file_type,
                file.md5,
                file.uploaded_at,
            ],
        )?;
        let trimmed = conn.execute(
            "DELETE FROM uploads
             WHERE session_id = ?1 AND kind = ?2 AND id NOT IN (
                 SELECT id FROM uploads WHERE session_id = ?1 AND kind = ?2
                 ORDER BY id DESC LIMIT ?3
             )",
            params![session_id, file.kind.as_str(), self.history_limit as i64],
        )?;
        if trimmed > 0 {
            log::debug!(
                "Trimmed {} old {} uploads for session {}",
                trimmed,
                file.kind,
                session_id
            );
        }
        Ok(())
    }

    pub fn latest_upload(&self, session_id: &str, kind: FileKind) -> Result<Option<UploadedFile>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT kind, filename, file_path, file_size, file_type, md5, uploaded_at
                 FROM uploads WHERE session_id = ?1 AND kind = ?2
                 ORDER BY id DESC LIMIT 1",
                params![session_id, kind.as_str()],
                upload_from_row,
            )
            .optional()?;
        row.map(with_kind).transpose()
    }

    /// Uploads of one kind, newest first.
    pub fn upload_history(&self, session_id: &str, kind: FileKind) -> Result<Vec<UploadedFile>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT kind, filename, file_path, file_size, file_type, md5, uploaded_at
             FROM uploads WHERE session_id = ?1 AND kind = ?2
             ORDER BY id DESC",
        )?;
        let rows = stmt
            .query_map(params![session_id, kind.as_str()], upload_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(with_kind).collect()
    }

    pub fn delete_session_uploads(&self, session_id: &str) -> Result<usize> {
        let conn = self.connect()?;
        Ok(conn.execute(
            "DELETE FROM uploads WHERE session_id = ?1",
            params![session_id],
        )?)
    }
}
