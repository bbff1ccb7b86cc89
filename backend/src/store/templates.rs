use super::Db;
use crate::error::{ApiError, Result};
use common::model::template::{CertificateTemplate, TextBox};
use rusqlite::{params, OptionalExtension, Row};

const SELECT_COLUMNS: &str =
    "id, session_id, image, image_width, image_height, text_boxes, created_at, updated_at";

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<(CertificateTemplate, String)> {
    let template = CertificateTemplate {
        id: row.get(0)?,
        session_id: row.get(1)?,
        image: row.get(2)?,
        image_width: row.get(3)?,
        image_height: row.get(4)?,
        text_boxes: Vec::new(),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    };
    Ok((template, row.get(5)?))
}

fn with_boxes((mut template, boxes): (CertificateTemplate, String)) -> Result<CertificateTemplate> {
    template.text_boxes = serde_json::from_str::<Vec<TextBox>>(&boxes)?;
    Ok(template)
}

impl Db {
    /// Inserts or updates a template. An update keeps the stored `created_at`.
    pub fn save_template(&self, template: &CertificateTemplate) -> Result<CertificateTemplate> {
        let conn = self.connect()?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT created_at FROM templates WHERE id = ?1",
                params![template.id],
                |row| row.get(0),
            )
            .optional()?;

        let mut saved = template.clone();
        if let Some(created_at) = existing {
            saved.created_at = created_at;
        }
        let boxes = serde_json::to_string(&saved.text_boxes)?;

        conn.execute(
            "INSERT OR REPLACE INTO templates
                 (id, session_id, image, image_width, image_height, text_boxes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                saved.id,
                saved.session_id,
                saved.image,
                saved.image_width,
                saved.image_height,
                boxes,
                saved.created_at,
                saved.updated_at,
            ],
        )?;
        Ok(saved)
    }

    pub fn get_template(&self, id: &str) -> Result<CertificateTemplate> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM templates WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                template_from_row,
            )
            .optional()?
            .ok_or_else(|| ApiError::not_found(format!("template '{}' not found", id)))?;
        with_boxes(row)
    }

    /// Templates of a session, newest first.
    pub fn list_templates(&self, session_id: &str) -> Result<Vec<CertificateTemplate>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM templates WHERE session_id = ?1 ORDER BY updated_at DESC, id",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![session_id], template_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(with_boxes).collect()
    }

    /// Returns whether a template was deleted.
    pub fn delete_template(&self, id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let n = conn.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    pub fn delete_session_templates(&self, session_id: &str) -> Result<usize> {
        let conn = self.connect()?;
        Ok(conn.execute(
            "DELETE FROM templates WHERE session_id = ?1",
            params![session_id],
        )?)
    }
}
