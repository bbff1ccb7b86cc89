use crate::error::{ApiError, Result};
use ab_glyph::FontVec;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// TrueType fonts loaded on first use from `{dir}/{family}-Regular.ttf` and
/// `{dir}/{family}-Bold.ttf`.
pub struct FontLibrary {
    dir: PathBuf,
    default_family: String,
    cache: Mutex<HashMap<(String, bool), Arc<FontVec>>>,
    /// File contents of the default regular face, embedded into PDFs.
    pdf_bytes: Mutex<Option<Arc<Vec<u8>>>>,
}

fn font_path(dir: &Path, family: &str, bold: bool) -> PathBuf {
    let style = if bold { "Bold" } else { "Regular" };
    dir.join(format!("{}-{}.ttf", family, style))
}

fn load(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path)
        .map_err(|e| ApiError::Render(format!("cannot read font {}: {}", path.display(), e)))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| ApiError::Render(format!("invalid font {}: {}", path.display(), e)))
}

impl FontLibrary {
    pub fn new(dir: impl Into<PathBuf>, default_family: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_family: default_family.into(),
            cache: Mutex::new(HashMap::new()),
            pdf_bytes: Mutex::new(None),
        }
    }

    /// Regular font file of the default family.
    pub fn default_regular_path(&self) -> PathBuf {
        font_path(&self.dir, &self.default_family, false)
    }

    /// Returns the requested face, falling back to the default family when
    /// `family` has no files, and to the regular face when no bold exists.
    pub fn font(&self, family: Option<&str>, bold: bool) -> Result<Arc<FontVec>> {
        let family = family
            .map(str::trim)
            .filter(|f| !f.is_empty() && font_path(&self.dir, f, false).is_file())
            .unwrap_or(&self.default_family)
            .to_string();
        let bold = bold && font_path(&self.dir, &family, true).is_file();
        let key = (family, bold);

        let mut cache = self
            .cache
            .lock()
            .map_err(|_| ApiError::internal("font cache lock poisoned"))?;
        if let Some(font) = cache.get(&key) {
            return Ok(font.clone());
        }
        let font = Arc::new(load(&font_path(&self.dir, &key.0, key.1))?);
        log::debug!("Loaded font {} (bold: {})", key.0, key.1);
        cache.insert(key, font.clone());
        Ok(font)
    }

    /// Raw bytes of the default regular face, used for PDF documents. Read
    /// from disk once and shared by every later call.
    pub fn default_regular_bytes(&self) -> Result<Arc<Vec<u8>>> {
        let mut cached = self
            .pdf_bytes
            .lock()
            .map_err(|_| ApiError::internal("font cache lock poisoned"))?;
        if let Some(bytes) = cached.as_ref() {
            return Ok(bytes.clone());
        }
        let path = self.default_regular_path();
        let bytes = std::fs::read(&path)
            .map(Arc::new)
            .map_err(|e| ApiError::Render(format!("cannot read font {}: {}", path.display(), e)))?;
        *cached = Some(bytes.clone());
        Ok(bytes)
    }
}
