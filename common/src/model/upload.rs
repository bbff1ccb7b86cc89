use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sub-folder of a session directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Template,
    Csv,
    Certificate,
    Preview,
}

impl FileKind {
    pub const ALL: [FileKind; 4] = [
        FileKind::Template,
        FileKind::Csv,
        FileKind::Certificate,
        FileKind::Preview,
    ];

    /// Directory name used on disk and in file-serving URLs.
    pub fn dir_name(self) -> &'static str {
        match self {
            FileKind::Template => "templates",
            FileKind::Csv => "csv",
            FileKind::Certificate => "certificates",
            FileKind::Preview => "preview",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Template => "template",
            FileKind::Csv => "csv",
            FileKind::Certificate => "certificate",
            FileKind::Preview => "preview",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = String;

    /// Accepts both the singular kind and the directory name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.dir_name() == s)
            .ok_or_else(|| format!("unknown file kind '{}'", s))
    }
}

/// A file stored for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub kind: FileKind,
    pub filename: String,
    pub file_path: String,
    pub file_size: u64,
    pub file_type: String,
    pub md5: String,
    pub uploaded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_str_accepts_dir_names() {
        assert_eq!("templates".parse::<FileKind>(), Ok(FileKind::Template));
        assert_eq!("certificate".parse::<FileKind>(), Ok(FileKind::Certificate));
        assert!("../etc".parse::<FileKind>().is_err());
    }
}
