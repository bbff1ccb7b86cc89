use crate::error::{ApiError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn zip_error(err: zip::result::ZipError) -> ApiError {
    ApiError::internal(format!("cannot write archive: {}", err))
}

/// Writes `files` flat into a deflated ZIP at `archive`.
///
/// The archive is built next to its destination and renamed into place once
/// complete, so a download never sees a half-written file.
pub fn write_zip(archive: &Path, files: &[PathBuf]) -> Result<()> {
    let dir = archive
        .parent()
        .ok_or_else(|| ApiError::internal("archive path has no parent directory"))?;
    fs::create_dir_all(dir)?;
    let tmp = NamedTempFile::new_in(dir)?;
    let mut zip = ZipWriter::new(tmp.reopen()?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        zip.start_file(name, options).map_err(zip_error)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }
    zip.finish().map_err(zip_error)?;
    tmp.persist(archive).map_err(|e| ApiError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_archive_contains_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("certificate_0001_Ada.png");
        let b = dir.path().join("certificate_0002_Alan.png");
        fs::write(&a, b"first").unwrap();
        fs::write(&b, b"second").unwrap();
        let archive = dir.path().join("out").join("job.zip");

        write_zip(&archive, &[a, b]).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);
        let mut content = String::new();
        zip.by_name("certificate_0002_Alan.png")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "second");
    }
}
