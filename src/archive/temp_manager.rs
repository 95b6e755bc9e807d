use crate::archive::ArchiveFormat;
use crate::error::{ProcessingError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tar::Archive;
use tempfile::TempDir;
use tracing::debug;
use zip::ZipArchive;

/// Scoped scratch space for downloads and extracted archive contents.
/// Everything under it is removed when the manager is dropped.
pub struct TempFileManager {
    temp_dir: TempDir,
}

impl TempFileManager {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("climgrid-")
            .tempdir()
            .map_err(|e| {
                ProcessingError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create temporary directory: {}", e),
                ))
            })?;

        Ok(Self { temp_dir })
    }

    pub fn temp_dir_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Unpack `archive_path` into its own subdirectory and return every
    /// extracted regular file, sorted by file name.
    pub fn extract_all(&self, archive_path: &Path) -> Result<Vec<PathBuf>> {
        let format = ArchiveFormat::detect(archive_path)?;
        let dest_dir = self.extraction_dir(archive_path);
        std::fs::create_dir_all(&dest_dir)?;

        debug!(
            archive = %archive_path.display(),
            %format,
            dest = %dest_dir.display(),
            "extracting archive"
        );

        match format {
            ArchiveFormat::TarGz => {
                let file = File::open(archive_path)?;
                Archive::new(GzDecoder::new(BufReader::new(file))).unpack(&dest_dir)?;
            }
            ArchiveFormat::Tar => {
                let file = File::open(archive_path)?;
                Archive::new(BufReader::new(file)).unpack(&dest_dir)?;
            }
            ArchiveFormat::Zip => extract_zip(archive_path, &dest_dir)?,
        }

        let mut files = Vec::new();
        collect_files(&dest_dir, &mut files)?;
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

        Ok(files)
    }

    fn extraction_dir(&self, archive_path: &Path) -> PathBuf {
        let name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().replace('.', "_"))
            .unwrap_or_else(|| "archive".to_string());
        self.temp_dir.path().join(name)
    }

    pub fn cleanup(self) -> Result<()> {
        self.temp_dir.close()?;
        Ok(())
    }
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    for i in 0..archive.len() {
        let mut zip_file = archive.by_index(i)?;

        // Entries escaping the destination are rejected
        let Some(relative) = zip_file.enclosed_name().map(Path::to_path_buf) else {
            return Err(ProcessingError::InvalidFormat(format!(
                "Unsafe path '{}' in archive '{}'",
                zip_file.name(),
                archive_path.display()
            )));
        };

        let dest_path = dest_dir.join(relative);

        if zip_file.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&dest_path)?);
        std::io::copy(&mut zip_file, &mut writer)?;
        writer.flush()?;
    }

    Ok(())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}
