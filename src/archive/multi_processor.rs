use crate::archive::{ArchiveFormat, ArchiveProcessor};
use crate::error::{ProcessingError, Result};
use crate::processors::RunSummary;
use crate::utils::progress::ProgressReporter;
use crate::writers::DatasetWriters;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Local archives found in one directory, in file-name order.
pub struct MultiArchiveProcessor {
    archives: Vec<PathBuf>,
}

impl MultiArchiveProcessor {
    pub fn from_directory(dir_path: &Path, file_pattern: Option<&str>) -> Result<Self> {
        if !dir_path.is_dir() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Path is not a directory: {}",
                dir_path.display()
            )));
        }

        let mut archives = Vec::new();

        for entry in fs::read_dir(dir_path)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if ArchiveFormat::from_file_name(filename).is_none() {
                continue;
            }

            // Apply file pattern filter if specified
            if let Some(pattern) = file_pattern {
                if !pattern.is_empty() && !filename.contains(pattern) {
                    continue;
                }
            }

            archives.push(path);
        }

        if archives.is_empty() {
            return Err(ProcessingError::InvalidFormat(format!(
                "No archives found in directory: {}",
                dir_path.display()
            )));
        }

        // Sort archives by filename for consistent processing order
        archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        info!(count = archives.len(), dir = %dir_path.display(), "found archives");

        Ok(Self { archives })
    }

    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }

    pub fn process_all<W: Write>(
        &self,
        processor: &ArchiveProcessor,
        writers: &mut DatasetWriters<W>,
        summary: &mut RunSummary,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        let total = self.archives.len();

        for (i, archive) in self.archives.iter().enumerate() {
            info!(
                "Processing {} ({}/{})",
                archive.display(),
                i + 1,
                total
            );
            if let Some(p) = progress {
                p.set_message(&format!("Processing archive {}/{}", i + 1, total));
            }

            match processor.process(archive, progress) {
                Ok(report) => report.write_to(writers, summary)?,
                Err(e) => {
                    error!(archive = %archive.display(), error = %e, "failed to process archive");
                    summary.record_archive_failure(&archive_name(archive), &e);
                }
            }
        }

        Ok(())
    }
}

pub(crate) fn archive_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
