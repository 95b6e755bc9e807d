use crate::archive::TempFileManager;
use crate::error::Result;
use crate::processors::{BatchProcessor, FileOutcome, RunSummary};
use crate::utils::constants::README_MARKER;
use crate::utils::progress::ProgressReporter;
use crate::writers::DatasetWriters;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything one archive produced.
#[derive(Debug)]
pub struct ArchiveReport {
    pub archive: PathBuf,
    pub outcomes: Vec<FileOutcome>,
    pub skipped: Vec<PathBuf>,
}

impl ArchiveReport {
    /// Append the archive's rows to the output streams and count it in
    /// `summary`.
    pub fn write_to<W: Write>(
        &self,
        writers: &mut DatasetWriters<W>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        summary.record_archive();

        for _ in &self.skipped {
            summary.record_skipped();
        }

        writers.write_outcomes(&self.outcomes, summary)
    }
}

pub struct ArchiveProcessor {
    batch: BatchProcessor,
}

impl ArchiveProcessor {
    pub fn new(batch: BatchProcessor) -> Self {
        Self { batch }
    }

    /// Extract `archive_path` into scratch space and aggregate every point
    /// file inside it. Scratch space is released before returning.
    pub fn process(
        &self,
        archive_path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<ArchiveReport> {
        let temp_manager = TempFileManager::new()?;
        let extracted = temp_manager.extract_all(archive_path)?;

        let (skipped, data_files): (Vec<PathBuf>, Vec<PathBuf>) =
            extracted.into_iter().partition(|path| is_readme(path));

        info!(
            archive = %archive_path.display(),
            files = data_files.len(),
            skipped = skipped.len(),
            "extracted archive"
        );

        let outcomes = self.batch.process_files(&data_files, progress)?;
        temp_manager.cleanup()?;

        Ok(ArchiveReport {
            archive: archive_path.to_path_buf(),
            outcomes,
            skipped,
        })
    }
}

fn is_readme(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains(README_MARKER))
        .unwrap_or(false)
}
