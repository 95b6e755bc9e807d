use crate::error::{ProcessingError, Result};
use crate::models::MeasurementType;
use crate::processors::ProcessedFile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Counters for one run across every archive and source file.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub archives_processed: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub observations: usize,
    pub malformed_skipped: usize,
    pub rows_written: BTreeMap<MeasurementType, usize>,
    pub failures: Vec<FileFailure>,
    pub archive_failures: Vec<FileFailure>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            archives_processed: 0,
            files_processed: 0,
            files_skipped: 0,
            observations: 0,
            malformed_skipped: 0,
            rows_written: MeasurementType::ALL.iter().map(|m| (*m, 0)).collect(),
            failures: Vec::new(),
            archive_failures: Vec::new(),
        }
    }

    pub fn record_archive(&mut self) {
        self.archives_processed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.files_skipped += 1;
    }

    pub fn record_file(&mut self, file: &ProcessedFile) {
        self.files_processed += 1;
        self.observations += file.observations;
        self.malformed_skipped += file.malformed_skipped;
        *self.rows_written.entry(file.source.measurement).or_insert(0) += file.records.len();
    }

    pub fn record_failure(&mut self, file: &str, error: &ProcessingError) {
        self.failures.push(FileFailure {
            file: file.to_string(),
            error: error.to_string(),
        });
    }

    /// An archive that never reached the file stage: failed download,
    /// unreadable or unsupported container.
    pub fn record_archive_failure(&mut self, archive: &str, error: &ProcessingError) {
        self.archive_failures.push(FileFailure {
            file: archive.to_string(),
            error: error.to_string(),
        });
    }

    pub fn total_rows(&self) -> usize {
        self.rows_written.values().sum()
    }

    /// `Err(FilesFailed)` when any source file could not be processed,
    /// otherwise `Err(ArchivesFailed)` when any archive was lost whole.
    pub fn ensure_success(&self) -> Result<()> {
        if !self.failures.is_empty() {
            return Err(ProcessingError::FilesFailed {
                failed: self.failures.len(),
                total: self.files_processed + self.failures.len(),
            });
        }
        if !self.archive_failures.is_empty() {
            return Err(ProcessingError::ArchivesFailed {
                failed: self.archive_failures.len(),
                total: self.archives_processed + self.archive_failures.len(),
            });
        }
        Ok(())
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn report(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== ClimGrid Processing Report ===\n");
        summary.push_str(&format!("Archives Processed: {}\n", self.archives_processed));
        summary.push_str(&format!("Archives Failed: {}\n", self.archive_failures.len()));
        summary.push_str(&format!("Files Processed: {}\n", self.files_processed));
        summary.push_str(&format!("Files Skipped: {}\n", self.files_skipped));
        summary.push_str(&format!("Files Failed: {}\n", self.failures.len()));
        summary.push_str(&format!("Observations: {}\n", self.observations));
        summary.push_str(&format!(
            "Malformed Lines Skipped: {}\n",
            self.malformed_skipped
        ));

        summary.push_str(&format!("\nRows Written: {}\n", self.total_rows()));
        for (measurement, rows) in &self.rows_written {
            summary.push_str(&format!(
                "  {} [{}] ({}): {}\n",
                measurement,
                measurement.units(),
                measurement.output_file_name(),
                rows
            ));
        }

        if !self.archive_failures.is_empty() {
            summary.push_str("\nArchive Failures:\n");
            for failure in &self.archive_failures {
                summary.push_str(&format!("  {}: {}\n", failure.file, failure.error));
            }
        }

        if !self.failures.is_empty() {
            summary.push_str("\nFailures:\n");
            for (i, failure) in self.failures.iter().take(10).enumerate() {
                summary.push_str(&format!("  {}. {}: {}\n", i + 1, failure.file, failure.error));
            }
            if self.failures.len() > 10 {
                summary.push_str(&format!("  ... and {} more\n", self.failures.len() - 10));
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregatedRecord;
    use crate::readers::SourceFile;
    use tempfile::TempDir;

    fn processed(name: &str, rows: usize) -> ProcessedFile {
        let source = SourceFile::parse(name).unwrap();
        let records = (0..rows)
            .map(|i| AggregatedRecord {
                year: source.year,
                month: source.month,
                latitude: 40.0 + i as f64,
                longitude: -90.0,
                value: 1.0,
            })
            .collect();

        ProcessedFile {
            source,
            records,
            observations: rows * 3,
            malformed_skipped: 1,
        }
    }

    #[test]
    fn test_counters() {
        let mut summary = RunSummary::new();
        summary.record_archive();
        summary.record_file(&processed("201701.prcp.conus.pnt", 2));
        summary.record_file(&processed("201701.tmax.conus.pnt", 3));
        summary.record_skipped();

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.observations, 15);
        assert_eq!(summary.malformed_skipped, 2);
        assert_eq!(summary.rows_written[&MeasurementType::Precipitation], 2);
        assert_eq!(summary.rows_written[&MeasurementType::MinTemperature], 0);
        assert_eq!(summary.total_rows(), 5);
        assert!(summary.ensure_success().is_ok());
    }

    #[test]
    fn test_failures_surface() {
        let mut summary = RunSummary::new();
        summary.record_file(&processed("201701.prcp.conus.pnt", 1));
        summary.record_failure(
            "201701.snow.conus.pnt",
            &ProcessingError::UnrecognizedMeasurementType("201701.snow.conus.pnt".to_string()),
        );

        let report = summary.report();
        assert!(report.contains("Files Failed: 1"));
        assert!(report.contains("201701.snow.conus.pnt"));
        assert!(report.contains("Precipitation [mm] (precipitation.csv): 1"));

        assert!(matches!(
            summary.ensure_success(),
            Err(ProcessingError::FilesFailed { failed: 1, total: 2 })
        ));
    }

    #[test]
    fn test_archive_failures_surface() {
        let mut summary = RunSummary::new();
        summary.record_archive();
        summary.record_file(&processed("201701.tave.conus.pnt", 1));
        summary.record_archive_failure(
            "201702.pnt.tar.gz",
            &ProcessingError::InvalidFormat("truncated gzip stream".to_string()),
        );

        let report = summary.report();
        assert!(report.contains("Archives Failed: 1"));
        assert!(report.contains("201702.pnt.tar.gz: Invalid data format: truncated gzip stream"));

        assert!(matches!(
            summary.ensure_success(),
            Err(ProcessingError::ArchivesFailed { failed: 1, total: 2 })
        ));
    }

    #[test]
    fn test_write_json() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("run-summary.json");

        let mut summary = RunSummary::new();
        summary.record_file(&processed("201701.tave.conus.pnt", 4));
        summary.write_json(&path)?;

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(value["files_processed"], 1);
        assert_eq!(value["rows_written"]["AverageTemperature"], 4);

        Ok(())
    }
}
