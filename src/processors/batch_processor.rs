use crate::error::Result;
use crate::processors::{FileProcessor, ProcessedFile};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Result of processing one extracted file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<ProcessedFile>,
}

impl FileOutcome {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Aggregates many point files on a worker pool. Every file gets its own
/// aggregator; results come back in input order.
pub struct BatchProcessor {
    processor: FileProcessor,
    max_workers: usize,
}

impl BatchProcessor {
    pub fn new(processor: FileProcessor, max_workers: usize) -> Self {
        Self {
            processor,
            max_workers: max_workers.max(1),
        }
    }

    pub fn process_files(
        &self,
        paths: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<FileOutcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()?;

        let outcomes = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let outcome = self.process_one(path);
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    outcome
                })
                .collect()
        });

        Ok(outcomes)
    }

    fn process_one(&self, path: &Path) -> FileOutcome {
        FileOutcome {
            path: path.to_path_buf(),
            result: self.processor.process_path(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::processors::GridIndexer;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_outcomes_keep_input_order() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = vec![
            write_file(temp_dir.path(), "201701.prcp.conus.pnt", &["40.1 -90.2 1.0"]),
            write_file(temp_dir.path(), "201701.tave.conus.pnt", &["40.1 -90.2 2.0"]),
            write_file(temp_dir.path(), "201701.wind.conus.pnt", &["40.1 -90.2 3.0"]),
            write_file(temp_dir.path(), "201701.tmin.conus.pnt", &["40.1 -90.2 4.0"]),
        ];

        let processor = FileProcessor::new(GridIndexer::new(0.32, 0.37)?);
        let outcomes = BatchProcessor::new(processor, 3).process_files(&paths, None)?;

        assert_eq!(outcomes.len(), 4);
        for (outcome, path) in outcomes.iter().zip(&paths) {
            assert_eq!(&outcome.path, path);
        }

        assert_eq!(outcomes[1].result.as_ref().unwrap().records[0].value, 2.0);
        assert!(matches!(
            outcomes[2].result,
            Err(ProcessingError::UnrecognizedMeasurementType(_))
        ));
        assert_eq!(outcomes[3].result.as_ref().unwrap().records[0].value, 4.0);
        assert_eq!(outcomes[2].file_name(), "201701.wind.conus.pnt");

        Ok(())
    }

    #[test]
    fn test_failed_file_does_not_affect_others() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = vec![
            write_file(
                temp_dir.path(),
                "201702.tmax.conus.pnt",
                &["40.1 -90.2 10.0", "40.1 -90.2 20.0"],
            ),
            temp_dir.path().join("201702.tmax.missing.pnt"),
        ];

        let processor = FileProcessor::new(GridIndexer::new(0.32, 0.37)?);
        let outcomes = BatchProcessor::new(processor, 0).process_files(&paths, None)?;

        let first = outcomes[0].result.as_ref().unwrap();
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.records[0].value, 15.0);
        assert!(matches!(outcomes[1].result, Err(ProcessingError::Io(_))));

        Ok(())
    }
}
