use crate::error::{ProcessingError, Result};
use crate::models::AggregatedRecord;
use crate::processors::{CellAggregator, GridIndexer};
use crate::readers::{PointFileReader, SourceFile};
use crate::settings::MalformedRecordPolicy;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

/// Aggregated output of one source file.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub source: SourceFile,
    pub records: Vec<AggregatedRecord>,
    pub observations: usize,
    pub malformed_skipped: usize,
}

/// Runs parse → index → aggregate for a single point file.
#[derive(Debug, Clone, Copy)]
pub struct FileProcessor {
    indexer: GridIndexer,
    malformed_policy: MalformedRecordPolicy,
}

impl FileProcessor {
    pub fn new(indexer: GridIndexer) -> Self {
        Self {
            indexer,
            malformed_policy: MalformedRecordPolicy::Skip,
        }
    }

    pub fn with_malformed_policy(mut self, policy: MalformedRecordPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    pub fn process_path(&self, path: &Path) -> Result<ProcessedFile> {
        let source = SourceFile::from_path(path)?;
        let reader = PointFileReader::open(path)?;
        self.aggregate(source, reader)
    }

    pub fn process_reader<R: BufRead>(&self, file_name: &str, reader: R) -> Result<ProcessedFile> {
        let source = SourceFile::parse(file_name)?;
        self.aggregate(source, PointFileReader::new(reader))
    }

    fn aggregate<R: BufRead>(
        &self,
        source: SourceFile,
        reader: PointFileReader<R>,
    ) -> Result<ProcessedFile> {
        let mut aggregator = CellAggregator::new(self.indexer);
        let mut malformed_skipped = 0;

        for result in reader {
            match result {
                Ok(observation) => aggregator.observe(&observation),
                Err(ProcessingError::MalformedRecord { line, reason })
                    if self.malformed_policy == MalformedRecordPolicy::Skip =>
                {
                    warn!(file = %source.name, line, %reason, "skipping malformed record");
                    malformed_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let observations = aggregator.observation_count();
        let records: Vec<AggregatedRecord> = aggregator
            .finish()
            .map(|average| average.into_record(source.year, source.month))
            .collect();

        debug!(
            file = %source.name,
            observations,
            cells = records.len(),
            malformed_skipped,
            "aggregated source file"
        );

        Ok(ProcessedFile {
            source,
            records,
            observations,
            malformed_skipped,
        })
    }
}
