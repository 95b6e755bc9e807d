use crate::error::{ProcessingError, Result};
use crate::models::{AggregatedRecord, MeasurementType};
use crate::processors::{FileOutcome, RunSummary};
use crate::utils::constants::CSV_HEADER;
use csv::{Writer, WriterBuilder};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::error;

/// Paths of the four dataset files inside `output_dir`.
pub fn output_paths(output_dir: &Path) -> Vec<PathBuf> {
    MeasurementType::ALL
        .iter()
        .map(|m| output_dir.join(m.output_file_name()))
        .collect()
}

/// One CSV stream per measurement type, each opened with the header row.
pub struct DatasetWriters<W: Write> {
    writers: BTreeMap<MeasurementType, Writer<W>>,
}

impl DatasetWriters<BufWriter<File>> {
    /// Create (truncating) the four output files inside `output_dir`.
    pub fn create(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Self::from_writers(|measurement| {
            let file = File::create(output_dir.join(measurement.output_file_name()))?;
            Ok(BufWriter::new(file))
        })
    }
}

impl<W: Write> DatasetWriters<W> {
    pub fn from_writers<F>(mut open: F) -> Result<Self>
    where
        F: FnMut(MeasurementType) -> Result<W>,
    {
        let mut writers = BTreeMap::new();

        for measurement in MeasurementType::ALL {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .from_writer(open(measurement)?);
            writer.write_record(CSV_HEADER)?;
            writers.insert(measurement, writer);
        }

        Ok(Self { writers })
    }

    pub fn write_record(
        &mut self,
        measurement: MeasurementType,
        record: &AggregatedRecord,
    ) -> Result<()> {
        let writer = self.writers.get_mut(&measurement).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("No output stream for {}", measurement))
        })?;
        writer.write_record(record.to_fields())?;
        Ok(())
    }

    pub fn write_records<'a, I>(&mut self, measurement: MeasurementType, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a AggregatedRecord>,
    {
        let mut written = 0;
        for record in records {
            self.write_record(measurement, record)?;
            written += 1;
        }
        Ok(written)
    }

    /// Write every successful file to its stream and record each outcome in
    /// `summary`. Failed files are logged and contribute no rows.
    pub fn write_outcomes(
        &mut self,
        outcomes: &[FileOutcome],
        summary: &mut RunSummary,
    ) -> Result<()> {
        for outcome in outcomes {
            match &outcome.result {
                Ok(processed) => {
                    self.write_records(processed.source.measurement, &processed.records)?;
                    summary.record_file(processed);
                }
                Err(e) => {
                    error!(file = %outcome.file_name(), error = %e, "failed to process source file");
                    summary.record_failure(&outcome.file_name(), e);
                }
            }
        }

        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and hand back the underlying sinks.
    pub fn into_inner(self) -> Result<BTreeMap<MeasurementType, W>> {
        self.writers
            .into_iter()
            .map(|(measurement, writer)| {
                writer
                    .into_inner()
                    .map(|inner| (measurement, inner))
                    .map_err(|e| ProcessingError::Io(e.into_error()))
            })
            .collect()
    }
}
