use crate::error::{ProcessingError, Result};
use crate::models::Observation;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse one `latitude longitude value` line.
///
/// Returns `Ok(None)` for a line with no tokens. The line number is only
/// used to build the error.
pub fn parse_record(line: &str, line_number: usize) -> Result<Option<Observation>> {
    let mut tokens = line.split_whitespace();

    let Some(first) = tokens.next() else {
        return Ok(None);
    };

    let (Some(second), Some(third), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ProcessingError::MalformedRecord {
            line: line_number,
            reason: format!(
                "expected 3 whitespace-separated values, got {}",
                line.split_whitespace().count()
            ),
        });
    };

    let latitude = parse_value(first, "latitude", line_number)?;
    let longitude = parse_value(second, "longitude", line_number)?;
    let value = parse_value(third, "value", line_number)?;

    Ok(Some(Observation::new(latitude, longitude, value)))
}

fn parse_value(token: &str, field: &str, line_number: usize) -> Result<f64> {
    let parsed = token
        .parse::<f64>()
        .map_err(|_| ProcessingError::MalformedRecord {
            line: line_number,
            reason: format!("invalid {}: '{}'", field, token),
        })?;

    if !parsed.is_finite() {
        return Err(ProcessingError::MalformedRecord {
            line: line_number,
            reason: format!("non-finite {}: '{}'", field, token),
        });
    }

    Ok(parsed)
}

/// Streams observations out of a point file, one per non-blank line.
pub struct PointFileReader<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
}

impl PointFileReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)))
    }
}

impl<R: BufRead> PointFileReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
        }
    }

    /// Number of lines consumed so far, blank lines included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for PointFileReader<R> {
    type Item = Result<Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();

            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    self.line_number += 1;

                    // A bad byte spoils only its own line
                    let Ok(line) = std::str::from_utf8(&self.buffer) else {
                        return Some(Err(ProcessingError::MalformedRecord {
                            line: self.line_number,
                            reason: "invalid UTF-8".to_string(),
                        }));
                    };

                    match parse_record(line, self.line_number) {
                        Ok(Some(observation)) => return Some(Ok(observation)),
                        Ok(None) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_record() {
        let observation = parse_record("  40.10 -90.20    5.5\n", 1).unwrap().unwrap();

        assert_eq!(observation.latitude, 40.10);
        assert_eq!(observation.longitude, -90.20);
        assert_eq!(observation.value, 5.5);
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(parse_record("", 7).unwrap().is_none());
        assert!(parse_record("   \t \r\n", 7).unwrap().is_none());
    }

    #[test]
    fn test_parse_wrong_token_count() {
        let err = parse_record("40.10 -90.20", 3).unwrap_err();
        assert!(matches!(err, ProcessingError::MalformedRecord { line: 3, .. }));

        assert!(parse_record("40.10 -90.20 5.5 1.0", 4).is_err());
    }

    #[test]
    fn test_parse_non_numeric_and_non_finite() {
        let err = parse_record("40.10 abc 5.5", 2).unwrap_err();
        assert!(err.to_string().contains("invalid longitude: 'abc'"));

        assert!(parse_record("NaN -90.20 5.5", 1).is_err());
        assert!(parse_record("40.10 -90.20 inf", 1).is_err());
    }

    #[test]
    fn test_reader_skips_blank_lines() {
        let input = "40.10 -90.20 5.5\n\n40.12 -90.18 6.5\n\n\n";
        let observations: Vec<_> = PointFileReader::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[1], Observation::new(40.12, -90.18, 6.5));
    }

    #[test]
    fn test_reader_reports_line_numbers() {
        let input = "40.10 -90.20 5.5\n\nbroken line\n40.12 -90.18 6.5\n";
        let results: Vec<_> = PointFileReader::new(Cursor::new(input)).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ProcessingError::MalformedRecord { line: 3, .. })
        ));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_reader_isolates_invalid_utf8_line() {
        let input: &[u8] = b"40.10 -90.20 5.5\n40.1\xff -90.2 1.0\n40.12 -90.18 6.5\n";
        let results: Vec<_> = PointFileReader::new(input).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(ProcessingError::MalformedRecord { line, reason }) => {
                assert_eq!(*line, 2);
                assert_eq!(reason, "invalid UTF-8");
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
        assert_eq!(
            results[2].as_ref().unwrap(),
            &Observation::new(40.12, -90.18, 6.5)
        );
    }

    #[test]
    fn test_open_point_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "  24.5625  -81.8125    12.34")?;
        writeln!(temp_file, "  24.5625  -81.7708    12.40")?;

        let mut reader = PointFileReader::open(temp_file.path())?;
        let first = reader.next().unwrap()?;
        assert_eq!(first.latitude, 24.5625);
        assert!(reader.next().is_some());
        assert!(reader.next().is_none());
        assert_eq!(reader.line_number(), 2);

        Ok(())
    }
}
