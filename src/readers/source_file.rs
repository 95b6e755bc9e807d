use crate::error::{ProcessingError, Result};
use crate::models::MeasurementType;
use serde::Serialize;
use std::path::Path;

/// What a source file name tells us: `YYYYMM.<type>.<region>.pnt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub measurement: MeasurementType,
}

impl SourceFile {
    pub fn parse(file_name: &str) -> Result<Self> {
        let invalid = |reason: &str| ProcessingError::InvalidFilename {
            name: file_name.to_string(),
            reason: reason.to_string(),
        };

        let year_str = file_name
            .get(0..4)
            .ok_or_else(|| invalid("too short for a YYYYMM prefix"))?;
        let month_str = file_name
            .get(4..6)
            .ok_or_else(|| invalid("too short for a YYYYMM prefix"))?;

        if !year_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("year is not numeric"));
        }
        if !month_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("month is not numeric"));
        }

        let year = year_str
            .parse::<i32>()
            .map_err(|_| invalid("year is not numeric"))?;
        let month = month_str
            .parse::<u32>()
            .map_err(|_| invalid("month is not numeric"))?;

        if !(1..=12).contains(&month) {
            return Err(invalid("month must be between 01 and 12"));
        }

        let measurement = MeasurementType::from_file_name(file_name)?;

        Ok(Self {
            name: file_name.to_string(),
            year,
            month,
            measurement,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!("Invalid file path: {}", path.display()))
            })?;

        Self::parse(file_name)
    }
}
