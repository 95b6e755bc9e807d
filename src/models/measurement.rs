use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasurementType {
    Precipitation,      // prcp
    AverageTemperature, // tave
    MaxTemperature,     // tmax
    MinTemperature,     // tmin
}

impl MeasurementType {
    /// Classification order. A file name matching several tokens takes the
    /// first one listed here.
    pub const ALL: [MeasurementType; 4] = [
        MeasurementType::Precipitation,
        MeasurementType::AverageTemperature,
        MeasurementType::MaxTemperature,
        MeasurementType::MinTemperature,
    ];

    /// Classify a source file by the measurement token embedded in its name,
    /// e.g. `201701.tave.conus.pnt`.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|measurement| file_name.contains(measurement.token()))
            .ok_or_else(|| ProcessingError::UnrecognizedMeasurementType(file_name.to_string()))
    }

    pub fn token(&self) -> &'static str {
        match self {
            MeasurementType::Precipitation => ".prcp.",
            MeasurementType::AverageTemperature => ".tave.",
            MeasurementType::MaxTemperature => ".tmax.",
            MeasurementType::MinTemperature => ".tmin.",
        }
    }

    pub fn output_file_name(&self) -> &'static str {
        match self {
            MeasurementType::Precipitation => "precipitation.csv",
            MeasurementType::AverageTemperature => "average-temperature.csv",
            MeasurementType::MaxTemperature => "max-temperature.csv",
            MeasurementType::MinTemperature => "min-temperature.csv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MeasurementType::Precipitation => "Precipitation",
            MeasurementType::AverageTemperature => "Temperature (Avg)",
            MeasurementType::MaxTemperature => "Temperature (Max)",
            MeasurementType::MinTemperature => "Temperature (Min)",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            MeasurementType::Precipitation => "mm",
            _ => "°C",
        }
    }
}

impl std::fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
