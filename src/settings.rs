use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_BASE_URL, DEFAULT_CELL_AREA_SQ_MILES, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MILES_PER_DEGREE_LATITUDE, DEFAULT_MILES_PER_DEGREE_LONGITUDE, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::{Validate, ValidationError};

/// How many miles one degree of longitude spans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LongitudeScale {
    /// One figure for the whole grid.
    Constant { miles_per_degree: f64 },
    /// `69.172 * cos(latitude)` evaluated once for the run.
    ReferenceLatitude { latitude: f64 },
    /// `69.172 * cos(latitude)` evaluated at the centre of each latitude band.
    LatitudeBand,
}

impl Default for LongitudeScale {
    fn default() -> Self {
        LongitudeScale::Constant {
            miles_per_degree: DEFAULT_MILES_PER_DEGREE_LONGITUDE,
        }
    }
}

fn validate_longitude_scale(scale: &LongitudeScale) -> std::result::Result<(), ValidationError> {
    match *scale {
        LongitudeScale::Constant { miles_per_degree }
            if !(miles_per_degree.is_finite() && miles_per_degree > 0.0) =>
        {
            Err(ValidationError::new("miles_per_degree_must_be_positive"))
        }
        LongitudeScale::ReferenceLatitude { latitude }
            if !(latitude.is_finite() && latitude.abs() < 90.0) =>
        {
            Err(ValidationError::new("reference_latitude_out_of_range"))
        }
        _ => Ok(()),
    }
}

/// Cell geometry for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GridConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub cell_area_sq_miles: f64,

    #[validate(range(exclusive_min = 0.0))]
    pub miles_per_degree_latitude: f64,

    #[validate(custom(function = "validate_longitude_scale"))]
    pub longitude: LongitudeScale,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_area_sq_miles: DEFAULT_CELL_AREA_SQ_MILES,
            miles_per_degree_latitude: DEFAULT_MILES_PER_DEGREE_LATITUDE,
            longitude: LongitudeScale::default(),
        }
    }
}

impl GridConfig {
    /// Side length of a square cell with the configured area.
    pub fn cell_side_miles(&self) -> f64 {
        self.cell_area_sq_miles.sqrt()
    }

    pub fn degrees_latitude_per_cell(&self) -> f64 {
        self.cell_side_miles() / self.miles_per_degree_latitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRecordPolicy {
    /// Log the line and keep going.
    #[default]
    Skip,
    /// Abort the file at the first bad line.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RemoteConfig {
    #[validate(url)]
    pub base_url: String,

    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub grid: GridConfig,

    #[validate(nested)]
    pub remote: RemoteConfig,

    pub malformed_records: MalformedRecordPolicy,

    #[validate(range(min = 1))]
    pub max_workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            remote: RemoteConfig::default(),
            malformed_records: MalformedRecordPolicy::default(),
            max_workers: num_cpus::get(),
        }
    }
}

impl AppConfig {
    /// Layer defaults, an optional config file and `CLIMGRID_*` environment
    /// variables (nested keys separated by `__`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }
}
