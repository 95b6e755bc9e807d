/// Grid geometry defaults
pub const DEFAULT_CELL_AREA_SQ_MILES: f64 = 500.0;
pub const DEFAULT_MILES_PER_DEGREE_LATITUDE: f64 = 69.0;
/// Ranges from ~45 to ~60 across the contiguous US; 60 gives the smallest cells
pub const DEFAULT_MILES_PER_DEGREE_LONGITUDE: f64 = 60.0;
/// Length of one degree of longitude at the equator
pub const EQUATORIAL_MILES_PER_DEGREE_LONGITUDE: f64 = 69.172;
/// Floor applied to cosine-scaled longitude near the poles
pub const MIN_MILES_PER_DEGREE_LONGITUDE: f64 = 1.0;

/// Output
pub const CSV_HEADER: [&str; 5] = ["Year", "Month", "Latitude", "Longitude", "Value"];
pub const RUN_SUMMARY_FILE: &str = "run-summary.json";

/// Remote repository
pub const DEFAULT_BASE_URL: &str = "https://www.ncei.noaa.gov/pub/data/climgrid/";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;
pub const MAX_DOWNLOAD_RETRIES: usize = 3;
pub const RETRY_DELAY_SECS: u64 = 2;

/// Archive entries skipped by name
pub const README_MARKER: &str = "readme";

/// Archive extensions
pub const TAR_GZ_EXTENSIONS: [&str; 2] = [".tar.gz", ".tgz"];
pub const TAR_EXTENSION: &str = ".tar";
pub const ZIP_EXTENSION: &str = ".zip";

/// Configuration
pub const ENV_PREFIX: &str = "CLIMGRID";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
