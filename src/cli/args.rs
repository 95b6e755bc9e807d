use crate::error::{ProcessingError, Result};
use crate::settings::{AppConfig, GridConfig, LongitudeScale, MalformedRecordPolicy};
use crate::utils::constants::DEFAULT_MILES_PER_DEGREE_LONGITUDE;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "climgrid-processor")]
#[command(about = "Re-aggregate NOAA nClimGrid point archives onto a coarse grid")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress bars")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Configuration file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every archive from the remote repository and process it
    Download {
        #[arg(long, help = "Remote directory URL [default: NOAA nClimGrid]")]
        base_url: Option<String>,

        #[arg(
            long,
            help = "Only archives whose name contains this pattern (e.g., '2017')",
            default_value = ""
        )]
        file_pattern: String,

        #[arg(long, help = "Keep downloaded archives in this directory")]
        keep_archives: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Process a single local archive
    Process {
        #[arg(short, long, help = "Input archive (.tar.gz, .tar or .zip)")]
        input_archive: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Process every archive in a local directory
    ProcessDirectory {
        #[arg(short, long, help = "Input directory containing archives")]
        input_dir: PathBuf,

        #[arg(
            long,
            help = "Filter to specific file pattern (e.g., '2017')",
            default_value = ""
        )]
        file_pattern: String,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Process already-extracted point files (e.g. 201701.tave.conus.pnt)
    ProcessFile {
        #[arg(required = true, help = "Point files")]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    #[arg(
        short,
        long,
        help = "Output directory for the CSV files [default: output/climgrid-{YYMMDD}]"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Abort a file at its first malformed line instead of skipping it")]
    pub fail_on_malformed: bool,

    #[arg(long)]
    pub max_workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LongitudeMode {
    Constant,
    ReferenceLatitude,
    LatitudeBand,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    #[arg(long, help = "Target cell area in square miles [default: 500]")]
    pub cell_area: Option<f64>,

    #[arg(long, help = "Miles per degree of latitude [default: 69]")]
    pub miles_per_degree_latitude: Option<f64>,

    #[arg(long, help = "Miles per degree of longitude for constant mode [default: 60]")]
    pub miles_per_degree_longitude: Option<f64>,

    #[arg(long, value_enum, help = "How longitude degrees convert to miles")]
    pub longitude_mode: Option<LongitudeMode>,

    #[arg(long, help = "Latitude used by reference-latitude mode")]
    pub reference_latitude: Option<f64>,
}

impl GridArgs {
    pub fn apply(&self, grid: &mut GridConfig) -> Result<()> {
        if let Some(area) = self.cell_area {
            grid.cell_area_sq_miles = area;
        }
        if let Some(miles) = self.miles_per_degree_latitude {
            grid.miles_per_degree_latitude = miles;
        }

        let mode = self.longitude_mode.or(match (
            self.miles_per_degree_longitude,
            self.reference_latitude,
        ) {
            (Some(_), _) => Some(LongitudeMode::Constant),
            (None, Some(_)) => Some(LongitudeMode::ReferenceLatitude),
            (None, None) => None,
        });

        match mode {
            None => {}
            Some(LongitudeMode::Constant) => {
                let current = match grid.longitude {
                    LongitudeScale::Constant { miles_per_degree } => miles_per_degree,
                    _ => DEFAULT_MILES_PER_DEGREE_LONGITUDE,
                };
                grid.longitude = LongitudeScale::Constant {
                    miles_per_degree: self.miles_per_degree_longitude.unwrap_or(current),
                };
            }
            Some(LongitudeMode::ReferenceLatitude) => {
                let latitude = match (self.reference_latitude, grid.longitude) {
                    (Some(latitude), _) => latitude,
                    (None, LongitudeScale::ReferenceLatitude { latitude }) => latitude,
                    (None, _) => {
                        return Err(ProcessingError::Config(
                            "--longitude-mode reference-latitude requires --reference-latitude"
                                .to_string(),
                        ))
                    }
                };
                grid.longitude = LongitudeScale::ReferenceLatitude { latitude };
            }
            Some(LongitudeMode::LatitudeBand) => grid.longitude = LongitudeScale::LatitudeBand,
        }

        Ok(())
    }
}

impl OutputArgs {
    pub fn apply(&self, app_config: &mut AppConfig) {
        if self.fail_on_malformed {
            app_config.malformed_records = MalformedRecordPolicy::Fail;
        }
        if let Some(workers) = self.max_workers {
            app_config.max_workers = workers;
        }
    }
}
