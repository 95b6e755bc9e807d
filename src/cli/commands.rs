use crate::archive::{ArchiveProcessor, ArchiveReport, MultiArchiveProcessor, TempFileManager};
use crate::cli::args::{Cli, Commands, GridArgs, OutputArgs};
use crate::error::Result;
use crate::processors::{BatchProcessor, FileProcessor, GridIndexer, RunSummary};
use crate::remote::{RemoteArchive, RemoteRepository};
use crate::settings::AppConfig;
use crate::utils::constants::RUN_SUMMARY_FILE;
use crate::utils::filename::generate_default_output_dir;
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::writers::{output_paths, DatasetWriters};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let quiet = cli.quiet;

    let mut app_config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download {
            base_url,
            file_pattern,
            keep_archives,
            output,
            grid,
        } => {
            if let Some(url) = base_url {
                app_config.remote.base_url = url;
            }
            let mut session = Session::start(app_config, &grid, &output)?;
            let processor = Arc::new(session.archive_processor());

            let repository = RemoteRepository::connect(
                &session.config.remote.base_url,
                Duration::from_secs(session.config.remote.timeout_secs),
            )?;
            let archives = repository.list_archives(Some(file_pattern.as_str())).await?;
            if archives.is_empty() {
                warn!(base_url = %repository.base_url(), "no archives listed");
            }

            let scratch = TempFileManager::new()?;
            let download_dir = keep_archives
                .clone()
                .unwrap_or_else(|| scratch.temp_dir_path().to_path_buf());

            let progress =
                ProgressReporter::new(archives.len() as u64, "Downloading archives...", quiet);

            for (i, archive) in archives.iter().enumerate() {
                progress.set_message(&format!(
                    "Archive {}/{}: {}",
                    i + 1,
                    archives.len(),
                    archive.name
                ));

                match fetch_and_process(&repository, archive, &download_dir, &processor).await {
                    Ok((path, report)) => {
                        report.write_to(&mut session.writers, &mut session.summary)?;
                        if keep_archives.is_none() {
                            std::fs::remove_file(&path)?;
                            debug!(archive = %path.display(), "removed downloaded archive");
                        }
                    }
                    Err(e) => {
                        error!(
                            archive = %archive.name,
                            error = %e,
                            "failed to fetch or process archive"
                        );
                        session.summary.record_archive_failure(&archive.name, &e);
                    }
                }
                progress.increment(1);
            }

            progress.finish_with_message(&format!("Processed {} archives", archives.len()));
            scratch.cleanup()?;
            session.finish()
        }

        Commands::Process {
            input_archive,
            output,
            grid,
        } => {
            let mut session = Session::start(app_config, &grid, &output)?;
            let processor = session.archive_processor();

            let progress = ProgressReporter::new_spinner("Processing archive...", quiet);
            let report = processor.process(&input_archive, Some(&progress))?;
            report.write_to(&mut session.writers, &mut session.summary)?;
            progress.finish_with_message(&format!(
                "Processed {} files from {}",
                report.outcomes.len(),
                input_archive.display()
            ));

            session.finish()
        }

        Commands::ProcessDirectory {
            input_dir,
            file_pattern,
            output,
            grid,
        } => {
            let mut session = Session::start(app_config, &grid, &output)?;
            let processor = session.archive_processor();

            let multi =
                MultiArchiveProcessor::from_directory(&input_dir, Some(file_pattern.as_str()))?;
            println!("Found {} archives to process", multi.archives().len());

            let progress = ProgressReporter::new_spinner("Processing archives...", quiet);
            multi.process_all(
                &processor,
                &mut session.writers,
                &mut session.summary,
                Some(&progress),
            )?;
            progress.finish_with_message(&format!(
                "Processed {} archives",
                multi.archives().len()
            ));

            session.finish()
        }

        Commands::ProcessFile {
            inputs,
            output,
            grid,
        } => {
            let mut session = Session::start(app_config, &grid, &output)?;
            let batch = session.batch_processor();

            let progress = ProgressReporter::new(inputs.len() as u64, "Processing files...", quiet);
            let outcomes = batch.process_files(&inputs, Some(&progress))?;
            session
                .writers
                .write_outcomes(&outcomes, &mut session.summary)?;
            progress.finish_with_message(&format!("Processed {} files", outcomes.len()));

            session.finish()
        }
    }
}

/// Download one archive and aggregate it on the blocking pool.
async fn fetch_and_process(
    repository: &RemoteRepository,
    archive: &RemoteArchive,
    download_dir: &Path,
    processor: &Arc<ArchiveProcessor>,
) -> Result<(PathBuf, ArchiveReport)> {
    let path = repository.download(archive, download_dir).await?;

    let worker = Arc::clone(processor);
    let archive_path = path.clone();
    let report =
        tokio::task::spawn_blocking(move || worker.process(&archive_path, None)).await??;

    Ok((path, report))
}

/// State shared by every command: the resolved configuration, the open
/// output streams and the run counters.
struct Session<W: Write> {
    config: AppConfig,
    indexer: GridIndexer,
    output_dir: PathBuf,
    writers: DatasetWriters<W>,
    summary: RunSummary,
}

impl Session<std::io::BufWriter<std::fs::File>> {
    fn start(mut config: AppConfig, grid: &GridArgs, output: &OutputArgs) -> Result<Self> {
        grid.apply(&mut config.grid)?;
        output.apply(&mut config);
        config.validate()?;

        let indexer = GridIndexer::from_config(&config.grid)?;
        let output_dir = output
            .output_dir
            .clone()
            .unwrap_or_else(generate_default_output_dir);

        info!(
            cell_area = config.grid.cell_area_sq_miles,
            lat_degrees = indexer.degrees_latitude_per_cell(),
            longitude = ?config.grid.longitude,
            output_dir = %output_dir.display(),
            workers = config.max_workers,
            "starting run"
        );

        let writers = DatasetWriters::create(&output_dir)?;

        Ok(Self {
            config,
            indexer,
            output_dir,
            writers,
            summary: RunSummary::new(),
        })
    }
}

impl<W: Write> Session<W> {
    fn batch_processor(&self) -> BatchProcessor {
        let processor =
            FileProcessor::new(self.indexer).with_malformed_policy(self.config.malformed_records);
        BatchProcessor::new(processor, self.config.max_workers)
    }

    fn archive_processor(&self) -> ArchiveProcessor {
        ArchiveProcessor::new(self.batch_processor())
    }

    /// Flush outputs, persist the run summary and turn any per-file failure
    /// into an error exit.
    fn finish(mut self) -> Result<()> {
        self.writers.flush()?;

        let summary_path = self.output_dir.join(RUN_SUMMARY_FILE);
        self.summary.write_json(&summary_path)?;

        println!("\n{}", self.summary.report());
        print_outputs(&self.output_dir);

        self.summary.ensure_success()
    }
}

fn print_outputs(output_dir: &Path) {
    println!("Output files:");
    for path in output_paths(output_dir) {
        println!("  {}", path.display());
    }
}
