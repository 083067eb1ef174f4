use crate::cli::args::{Cli, Commands};
use crate::config::RunConfig;
use crate::error::Result;
use crate::processors::ParallelProcessor;
use crate::utils::progress::ProgressReporter;
use crate::writers::ReportWriter;
use std::path::Path;
use tracing::{info, Level};

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or_default();
    let config = RunConfig::load(&command.overrides())?;

    match command {
        Commands::Process { quiet, .. } => {
            let file_size = input_size(&config.input_file)?;
            let processor = sized_processor(&config, file_size).with_read_mode(config.read_mode);

            println!(
                "Processing file: {} ({:.2} MB)",
                config.input_file.display(),
                file_size as f64 / 1024.0 / 1024.0
            );
            println!("Using {} workers", processor.workers());

            let progress = ProgressReporter::new(0, "Aggregating measurements...", quiet);
            let summary = processor.process_file(&config.input_file, Some(&progress))?;

            ReportWriter::new().write_report(&summary.result, &config.output_file)?;

            println!(
                "Aggregated {} stations from {} lines in {} chunks ({} skipped)",
                summary.result.len(),
                summary.lines,
                summary.chunks,
                summary.skipped
            );
            println!("Results written to {}", config.output_file.display());
        }

        Commands::Plan { .. } => {
            let processor = sized_processor(&config, input_size(&config.input_file)?);
            let ranges = processor.plan(&config.input_file)?;

            println!(
                "{} chunks for {} workers over {}",
                ranges.len(),
                processor.workers(),
                config.input_file.display()
            );
            for (index, range) in ranges.iter().enumerate() {
                println!("{:>4}  {}", index, range);
            }
        }
    }

    Ok(())
}

/// Explicit worker count when configured, otherwise sized from the input file.
fn sized_processor(config: &RunConfig, file_size: u64) -> ParallelProcessor {
    match config.workers {
        Some(workers) => ParallelProcessor::new(workers),
        None => {
            let processor = ParallelProcessor::for_file_size(file_size);
            info!(file_size, workers = processor.workers(), "Sized worker pool");
            processor
        }
    }
}

fn input_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
