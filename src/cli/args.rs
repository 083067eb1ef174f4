use crate::config::ConfigOverrides;
use crate::readers::ReadMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "station-stats")]
#[command(about = "Parallel per-station min/mean/max over large measurement files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate the input file and write the sorted report (default)
    Process {
        #[command(flatten)]
        input: InputArgs,

        #[arg(
            short,
            long,
            help = "Report file path [env: OUTPUT_FILE] [default: output.txt]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, value_enum, help = "How workers read their chunk [env: STATS_READ_MODE]")]
        read_mode: Option<ReadModeArg>,

        #[arg(short, long, help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Print the chunk boundaries a run would use, without aggregating
    Plan {
        #[command(flatten)]
        input: InputArgs,
    },
}

/// Command-line spelling of [`ReadMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReadModeArg {
    Mmap,
    Buffered,
}

impl From<ReadModeArg> for ReadMode {
    fn from(arg: ReadModeArg) -> Self {
        match arg {
            ReadModeArg::Mmap => ReadMode::Mmap,
            ReadModeArg::Buffered => ReadMode::Buffered,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    #[arg(
        short,
        long,
        help = "Measurement file [env: INPUT_FILE] [default: testcase.txt]"
    )]
    pub input_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Worker count [env: STATS_WORKERS] [default: one per 50 MiB, capped at CPU count]"
    )]
    pub workers: Option<usize>,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Process {
            input: InputArgs::default(),
            output_file: None,
            read_mode: None,
            quiet: false,
        }
    }
}

impl Commands {
    pub fn overrides(&self) -> ConfigOverrides {
        match self {
            Commands::Process {
                input,
                output_file,
                read_mode,
                ..
            } => ConfigOverrides {
                input_file: input.input_file.clone(),
                output_file: output_file.clone(),
                workers: input.workers,
                read_mode: read_mode.map(ReadMode::from),
            },
            Commands::Plan { input } => ConfigOverrides {
                input_file: input.input_file.clone(),
                workers: input.workers,
                ..Default::default()
            },
        }
    }
}
