use anyhow::Context;
use clap::Parser;
use station_stats::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).context("station-stats run failed")
}
