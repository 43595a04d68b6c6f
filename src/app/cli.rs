use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "energy-report")]
#[command(
    version,
    about = "Summarize Home Assistant energy use and compare time-of-use plans"
)]
pub struct Cli {
    /// Report this calendar month instead of the current month to date
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Year of --month, defaults to the current year
    #[arg(long, requires = "month")]
    pub year: Option<i32>,

    /// Read configuration from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}
