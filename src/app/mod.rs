mod cli;
mod config;
mod error;
mod logging;
mod report;
mod runtime;

use clap::Parser;

pub use config::AppConfig;
pub use error::AppError;
pub use runtime::{ReportRequest, generate};

pub fn run() -> Result<(), AppError> {
    let cli = cli::Cli::parse();
    if cli.env_file.is_none() {
        let _ = dotenvy::dotenv();
    }

    logging::init()?;
    // wss endpoints need a process-wide crypto provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match cli.env_file.as_deref() {
        Some(path) => AppConfig::from_env_file(path)?,
        None => AppConfig::from_env()?,
    };

    tracing::info!(
        ha_url = %config.ha_url,
        sensors = config.sensor_ids.len(),
        plans = config.plans.len(),
        tariff_rate = config.tariff_rate,
        receive_timeout_secs = config.receive_timeout_secs,
        replay = config.replay_file.is_some(),
        "application bootstrap initialized"
    );

    let report = runtime::run(
        &config,
        ReportRequest {
            month: cli.month,
            year: cli.year,
        },
    )?;
    println!("{report}");
    Ok(())
}
