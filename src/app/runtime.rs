use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::adapters::replay::ReplayConnector;
use crate::adapters::session::SessionClient;
use crate::adapters::transport::{Connector, WebSocketConnector};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::report::Report;
use crate::domain::aggregation::aggregate;
use crate::domain::report_window::{Clock, ReportWindow};
use crate::domain::tariff::{CostSummary, TariffError, evaluate};

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportRequest {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub fn run(config: &AppConfig, request: ReportRequest) -> Result<String, AppError> {
    match config.replay_file.as_deref() {
        Some(path) => {
            tracing::info!(path, "serving statistics from replay file");
            generate(ReplayConnector::from_file(path)?, &SystemClock, config, request)
        }
        None => {
            let connector = WebSocketConnector::new(
                &config.ha_url,
                Duration::from_secs(config.receive_timeout_secs),
            )?;
            tracing::info!(url = %connector.endpoint().url, "connecting to statistics service");
            generate(connector, &SystemClock, config, request)
        }
    }
}

pub fn generate<C, Cl>(
    connector: C,
    clock: &Cl,
    config: &AppConfig,
    request: ReportRequest,
) -> Result<String, AppError>
where
    C: Connector,
    Cl: Clock,
{
    if config.plans.is_empty() {
        return Err(TariffError::NoPlans.into());
    }
    let window = ReportWindow::resolve(clock, request.month, request.year)?;

    let mut client = SessionClient::new(connector, &config.access_token);
    let fetched = client
        .connect()
        .and_then(|()| client.fetch_statistics(&config.sensor_ids, &window));
    client.close();
    let statistics = fetched?;

    let aggregation = aggregate(&statistics);
    tracing::info!(
        sensors = statistics.len(),
        accepted = aggregation.accepted,
        skipped = aggregation.skipped,
        "statistics fetched"
    );

    let discounts = evaluate(&aggregation.by_day_hour, &config.plans, config.tariff_rate)?;
    let summary = CostSummary::new(&aggregation.hourly, &discounts, config.tariff_rate)?;
    tracing::info!(
        best_plan = %summary.best_plan,
        best_discount = summary.best_discount,
        "plans evaluated"
    );

    Ok(Report {
        window,
        hourly: &aggregation.hourly,
        discounts: &discounts,
        summary: &summary,
        currency: &config.currency,
    }
    .to_string())
}
