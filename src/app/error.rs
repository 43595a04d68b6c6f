use thiserror::Error;

use crate::adapters::session::SessionError;
use crate::adapters::transport::TransportError;
use crate::domain::error::FormatError;
use crate::domain::report_window::WindowError;
use crate::domain::tariff::TariffError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid plan in {key}: {source}")]
    Plan {
        key: String,
        #[source]
        source: FormatError,
    },
    #[error("invalid reporting window: {0}")]
    Window(#[from] WindowError),
    #[error("failed to set up transport: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("tariff evaluation failed: {0}")]
    Tariff(#[from] TariffError),
}

impl AppError {
    pub fn logging_init<E: std::fmt::Display>(error: E) -> Self {
        Self::LoggingInit(error.to_string())
    }

    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }
}
