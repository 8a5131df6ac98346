//! Shared error type across statkit crates.

use thiserror::Error;

/// Stable error codes (used in log fields and by reporters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Empty metric name.
    InvalidName,
    /// Quantile outside `[0, 1]`.
    InvalidQuantile,
    /// Write attempted on an accessor-backed gauge.
    ReadOnlyGauge,
    /// Configuration could not be read or failed validation.
    Config,
    /// A reporter failed to emit its output.
    Report,
}

impl ErrorCode {
    /// String representation used in logs and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidName => "INVALID_NAME",
            ErrorCode::InvalidQuantile => "INVALID_QUANTILE",
            ErrorCode::ReadOnlyGauge => "READ_ONLY_GAUGE",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Report => "REPORT",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatkitError>;

/// Unified error type used by core and report.
#[derive(Debug, Error)]
pub enum StatkitError {
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("quantile {0} is not in [0, 1]")]
    InvalidQuantile(f64),
    #[error("gauge is backed by an accessor and cannot be set")]
    ReadOnlyGauge,
    #[error("config: {0}")]
    Config(String),
    #[error("report: {0}")]
    Report(String),
}

impl StatkitError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            StatkitError::InvalidName(_) => ErrorCode::InvalidName,
            StatkitError::InvalidQuantile(_) => ErrorCode::InvalidQuantile,
            StatkitError::ReadOnlyGauge => ErrorCode::ReadOnlyGauge,
            StatkitError::Config(_) => ErrorCode::Config,
            StatkitError::Report(_) => ErrorCode::Report,
        }
    }
}
