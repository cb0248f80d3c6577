use thiserror::Error;

/// Errors raised at the I/O edges of the dashboard (loading, config, writing).
///
/// Rule evaluation and color mapping never produce these: bad cell values
/// degrade to defaults instead.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("unknown metric `{0}` (expected Profit Margin, Temperature, Rainfall or Humidity)")]
    UnknownMetric(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
