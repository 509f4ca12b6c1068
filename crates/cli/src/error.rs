use connectors::error::ConnectorError;
use engine_core::settings::SettingsError;
use engine_runtime::error::CopyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Connection error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Copy failed: {0}")]
    Copy(#[from] CopyError),

    #[error("Failed to serialize summary: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
