use connectors::provider::AtomicityMode;
use std::thread;
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("source table name must not be empty")]
    EmptyTable,

    #[error("batch size must be at least 1")]
    ZeroBatchSize,
}

/// Validated knobs of one copy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySettings {
    pub source_table: String,
    pub destination_table: String,
    pub worker_count: usize,
    pub batch_size: usize,
    pub atomicity: AtomicityMode,
}

impl CopySettings {
    /// Normalizes the raw inputs: the destination table defaults to the
    /// source table, and the worker count is clamped to `1..=cores` so a
    /// wild `--workers` value cannot open hundreds of connections.
    pub fn new(
        source_table: impl Into<String>,
        destination_table: Option<String>,
        worker_count: usize,
        batch_size: usize,
        atomicity: AtomicityMode,
    ) -> Result<Self, SettingsError> {
        let source_table = source_table.into();
        if source_table.trim().is_empty() {
            return Err(SettingsError::EmptyTable);
        }
        if batch_size == 0 {
            return Err(SettingsError::ZeroBatchSize);
        }

        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        let worker_count = worker_count.clamp(1, cores.max(1));

        let destination_table = match destination_table {
            Some(table) if !table.trim().is_empty() => table,
            _ => source_table.clone(),
        };

        Ok(CopySettings {
            source_table,
            destination_table,
            worker_count,
            batch_size,
            atomicity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_defaults_to_source_table() {
        let settings =
            CopySettings::new("orders", None, 2, DEFAULT_BATCH_SIZE, AtomicityMode::Global)
                .unwrap();
        assert_eq!(settings.destination_table, "orders");

        let settings = CopySettings::new(
            "orders",
            Some("orders_copy".into()),
            2,
            DEFAULT_BATCH_SIZE,
            AtomicityMode::Global,
        )
        .unwrap();
        assert_eq!(settings.destination_table, "orders_copy");
    }

    #[test]
    fn worker_count_is_clamped() {
        let settings =
            CopySettings::new("t", None, 0, DEFAULT_BATCH_SIZE, AtomicityMode::Global).unwrap();
        assert_eq!(settings.worker_count, 1);

        let settings =
            CopySettings::new("t", None, 100_000, DEFAULT_BATCH_SIZE, AtomicityMode::Global)
                .unwrap();
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        assert_eq!(settings.worker_count, cores);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert_eq!(
            CopySettings::new("  ", None, 1, 1000, AtomicityMode::Global),
            Err(SettingsError::EmptyTable)
        );
        assert_eq!(
            CopySettings::new("t", None, 1, 0, AtomicityMode::Global),
            Err(SettingsError::ZeroBatchSize)
        );
    }
}
