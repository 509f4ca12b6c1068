use crate::{
    destination::DestinationBranch,
    error::ConnectorError,
    source::SourceReader,
    sql::{
        mysql::{branch::MySqlBranch, reader::MySqlSourceReader},
        postgres::{branch::PgBranch, reader::PgSourceReader},
    },
};
use async_trait::async_trait;
use std::{fmt, str::FromStr};

/// Whether the run commits as one distributed transaction or one local
/// transaction per branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtomicityMode {
    /// Full two-phase commit: the destination table is either fully copied
    /// or untouched, across all branches.
    #[default]
    Global,
    /// Plain per-connection commit/rollback. A late failure can leave the
    /// partitions of earlier-committed branches in place.
    PerBranch,
}

impl FromStr for AtomicityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(AtomicityMode::Global),
            "per-branch" => Ok(AtomicityMode::PerBranch),
            other => Err(format!("unknown atomicity mode: {other}")),
        }
    }
}

impl fmt::Display for AtomicityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicityMode::Global => f.write_str("global"),
            AtomicityMode::PerBranch => f.write_str("per-branch"),
        }
    }
}

/// Hands out ready connections: read handles on the source side, branch
/// handles (auto-commit disabled) on the destination side.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn open_source(&self) -> Result<Box<dyn SourceReader>, ConnectorError>;
    async fn open_destination(&self) -> Result<Box<dyn DestinationBranch>, ConnectorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatabaseKind {
    MySql,
    Postgres,
}

fn kind_of(url: &str) -> Result<DatabaseKind, ConnectorError> {
    let (scheme, _) = url
        .split_once("://")
        .ok_or_else(|| ConnectorError::InvalidUrl(url.to_string()))?;
    match scheme {
        "mysql" => Ok(DatabaseKind::MySql),
        "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
        other => Err(ConnectorError::UnsupportedScheme(other.to_string())),
    }
}

/// Connection provider backed by two connection URLs.
pub struct UrlConnectionProvider {
    source_url: String,
    destination_url: String,
    mode: AtomicityMode,
}

impl UrlConnectionProvider {
    pub fn new(
        source_url: impl Into<String>,
        destination_url: impl Into<String>,
        mode: AtomicityMode,
    ) -> Result<Self, ConnectorError> {
        let source_url = source_url.into();
        let destination_url = destination_url.into();
        kind_of(&source_url)?;
        kind_of(&destination_url)?;
        Ok(UrlConnectionProvider {
            source_url,
            destination_url,
            mode,
        })
    }
}

#[async_trait]
impl ConnectionProvider for UrlConnectionProvider {
    async fn open_source(&self) -> Result<Box<dyn SourceReader>, ConnectorError> {
        match kind_of(&self.source_url)? {
            DatabaseKind::MySql => Ok(Box::new(MySqlSourceReader::connect(&self.source_url).await?)),
            DatabaseKind::Postgres => {
                Ok(Box::new(PgSourceReader::connect(&self.source_url).await?))
            }
        }
    }

    async fn open_destination(&self) -> Result<Box<dyn DestinationBranch>, ConnectorError> {
        match kind_of(&self.destination_url)? {
            DatabaseKind::MySql => Ok(Box::new(
                MySqlBranch::connect(&self.destination_url, self.mode).await?,
            )),
            DatabaseKind::Postgres => Ok(Box::new(
                PgBranch::connect(&self.destination_url, self.mode).await?,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_url_schemes() {
        assert!(UrlConnectionProvider::new(
            "mysql://u:p@localhost:3306/db",
            "postgres://u:p@localhost:5432/db",
            AtomicityMode::Global,
        )
        .is_ok());

        assert!(matches!(
            UrlConnectionProvider::new("oracle://x", "mysql://y", AtomicityMode::Global),
            Err(ConnectorError::UnsupportedScheme(_))
        ));

        assert!(matches!(
            UrlConnectionProvider::new("not a url", "mysql://y", AtomicityMode::Global),
            Err(ConnectorError::InvalidUrl(_))
        ));
    }

    #[test]
    fn atomicity_mode_round_trips_through_strings() {
        assert_eq!(
            "global".parse::<AtomicityMode>().unwrap(),
            AtomicityMode::Global
        );
        assert_eq!(
            "per-branch".parse::<AtomicityMode>().unwrap(),
            AtomicityMode::PerBranch
        );
        assert!("sometimes".parse::<AtomicityMode>().is_err());
        assert_eq!(AtomicityMode::PerBranch.to_string(), "per-branch");
    }
}
