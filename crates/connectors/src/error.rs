use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// Any Postgres driver error.
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A source column type the copy path cannot carry.
    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),

    /// Decoding a fetched row into values failed.
    #[error("Row decode error: {0}")]
    Decode(String),

    /// The operation was issued on an already-closed connection.
    #[error("Connection already closed")]
    Closed,

    /// The run was cancelled while this operation was pending.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported database scheme: {0}")]
    UnsupportedScheme(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Connected, but the session could not be put into the transaction
    /// state the copy requires.
    #[error("Session setup failed: {0}")]
    SessionSetup(#[from] DbError),
}
