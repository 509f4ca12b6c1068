use crate::{error::CliError, shutdown::ExitCode};
use clap::Parser;
use commands::Commands;
use connectors::provider::{AtomicityMode, ConnectionProvider, UrlConnectionProvider};
use engine_core::{progress::ProgressTable, settings::CopySettings};
use engine_runtime::{coordinator::CopyCoordinator, summary::RunSummary};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "parcopy", version = "0.1.0", about = "Parallel table copy tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli).await.as_i32());
}

async fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Copy {
            source_url,
            destination_url,
            table,
            destination_table,
            workers,
            batch_size,
            atomicity,
            json,
            quiet,
        } => {
            let result = copy(
                source_url,
                destination_url,
                table,
                destination_table,
                workers,
                batch_size,
                atomicity,
                json,
                quiet,
            )
            .await;
            match result {
                Ok((summary, shutdown_requested)) => {
                    if shutdown_requested {
                        ExitCode::ShutdownRequested
                    } else if summary.committed() {
                        ExitCode::Success
                    } else {
                        ExitCode::GeneralError
                    }
                }
                Err(err) => {
                    eprintln!("{err}");
                    ExitCode::GeneralError
                }
            }
        }
        Commands::TestConn { url } => match test_conn(&url).await {
            Ok(()) => {
                println!("Connection OK");
                ExitCode::Success
            }
            Err(err) => {
                eprintln!("{err}");
                ExitCode::GeneralError
            }
        },
    }
}

#[allow(clippy::too_many_arguments)]
async fn copy(
    source_url: String,
    destination_url: String,
    table: String,
    destination_table: Option<String>,
    workers: usize,
    batch_size: usize,
    atomicity: AtomicityMode,
    json: bool,
    quiet: bool,
) -> Result<(RunSummary, bool), CliError> {
    let settings = CopySettings::new(table, destination_table, workers, batch_size, atomicity)?;
    let provider = UrlConnectionProvider::new(source_url, destination_url, atomicity)?;

    let progress = Arc::new(ProgressTable::new(settings.worker_count));
    let cancel = CancellationToken::new();

    let shutdown = shutdown::ShutdownCoordinator::new(cancel.clone());
    shutdown.register_handlers();

    let (done_tx, done_rx) = watch::channel(false);
    let reporter = if quiet || json {
        None
    } else {
        Some(output::spawn_reporter(Arc::clone(&progress), done_rx))
    };

    let coordinator = CopyCoordinator::new(
        Arc::new(provider) as Arc<dyn ConnectionProvider>,
        settings,
        progress,
        cancel,
    );
    let result = coordinator.run().await;

    let _ = done_tx.send(true);
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }

    let summary = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print_summary(&summary);
    }
    Ok((summary, shutdown.is_shutdown_requested()))
}

async fn test_conn(url: &str) -> Result<(), CliError> {
    let provider = UrlConnectionProvider::new(url, url, AtomicityMode::PerBranch)?;
    let mut reader = provider.open_source().await?;
    if let Err(error) = reader.close().await {
        warn!(%error, "closing test connection failed");
    }
    Ok(())
}
