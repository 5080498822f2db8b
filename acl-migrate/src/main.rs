//! acl-migrate entry point.

use acl_migrate::config::MigrateConfig;
use acl_migrate::startup::Application;
use clap::Parser;
use migrate_core::observability::init_tracing;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;

/// Re-point a file-system permission export from a template domain to a
/// target domain.
#[derive(Debug, Parser)]
#[command(name = "acl-migrate", version, about)]
struct Args {
    /// Permission export to migrate (two lines per path).
    input: PathBuf,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config = match MigrateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.service_name, &config.log_level, config.common.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        input = %args.input.display(),
        workers = config.common.workers(),
        snapshot = %config.directory.snapshot_path.display(),
        line_ending = ?config.output.line_ending,
        "Starting acl-migrate"
    );

    let app = match Application::build(config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build application");
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        result = app.run(&args.input) => match result {
            Ok(report) => {
                println!(
                    "Wrote {} paths ({} entries added) to {}",
                    report.path_count,
                    report.entries_added,
                    report
                        .output_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                );
                ExitCode::SUCCESS
            }
            Err(e) if e.is_abort() => {
                tracing::info!(reason = %e, "Migration aborted");
                println!("Migration aborted, no output written.");
                ExitCode::from(e.exit_code())
            }
            Err(e) => {
                tracing::error!(error = %e, "Migration failed");
                ExitCode::from(e.exit_code())
            }
        },
        _ = shutdown_signal() => {
            println!("Migration interrupted, no output written.");
            ExitCode::SUCCESS
        }
    }
}
