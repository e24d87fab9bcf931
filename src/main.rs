use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use policy_sync::sync::SyncOptions;

/// Register every `.rego` file at the root of a GitHub repository as a
/// Harness policy.
#[derive(Debug, Parser)]
#[command(name = "policy-sync", version, about)]
struct Cli {
    /// List and fetch policies without creating them in Harness.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("POLICY_SYNC_LOG").unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .init();

    let opts = SyncOptions {
        dry_run: cli.dry_run,
    };

    match policy_sync::execute(|key| std::env::var(key).ok(), opts).await {
        Ok(report) => {
            tracing::info!(
                listed = report.listed,
                matched = report.matched,
                created = report.created.len(),
                planned = report.planned.len(),
                skipped = report.skipped.len(),
                failed = report.failures.len(),
                "policy sync finished"
            );
            for failure in &report.failures {
                tracing::warn!(
                    path = %failure.path,
                    stage = %failure.stage,
                    error = %failure.message,
                    "policy not synced"
                );
            }
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "policy sync aborted");
            e.exit_code()
        }
    }
}
