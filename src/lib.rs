pub mod config;
pub mod error;
pub mod github;
pub mod harness;
pub mod policy;
pub mod sync;

use config::Config;
use error::SyncError;
use github::GithubClient;
use harness::PolicyClient;
use sync::{SyncOptions, SyncReport};

/// Validate configuration, then run one sync pass.
///
/// Configuration is checked in full before any client is built, so a missing
/// variable never results in a network call.
pub async fn execute<F>(lookup: F, opts: SyncOptions) -> Result<SyncReport, SyncError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = Config::from_lookup(lookup)?;
    let repo_url = config.repo_url()?;

    let source = GithubClient::new(repo_url.clone(), &config.github_token)?;
    let sink = PolicyClient::new(
        &config.harness_policy_url,
        &config.harness_api_key,
        &config.scope,
    )?;

    tracing::info!(
        repo = %repo_url,
        endpoint = %sink.endpoint(),
        dry_run = opts.dry_run,
        "starting policy sync"
    );

    let report = sync::run(&source, &sink, opts).await?;
    Ok(report)
}
