use std::fmt;

use crate::error::{FetchError, PublishError};
use crate::github::GithubClient;
use crate::harness::PolicyClient;
use crate::policy::{self, PolicyPayload};

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Where rule source files come from.
/// Uses native async fn in trait (Rust 2024 edition).
#[allow(async_fn_in_trait)]
pub trait PolicySource {
    /// Paths of all regular files. Called once per run.
    async fn list_files(&self) -> Result<Vec<String>, FetchError>;

    /// Raw content of one file.
    async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Where policies are registered.
#[allow(async_fn_in_trait)]
pub trait PolicySink {
    async fn create_policy(&self, payload: &PolicyPayload) -> Result<(), PublishError>;
}

impl PolicySource for GithubClient {
    async fn list_files(&self) -> Result<Vec<String>, FetchError> {
        GithubClient::list_files(self).await
    }

    async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        GithubClient::fetch_content(self, path).await
    }
}

impl PolicySink for PolicyClient {
    async fn create_policy(&self, payload: &PolicyPayload) -> Result<(), PublishError> {
        PolicyClient::create_policy(self, payload).await
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Publish => f.write_str("publish"),
        }
    }
}

/// A file that could not be synced. The run carried on past it.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: String,
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Regular files in the listing.
    pub listed: usize,
    /// Files carrying the policy extension.
    pub matched: usize,
    pub created: Vec<String>,
    /// Policies that would have been created in a dry run.
    pub planned: Vec<String>,
    /// Matched files whose stem is empty.
    pub skipped: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &str, stage: Stage, err: &dyn std::error::Error) {
        self.failures.push(FileFailure {
            path: path.to_owned(),
            stage,
            message: err.to_string(),
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// List and fetch, but never publish.
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// List once, then fetch and publish each policy file in order.
///
/// Only a listing failure is returned as an error; per-file failures are
/// logged and collected in the report.
pub async fn run<S, P>(source: &S, sink: &P, opts: SyncOptions) -> Result<SyncReport, FetchError>
where
    S: PolicySource,
    P: PolicySink,
{
    let files = source.list_files().await?;
    let mut report = SyncReport {
        listed: files.len(),
        ..SyncReport::default()
    };

    for path in files.iter().filter(|p| policy::is_policy_file(p)) {
        report.matched += 1;

        let Some(name) = policy::policy_name(path) else {
            tracing::warn!(%path, "skipping policy file with empty name");
            report.skipped.push(path.clone());
            continue;
        };

        let rego = match fetch_rego(source, path).await {
            Ok(rego) => rego,
            Err(e) => {
                tracing::error!(%path, error = %e, "error getting file content");
                report.fail(path, Stage::Fetch, &e);
                continue;
            }
        };

        let payload = PolicyPayload::new(name, rego);

        if opts.dry_run {
            tracing::info!(%path, identifier = %payload.identifier, "dry run: policy not created");
            report.planned.push(payload.identifier);
            continue;
        }

        match sink.create_policy(&payload).await {
            Ok(()) => {
                tracing::info!(%path, identifier = %payload.identifier, "policy created in Harness");
                report.created.push(payload.identifier);
            }
            Err(e) => {
                tracing::error!(%path, error = %e, "error creating policy in Harness");
                report.fail(path, Stage::Publish, &e);
            }
        }
    }

    Ok(report)
}

async fn fetch_rego<S: PolicySource>(source: &S, path: &str) -> Result<String, FetchError> {
    let bytes = source.fetch_content(path).await?;
    String::from_utf8(bytes).map_err(|_| FetchError::NotUtf8 {
        path: path.to_owned(),
    })
}
