use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid url in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Failure to read from the repository host. Fatal for the listing,
/// per-file for content.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base64 content in {path}: {source}")]
    Base64 {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("content of {path} is not valid utf-8")]
    NotUtf8 { path: String },

    #[error("invalid path {path}")]
    InvalidPath { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize policy {identifier}: {source}")]
    Serialize {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to send policy {identifier}: {source}")]
    Transport {
        identifier: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to create policy {identifier} in Harness ({status}): {body}")]
    Rejected {
        identifier: String,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Run-level failure: anything that stops the pipeline as a whole.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to list repository files: {0}")]
    Listing(#[from] FetchError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{var} is not a valid http header value")]
    InvalidHeader { var: &'static str },
}

impl SyncError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::InvalidHeader { .. } => ExitCode::from(2),
            Self::Listing(_) | Self::Client(_) => ExitCode::FAILURE,
        }
    }
}
