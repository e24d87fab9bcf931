use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::{FetchError, SyncError};

const USER_AGENT: &str = concat!("policy-sync/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One entry of a `/contents` directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryItem {
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    Base64,
    #[default]
    #[serde(other)]
    Plain,
}

/// Body of a `/contents/{path}` file response. Missing and null fields both
/// fall back to their defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub encoding: ContentEncoding,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

impl FileContent {
    /// Decode into raw bytes. GitHub wraps base64 payloads at 60 columns, so
    /// line breaks are dropped before decoding; any other whitespace is invalid.
    pub fn decode(self, path: &str) -> Result<Vec<u8>, FetchError> {
        match self.encoding {
            ContentEncoding::Base64 => {
                let compact: String = self
                    .content
                    .chars()
                    .filter(|c| !matches!(c, '\n' | '\r'))
                    .collect();
                STANDARD
                    .decode(compact)
                    .map_err(|source| FetchError::Base64 {
                        path: path.to_owned(),
                        source,
                    })
            }
            ContentEncoding::Plain => Ok(self.content.into_bytes()),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Read-only client for the GitHub repository contents API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    repo_url: Url,
}

impl GithubClient {
    pub fn new(repo_url: Url, token: &str) -> Result<Self, SyncError> {
        let headers =
            auth_headers(token).map_err(|_| SyncError::InvalidHeader { var: "GITHUBTOKEN" })?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, repo_url })
    }

    /// Paths of the regular files at the repository root.
    #[tracing::instrument(skip(self), fields(repo = %self.repo_url), err)]
    pub async fn list_files(&self) -> Result<Vec<String>, FetchError> {
        let url = self.contents_url(&[])?;
        let items: Vec<RepositoryItem> = self.get_json(url).await?;

        let files: Vec<String> = items
            .into_iter()
            .filter(|item| item.item_type == ItemType::File)
            .map(|item| item.path)
            .collect();
        tracing::debug!(count = files.len(), "listed repository files");
        Ok(files)
    }

    /// Raw bytes of a single file.
    #[tracing::instrument(skip(self), err)]
    pub async fn fetch_content(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(FetchError::InvalidPath {
                path: path.to_owned(),
            });
        }
        let url = self.contents_url(&segments)?;
        let file: FileContent = self.get_json(url).await?;
        file.decode(path)
    }

    fn contents_url(&self, path: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.repo_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidPath {
                path: path.join("/"),
            })?
            .pop_if_empty()
            .push("contents")
            .extend(path);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let url_str = url.to_string();
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status,
            });
        }

        let body = resp.bytes().await.map_err(|source| FetchError::Transport {
            url: url_str.clone(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url_str,
            source,
        })
    }
}

fn auth_headers(token: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("token {token}"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    Ok(headers)
}
