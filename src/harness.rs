use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use url::Url;

use crate::config::Scope;
use crate::error::{PublishError, SyncError};
use crate::policy::PolicyPayload;

const API_KEY_HEADER: &str = "x-api-key";

/// Client for the Harness policy management API. Create-only.
#[derive(Debug, Clone)]
pub struct PolicyClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl PolicyClient {
    /// `base_url` is the policies collection endpoint; the scope is baked into
    /// its query string once.
    pub fn new(base_url: &Url, api_key: &str, scope: &Scope) -> Result<Self, SyncError> {
        let headers =
            api_headers(api_key).map_err(|_| SyncError::InvalidHeader { var: "HARNESSAPIKEY" })?;
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            endpoint: scoped_endpoint(base_url, scope),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Submit a creation request. Any status of 400 or above is a failure
    /// carrying the response body.
    #[tracing::instrument(skip(self, payload), fields(identifier = %payload.identifier), err)]
    pub async fn create_policy(&self, payload: &PolicyPayload) -> Result<(), PublishError> {
        let body = serde_json::to_vec(payload).map_err(|source| PublishError::Serialize {
            identifier: payload.identifier.clone(),
            source,
        })?;

        let resp = self
            .http
            .post(self.endpoint.clone())
            .body(body)
            .send()
            .await
            .map_err(|source| PublishError::Transport {
                identifier: payload.identifier.clone(),
                source,
            })?;

        let status = resp.status();
        if status.as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                identifier: payload.identifier.clone(),
                status,
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "policy accepted");
        Ok(())
    }
}

fn api_headers(api_key: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    let mut key = HeaderValue::from_str(api_key)?;
    key.set_sensitive(true);
    headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Append `accountIdentifier` and, when set, `orgIdentifier` and
/// `projectIdentifier`.
fn scoped_endpoint(base_url: &Url, scope: &Scope) -> Url {
    let mut url = base_url.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("accountIdentifier", &scope.account_id);
        if let Some(org) = &scope.org_id {
            query.append_pair("orgIdentifier", org);
        }
        if let Some(project) = &scope.project_id {
            query.append_pair("projectIdentifier", project);
        }
    }
    url
}
