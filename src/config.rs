use url::Url;

use crate::error::ConfigError;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_HARNESS_POLICY_URL: &str = "https://app.harness.io/gateway/pm/api/v1/policies";

/// Required variables, in the order they are reported when missing.
const REQUIRED: [&str; 5] = [
    "HARNESSACCOUNTID",
    "HARNESSAPIKEY",
    "GITHUBTOKEN",
    "GITHUBUSER",
    "GITHUBREPO",
];

/// Where policies land inside the Harness account hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub account_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scope: Scope,
    pub harness_api_key: String,
    pub harness_policy_url: Url,
    pub github_token: String,
    pub github_user: String,
    pub github_repo: String,
    pub github_api_url: Url,
}

impl Config {
    /// Build and validate a config from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones. All missing required
    /// variables are reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let missing: Vec<&'static str> = REQUIRED
            .into_iter()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let required = |key: &'static str| get(key).unwrap_or_default();

        Ok(Self {
            scope: Scope {
                account_id: required("HARNESSACCOUNTID"),
                org_id: get("HARNESSORG"),
                project_id: get("HARNESSPROJECT"),
            },
            harness_api_key: required("HARNESSAPIKEY"),
            harness_policy_url: parse_url(
                "HARNESSPOLICYURL",
                get("HARNESSPOLICYURL").as_deref(),
                DEFAULT_HARNESS_POLICY_URL,
            )?,
            github_token: required("GITHUBTOKEN"),
            github_user: required("GITHUBUSER"),
            github_repo: required("GITHUBREPO"),
            github_api_url: parse_url(
                "GITHUBAPIURL",
                get("GITHUBAPIURL").as_deref(),
                DEFAULT_GITHUB_API_URL,
            )?,
        })
    }

    /// `{api}/repos/{user}/{repo}`
    pub fn repo_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.github_api_url.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::InvalidUrl {
                var: "GITHUBAPIURL",
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(["repos", self.github_user.as_str(), self.github_repo.as_str()]);
        Ok(url)
    }
}

fn parse_url(var: &'static str, value: Option<&str>, default: &str) -> Result<Url, ConfigError> {
    Url::parse(value.unwrap_or(default)).map_err(|source| ConfigError::InvalidUrl { var, source })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            ("HARNESSACCOUNTID", "acct"),
            ("HARNESSAPIKEY", "pat.key"),
            ("GITHUBTOKEN", "ghp_token"),
            ("GITHUBUSER", "octo"),
            ("GITHUBREPO", "policies"),
        ]
    }

    #[test]
    fn loads_required_values_and_defaults() {
        let cfg = Config::from_lookup(lookup(&complete())).unwrap();
        assert_eq!(cfg.scope.account_id, "acct");
        assert_eq!(cfg.scope.org_id, None);
        assert_eq!(cfg.scope.project_id, None);
        assert_eq!(cfg.harness_api_key, "pat.key");
        assert_eq!(cfg.github_api_url.as_str(), "https://api.github.com/");
        assert_eq!(
            cfg.harness_policy_url.as_str(),
            "https://app.harness.io/gateway/pm/api/v1/policies"
        );
    }

    #[test]
    fn optional_scope_values_are_kept_when_set() {
        let mut pairs = complete();
        pairs.push(("HARNESSORG", "default"));
        pairs.push(("HARNESSPROJECT", "payments"));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.scope.org_id.as_deref(), Some("default"));
        assert_eq!(cfg.scope.project_id.as_deref(), Some("payments"));
    }

    #[test]
    fn empty_optional_scope_is_none() {
        let mut pairs = complete();
        pairs.push(("HARNESSORG", ""));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.scope.org_id, None);
    }

    #[test]
    fn empty_api_key_is_missing() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "HARNESSAPIKEY");
        pairs.push(("HARNESSAPIKEY", ""));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref keys) if keys == &["HARNESSAPIKEY"]));
    }

    #[test]
    fn whitespace_values_are_kept_verbatim() {
        let mut pairs = complete();
        pairs.push(("HARNESSORG", " "));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.scope.org_id.as_deref(), Some(" "));
    }

    #[test]
    fn reports_every_missing_variable() {
        let err = Config::from_lookup(lookup(&[("GITHUBUSER", "octo")])).unwrap_err();
        match err {
            ConfigError::Missing(keys) => assert_eq!(
                keys,
                vec!["HARNESSACCOUNTID", "HARNESSAPIKEY", "GITHUBTOKEN", "GITHUBREPO"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let mut pairs = complete();
        pairs.push(("GITHUBAPIURL", "not a url"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: "GITHUBAPIURL", .. }));
    }

    #[test]
    fn repo_url_joins_owner_and_name() {
        let cfg = Config::from_lookup(lookup(&complete())).unwrap();
        assert_eq!(
            cfg.repo_url().unwrap().as_str(),
            "https://api.github.com/repos/octo/policies"
        );
    }

    #[test]
    fn repo_url_respects_base_path() {
        let mut pairs = complete();
        pairs.push(("GITHUBAPIURL", "https://ghe.example.com/api/v3"));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            cfg.repo_url().unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/octo/policies"
        );
    }
}
