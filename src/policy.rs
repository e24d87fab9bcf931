use serde::Serialize;

/// Suffix that marks a file as Rego rule source. Matched case-sensitively.
pub const POLICY_EXTENSION: &str = ".rego";

/// Body of a Harness policy creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyPayload {
    pub identifier: String,
    pub name: String,
    pub rego: String,
}

impl PolicyPayload {
    /// Identifier and name are always the same derived policy name.
    pub fn new(policy_name: &str, rego: String) -> Self {
        Self {
            identifier: policy_name.to_owned(),
            name: policy_name.to_owned(),
            rego,
        }
    }
}

/// Derive the policy name for a repository path.
///
/// Returns `None` unless the path ends in [`POLICY_EXTENSION`] and the base
/// name has a non-empty stem.
pub fn policy_name(path: &str) -> Option<&str> {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.strip_suffix(POLICY_EXTENSION)
        .filter(|stem| !stem.is_empty())
}

/// True when the path carries the policy extension, regardless of stem.
pub fn is_policy_file(path: &str) -> bool {
    path.ends_with(POLICY_EXTENSION)
}
