use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that points the deploy tool at a credential file
pub const CREDENTIALS_FILE_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variable that carries a CI bearer token to the deploy tool
pub const TOKEN_ENV: &str = "FIREBASE_TOKEN";

/// Credentials handed to the deploy tool. Exactly one kind per run.
#[derive(Clone, PartialEq, Eq)]
pub enum DeployAuth {
    /// Path to a materialized service-account credential file
    CredentialsFile(PathBuf),
    /// Bearer token
    Token(String),
}

impl DeployAuth {
    /// The single environment variable this credential contributes.
    pub fn env_var(&self) -> (&'static str, String) {
        match self {
            DeployAuth::CredentialsFile(path) => {
                (CREDENTIALS_FILE_ENV, path.to_string_lossy().into_owned())
            }
            DeployAuth::Token(token) => (TOKEN_ENV, token.clone()),
        }
    }
}

// Tokens must never reach the logs.
impl std::fmt::Debug for DeployAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployAuth::CredentialsFile(path) => {
                f.debug_tuple("CredentialsFile").field(path).finish()
            }
            DeployAuth::Token(_) => f.write_str("Token(***)"),
        }
    }
}

/// Everything a preview channel deploy needs
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub auth: DeployAuth,
    pub project_id: Option<String>,
    /// Channel lifetime such as `7d`; the tool's default when absent
    pub expires: Option<String>,
    pub channel_id: String,
    pub targets: Vec<String>,
    /// Directory holding `firebase.json`; the tool runs there
    pub project_dir: PathBuf,
}

/// Everything a production deploy needs
#[derive(Debug, Clone)]
pub struct ProductionConfig {
    pub auth: DeployAuth,
    pub project_id: Option<String>,
    pub targets: Vec<String>,
    pub project_dir: PathBuf,
}

/// One hosting site updated by a channel deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDeploy {
    pub site: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub url: String,
    /// ISO 8601 timestamp
    pub expire_time: String,
}

/// Structured result printed by the deploy tool in `--json` mode.
///
/// The `status` tag decides which of the other fields exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeployResult<T> {
    Success { result: T },
    Error { error: String },
}

impl<T> DeployResult<T> {
    /// Success body, or the tool's own error message as a deployment error
    pub fn into_result(self) -> Result<T> {
        match self {
            DeployResult::Success { result } => Ok(result),
            DeployResult::Error { error } => Err(Error::Deployment(error)),
        }
    }
}

/// Sites keyed by site name, in the order the tool reported them
pub type ChannelSites = IndexMap<String, SiteDeploy>;

pub type ChannelDeployResult = DeployResult<ChannelSites>;

pub type ProductionDeployResult = DeployResult<ProductionSites>;

/// Result body of a production deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionSites {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosting: Option<HostingSites>,
}

/// The tool reports one name for a single site and a list for several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostingSites {
    Single(String),
    Multiple(Vec<String>),
}

/// Pull request the run is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrContext {
    pub pr_number: u64,
    pub commit_sha: String,
    pub branch_name: String,
}

impl PrContext {
    /// Abbreviated commit id used in comments
    pub fn short_sha(&self) -> &str {
        match self.commit_sha.char_indices().nth(7) {
            Some((idx, _)) => &self.commit_sha[..idx],
            None => &self.commit_sha,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    Success,
    Failure,
}

/// Final report delivered to the commit check (or the log)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub conclusion: Conclusion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    pub title: String,
    pub summary: String,
}

impl CheckReport {
    pub fn success(title: impl Into<String>, summary: impl Into<String>, details_url: String) -> Self {
        Self {
            conclusion: Conclusion::Success,
            details_url: Some(details_url),
            title: title.into(),
            summary: summary.into(),
        }
    }

    pub fn failure(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            conclusion: Conclusion::Failure,
            details_url: None,
            title: title.into(),
            summary: summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_env_var_token() {
        let auth = DeployAuth::Token("1//secret".to_string());
        assert_eq!(auth.env_var(), (TOKEN_ENV, "1//secret".to_string()));
        assert_eq!(format!("{:?}", auth), "Token(***)");
    }

    #[test]
    fn test_auth_env_var_credentials_file() {
        let auth = DeployAuth::CredentialsFile(PathBuf::from("/tmp/gac.json"));
        assert_eq!(
            auth.env_var(),
            (CREDENTIALS_FILE_ENV, "/tmp/gac.json".to_string())
        );
    }

    #[test]
    fn test_deploy_result_status_tag() {
        let ok: ProductionDeployResult =
            serde_json::from_str(r#"{"status":"success","result":{"hosting":"demo"}}"#).unwrap();
        assert_eq!(
            ok.into_result().unwrap().hosting,
            Some(HostingSites::Single("demo".to_string()))
        );

        let failed: ProductionDeployResult =
            serde_json::from_str(r#"{"status":"error","error":"HTTP Error: 403"}"#).unwrap();
        match failed.into_result() {
            Err(Error::Deployment(msg)) => assert_eq!(msg, "HTTP Error: 403"),
            other => panic!("expected deployment error, got {:?}", other),
        }
    }

    #[test]
    fn test_deploy_result_rejects_unknown_status() {
        let parsed = serde_json::from_str::<ChannelDeployResult>(r#"{"status":"pending"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_short_sha() {
        let pr = PrContext {
            pr_number: 42,
            commit_sha: "abc1234def5678".to_string(),
            branch_name: "feature-x".to_string(),
        };
        assert_eq!(pr.short_sha(), "abc1234");

        let short = PrContext {
            commit_sha: "abc".to_string(),
            ..pr
        };
        assert_eq!(short.short_sha(), "abc");
    }

    #[test]
    fn test_check_report_conclusion_serializes_lowercase() {
        let report = CheckReport::failure("Deploy preview failed", "Error: boom");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["conclusion"], "failure");
        assert!(json.get("details_url").is_none());
    }

    #[test]
    fn test_channel_sites_keep_reported_order() {
        let parsed: ChannelDeployResult = serde_json::from_str(
            r#"{"status":"success","result":{
                "zeta-app":{"site":"zeta-app","url":"https://zeta-app--pr1.web.app","expireTime":"t"},
                "alpha-docs":{"site":"alpha-docs","url":"https://alpha-docs--pr1.web.app","expireTime":"t"}
            }}"#,
        )
        .unwrap();
        let sites = parsed.into_result().unwrap();
        let names: Vec<&str> = sites.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta-app", "alpha-docs"]);
    }
}
