use crate::types::PrContext;
use serde_json::Value;
use std::path::PathBuf;
use tracing::warn;

/// Channel id that selects a production deploy instead of a preview channel
pub const LIVE_CHANNEL: &str = "live";

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Raw action inputs, exactly as the runner hands them over.
///
/// Unset inputs frequently arrive as empty strings, so every field is
/// normalized by [`ActionConfig::from_raw`] before anything reads it.
#[derive(Debug, Default, Clone)]
pub struct RawInputs {
    pub firebase_service_account: Option<String>,
    pub firebase_token: Option<String>,
    pub expires: Option<String>,
    pub comment_url_path: Option<String>,
    pub project_id: Option<String>,
    pub channel_id: Option<String>,
    /// Comma separated hosting targets
    pub targets: Option<String>,
    pub repo_token: Option<String>,
    /// `GITHUB_TOKEN` from the environment; wins over `repo_token`
    pub github_token: Option<String>,
    pub entry_point: Option<String>,
    pub pr_number: Option<String>,
    pub commit_sha: Option<String>,
    pub pr_branch_name: Option<String>,
    /// `owner/name`, from `GITHUB_REPOSITORY`
    pub repository: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    Production,
    Preview,
}

/// Repository coordinates for the REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse `owner/name`
    pub fn parse(slug: &str) -> Option<Self> {
        let (owner, name) = slug.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// Immutable run configuration, built once at startup and borrowed by every
/// stage of the run.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub firebase_service_account: Option<String>,
    pub firebase_token: Option<String>,
    pub expires: Option<String>,
    /// Appended to every preview URL in links
    pub comment_url_path: String,
    pub project_id: Option<String>,
    /// Explicit preview channel; never `live`
    pub channel_id: Option<String>,
    pub mode: DeployMode,
    pub targets: Vec<String>,
    pub token: Option<String>,
    pub entry_point: PathBuf,
    pub pr_context: Option<PrContext>,
    pub repository: Option<Repository>,
    pub api_url: String,
}

impl ActionConfig {
    /// Normalize raw inputs. `event` is the webhook payload that triggered
    /// the workflow, used when the PR inputs are not given explicitly.
    pub fn from_raw(raw: RawInputs, event: Option<&Value>) -> Self {
        let pr_context = resolve_pr_context(
            raw.pr_number.as_deref(),
            raw.commit_sha.as_deref(),
            raw.pr_branch_name.as_deref(),
            event,
        );

        let channel_id = non_empty(raw.channel_id);
        let (mode, channel_id) = match channel_id {
            Some(id) if id == LIVE_CHANNEL => (DeployMode::Production, None),
            other => (DeployMode::Preview, other),
        };

        let repository = non_empty(raw.repository).and_then(|slug| {
            let parsed = Repository::parse(&slug);
            if parsed.is_none() {
                warn!(repository = %slug, "ignoring malformed repository slug");
            }
            parsed
        });

        ActionConfig {
            firebase_service_account: non_empty(raw.firebase_service_account),
            firebase_token: non_empty(raw.firebase_token),
            expires: non_empty(raw.expires),
            comment_url_path: raw.comment_url_path.unwrap_or_default(),
            project_id: non_empty(raw.project_id),
            channel_id,
            mode,
            targets: parse_targets(raw.targets.as_deref().unwrap_or_default()),
            token: non_empty(raw.github_token).or(non_empty(raw.repo_token)),
            entry_point: PathBuf::from(
                non_empty(raw.entry_point).unwrap_or_else(|| ".".to_string()),
            ),
            pr_context,
            repository,
            api_url: non_empty(raw.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.mode == DeployMode::Production
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a comma separated target list, dropping blanks
pub fn parse_targets(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the PR context from explicit inputs, falling back to the
/// `pull_request` object of the event payload. Any missing piece means there
/// is no context at all.
pub fn resolve_pr_context(
    pr_number: Option<&str>,
    commit_sha: Option<&str>,
    branch_name: Option<&str>,
    event: Option<&Value>,
) -> Option<PrContext> {
    let payload = event.and_then(|e| e.get("pull_request"));

    let pr_number = match pr_number.map(str::trim).filter(|n| !n.is_empty()) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                warn!(pr_number = %raw, "prNumber is not a number; ignoring PR context");
                return None;
            }
        },
        None => payload?.get("number")?.as_u64()?,
    };

    let commit_sha = explicit_or_payload(commit_sha, payload, "sha")?;
    let branch_name = explicit_or_payload(branch_name, payload, "ref")?;

    Some(PrContext {
        pr_number,
        commit_sha,
        branch_name,
    })
}

fn explicit_or_payload(explicit: Option<&str>, payload: Option<&Value>, head_field: &str) -> Option<String> {
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return Some(value.to_string());
    }
    payload?
        .get("head")?
        .get(head_field)?
        .as_str()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
